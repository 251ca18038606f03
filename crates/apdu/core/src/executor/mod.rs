//! Typed command exchange over a transport
//!
//! The executor turns a [`Command`] into wire bytes, hands them to a
//! [`CardTransport`] and splits the reply into a [`Response`]. One command is
//! outstanding at a time.

use bytes::Bytes;
use tracing::{debug, instrument, trace};

use crate::transport::CardTransport;
use crate::{Command, Error, Response, Result};

/// Exchanges typed commands with one card or SAM
#[derive(Debug)]
pub struct CardExecutor<T: CardTransport> {
    transport: T,
    /// Raw bytes of the last reply, status word included
    last_response: Option<Bytes>,
}

impl<T: CardTransport> CardExecutor<T> {
    /// Executor over a transport
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            last_response: None,
        }
    }

    /// Underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Raw bytes of the last reply
    pub const fn last_response(&self) -> Option<&Bytes> {
        self.last_response.as_ref()
    }

    /// Transmit a command and parse the reply
    ///
    /// The status word is not interpreted here: a well formed reply carrying
    /// an error status is still `Ok`. A data field longer than a short APDU
    /// allows is refused before the transport is used.
    #[instrument(level = "trace", skip_all, fields(ins = command.instruction()))]
    pub fn transmit(&mut self, command: &Command) -> Result<Response> {
        command.check_length()?;
        let raw = command.to_bytes();
        trace!(command = %hex::encode_upper(&raw), "Transmitting command");

        let reply = self
            .transport
            .transmit_raw(&raw)
            .inspect_err(|err| debug!(%err, "Command not delivered"))?;
        self.last_response = Some(reply.clone());

        let response = Response::from_bytes(&reply)?;
        let status = response.status();
        trace!(%status, meaning = status.description(), "Received response");
        Ok(response)
    }

    /// Forget the last reply and reset the transport
    pub fn reset(&mut self) -> Result<()> {
        self.last_response = None;
        self.transport.reset()
    }

    /// Whether the underlying transport still reaches a card
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}

impl<T: CardTransport> From<T> for CardExecutor<T> {
    fn from(transport: T) -> Self {
        Self::new(transport)
    }
}

/// Map a transport failure to an error carrying the command that failed
pub fn transmission_context(command: &Command, error: Error) -> Error {
    error.with_context(format!("command {command}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_transmit_parses_reply() {
        let transport = MockTransport::with_response(Bytes::from_static(&[0x01, 0x02, 0x90, 0x00]));
        let mut executor = CardExecutor::new(transport);

        let command = Command::new(0x00, 0x84, 0x00, 0x00).with_le(0x08);
        let response = executor.transmit(&command).unwrap();

        assert!(response.is_success());
        assert_eq!(response.data(), &[0x01, 0x02]);
        assert_eq!(
            executor.transport().commands[0].as_ref(),
            &[0x00, 0x84, 0x00, 0x00, 0x08]
        );
        assert_eq!(executor.last_response().map(|b| b.len()), Some(4));
    }

    #[test]
    fn test_transmit_keeps_error_status() {
        let transport = MockTransport::with_response(Bytes::from_static(&[0x6A, 0x82]));
        let mut executor = CardExecutor::new(transport);

        let response = executor
            .transmit(&Command::new(0x00, 0xA4, 0x02, 0x00))
            .unwrap();
        assert_eq!(response.status(), crate::response::status::common::FILE_NOT_FOUND);
    }

    #[test]
    fn test_transmit_malformed_and_transport_errors() {
        let transport = MockTransport::with_response(Bytes::from_static(&[0x90]));
        let mut executor = CardExecutor::new(transport);
        let command = Command::new(0x00, 0xB2, 0x01, 0x44);

        assert_eq!(
            executor.transmit(&command).unwrap_err(),
            Error::MalformedResponse(1)
        );
        // Queue exhausted
        assert_eq!(executor.transmit(&command).unwrap_err(), Error::Transmission);

        executor.transport_mut().connected = false;
        assert_eq!(executor.transmit(&command).unwrap_err(), Error::Connection);
        executor.reset().unwrap();
        assert!(executor.is_connected());
        assert!(executor.last_response().is_none());
    }

    #[test]
    fn test_oversized_command_not_sent() {
        let transport = MockTransport::with_response(Bytes::from_static(&[0x90, 0x00]));
        let mut executor = CardExecutor::new(transport);
        let command = Command::new(0x00, 0xDC, 0x01, 0x44).with_data(vec![0x00; 256]);

        assert_eq!(
            executor.transmit(&command).unwrap_err(),
            Error::InvalidCommandLength(256)
        );
        assert!(executor.transport().commands.is_empty());
        assert!(executor.last_response().is_none());
    }

    #[test]
    fn test_transmission_context() {
        let command = Command::new(0x00, 0x84, 0x00, 0x00).with_le(0x08);
        let err = transmission_context(&command, Error::Timeout);
        assert_eq!(err.to_string(), "command 0084000008: Operation timed out");
    }
}
