//! Channel to a card or SAM
//!
//! The session engine only ever calls [`Channel::transmit`]. Opening and
//! closing the logical channel is the caller's business.

use std::fmt;

use calypso_apdu_core::{Bytes, CardExecutor, CardTransport, Command, Response};
use tracing::{debug, instrument, warn};

use crate::commands::file::select_application;
use crate::{Error, Result};

/// Outcome of a successful application selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Answer To Reset of the card, empty when the reader does not report it
    pub atr: Bytes,
    /// Raw response to the selection, FCI followed by the status word
    pub fci: Response,
}

/// Half-duplex command channel
pub trait Channel: fmt::Debug {
    /// Select an application and keep the logical channel open
    fn open_logical_channel(&mut self, aid: &[u8]) -> Result<Selection>;

    /// Send one command and wait for its response
    fn transmit(&mut self, command: &Command) -> Result<Response>;

    /// Close the logical channel
    fn close(&mut self) -> Result<()>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn open_logical_channel(&mut self, aid: &[u8]) -> Result<Selection> {
        (**self).open_logical_channel(aid)
    }

    fn transmit(&mut self, command: &Command) -> Result<Response> {
        (**self).transmit(command)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn open_logical_channel(&mut self, aid: &[u8]) -> Result<Selection> {
        (**self).open_logical_channel(aid)
    }

    fn transmit(&mut self, command: &Command) -> Result<Response> {
        (**self).transmit(command)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Channel over a [`CardTransport`]
#[derive(Debug)]
pub struct CardChannel<T: CardTransport> {
    executor: CardExecutor<T>,
    selected: Option<Bytes>,
}

impl<T: CardTransport> CardChannel<T> {
    /// Create a channel over a transport
    pub const fn new(transport: T) -> Self {
        Self {
            executor: CardExecutor::new(transport),
            selected: None,
        }
    }

    /// Underlying transport
    pub const fn transport(&self) -> &T {
        self.executor.transport()
    }

    /// Underlying transport, mutably
    pub const fn transport_mut(&mut self) -> &mut T {
        self.executor.transport_mut()
    }

    /// AID of the currently selected application
    pub fn selected_aid(&self) -> Option<&[u8]> {
        self.selected.as_deref()
    }

    /// Take the transport back
    pub fn into_transport(self) -> T {
        self.executor.into_transport()
    }
}

impl<T: CardTransport> Channel for CardChannel<T> {
    #[instrument(level = "debug", skip_all, fields(aid = %hex::encode_upper(aid)))]
    fn open_logical_channel(&mut self, aid: &[u8]) -> Result<Selection> {
        let command = select_application(aid)?;
        let fci = self.transmit(&command)?;
        if !command.is_successful(&fci) {
            warn!(status = %fci.status(), "Application selection rejected");
            return Err(Error::SelectionFailed(fci.status()));
        }

        debug!(fci_len = fci.data().len(), "Application selected");
        self.selected = Some(Bytes::copy_from_slice(aid));
        Ok(Selection {
            atr: self.executor.transport().atr(),
            fci,
        })
    }

    fn transmit(&mut self, command: &Command) -> Result<Response> {
        self.executor
            .transmit(command)
            .map_err(|err| match err.root() {
                calypso_apdu_core::Error::MalformedResponse(_) => {
                    Error::MalformedResponse("response shorter than a status word")
                }
                _ => Error::ChannelIo(calypso_apdu_core::executor::transmission_context(
                    command, err,
                )),
            })
    }

    fn close(&mut self) -> Result<()> {
        self.selected = None;
        self.executor.reset()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use calypso_apdu_core::Error as CoreError;
    use hex_literal::hex;

    use super::*;

    #[derive(Debug, Default)]
    struct Replay {
        replies: Vec<Bytes>,
        sent: Vec<Bytes>,
    }

    impl CardTransport for Replay {
        fn do_transmit_raw(&mut self, command: &[u8]) -> calypso_apdu_core::Result<Bytes> {
            self.sent.push(Bytes::copy_from_slice(command));
            if self.replies.is_empty() {
                return Err(CoreError::Transmission);
            }
            Ok(self.replies.remove(0))
        }

        fn atr(&self) -> Bytes {
            Bytes::copy_from_slice(&hex!("3B 88 80 01"))
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn reset(&mut self) -> calypso_apdu_core::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_open_logical_channel() {
        let transport = Replay {
            replies: vec![Bytes::copy_from_slice(&hex!("6F 00 90 00"))],
            ..Default::default()
        };
        let mut channel = CardChannel::new(transport);
        let aid = hex!("31 4D 54 52 2E 49 43 41");
        let selection = channel.open_logical_channel(&aid).unwrap();

        assert_eq!(selection.atr.as_ref(), hex!("3B 88 80 01"));
        assert_eq!(selection.fci.data(), hex!("6F 00"));
        assert_eq!(channel.selected_aid(), Some(&aid[..]));
        assert_eq!(
            channel.transport().sent[0].as_ref(),
            hex!("00 A4 04 00 08 31 4D 54 52 2E 49 43 41 00")
        );
    }

    #[test]
    fn test_selection_failure() {
        let transport = Replay {
            replies: vec![Bytes::copy_from_slice(&hex!("6A 82"))],
            ..Default::default()
        };
        let mut channel = CardChannel::new(transport);
        let err = channel
            .open_logical_channel(&hex!("31 4D 54 52 2E 49 43 41"))
            .unwrap_err();
        assert_eq!(err, Error::SelectionFailed(calypso_apdu_core::StatusWord::new(0x6A, 0x82)));
        assert!(channel.selected_aid().is_none());
    }

    #[test]
    fn test_transmit_errors() {
        let transport = Replay {
            replies: vec![Bytes::from_static(&[0x90])],
            ..Default::default()
        };
        let mut channel = CardChannel::new(transport);
        let command = Command::new(0x00, 0x84, 0x00, 0x00).with_le(0x08);

        assert!(matches!(
            channel.transmit(&command),
            Err(Error::MalformedResponse(_))
        ));
        let err = channel.transmit(&command).unwrap_err();
        match err {
            Error::ChannelIo(inner) => assert_eq!(inner.root(), &CoreError::Transmission),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
