//! Reader side of the byte exchange
//!
//! A transport moves raw bytes to a card or SAM and back. It knows nothing of
//! APDU structure, Calypso commands or sessions.

use std::fmt;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::Error;

/// Reader driver able to exchange raw APDUs with one card
pub trait CardTransport: Send + fmt::Debug {
    /// Exchange raw bytes, logging both directions at trace level
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error> {
        trace!(command = %hex::encode_upper(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(reply) => trace!(reply = %hex::encode_upper(reply), "Received raw reply"),
            Err(err) => debug!(%err, "Transport failure"),
        }
        result
    }

    /// Driver specific exchange, called by [`transmit_raw`](Self::transmit_raw)
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error>;

    /// Answer To Reset of the card currently powered, empty when unknown
    fn atr(&self) -> Bytes {
        Bytes::new()
    }

    /// Whether a card is reachable
    fn is_connected(&self) -> bool;

    /// Power cycle the card or reopen the reader
    fn reset(&mut self) -> Result<(), Error>;
}

impl<T: CardTransport + ?Sized> CardTransport for Box<T> {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error> {
        (**self).transmit_raw(command)
    }

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error> {
        (**self).do_transmit_raw(command)
    }

    fn atr(&self) -> Bytes {
        (**self).atr()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn reset(&mut self) -> Result<(), Error> {
        (**self).reset()
    }
}

#[cfg(test)]
pub(crate) use mock::MockTransport;
