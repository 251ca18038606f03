//! APDU response definitions
//!
//! This module provides the response value type according to ISO/IEC 7816-4:
//! optional data followed by a two byte status word.

pub mod status;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::Error;
use status::StatusWord;

/// Basic APDU response structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response data, without the status word
    payload: Bytes,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// Create a success response
    pub fn success(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, status::common::SUCCESS)
    }

    /// Create an error response from a status word
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self::new(Bytes::new(), status)
    }

    /// Parse response from raw bytes (including status word)
    ///
    /// Fails with [`Error::MalformedResponse`] when fewer than two bytes are given.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let [payload @ .., sw1, sw2] = data else {
            return Err(Error::MalformedResponse(data.len()));
        };
        let status = StatusWord::new(*sw1, *sw2);
        trace!(%status, payload_len = payload.len(), "Parsed APDU response");

        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            status,
        })
    }

    /// Data preceding the status word
    pub fn data(&self) -> &[u8] {
        &self.payload
    }

    /// Data preceding the status word, as shared bytes
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Get the status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Get the status word as a big-endian u16
    pub const fn status_word(&self) -> u16 {
        self.status.to_u16()
    }

    /// Check if the response indicates success (90 00 only)
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check success against 90 00 and an additional set of accepted status words
    ///
    /// Evaluated from the status word on every call.
    pub fn is_successful(&self, extra: &[StatusWord]) -> bool {
        self.status.is_success() || extra.contains(&self.status)
    }

    /// Serialize back to raw bytes (data followed by SW1 SW2)
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.payload.len() + 2);
        buf.put_slice(&self.payload);
        buf.put_u8(self.status.sw1);
        buf.put_u8(self.status.sw2);
        buf.freeze()
    }
}

impl TryFrom<&[u8]> for Response {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self, Error> {
        Self::from_bytes(data)
    }
}

impl TryFrom<Bytes> for Response {
    type Error = Error;

    fn try_from(data: Bytes) -> Result<Self, Error> {
        Self::from_bytes(&data)
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        response.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_creation() {
        let resp = Response::new(vec![0x01, 0x02, 0x03], (0x90, 0x00));
        assert_eq!(resp.data(), &[0x01, 0x02, 0x03]);
        assert_eq!(resp.status(), StatusWord::new(0x90, 0x00));
        assert!(resp.is_success());
    }

    #[test]
    fn test_response_from_bytes() {
        let resp = Response::from_bytes(&[0x01, 0x02, 0x03, 0x90, 0x00]).unwrap();
        assert_eq!(resp.data(), &[0x01, 0x02, 0x03]);
        assert_eq!(resp.status_word(), 0x9000);

        let resp = Response::from_bytes(&[0x6A, 0x82]).unwrap();
        assert!(resp.data().is_empty());
        assert!(!resp.is_success());

        assert!(matches!(
            Response::from_bytes(&[0x90]),
            Err(Error::MalformedResponse(1))
        ));
        assert!(matches!(
            Response::from_bytes(&[]),
            Err(Error::MalformedResponse(0))
        ));
    }

    #[test]
    fn test_is_successful_boundaries() {
        let extra = [StatusWord::new(0x62, 0x00)];
        for (raw, plain, tolerant) in [
            ([0x90, 0x00], true, true),
            ([0x00, 0x00], false, false),
            ([0x6A, 0x82], false, false),
            ([0x62, 0x00], false, true),
        ] {
            let resp = Response::from_bytes(&raw).unwrap();
            assert_eq!(resp.is_successful(&[]), plain, "{raw:02X?}");
            assert_eq!(resp.is_successful(&extra), tolerant, "{raw:02X?}");
        }

        // Same answer on a copy
        let resp = Response::from_bytes(&[0x62, 0x00]).unwrap();
        let copy = resp.clone();
        assert!(copy.is_successful(&extra));
        assert!(!copy.is_successful(&[]));
    }

    #[test]
    fn test_response_to_bytes() {
        let raw = [0xAA, 0xBB, 0x90, 0x00];
        let resp = Response::from_bytes(&raw).unwrap();
        assert_eq!(resp.to_bytes().as_ref(), &raw);
        assert_eq!(Bytes::from(Response::error(0x6985u16)).as_ref(), &[0x69, 0x85]);
    }
}
