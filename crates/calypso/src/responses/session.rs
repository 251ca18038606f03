//! Open and Close Secure Session response decoders
//!
//! Revision 3 cards answer Open Secure Session with
//!
//! ```text
//! counter(3) random(1) ratification(1) KIF(1) KVC(1) length(1) record data
//! ```
//!
//! while revision 1 and 2 cards answer with
//!
//! ```text
//! KVC(1) counter(3) random(1) [KIF(1) ...] [record data from offset 7]
//! ```

use bytes::Bytes;

use crate::constants::DEFAULT_KIF_SUBSTITUTE;
use crate::cursor::ByteCursor;
use crate::revision::Revision;
use crate::{Error, Result};

/// KIF value meaning the card did not report one
const UNREPORTED_KIF: u8 = 0xFF;

/// Data returned by Open Secure Session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSessionData {
    /// Raw transaction counter bytes
    pub transaction_counter: [u8; 3],
    /// Card random byte
    pub random: u8,
    /// Whether the previous session was ratified
    pub previous_session_ratified: bool,
    /// Session key identifier, absent when the card did not send one
    pub kif: Option<u8>,
    /// Session key version
    pub kvc: u8,
    /// Record read while opening
    pub record_data: Bytes,
    /// Whole response data, fed to Digest Init
    pub raw: Bytes,
}

impl OpenSessionData {
    /// Transaction counter as the sum of its three bytes
    pub fn transaction_counter_value(&self) -> u32 {
        self.transaction_counter.iter().map(|&b| u32::from(b)).sum()
    }

    /// Card challenge: transaction counter followed by the random byte
    pub fn card_challenge(&self) -> [u8; 4] {
        let [a, b, c] = self.transaction_counter;
        [a, b, c, self.random]
    }
}

const fn substitute_kif(kif: u8) -> u8 {
    if kif == UNREPORTED_KIF {
        DEFAULT_KIF_SUBSTITUTE
    } else {
        kif
    }
}

/// Decode the Open Secure Session response of a card revision
pub fn decode_open_session(data: &[u8], revision: Revision) -> Result<OpenSessionData> {
    if revision.is_legacy() {
        decode_legacy(data)
    } else {
        decode_rev3(data)
    }
}

fn decode_rev3(data: &[u8]) -> Result<OpenSessionData> {
    let mut cursor = ByteCursor::new(data);
    let [c0, c1, c2, random, _, kif, kvc] = cursor
        .take_array::<7>()
        .ok_or(Error::MalformedResponse("open session response shorter than 7 bytes"))?;

    // A length that runs past the data leaves the record empty
    let record_data = cursor.take_length_prefixed().unwrap_or_default();

    Ok(OpenSessionData {
        transaction_counter: [c0, c1, c2],
        random,
        previous_session_ratified: kif != 0x01,
        kif: Some(substitute_kif(kif)),
        kvc,
        record_data: Bytes::copy_from_slice(record_data),
        raw: Bytes::copy_from_slice(data),
    })
}

fn decode_legacy(data: &[u8]) -> Result<OpenSessionData> {
    let mut cursor = ByteCursor::new(data);
    let [kvc, c0, c1, c2, random] = cursor
        .take_array::<5>()
        .ok_or(Error::MalformedResponse("open session response shorter than 5 bytes"))?;

    Ok(OpenSessionData {
        transaction_counter: [c0, c1, c2],
        random,
        previous_session_ratified: data.len() < 6,
        kif: cursor.read_u8().map(substitute_kif),
        kvc,
        record_data: Bytes::copy_from_slice(data.get(7..).unwrap_or_default()),
        raw: Bytes::copy_from_slice(data),
    })
}

/// Data returned by Close Secure Session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseSessionData {
    /// Data preceding the signature, such as postponed counter data
    pub postponed_data: Bytes,
    /// Card half-signature
    pub signature: Option<Bytes>,
}

/// Decode the Close Secure Session response
///
/// Eight bytes carry postponed data then the half-signature, four bytes are
/// the half-signature alone. Any other length carries no signature.
pub fn decode_close_session(data: &[u8]) -> CloseSessionData {
    match data.len() {
        8 => CloseSessionData {
            postponed_data: Bytes::copy_from_slice(&data[..4]),
            signature: Some(Bytes::copy_from_slice(&data[4..])),
        },
        4 => CloseSessionData {
            postponed_data: Bytes::new(),
            signature: Some(Bytes::copy_from_slice(data)),
        },
        _ => CloseSessionData {
            postponed_data: Bytes::copy_from_slice(data),
            signature: None,
        },
    }
}
