//! Record, counter, PIN, challenge and file header extractors

use std::collections::BTreeMap;

use bytes::Bytes;
use calypso_apdu_core::StatusWord;

use crate::commands::ReadMode;
use crate::constants::{CARD_CHALLENGE_LENGTH, status, tags};
use crate::cursor::ByteCursor;
use crate::responses::lists::EfType;
use crate::{Error, Result};

/// Records returned by Read Records, keyed by record number
///
/// In multiple record mode the card answers with `number | length | data`
/// entries; decoding stops at the first truncated entry.
pub fn decode_records(data: &[u8], mode: ReadMode, first_record: u8) -> BTreeMap<u8, Bytes> {
    let mut records = BTreeMap::new();
    match mode {
        ReadMode::OneRecord => {
            records.insert(first_record, Bytes::copy_from_slice(data));
        }
        ReadMode::MultipleRecords => {
            let mut cursor = ByteCursor::new(data);
            while let Some(number) = cursor.read_u8() {
                let Some(record) = cursor.take_length_prefixed() else {
                    break;
                };
                records.insert(number, Bytes::copy_from_slice(record));
            }
        }
    }
    records
}

/// New counter value returned by Increase or Decrease
pub fn decode_counter_value(data: &[u8]) -> Result<u32> {
    let [high, mid, low] = ByteCursor::new(data)
        .take_array::<3>()
        .ok_or(Error::MalformedResponse("counter value must be 3 bytes"))?;
    Ok(u32::from_be_bytes([0, high, mid, low]))
}

/// Challenge returned by the card's Get Challenge
pub fn decode_card_challenge(data: &[u8]) -> Result<Bytes> {
    if data.len() != usize::from(CARD_CHALLENGE_LENGTH) {
        return Err(Error::MalformedResponse("card challenge must be 8 bytes"));
    }
    Ok(Bytes::copy_from_slice(data))
}

/// Attempts left to present the PIN, read from the Verify PIN status
pub fn decode_pin_attempts(sw: StatusWord) -> Result<u8> {
    match sw {
        status::SUCCESS => Ok(3),
        status::PIN_TWO_ATTEMPTS_LEFT => Ok(2),
        status::PIN_ONE_ATTEMPT_LEFT => Ok(1),
        status::AUTHENTICATION_METHOD_BLOCKED => Ok(0),
        _ => Err(Error::UnexpectedResponse("status does not carry a PIN attempt counter")),
    }
}

/// Header of a file returned by Select File
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Short file identifier
    pub sfi: u8,
    /// File type, DF or EF
    pub file_type: u8,
    /// Raw EF type byte
    pub ef_type: u8,
    /// Size of one record
    pub record_size: u8,
    /// Number of records
    pub record_count: u8,
    /// Access conditions
    pub access_conditions: [u8; 4],
    /// Key indexes of the access conditions
    pub key_indexes: [u8; 4],
    /// DF status byte
    pub df_status: u8,
}

impl FileHeader {
    /// Decoded EF type, when known
    pub const fn structure(&self) -> Option<EfType> {
        EfType::from_code(self.ef_type)
    }

    /// Whether the DF is invalidated
    pub const fn is_invalidated(&self) -> bool {
        self.df_status & 0x01 != 0
    }
}

/// Walk the proprietary information of a Select File response
pub fn decode_file_header(data: &[u8]) -> Option<FileHeader> {
    let value = ByteCursor::new(data).read_tlv(&[tags::PROPRIETARY_INFORMATION])?;
    let mut cursor = ByteCursor::new(value);
    let [sfi, file_type, ef_type, record_size, record_count] = cursor.take_array::<5>()?;
    Some(FileHeader {
        sfi,
        file_type,
        ef_type,
        record_size,
        record_count,
        access_conditions: cursor.take_array()?,
        key_indexes: cursor.take_array()?,
        df_status: cursor.read_u8()?,
    })
}
