//! Record and counter commands

use bytes::Bytes;
use calypso_apdu_core::Command;

use crate::constants::ins;
use crate::revision::Revision;
use crate::{Error, Result};

/// How many records Read Records returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Only the requested record
    OneRecord,
    /// The requested record and the following ones, as far as Le allows
    MultipleRecords,
}

/// Largest value an Increase or Decrease can carry
pub const MAX_COUNTER_VALUE: u32 = 0x00FF_FFFF;

fn check_sfi(sfi: u8) -> Result<u8> {
    if sfi > 0x1E {
        return Err(Error::InconsistentArgument("SFI out of range"));
    }
    Ok(sfi * 8)
}

fn check_record(record: u8) -> Result<u8> {
    if record == 0 {
        return Err(Error::InconsistentArgument("record number 0 is not allowed"));
    }
    Ok(record)
}

/// Build Read Records
///
/// SFI 0 reads from the current EF. An expected length of 0 lets the card
/// return everything it has.
pub fn read_records(
    revision: Revision,
    sfi: u8,
    record: u8,
    mode: ReadMode,
    expected_length: u8,
) -> Result<Command> {
    let p2 = check_sfi(sfi)?
        + match mode {
            ReadMode::OneRecord => 0x04,
            ReadMode::MultipleRecords => 0x05,
        };
    Ok(
        Command::new(revision.class(), ins::READ_RECORDS, check_record(record)?, p2)
            .with_le(expected_length),
    )
}

fn record_write(
    revision: Revision,
    instruction: u8,
    sfi: u8,
    record: u8,
    data: Bytes,
) -> Result<Command> {
    if data.is_empty() || data.len() > 0xFA {
        return Err(Error::InconsistentArgument("record data must be 1 to 250 bytes"));
    }
    let p2 = check_sfi(sfi)? + 0x04;
    Ok(Command::new(revision.class(), instruction, check_record(record)?, p2).with_data(data))
}

/// Build Update Record, replacing the content of a record
pub fn update_record(revision: Revision, sfi: u8, record: u8, data: Bytes) -> Result<Command> {
    record_write(revision, ins::UPDATE_RECORD, sfi, record, data)
}

/// Build Write Record, OR-ing data into a record
pub fn write_record(revision: Revision, sfi: u8, record: u8, data: Bytes) -> Result<Command> {
    record_write(revision, ins::WRITE_RECORD, sfi, record, data)
}

/// Build Append Record on a cyclic file
pub fn append_record(revision: Revision, sfi: u8, data: Bytes) -> Result<Command> {
    if data.is_empty() || data.len() > 0xFA {
        return Err(Error::InconsistentArgument("record data must be 1 to 250 bytes"));
    }
    Ok(Command::new(revision.class(), ins::APPEND_RECORD, 0x00, check_sfi(sfi)?).with_data(data))
}

fn counter(revision: Revision, instruction: u8, sfi: u8, counter: u8, value: u32) -> Result<Command> {
    if value > MAX_COUNTER_VALUE {
        return Err(Error::InconsistentArgument("counter value exceeds three bytes"));
    }
    let [_, high, mid, low] = value.to_be_bytes();
    Ok(
        Command::new(revision.class(), instruction, check_record(counter)?, check_sfi(sfi)?)
            .with_data(vec![high, mid, low])
            .with_le(0x00)
            .with_case4(true),
    )
}

/// Build Increase on a counter
pub fn increase(revision: Revision, sfi: u8, counter_number: u8, value: u32) -> Result<Command> {
    counter(revision, ins::INCREASE, sfi, counter_number, value)
}

/// Build Decrease on a counter
pub fn decrease(revision: Revision, sfi: u8, counter_number: u8, value: u32) -> Result<Command> {
    counter(revision, ins::DECREASE, sfi, counter_number, value)
}
