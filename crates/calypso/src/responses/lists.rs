//! Get Data list walkers: EF list, AID list and historical bytes

use bytes::Bytes;
use derive_more::Display;
use iso7816_tlv::simple::Tlv;
use tracing::debug;

use crate::constants::{sfi, tags};
use crate::cursor::ByteCursor;

/// Length of an EF descriptor, tag and length included
const EF_DESCRIPTOR_LEN: usize = 8;

/// Role of a file, derived from its SFI
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// Environment and holder
    #[display("Environment")]
    Environment,
    /// Event log
    #[display("Event log")]
    EventLog,
    /// Contracts
    #[display("Contracts")]
    Contracts,
    /// Counters
    #[display("Counters")]
    Counters,
    /// Special events
    #[display("Special events")]
    SpecialEvents,
    /// Contract list
    #[display("Contract list")]
    ContractList,
    /// Anything else
    #[display("Unknown")]
    Unknown,
}

impl FileCategory {
    /// Category of the standard ticketing file with this SFI
    pub const fn from_sfi(value: u8) -> Self {
        match value {
            sfi::ENVIRONMENT => Self::Environment,
            sfi::EVENT_LOG => Self::EventLog,
            sfi::CONTRACTS => Self::Contracts,
            sfi::COUNTERS => Self::Counters,
            sfi::SPECIAL_EVENTS => Self::SpecialEvents,
            sfi::CONTRACT_LIST => Self::ContractList,
            _ => Self::Unknown,
        }
    }
}

/// Structure of an elementary file
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EfType {
    /// Binary
    #[display("Binary")]
    Binary,
    /// Linear records
    #[display("Linear")]
    Linear,
    /// Cyclic records
    #[display("Cyclic")]
    Cyclic,
    /// Counters simulated by records
    #[display("Simulated counters")]
    SimulatedCounters,
    /// Counters
    #[display("Counters")]
    Counters,
}

impl EfType {
    /// Decode the EF type byte
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::Binary),
            0x02 => Some(Self::Linear),
            0x04 => Some(Self::Cyclic),
            0x08 => Some(Self::SimulatedCounters),
            0x09 => Some(Self::Counters),
            _ => None,
        }
    }
}

/// Entry of the EF list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EfDescriptor {
    /// Long file identifier
    pub lid: u16,
    /// Short file identifier
    pub sfi: u8,
    /// Raw EF type byte
    pub ef_type: u8,
    /// Size of one record
    pub record_size: u8,
    /// Number of records
    pub record_count: u8,
}

impl EfDescriptor {
    fn from_bytes(record: &[u8]) -> Option<Self> {
        let mut cursor = ByteCursor::new(record);
        let value = cursor.read_tlv(&[tags::EF_DESCRIPTOR])?;
        let [lid_high, lid_low, sfi, ef_type, record_size, record_count] =
            ByteCursor::new(value).take_array::<6>()?;
        Some(Self {
            lid: u16::from_be_bytes([lid_high, lid_low]),
            sfi,
            ef_type,
            record_size,
            record_count,
        })
    }

    /// Category derived from the SFI
    pub const fn category(&self) -> FileCategory {
        FileCategory::from_sfi(self.sfi)
    }

    /// Decoded EF type, when known
    pub const fn structure(&self) -> Option<EfType> {
        EfType::from_code(self.ef_type)
    }
}

/// Walk the EF list returned by Get Data
///
/// The list value holds fixed size descriptors. Descriptors whose tag does
/// not match are skipped; `None` means the list itself was not found.
pub fn decode_ef_list(data: &[u8]) -> Option<Vec<EfDescriptor>> {
    let mut list = ByteCursor::new(data).enter_tlv(&[tags::EF_LIST])?;
    let count = list.remaining() / EF_DESCRIPTOR_LEN;

    let mut descriptors = Vec::with_capacity(count);
    for index in 0..count {
        let record = list.take(EF_DESCRIPTOR_LEN)?;
        match EfDescriptor::from_bytes(record) {
            Some(descriptor) => descriptors.push(descriptor),
            None => debug!(index, record = %hex::encode_upper(record), "Skipping EF descriptor"),
        }
    }
    Some(descriptors)
}

/// Walk the AID list returned by Get Data
pub fn decode_aid_list(data: &[u8]) -> Option<Vec<Bytes>> {
    let value = ByteCursor::new(data).read_tlv(&[tags::AID_LIST])?;
    Some(
        Tlv::parse_all(value)
            .into_iter()
            .filter_map(|tlv| {
                let tag: u8 = tlv.tag().into();
                (tag == tags::AID).then(|| Bytes::copy_from_slice(tlv.value()))
            })
            .collect(),
    )
}

/// Historical bytes returned by Get Data
///
/// Some cards answer with the bare bytes, others wrap them in their tag.
pub fn decode_historical_bytes(data: &[u8]) -> Bytes {
    let value = ByteCursor::new(data)
        .read_tlv(&tags::HISTORICAL_BYTES)
        .unwrap_or(data);
    Bytes::copy_from_slice(value)
}
