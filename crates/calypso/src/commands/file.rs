//! Selection and Get Data commands

use bytes::Bytes;
use calypso_apdu_core::Command;

use crate::catalog::CommandRef;
use crate::constants::{cla, get_data, ins, status};
use crate::revision::Revision;
use crate::{Error, Result};

/// Target of Select File
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectFileTarget {
    /// File by its two byte LID
    Lid(u16),
    /// First EF of the current DF
    FirstEf,
    /// EF following the current one
    NextEf,
    /// Current DF
    CurrentDf,
}

/// Data object read by Get Data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetDataTarget {
    /// FCI of the current DF
    Fci,
    /// List of EF of the current DF
    EfList,
    /// List of AID
    AidList,
    /// Historical bytes
    HistoricalBytes,
}

impl GetDataTarget {
    /// Catalog entry of the command reading this object
    pub const fn command_ref(self) -> CommandRef {
        match self {
            Self::Fci => CommandRef::GetDataFci,
            Self::EfList => CommandRef::GetDataEfList,
            Self::AidList => CommandRef::GetDataAidList,
            Self::HistoricalBytes => CommandRef::GetDataHistoricalBytes,
        }
    }

    const fn p1p2(self) -> [u8; 2] {
        match self {
            Self::Fci => get_data::FCI,
            Self::EfList => get_data::EF_LIST,
            Self::AidList => get_data::AID_LIST,
            Self::HistoricalBytes => get_data::HISTORICAL_BYTES,
        }
    }
}

/// Build Select File
pub fn select_file(revision: Revision, target: SelectFileTarget) -> Command {
    let (p1, p2, data) = match target {
        SelectFileTarget::Lid(lid) => {
            let p1 = if revision.is_legacy() { 0x08 } else { 0x09 };
            (p1, 0x00, lid.to_be_bytes())
        }
        SelectFileTarget::FirstEf => (0x02, 0x00, [0x00, 0x00]),
        SelectFileTarget::NextEf => (0x02, 0x02, [0x00, 0x00]),
        SelectFileTarget::CurrentDf => (0x09, 0x00, [0x00, 0x00]),
    };
    Command::new(revision.class(), ins::SELECT_FILE, p1, p2)
        .with_data(data.to_vec())
        .with_le(0x00)
        .with_case4(true)
}

/// Build Select Application by AID
///
/// The card revision is not known before selection, so the ISO class is used.
pub fn select_application(aid: &[u8]) -> Result<Command> {
    if !(5..=16).contains(&aid.len()) {
        return Err(Error::InconsistentArgument("AID must be 5 to 16 bytes"));
    }
    Ok(Command::new(cla::ISO, ins::SELECT_FILE, 0x04, 0x00)
        .with_data(Bytes::copy_from_slice(aid))
        .with_le(0x00)
        .with_case4(true))
}

/// Build Get Data
pub fn get_data(revision: Revision, target: GetDataTarget) -> Command {
    let [p1, p2] = target.p1p2();
    let command = Command::new(revision.class(), ins::GET_DATA, p1, p2).with_le(0x00);
    match target {
        GetDataTarget::Fci => command.with_successful_status(status::DF_INVALIDATED),
        _ => command,
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_select_file() {
        let cmd = select_file(Revision::Rev3_1, SelectFileTarget::Lid(0x2010));
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00 A4 09 00 02 20 10 00"));

        let cmd = select_file(Revision::Rev2_4, SelectFileTarget::Lid(0x2010));
        assert_eq!(cmd.to_bytes().as_ref(), hex!("94 A4 08 00 02 20 10 00"));

        let cmd = select_file(Revision::Rev3_2, SelectFileTarget::NextEf);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00 A4 02 02 02 00 00 00"));
    }

    #[test]
    fn test_select_application() {
        let aid = hex!("31 4D 54 52 2E 49 43 41");
        let cmd = select_application(&aid).unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00 A4 04 00 08 31 4D 54 52 2E 49 43 41 00"));
        assert!(select_application(&aid[..4]).is_err());
    }

    #[test]
    fn test_get_data() {
        let cmd = get_data(Revision::Rev3_1, GetDataTarget::Fci);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00 CA 00 6F 00"));
        assert_eq!(cmd.successful_status(), &[status::DF_INVALIDATED]);

        let cmd = get_data(Revision::Rev3_1, GetDataTarget::EfList);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00 CA 00 C0 00"));
        assert!(cmd.successful_status().is_empty());

        let cmd = get_data(Revision::Rev2_4, GetDataTarget::HistoricalBytes);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("94 CA 5F 52 00"));
    }
}
