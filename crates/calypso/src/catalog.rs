//! Command catalog and status tables
//!
//! Every command the crate can build has one [`CommandRef`] entry naming it,
//! fixing its instruction byte and pairing it with the [`DecoderKind`] that
//! reads its response. Status tables are built once per decoder kind on first
//! use and shared read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use calypso_apdu_core::{Response, StatusWord};
use derive_more::Display;
use once_cell::sync::Lazy;

use crate::constants::{ins, sam_ins};

/// Catalog entry of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandRef {
    /// Get Data, FCI of the current DF
    GetDataFci,
    /// Get Data, list of EF
    GetDataEfList,
    /// Get Data, list of AID
    GetDataAidList,
    /// Get Data, historical bytes
    GetDataHistoricalBytes,
    /// Open Secure Session, revision 1.0
    OpenSession10,
    /// Open Secure Session, revision 2.4
    OpenSession24,
    /// Open Secure Session, revision 3.1
    OpenSession31,
    /// Open Secure Session, revision 3.2
    OpenSession32,
    /// Close Secure Session
    CloseSession,
    /// Get Challenge
    GetChallenge,
    /// Read Records
    ReadRecords,
    /// Update Record
    UpdateRecord,
    /// Write Record
    WriteRecord,
    /// Append Record
    AppendRecord,
    /// Increase
    Increase,
    /// Decrease
    Decrease,
    /// Select File
    SelectFile,
    /// Select Application
    SelectApplication,
    /// Verify PIN
    VerifyPin,
    /// Change Key
    ChangeKey,
    /// Invalidate
    Invalidate,
    /// Rehabilitate
    Rehabilitate,
    /// Ratification
    Ratification,
    /// SAM Select Diversifier
    SamSelectDiversifier,
    /// SAM Get Challenge
    SamGetChallenge,
    /// SAM Digest Init
    DigestInit,
    /// SAM Digest Update
    DigestUpdate,
    /// SAM Digest Close
    DigestClose,
    /// SAM Digest Authenticate
    DigestAuthenticate,
    /// SAM Give Random
    GiveRandom,
    /// SAM Card Generate Key
    CardGenerateKey,
}

/// Response decoder paired with a command
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    /// FCI template walker
    Fci,
    /// EF list walker
    EfList,
    /// AID list walker
    AidList,
    /// Raw historical bytes
    HistoricalBytes,
    /// Open session challenge and ratification extractor
    OpenSession,
    /// Close session half-signature extractor
    CloseSession,
    /// Card challenge
    Challenge,
    /// Record list
    Records,
    /// Acknowledgement of a record write
    RecordWrite,
    /// New counter value
    Counter,
    /// File header
    FileHeader,
    /// Application selection
    Selection,
    /// PIN attempts remaining
    Pin,
    /// Acknowledgement of a key change
    KeyChange,
    /// Acknowledgement of an invalidate or rehabilitate
    Lifecycle,
    /// Ratification, status ignored
    Ratification,
    /// SAM acknowledgement
    SamAck,
    /// SAM challenge
    SamChallenge,
    /// SAM signature from Digest Close
    SamSignature,
    /// SAM signature check from Digest Authenticate
    SamAuthenticate,
    /// SAM ciphered key from Card Generate Key
    SamCipheredKey,
}

impl CommandRef {
    /// Every catalog entry
    pub const ALL: [Self; 31] = [
        Self::GetDataFci,
        Self::GetDataEfList,
        Self::GetDataAidList,
        Self::GetDataHistoricalBytes,
        Self::OpenSession10,
        Self::OpenSession24,
        Self::OpenSession31,
        Self::OpenSession32,
        Self::CloseSession,
        Self::GetChallenge,
        Self::ReadRecords,
        Self::UpdateRecord,
        Self::WriteRecord,
        Self::AppendRecord,
        Self::Increase,
        Self::Decrease,
        Self::SelectFile,
        Self::SelectApplication,
        Self::VerifyPin,
        Self::ChangeKey,
        Self::Invalidate,
        Self::Rehabilitate,
        Self::Ratification,
        Self::SamSelectDiversifier,
        Self::SamGetChallenge,
        Self::DigestInit,
        Self::DigestUpdate,
        Self::DigestClose,
        Self::DigestAuthenticate,
        Self::GiveRandom,
        Self::CardGenerateKey,
    ];

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetDataFci => "Get Data (FCI)",
            Self::GetDataEfList => "Get Data (EF list)",
            Self::GetDataAidList => "Get Data (AID list)",
            Self::GetDataHistoricalBytes => "Get Data (historical bytes)",
            Self::OpenSession10 => "Open Secure Session V1",
            Self::OpenSession24 => "Open Secure Session V2",
            Self::OpenSession31 => "Open Secure Session V3.1",
            Self::OpenSession32 => "Open Secure Session V3.2",
            Self::CloseSession => "Close Secure Session",
            Self::GetChallenge => "Get Challenge",
            Self::ReadRecords => "Read Records",
            Self::UpdateRecord => "Update Record",
            Self::WriteRecord => "Write Record",
            Self::AppendRecord => "Append Record",
            Self::Increase => "Increase",
            Self::Decrease => "Decrease",
            Self::SelectFile => "Select File",
            Self::SelectApplication => "Select Application",
            Self::VerifyPin => "Verify PIN",
            Self::ChangeKey => "Change Key",
            Self::Invalidate => "Invalidate",
            Self::Rehabilitate => "Rehabilitate",
            Self::Ratification => "Ratification",
            Self::SamSelectDiversifier => "SAM Select Diversifier",
            Self::SamGetChallenge => "SAM Get Challenge",
            Self::DigestInit => "SAM Digest Init",
            Self::DigestUpdate => "SAM Digest Update",
            Self::DigestClose => "SAM Digest Close",
            Self::DigestAuthenticate => "SAM Digest Authenticate",
            Self::GiveRandom => "SAM Give Random",
            Self::CardGenerateKey => "SAM Card Generate Key",
        }
    }

    /// Fixed instruction byte
    pub const fn instruction(self) -> u8 {
        match self {
            Self::GetDataFci
            | Self::GetDataEfList
            | Self::GetDataAidList
            | Self::GetDataHistoricalBytes => ins::GET_DATA,
            Self::OpenSession10
            | Self::OpenSession24
            | Self::OpenSession31
            | Self::OpenSession32 => ins::OPEN_SESSION,
            Self::CloseSession => ins::CLOSE_SESSION,
            Self::GetChallenge => ins::GET_CHALLENGE,
            Self::ReadRecords | Self::Ratification => ins::READ_RECORDS,
            Self::UpdateRecord => ins::UPDATE_RECORD,
            Self::WriteRecord => ins::WRITE_RECORD,
            Self::AppendRecord => ins::APPEND_RECORD,
            Self::Increase => ins::INCREASE,
            Self::Decrease => ins::DECREASE,
            Self::SelectFile | Self::SelectApplication => ins::SELECT_FILE,
            Self::VerifyPin => ins::VERIFY_PIN,
            Self::ChangeKey => ins::CHANGE_KEY,
            Self::Invalidate => ins::INVALIDATE,
            Self::Rehabilitate => ins::REHABILITATE,
            Self::SamSelectDiversifier => sam_ins::SELECT_DIVERSIFIER,
            Self::SamGetChallenge => sam_ins::GET_CHALLENGE,
            Self::DigestInit => sam_ins::DIGEST_INIT,
            Self::DigestUpdate => sam_ins::DIGEST_UPDATE,
            Self::DigestClose => sam_ins::DIGEST_CLOSE,
            Self::DigestAuthenticate => sam_ins::DIGEST_AUTHENTICATE,
            Self::GiveRandom => sam_ins::GIVE_RANDOM,
            Self::CardGenerateKey => sam_ins::CARD_GENERATE_KEY,
        }
    }

    /// Decoder reading the response of this command
    pub const fn decoder(self) -> DecoderKind {
        match self {
            Self::GetDataFci => DecoderKind::Fci,
            Self::GetDataEfList => DecoderKind::EfList,
            Self::GetDataAidList => DecoderKind::AidList,
            Self::GetDataHistoricalBytes => DecoderKind::HistoricalBytes,
            Self::OpenSession10
            | Self::OpenSession24
            | Self::OpenSession31
            | Self::OpenSession32 => DecoderKind::OpenSession,
            Self::CloseSession => DecoderKind::CloseSession,
            Self::GetChallenge => DecoderKind::Challenge,
            Self::ReadRecords => DecoderKind::Records,
            Self::UpdateRecord | Self::WriteRecord | Self::AppendRecord => DecoderKind::RecordWrite,
            Self::Increase | Self::Decrease => DecoderKind::Counter,
            Self::SelectFile => DecoderKind::FileHeader,
            Self::SelectApplication => DecoderKind::Selection,
            Self::VerifyPin => DecoderKind::Pin,
            Self::ChangeKey => DecoderKind::KeyChange,
            Self::Invalidate | Self::Rehabilitate => DecoderKind::Lifecycle,
            Self::Ratification => DecoderKind::Ratification,
            Self::SamSelectDiversifier | Self::DigestInit | Self::DigestUpdate | Self::GiveRandom => {
                DecoderKind::SamAck
            }
            Self::SamGetChallenge => DecoderKind::SamChallenge,
            Self::DigestClose => DecoderKind::SamSignature,
            Self::DigestAuthenticate => DecoderKind::SamAuthenticate,
            Self::CardGenerateKey => DecoderKind::SamCipheredKey,
        }
    }

    /// Status table of the paired decoder
    pub fn status_table(self) -> &'static StatusTable {
        self.decoder().status_table()
    }

    /// Whether the response is successful for this command
    ///
    /// A status word is accepted when the command itself lists it, or when the
    /// status table of the paired decoder marks it successful.
    pub fn accepts(self, response: &Response, extra: &[StatusWord]) -> bool {
        response.is_successful(extra) || self.status_table().is_successful(response.status())
    }
}

impl fmt::Display for CommandRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entry of a status table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    /// Whether the status word means success
    pub successful: bool,
    /// Human readable meaning
    pub message: &'static str,
}

/// Status word lookup table of one decoder kind
#[derive(Debug)]
pub struct StatusTable {
    entries: HashMap<StatusWord, StatusEntry>,
}

impl StatusTable {
    fn build(specific: &[(u16, bool, &'static str)]) -> Self {
        let entries = COMMON_STATUS
            .iter()
            .chain(specific)
            .map(|&(sw, successful, message)| {
                (StatusWord::from_u16(sw), StatusEntry { successful, message })
            })
            .collect();
        Self { entries }
    }

    /// Look up a status word
    pub fn get(&self, status: StatusWord) -> Option<&StatusEntry> {
        self.entries.get(&status)
    }

    /// Whether the table marks the status word successful
    pub fn is_successful(&self, status: StatusWord) -> bool {
        self.get(status).is_some_and(|entry| entry.successful)
    }

    /// Message for a status word, falling back to the generic ISO meaning
    pub fn message(&self, status: StatusWord) -> &'static str {
        self.get(status)
            .map_or_else(|| status.description(), |entry| entry.message)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const COMMON_STATUS: &[(u16, bool, &str)] = &[
    (0x9000, true, "Successful execution."),
    (0x6700, false, "Lc value not supported."),
    (0x6D00, false, "Instruction unknown."),
    (0x6E00, false, "Class not supported."),
];

const FCI_STATUS: &[(u16, bool, &str)] = &[
    (0x6283, true, "Successful execution, FCI request and DF is invalidated."),
    (0x6A88, false, "Data object not found (optional mode not available)."),
    (0x6B00, false, "P1 or P2 value not supported."),
];

const GET_DATA_STATUS: &[(u16, bool, &str)] = &[
    (0x6A88, false, "Data object not found (optional mode not available)."),
    (0x6B00, false, "P1 or P2 value not supported."),
];

const OPEN_SESSION_STATUS: &[(u16, bool, &str)] = &[
    (0x6900, false, "Transaction Counter is 0."),
    (0x6981, false, "Command forbidden (read requested and current EF is a Binary file)."),
    (0x6982, false, "Security conditions not fulfilled (PIN code not presented, AES key forbidding the compatibility mode, encryption required)."),
    (0x6985, false, "Access forbidden (Never access mode, Session already opened)."),
    (0x6986, false, "Command not allowed (read requested and no current EF)."),
    (0x6A81, false, "Wrong key index."),
    (0x6A82, false, "File not found."),
    (0x6A83, false, "Record not found (record index is above NumRec)."),
    (0x6B00, false, "P1 or P2 value not supported (key index incorrect, wrong P2)."),
];

const CLOSE_SESSION_STATUS: &[(u16, bool, &str)] = &[
    (0x6700, false, "Lc value not supported (e.g. Lc=4 with a Revision 3.2 mode for Open Secure Session)."),
    (0x6B00, false, "P1 or P2 value not supported."),
    (0x6988, false, "Incorrect signature."),
    (0x6985, false, "No session was opened."),
];

const CHALLENGE_STATUS: &[(u16, bool, &str)] = &[
    (0x6B00, false, "P1 or P2 value not supported."),
];

const RECORDS_STATUS: &[(u16, bool, &str)] = &[
    (0x6981, false, "Command forbidden on binary files."),
    (0x6982, false, "Security conditions not fulfilled (PIN code not presented, encryption required)."),
    (0x6985, false, "Access forbidden (Never access mode, stored value log file and a stored value operation was done during the current session)."),
    (0x6986, false, "Command not allowed (no current EF)."),
    (0x6A82, false, "File not found."),
    (0x6A83, false, "Record not found (record index is 0, or above NumRec)."),
    (0x6B00, false, "P2 value not supported."),
];

const RECORD_WRITE_STATUS: &[(u16, bool, &str)] = &[
    (0x6400, false, "Too many modifications in session."),
    (0x6981, false, "Command forbidden on binary files."),
    (0x6982, false, "Security conditions not fulfilled (no session, wrong key, encryption required)."),
    (0x6985, false, "Access forbidden (Never access mode, DF is invalidated, etc.)."),
    (0x6986, false, "Command not allowed (no current EF)."),
    (0x6A82, false, "File not found."),
    (0x6A83, false, "Record not found (record index is 0 or above NumRec)."),
    (0x6B00, false, "P2 value not supported."),
];

const COUNTER_STATUS: &[(u16, bool, &str)] = &[
    (0x6103, true, "Successful execution (possible only in ISO7816 T=0)."),
    (0x6400, false, "Too many modifications in session."),
    (0x6981, false, "The current EF is not a Counters or Simulated Counter EF."),
    (0x6982, false, "Security conditions not fulfilled (no session, wrong key, encryption required)."),
    (0x6985, false, "Access forbidden (Never access mode, DF is invalidated, etc.)."),
    (0x6986, false, "Command not allowed (no current EF)."),
    (0x6A80, false, "Overflow error."),
    (0x6A82, false, "File not found."),
    (0x6B00, false, "P1 or P2 value not supported."),
];

const FILE_HEADER_STATUS: &[(u16, bool, &str)] = &[
    (0x6119, true, "Correct execution (ISO7816 T=0)."),
    (0x6A82, false, "File not found."),
    (0x6B00, false, "P1 or P2 value not supported."),
];

const SELECTION_STATUS: &[(u16, bool, &str)] = &[
    (0x6283, true, "Successful execution, DF is invalidated."),
    (0x6999, false, "Application not found."),
    (0x6A82, false, "File not found."),
];

const PIN_STATUS: &[(u16, bool, &str)] = &[
    (0x6900, false, "Transaction Counter is 0."),
    (0x6982, false, "Security conditions not fulfilled (Get Challenge not done: challenge unavailable)."),
    (0x6985, false, "Access forbidden (a session is open or DF is invalidated)."),
    (0x63C1, false, "Incorrect PIN (1 attempt remaining)."),
    (0x63C2, false, "Incorrect PIN (2 attempt remaining)."),
    (0x6983, false, "Presentation rejected (PIN is blocked)."),
    (0x6D00, false, "PIN function not present."),
];

const KEY_CHANGE_STATUS: &[(u16, bool, &str)] = &[
    (0x6900, false, "Key index incorrect."),
    (0x6982, false, "Security conditions not fulfilled (Get Challenge not done: challenge unavailable)."),
    (0x6985, false, "Access forbidden (a session is open or DF is invalidated)."),
    (0x6988, false, "Incorrect cryptogram."),
    (0x6A80, false, "Decrypted message incorrect (key algorithm not supported, incorrect padding, etc.)."),
    (0x6A87, false, "Lc not compatible with P2."),
    (0x6B00, false, "Incorrect P1, P2."),
];

const LIFECYCLE_STATUS: &[(u16, bool, &str)] = &[
    (0x6400, false, "Too many modifications in session."),
    (0x6982, false, "Security conditions not fulfilled (no session, wrong key)."),
    (0x6985, false, "Access forbidden (DF context is invalid)."),
];

const SAM_ACK_STATUS: &[(u16, bool, &str)] = &[
    (0x6900, false, "An event counter cannot be incremented."),
    (0x6985, false, "Preconditions not satisfied."),
    (0x6A00, false, "Incorrect P1 or P2."),
    (0x6A83, false, "Record not found: signing key not found."),
    (0x6B00, false, "Incorrect P1."),
];

const SAM_CHALLENGE_STATUS: &[(u16, bool, &str)] = &[
    (0x6700, false, "Incorrect Le."),
    (0x6B00, false, "Incorrect P1 or P2."),
];

const SAM_SIGNATURE_STATUS: &[(u16, bool, &str)] = &[
    (0x6985, false, "Preconditions not satisfied."),
];

const SAM_AUTHENTICATE_STATUS: &[(u16, bool, &str)] = &[
    (0x6700, false, "Incorrect Lc."),
    (0x6985, false, "Preconditions not satisfied."),
    (0x6988, false, "Incorrect signature."),
];

const SAM_CIPHERED_KEY_STATUS: &[(u16, bool, &str)] = &[
    (0x6700, false, "Incorrect Lc."),
    (0x6900, false, "Key usage counter at 0."),
    (0x6985, false, "Preconditions not satisfied."),
    (0x6A00, false, "Incorrect P1 or P2."),
    (0x6A83, false, "Record not found: ciphering key not found."),
];

macro_rules! status_tables {
    ($($name:ident => $entries:expr),* $(,)?) => {
        $(static $name: Lazy<StatusTable> = Lazy::new(|| StatusTable::build($entries));)*
    };
}

status_tables! {
    FCI_TABLE => FCI_STATUS,
    GET_DATA_TABLE => GET_DATA_STATUS,
    OPEN_SESSION_TABLE => OPEN_SESSION_STATUS,
    CLOSE_SESSION_TABLE => CLOSE_SESSION_STATUS,
    CHALLENGE_TABLE => CHALLENGE_STATUS,
    RECORDS_TABLE => RECORDS_STATUS,
    RECORD_WRITE_TABLE => RECORD_WRITE_STATUS,
    COUNTER_TABLE => COUNTER_STATUS,
    FILE_HEADER_TABLE => FILE_HEADER_STATUS,
    SELECTION_TABLE => SELECTION_STATUS,
    PIN_TABLE => PIN_STATUS,
    KEY_CHANGE_TABLE => KEY_CHANGE_STATUS,
    LIFECYCLE_TABLE => LIFECYCLE_STATUS,
    RATIFICATION_TABLE => &[],
    SAM_ACK_TABLE => SAM_ACK_STATUS,
    SAM_CHALLENGE_TABLE => SAM_CHALLENGE_STATUS,
    SAM_SIGNATURE_TABLE => SAM_SIGNATURE_STATUS,
    SAM_AUTHENTICATE_TABLE => SAM_AUTHENTICATE_STATUS,
    SAM_CIPHERED_KEY_TABLE => SAM_CIPHERED_KEY_STATUS,
}

impl DecoderKind {
    /// Process-wide status table of this decoder
    pub fn status_table(self) -> &'static StatusTable {
        match self {
            Self::Fci => &FCI_TABLE,
            Self::EfList | Self::AidList | Self::HistoricalBytes => &GET_DATA_TABLE,
            Self::OpenSession => &OPEN_SESSION_TABLE,
            Self::CloseSession => &CLOSE_SESSION_TABLE,
            Self::Challenge => &CHALLENGE_TABLE,
            Self::Records => &RECORDS_TABLE,
            Self::RecordWrite => &RECORD_WRITE_TABLE,
            Self::Counter => &COUNTER_TABLE,
            Self::FileHeader => &FILE_HEADER_TABLE,
            Self::Selection => &SELECTION_TABLE,
            Self::Pin => &PIN_TABLE,
            Self::KeyChange => &KEY_CHANGE_TABLE,
            Self::Lifecycle => &LIFECYCLE_TABLE,
            Self::Ratification => &RATIFICATION_TABLE,
            Self::SamAck => &SAM_ACK_TABLE,
            Self::SamChallenge => &SAM_CHALLENGE_TABLE,
            Self::SamSignature => &SAM_SIGNATURE_TABLE,
            Self::SamAuthenticate => &SAM_AUTHENTICATE_TABLE,
            Self::SamCipheredKey => &SAM_CIPHERED_KEY_TABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_entries_are_distinct() {
        let names: HashSet<_> = CommandRef::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), CommandRef::ALL.len());
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(CommandRef::OpenSession32.instruction(), 0x8A);
        assert_eq!(CommandRef::OpenSession32.decoder(), DecoderKind::OpenSession);
        assert_eq!(CommandRef::Ratification.instruction(), 0xB2);
        assert_eq!(CommandRef::Ratification.decoder(), DecoderKind::Ratification);
        assert_eq!(CommandRef::DigestClose.to_string(), "SAM Digest Close");
    }

    #[test]
    fn test_status_tables_are_shared() {
        let a = CommandRef::UpdateRecord.status_table();
        let b = CommandRef::AppendRecord.status_table();
        assert!(std::ptr::eq(a, b));
        assert!(a.is_successful(StatusWord::new(0x90, 0x00)));
        assert!(!a.is_successful(StatusWord::new(0x64, 0x00)));
        assert_eq!(
            a.message(StatusWord::new(0x64, 0x00)),
            "Too many modifications in session."
        );
        // Falls back to the generic meaning
        assert_eq!(a.message(StatusWord::new(0x6A, 0x84)), "Not enough memory space in the file");
    }

    #[test]
    fn test_accepts() {
        let fci = Response::from_bytes(&[0x6F, 0x00, 0x62, 0x83]).unwrap();
        assert!(CommandRef::GetDataFci.accepts(&fci, &[]));
        assert!(!CommandRef::GetDataEfList.accepts(&fci, &[]));

        let pin = Response::from_bytes(&[0x63, 0xC1]).unwrap();
        assert!(!CommandRef::VerifyPin.accepts(&pin, &[]));
        assert!(CommandRef::VerifyPin.accepts(&pin, &[StatusWord::new(0x63, 0xC1)]));
    }
}
