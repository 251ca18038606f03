//! Card command builders
//!
//! [`PoCommand`] is the closed set of commands the terminal sends to a card.
//! Each variant carries only its own parameters and is turned into bytes by
//! [`PoCommand::build`] for the revision of the card at hand.

pub mod file;
pub mod records;
pub mod security;
pub mod session;

use bytes::Bytes;
use calypso_apdu_core::Command;

pub use file::{GetDataTarget, SelectFileTarget};
pub use records::ReadMode;
pub use security::PinPresentation;
pub use session::OpenSessionParams;

use crate::Result;
use crate::catalog::CommandRef;
use crate::revision::{BufferMode, Revision};

/// Bytes a modifying command costs in the session buffer on top of its data
pub const SESSION_BUFFER_COMMAND_OVERHEAD: usize = 6;

/// Command addressed to a Calypso card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoCommand {
    /// Open Secure Session
    OpenSession(OpenSessionParams),
    /// Close Secure Session with the terminal half-signature
    CloseSession {
        /// Terminal half-signature, 4 or 8 bytes
        signature: Bytes,
        /// Whether ratification is requested
        ratification: bool,
    },
    /// Close Secure Session without signature, cancelling the session
    AbortSession,
    /// Ratification following Close Secure Session
    Ratification,
    /// Get Challenge
    GetChallenge,
    /// Get Data
    GetData(GetDataTarget),
    /// Read Records
    ReadRecords {
        /// SFI, 0 for the current EF
        sfi: u8,
        /// First record to read
        record: u8,
        /// One or several records
        mode: ReadMode,
        /// Expected length, 0 for all
        expected_length: u8,
    },
    /// Update Record
    UpdateRecord {
        /// SFI, 0 for the current EF
        sfi: u8,
        /// Record to replace
        record: u8,
        /// New record content
        data: Bytes,
    },
    /// Write Record
    WriteRecord {
        /// SFI, 0 for the current EF
        sfi: u8,
        /// Record to write into
        record: u8,
        /// Data OR-ed into the record
        data: Bytes,
    },
    /// Append Record
    AppendRecord {
        /// SFI, 0 for the current EF
        sfi: u8,
        /// New record content
        data: Bytes,
    },
    /// Increase a counter
    Increase {
        /// SFI of the counters file
        sfi: u8,
        /// Counter number, starting at 1
        counter: u8,
        /// Amount to add, at most three bytes
        value: u32,
    },
    /// Decrease a counter
    Decrease {
        /// SFI of the counters file
        sfi: u8,
        /// Counter number, starting at 1
        counter: u8,
        /// Amount to subtract, at most three bytes
        value: u32,
    },
    /// Select File
    SelectFile(SelectFileTarget),
    /// Select Application by AID
    SelectApplication(Bytes),
    /// Verify PIN
    VerifyPin(PinPresentation),
    /// Change Key
    ChangeKey {
        /// Key index, 1 to 3
        key_index: u8,
        /// Cryptogram computed by the SAM
        cryptogram: Bytes,
    },
    /// Invalidate the current DF
    Invalidate,
    /// Rehabilitate the current DF
    Rehabilitate,
}

impl PoCommand {
    /// Catalog entry of this command for a card revision
    pub const fn command_ref(&self, revision: Revision) -> CommandRef {
        match self {
            Self::OpenSession(_) => session::open_session_ref(revision),
            Self::CloseSession { .. } | Self::AbortSession => CommandRef::CloseSession,
            Self::Ratification => CommandRef::Ratification,
            Self::GetChallenge => CommandRef::GetChallenge,
            Self::GetData(target) => target.command_ref(),
            Self::ReadRecords { .. } => CommandRef::ReadRecords,
            Self::UpdateRecord { .. } => CommandRef::UpdateRecord,
            Self::WriteRecord { .. } => CommandRef::WriteRecord,
            Self::AppendRecord { .. } => CommandRef::AppendRecord,
            Self::Increase { .. } => CommandRef::Increase,
            Self::Decrease { .. } => CommandRef::Decrease,
            Self::SelectFile(_) => CommandRef::SelectFile,
            Self::SelectApplication(_) => CommandRef::SelectApplication,
            Self::VerifyPin(_) => CommandRef::VerifyPin,
            Self::ChangeKey { .. } => CommandRef::ChangeKey,
            Self::Invalidate => CommandRef::Invalidate,
            Self::Rehabilitate => CommandRef::Rehabilitate,
        }
    }

    /// Build the command bytes for a card revision
    ///
    /// Argument checks run here, before any byte is produced.
    pub fn build(&self, revision: Revision) -> Result<Command> {
        match self {
            Self::OpenSession(params) => session::open_session(revision, params),
            Self::CloseSession {
                signature,
                ratification,
            } => session::close_session(revision, signature, *ratification),
            Self::AbortSession => Ok(session::abort_session(revision)),
            Self::Ratification => Ok(session::ratification(revision)),
            Self::GetChallenge => Ok(security::get_challenge(revision)),
            Self::GetData(target) => Ok(file::get_data(revision, *target)),
            Self::ReadRecords {
                sfi,
                record,
                mode,
                expected_length,
            } => records::read_records(revision, *sfi, *record, *mode, *expected_length),
            Self::UpdateRecord { sfi, record, data } => {
                records::update_record(revision, *sfi, *record, data.clone())
            }
            Self::WriteRecord { sfi, record, data } => {
                records::write_record(revision, *sfi, *record, data.clone())
            }
            Self::AppendRecord { sfi, data } => records::append_record(revision, *sfi, data.clone()),
            Self::Increase { sfi, counter, value } => {
                records::increase(revision, *sfi, *counter, *value)
            }
            Self::Decrease { sfi, counter, value } => {
                records::decrease(revision, *sfi, *counter, *value)
            }
            Self::SelectFile(target) => Ok(file::select_file(revision, *target)),
            Self::SelectApplication(aid) => file::select_application(aid),
            Self::VerifyPin(presentation) => security::verify_pin(revision, presentation),
            Self::ChangeKey {
                key_index,
                cryptogram,
            } => security::change_key(revision, *key_index, cryptogram.clone()),
            Self::Invalidate => Ok(security::invalidate(revision)),
            Self::Rehabilitate => Ok(security::rehabilitate(revision)),
        }
    }

    /// Whether the command modifies card data and so uses the session buffer
    pub const fn is_modifying(&self) -> bool {
        matches!(
            self,
            Self::UpdateRecord { .. }
                | Self::WriteRecord { .. }
                | Self::AppendRecord { .. }
                | Self::Increase { .. }
                | Self::Decrease { .. }
                | Self::Invalidate
                | Self::Rehabilitate
        )
    }

    /// Session buffer cost of the built command
    ///
    /// Non-modifying commands, including the abort variant, cost nothing.
    pub fn session_buffer_cost(&self, command: &Command, mode: BufferMode) -> usize {
        if !self.is_modifying() {
            return 0;
        }
        match mode {
            BufferMode::Bytes => SESSION_BUFFER_COMMAND_OVERHEAD + command.lc(),
            BufferMode::Operations => 1,
        }
    }
}
