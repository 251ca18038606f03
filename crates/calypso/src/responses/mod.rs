//! Response decoders
//!
//! Decoders never panic on short or malformed input. Structural walkers
//! such as the FCI return whatever they could read; fixed layout
//! extractors return [`Error::MalformedResponse`](crate::Error::MalformedResponse).

pub mod fci;
pub mod lists;
pub mod records;
pub mod sam;
pub mod session;

use calypso_apdu_core::{Command, Response};
use tracing::{info, warn};

pub use fci::{Fci, StartupInfo, decode_fci};
pub use lists::{EfDescriptor, EfType, FileCategory, decode_aid_list, decode_ef_list, decode_historical_bytes};
pub use records::{
    FileHeader, decode_card_challenge, decode_counter_value, decode_file_header,
    decode_pin_attempts, decode_records,
};
pub use session::{CloseSessionData, OpenSessionData, decode_close_session, decode_open_session};

use crate::catalog::CommandRef;
use crate::{Error, Result};

/// Check a response against the command and its status table
///
/// Status words the command lists itself are accepted on top of the ones
/// the table marks successful.
pub fn check_status(command_ref: CommandRef, command: &Command, response: &Response) -> Result<()> {
    let status = response.status();
    if command_ref.accepts(response, command.successful_status()) {
        return Ok(());
    }

    let message = command_ref.status_table().message(status);
    if status.is_warning() {
        info!(command = %command_ref, %status, message, "Command completed with a warning status");
    } else {
        warn!(command = %command_ref, %status, message, "Command failed");
    }
    Err(Error::UnsuccessfulStatus {
        command: command_ref.name(),
        status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use calypso_apdu_core::StatusWord;

    use super::*;
    use crate::commands::{GetDataTarget, PoCommand};
    use crate::revision::Revision;

    #[test]
    fn test_check_status_uses_table_message() {
        let command = PoCommand::UpdateRecord {
            sfi: 0x08,
            record: 1,
            data: bytes::Bytes::from_static(&[0x01]),
        };
        let apdu = command.build(Revision::Rev3_1).unwrap();
        let response = Response::error(StatusWord::new(0x64, 0x00));

        let err = check_status(CommandRef::UpdateRecord, &apdu, &response).unwrap_err();
        assert_eq!(
            err,
            Error::UnsuccessfulStatus {
                command: "Update Record",
                status: StatusWord::new(0x64, 0x00),
                message: "Too many modifications in session.",
            }
        );
        assert_eq!(
            err.to_string(),
            "Update Record failed with status 6400: Too many modifications in session."
        );

        assert!(check_status(CommandRef::UpdateRecord, &apdu, &Response::success(vec![])).is_ok());
    }

    #[test]
    fn test_check_status_accepts_command_specific_status() {
        let apdu = PoCommand::GetData(GetDataTarget::Fci)
            .build(Revision::Rev3_1)
            .unwrap();
        let invalidated = Response::error(StatusWord::new(0x62, 0x83));
        assert!(check_status(CommandRef::GetDataFci, &apdu, &invalidated).is_ok());

        let apdu = PoCommand::GetData(GetDataTarget::EfList)
            .build(Revision::Rev3_1)
            .unwrap();
        assert!(check_status(CommandRef::GetDataEfList, &apdu, &invalidated).is_err());
    }
}
