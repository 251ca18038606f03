//! Secure session commands: Open, Close, abort and Ratification

use bytes::{BufMut, Bytes, BytesMut};
use calypso_apdu_core::Command;

use crate::catalog::CommandRef;
use crate::constants::ins;
use crate::revision::Revision;
use crate::{Error, Result};

/// Parameters of an Open Secure Session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSessionParams {
    /// Index of the session key (1 to 3 for issuer, load and debit)
    pub key_index: u8,
    /// SFI of the file whose record is read while opening, 0 for none
    pub sfi: u8,
    /// Record read while opening, 0 for none
    pub record: u8,
    /// Challenge obtained from the SAM
    pub sam_challenge: Bytes,
}

/// Catalog entry of the Open Session variant used by a revision
pub const fn open_session_ref(revision: Revision) -> CommandRef {
    match revision {
        Revision::Rev1_0 => CommandRef::OpenSession10,
        Revision::Rev2_4 => CommandRef::OpenSession24,
        Revision::Rev3_1 | Revision::Rev3_1Clap => CommandRef::OpenSession31,
        Revision::Rev3_2 => CommandRef::OpenSession32,
    }
}

/// Build Open Secure Session for a raw revision code
pub fn open_session_for_code(code: u8, params: &OpenSessionParams) -> Result<Command> {
    open_session(Revision::try_from(code)?, params)
}

/// Build Open Secure Session for a card revision
pub fn open_session(revision: Revision, params: &OpenSessionParams) -> Result<Command> {
    if params.key_index > 0x07 {
        return Err(Error::InconsistentArgument("key index does not fit in three bits"));
    }
    if params.sfi > 0x1F {
        return Err(Error::InconsistentArgument("SFI out of range"));
    }
    if !matches!(params.sam_challenge.len(), 4 | 8) {
        return Err(Error::InconsistentArgument("SAM challenge must be 4 or 8 bytes"));
    }

    let record_bits = params
        .record
        .checked_mul(8)
        .ok_or(Error::InconsistentArgument("record number out of range"))?;
    let sfi_bits = params.sfi * 8;

    let (p1, p2, data) = match revision {
        Revision::Rev1_0 | Revision::Rev2_4 => {
            if params.key_index == 0 {
                return Err(Error::InconsistentArgument("key index 0 is not allowed"));
            }
            let base: u8 = if revision == Revision::Rev2_4 { 0x80 } else { 0x00 };
            let p1 = base
                .checked_add(record_bits)
                .and_then(|p1| p1.checked_add(params.key_index))
                .ok_or(Error::InconsistentArgument("record number out of range"))?;
            (p1, sfi_bits, params.sam_challenge.clone())
        }
        Revision::Rev3_1 | Revision::Rev3_1Clap => (
            record_bits + params.key_index,
            sfi_bits,
            params.sam_challenge.clone(),
        ),
        Revision::Rev3_2 => {
            let mut data = BytesMut::with_capacity(1 + params.sam_challenge.len());
            data.put_u8(0x00);
            data.put_slice(&params.sam_challenge);
            (record_bits + params.key_index, sfi_bits + 2, data.freeze())
        }
    };

    Ok(Command::new(revision.class(), ins::OPEN_SESSION, p1, p2)
        .with_data(data)
        .with_le(0x00)
        .with_case4(true))
}

/// Build Close Secure Session carrying the terminal half-signature
pub fn close_session(revision: Revision, signature: &[u8], ratification: bool) -> Result<Command> {
    if !matches!(signature.len(), 4 | 8) {
        return Err(Error::InconsistentArgument("terminal signature must be 4 or 8 bytes"));
    }
    let p1 = if ratification { 0x80 } else { 0x00 };
    Ok(
        Command::new(revision.class(), ins::CLOSE_SESSION, p1, 0x00)
            .with_data(Bytes::copy_from_slice(signature))
            .with_le(0x00)
            .with_case4(true),
    )
}

/// Build the Close Secure Session variant that cancels the session
pub fn abort_session(revision: Revision) -> Command {
    Command::new(revision.class(), ins::CLOSE_SESSION, 0x00, 0x00).with_data(Bytes::new())
}

/// Build the Ratification command sent after Close Secure Session
pub fn ratification(revision: Revision) -> Command {
    Command::new(revision.class(), ins::READ_RECORDS, 0x00, 0x00).with_le(0x00)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn params(key_index: u8, sfi: u8, record: u8) -> OpenSessionParams {
        OpenSessionParams {
            key_index,
            sfi,
            record,
            sam_challenge: Bytes::copy_from_slice(&hex!("01 02 03 04")),
        }
    }

    #[test]
    fn test_open_session_32() {
        let cmd = open_session(Revision::Rev3_2, &params(0x03, 0x08, 0x01)).unwrap();
        assert_eq!(cmd.p1(), 0x0B);
        assert_eq!(cmd.p2(), 0x42);
        assert_eq!(cmd.data(), Some(&hex!("00 01 02 03 04")[..]));
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00 8A 0B 42 05 00 01 02 03 04 00"));
        assert!(cmd.is_case4());
    }

    #[test]
    fn test_open_session_per_revision() {
        let p = params(0x03, 0x08, 0x01);
        let cases = [
            (Revision::Rev1_0, 0x94, 0x0B, 0x40),
            (Revision::Rev2_4, 0x94, 0x8B, 0x40),
            (Revision::Rev3_1, 0x00, 0x0B, 0x40),
            (Revision::Rev3_1Clap, 0x00, 0x0B, 0x40),
            (Revision::Rev3_2, 0x00, 0x0B, 0x42),
        ];
        for (revision, cla, p1, p2) in cases {
            let cmd = open_session(revision, &p).unwrap();
            assert_eq!((cmd.class(), cmd.p1(), cmd.p2()), (cla, p1, p2), "{revision}");
            assert_eq!(cmd.instruction(), open_session_ref(revision).instruction());
        }
    }

    #[test]
    fn test_open_session_rejects_bad_arguments() {
        for revision in [Revision::Rev1_0, Revision::Rev2_4] {
            assert!(matches!(
                open_session(revision, &params(0, 0x08, 1)),
                Err(Error::InconsistentArgument(_))
            ));
        }
        assert!(open_session(Revision::Rev3_1, &params(0, 0x08, 1)).is_ok());
        assert!(open_session(Revision::Rev2_4, &params(1, 0x08, 16)).is_err());
        assert!(open_session(Revision::Rev3_1, &params(1, 0x08, 32)).is_err());

        let mut short = params(1, 0x08, 1);
        short.sam_challenge = Bytes::from_static(&[0x01, 0x02]);
        assert!(open_session(Revision::Rev3_1, &short).is_err());
    }

    #[test]
    fn test_open_session_for_unknown_code() {
        assert_eq!(
            open_session_for_code(0x33, &params(1, 0x08, 1)),
            Err(Error::UnsupportedRevision(0x33))
        );
        for revision in Revision::ALL {
            assert!(open_session_for_code(revision.code(), &params(1, 0x08, 1)).is_ok());
        }
    }

    #[test]
    fn test_close_and_abort() {
        let signature = hex!("11 22 33 44");
        let cmd = close_session(Revision::Rev3_1, &signature, true).unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00 8E 80 00 04 11 22 33 44 00"));

        let cmd = close_session(Revision::Rev2_4, &signature, false).unwrap();
        assert_eq!(cmd.p1(), 0x00);
        assert_eq!(cmd.class(), 0x94);

        assert!(close_session(Revision::Rev3_1, &signature[..3], true).is_err());

        let abort = abort_session(Revision::Rev3_2);
        assert_eq!(abort.to_bytes().as_ref(), hex!("00 8E 00 00 00"));
        assert_eq!(abort.lc(), 0);

        assert_eq!(
            ratification(Revision::Rev2_4).to_bytes().as_ref(),
            hex!("94 B2 00 00 00")
        );
    }
}
