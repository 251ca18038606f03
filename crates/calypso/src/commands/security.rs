//! PIN, key and application lifecycle commands

use bytes::Bytes;
use calypso_apdu_core::Command;
use zeroize::Zeroizing;

use crate::constants::{CARD_CHALLENGE_LENGTH, ins, status};
use crate::revision::Revision;
use crate::{Error, Result};

/// How the PIN is presented to the card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinPresentation {
    /// Four byte PIN sent in plain text
    Plain(Zeroizing<Vec<u8>>),
    /// Eight byte block ciphered by the SAM
    Ciphered(Bytes),
    /// No PIN, only read the attempt counter
    StatusCheck,
}

/// Build Verify PIN
///
/// The status check variant accepts the wrong-PIN and blocked-PIN status
/// words as successful, since only the attempt counter is of interest.
pub fn verify_pin(revision: Revision, presentation: &PinPresentation) -> Result<Command> {
    let command = Command::new(revision.class(), ins::VERIFY_PIN, 0x00, 0x00);
    match presentation {
        PinPresentation::Plain(pin) => {
            if pin.len() != 4 {
                return Err(Error::InconsistentArgument("plain PIN must be 4 bytes"));
            }
            Ok(command.with_data(Bytes::copy_from_slice(pin)))
        }
        PinPresentation::Ciphered(block) => {
            if block.len() != 8 {
                return Err(Error::InconsistentArgument("ciphered PIN must be 8 bytes"));
            }
            Ok(command.with_data(block.clone()))
        }
        PinPresentation::StatusCheck => Ok(command
            .with_successful_status(status::PIN_ONE_ATTEMPT_LEFT)
            .with_successful_status(status::PIN_TWO_ATTEMPTS_LEFT)
            .with_successful_status(status::AUTHENTICATION_METHOD_BLOCKED)),
    }
}

/// Build Change Key with a cryptogram computed by the SAM
pub fn change_key(revision: Revision, key_index: u8, cryptogram: Bytes) -> Result<Command> {
    if !(1..=3).contains(&key_index) {
        return Err(Error::InconsistentArgument("key index must be 1, 2 or 3"));
    }
    if !matches!(cryptogram.len(), 24 | 32) {
        return Err(Error::InconsistentArgument("key cryptogram must be 24 or 32 bytes"));
    }
    Ok(Command::new(revision.class(), ins::CHANGE_KEY, 0x00, key_index).with_data(cryptogram))
}

/// Build Get Challenge
pub fn get_challenge(revision: Revision) -> Command {
    Command::new(revision.class(), ins::GET_CHALLENGE, 0x00, 0x00).with_le(CARD_CHALLENGE_LENGTH)
}

/// Build Invalidate
pub fn invalidate(revision: Revision) -> Command {
    Command::new(revision.class(), ins::INVALIDATE, 0x00, 0x00).with_data(Bytes::new())
}

/// Build Rehabilitate
pub fn rehabilitate(revision: Revision) -> Command {
    Command::new(revision.class(), ins::REHABILITATE, 0x00, 0x00).with_data(Bytes::new())
}
