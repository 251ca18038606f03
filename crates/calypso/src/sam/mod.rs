//! SAM commands and client
//!
//! The SAM holds the keys. The terminal only asks it for challenges and
//! signatures, and asks it to check the card's signature.

mod client;

pub use client::Sam;

use bytes::{BufMut, Bytes, BytesMut};
use calypso_apdu_core::Command;
use serde::{Deserialize, Serialize};

use crate::catalog::CommandRef;
use crate::constants::sam_ins;
use crate::revision::SamRevision;
use crate::{Error, Result};

/// Largest block a single Digest Update accepts
pub const MAX_DIGEST_DATA_LENGTH: usize = 0xFF;

/// Reference to a key held by the SAM or the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyReference {
    /// Key identifier
    pub kif: u8,
    /// Key version
    pub kvc: u8,
}

impl KeyReference {
    /// Create a key reference
    pub const fn new(kif: u8, kvc: u8) -> Self {
        Self { kif, kvc }
    }
}

/// Command addressed to a SAM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamCommand {
    /// Select the card serial number used to diversify keys
    SelectDiversifier(Bytes),
    /// Ask for a challenge of 4 or 8 bytes
    GetChallenge(u8),
    /// Start the session digest
    DigestInit {
        /// Ask the SAM to verify rather than compute
        verification: bool,
        /// Revision 3.2 session
        rev3_2: bool,
        /// Session key
        key: KeyReference,
        /// Data returned by Open Secure Session
        opening_data: Bytes,
    },
    /// Feed one card command or response into the digest
    DigestUpdate {
        /// Session is encrypted
        encrypted: bool,
        /// Command or response bytes
        data: Bytes,
    },
    /// Finish the digest and return the terminal half-signature
    DigestClose(u8),
    /// Check the card half-signature
    DigestAuthenticate(Bytes),
    /// Hand the card challenge to the SAM
    GiveRandom(Bytes),
    /// Compute the cryptogram of a new card key
    CardGenerateKey {
        /// Key ciphering the transfer, the null key when absent
        ciphering: Option<KeyReference>,
        /// Key to transfer
        source: KeyReference,
    },
}

impl SamCommand {
    /// Catalog entry of this command
    pub const fn command_ref(&self) -> CommandRef {
        match self {
            Self::SelectDiversifier(_) => CommandRef::SamSelectDiversifier,
            Self::GetChallenge(_) => CommandRef::SamGetChallenge,
            Self::DigestInit { .. } => CommandRef::DigestInit,
            Self::DigestUpdate { .. } => CommandRef::DigestUpdate,
            Self::DigestClose(_) => CommandRef::DigestClose,
            Self::DigestAuthenticate(_) => CommandRef::DigestAuthenticate,
            Self::GiveRandom(_) => CommandRef::GiveRandom,
            Self::CardGenerateKey { .. } => CommandRef::CardGenerateKey,
        }
    }

    /// Build the command bytes for a SAM revision
    pub fn build(&self, revision: SamRevision) -> Result<Command> {
        let cla = revision.class();
        let ins = self.command_ref().instruction();
        match self {
            Self::SelectDiversifier(serial) => {
                if !matches!(serial.len(), 4 | 8) {
                    return Err(Error::InconsistentArgument("diversifier must be 4 or 8 bytes"));
                }
                Ok(Command::new(cla, ins, 0x00, 0x00).with_data(serial.clone()))
            }
            Self::GetChallenge(length) => {
                if !matches!(length, 4 | 8) {
                    return Err(Error::InconsistentArgument("SAM challenge must be 4 or 8 bytes"));
                }
                Ok(Command::new(cla, ins, 0x00, 0x00).with_le(*length))
            }
            Self::DigestInit {
                verification,
                rev3_2,
                key,
                opening_data,
            } => {
                if opening_data.is_empty() || opening_data.len() > 0xFD {
                    return Err(Error::InconsistentArgument("digest init data length out of range"));
                }
                let mut p1 = 0x00;
                if *verification {
                    p1 |= 0x01;
                }
                if *rev3_2 {
                    p1 |= 0x02;
                }
                let mut data = BytesMut::with_capacity(2 + opening_data.len());
                data.put_u8(key.kif);
                data.put_u8(key.kvc);
                data.put_slice(opening_data);
                Ok(Command::new(cla, ins, p1, 0xFF).with_data(data.freeze()))
            }
            Self::DigestUpdate { encrypted, data } => {
                if data.len() > MAX_DIGEST_DATA_LENGTH {
                    return Err(Error::InconsistentArgument("digest data longer than 255 bytes"));
                }
                let p2 = if *encrypted { 0x80 } else { 0x00 };
                Ok(Command::new(cla, ins, 0x00, p2).with_data(data.clone()))
            }
            Self::DigestClose(length) => {
                if !matches!(length, 4 | 8) {
                    return Err(Error::InconsistentArgument("signature must be 4 or 8 bytes"));
                }
                Ok(Command::new(cla, ins, 0x00, 0x00).with_le(*length))
            }
            Self::DigestAuthenticate(signature) => {
                if !matches!(signature.len(), 4 | 8) {
                    return Err(Error::InconsistentArgument("card signature must be 4 or 8 bytes"));
                }
                Ok(Command::new(cla, ins, 0x00, 0x00).with_data(signature.clone()))
            }
            Self::GiveRandom(random) => {
                if random.len() != 8 {
                    return Err(Error::InconsistentArgument("card challenge must be 8 bytes"));
                }
                Ok(Command::new(cla, ins, 0x00, 0x00).with_data(random.clone()))
            }
            Self::CardGenerateKey { ciphering, source } => {
                let mut data = BytesMut::with_capacity(5);
                let p2 = match ciphering {
                    Some(key) => {
                        data.put_u8(key.kif);
                        data.put_u8(key.kvc);
                        0xFF
                    }
                    None => 0x00,
                };
                data.put_u8(source.kif);
                data.put_u8(source.kvc);
                data.put_u8(0x90);
                Ok(Command::new(cla, ins, 0xFF, p2)
                    .with_data(data.freeze())
                    .with_le(0x00)
                    .with_case4(true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_select_diversifier_and_challenge() {
        let cmd = SamCommand::SelectDiversifier(Bytes::copy_from_slice(&hex!("00 00 00 00 27 4A 9A B7")))
            .build(SamRevision::C1)
            .unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), hex!("80 14 00 00 08 00 00 00 00 27 4A 9A B7"));

        let cmd = SamCommand::GetChallenge(4).build(SamRevision::S1D).unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), hex!("94 84 00 00 04"));

        assert!(SamCommand::GetChallenge(6).build(SamRevision::C1).is_err());
        assert!(SamCommand::SelectDiversifier(Bytes::new()).build(SamRevision::C1).is_err());
    }

    #[test]
    fn test_digest_commands() {
        let init = SamCommand::DigestInit {
            verification: false,
            rev3_2: true,
            key: KeyReference::new(0x30, 0x79),
            opening_data: Bytes::copy_from_slice(&hex!("03 0D 0E FA 9C 30 79 00")),
        };
        assert_eq!(
            init.build(SamRevision::C1).unwrap().to_bytes().as_ref(),
            hex!("80 8A 02 FF 0A 30 79 03 0D 0E FA 9C 30 79 00")
        );

        let update = SamCommand::DigestUpdate {
            encrypted: false,
            data: Bytes::copy_from_slice(&hex!("00 B2 01 3C 00")),
        };
        assert_eq!(
            update.build(SamRevision::C1).unwrap().to_bytes().as_ref(),
            hex!("80 8C 00 00 05 00 B2 01 3C 00")
        );

        let close = SamCommand::DigestClose(4).build(SamRevision::C1).unwrap();
        assert_eq!(close.to_bytes().as_ref(), hex!("80 8E 00 00 04"));

        let auth = SamCommand::DigestAuthenticate(Bytes::copy_from_slice(&hex!("11 22 33 44")));
        assert_eq!(
            auth.build(SamRevision::C1).unwrap().to_bytes().as_ref(),
            hex!("80 82 00 00 04 11 22 33 44")
        );
    }

    #[test]
    fn test_card_generate_key() {
        let with_cipher = SamCommand::CardGenerateKey {
            ciphering: Some(KeyReference::new(0x21, 0x79)),
            source: KeyReference::new(0x27, 0x79),
        };
        assert_eq!(
            with_cipher.build(SamRevision::C1).unwrap().to_bytes().as_ref(),
            hex!("80 12 FF FF 05 21 79 27 79 90 00")
        );

        let null_cipher = SamCommand::CardGenerateKey {
            ciphering: None,
            source: KeyReference::new(0x27, 0x79),
        };
        assert_eq!(
            null_cipher.build(SamRevision::C1).unwrap().to_bytes().as_ref(),
            hex!("80 12 FF 00 03 27 79 90 00")
        );

        let random = SamCommand::GiveRandom(Bytes::copy_from_slice(&hex!("01 02 03 04 05 06 07 08")));
        assert_eq!(random.build(SamRevision::C1).unwrap().p1(), 0x00);
        assert!(SamCommand::GiveRandom(Bytes::new()).build(SamRevision::C1).is_err());
    }
}
