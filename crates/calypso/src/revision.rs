//! Card and SAM revisions
//!
//! The card revision drives the class byte, the Open Session variant, the
//! decoder offsets and how the session buffer is accounted.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::constants::cla;
use crate::{Error, Result};

/// Calypso card revision
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Revision {
    /// Revision 1.0
    #[display("1.0")]
    Rev1_0,
    /// Revision 2.4
    #[display("2.4")]
    Rev2_4,
    /// Revision 3.1
    #[display("3.1")]
    Rev3_1,
    /// Revision 3.1 with the CLAP extension
    #[display("3.1 CLAP")]
    Rev3_1Clap,
    /// Revision 3.2
    #[display("3.2")]
    Rev3_2,
}

/// How in-session modifications are counted against the session buffer
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// Each modifying command costs its byte footprint
    #[display("bytes")]
    Bytes,
    /// Each modifying command costs one operation
    #[display("operations")]
    Operations,
}

impl Revision {
    /// Every supported revision
    pub const ALL: [Self; 5] = [
        Self::Rev1_0,
        Self::Rev2_4,
        Self::Rev3_1,
        Self::Rev3_1Clap,
        Self::Rev3_2,
    ];

    /// Raw revision code
    pub const fn code(self) -> u8 {
        match self {
            Self::Rev1_0 => 0x10,
            Self::Rev2_4 => 0x24,
            Self::Rev3_1 => 0x31,
            Self::Rev3_1Clap => 0xB1,
            Self::Rev3_2 => 0x32,
        }
    }

    /// Derive the revision from the application type byte of the startup
    /// information
    ///
    /// Bit 7 flags the CLAP extension, then the upper five bits select
    /// 3.2 (`0b00101`) or 3.1 (`0b00100`). Anything else is a 2.4 card.
    pub const fn from_application_type(application_type: u8) -> Self {
        if application_type & 0x80 != 0 {
            Self::Rev3_1Clap
        } else if application_type >> 3 == 0x05 {
            Self::Rev3_2
        } else if application_type >> 3 == 0x04 {
            Self::Rev3_1
        } else {
            Self::Rev2_4
        }
    }

    /// Revision of a card, given its optional startup information
    ///
    /// Cards that do not report startup information are 1.0 cards.
    pub fn from_startup_info(application_type: Option<u8>) -> Self {
        application_type.map_or(Self::Rev1_0, Self::from_application_type)
    }

    /// Class byte to use with this revision
    pub const fn class(self) -> u8 {
        if self.is_legacy() { cla::LEGACY } else { cla::ISO }
    }

    /// Revision 1.0 or 2.4
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::Rev1_0 | Self::Rev2_4)
    }

    /// Session buffer accounting used by this revision
    pub const fn buffer_mode(self) -> BufferMode {
        if self.is_legacy() {
            BufferMode::Operations
        } else {
            BufferMode::Bytes
        }
    }
}

impl TryFrom<u8> for Revision {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|revision| revision.code() == code)
            .ok_or(Error::UnsupportedRevision(code))
    }
}

impl From<Revision> for u8 {
    fn from(revision: Revision) -> Self {
        revision.code()
    }
}

/// SAM revision
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SamRevision {
    /// C1 SAM
    #[default]
    C1,
    /// S1E SAM
    S1E,
    /// S1D SAM
    S1D,
}

impl SamRevision {
    /// Class byte to use with this SAM
    pub const fn class(self) -> u8 {
        match self {
            Self::C1 | Self::S1E => cla::SAM,
            Self::S1D => cla::LEGACY,
        }
    }
}
