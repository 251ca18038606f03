//! FCI template walker
//!
//! ```text
//! 6F L
//!    84 L  DF name (AID)
//!    A5 L  proprietary template
//!          BF0C L  issuer discretionary data
//!                  C7 L  application serial number
//!                  53 L  discretionary data (startup information)
//! ```
//!
//! Each field sits at an offset derived from the ones before it. When a tag
//! does not match, that field and every later one stay absent while the
//! fields already read are kept.

use bytes::Bytes;
use tracing::debug;

use crate::constants::tags;
use crate::cursor::ByteCursor;
use crate::revision::Revision;

/// Seven bytes of startup information found in the discretionary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StartupInfo {
    /// Session buffer size indicator
    pub buffer_size_indicator: u8,
    /// Chip platform
    pub platform: u8,
    /// Application type, from which the revision is derived
    pub application_type: u8,
    /// Application subtype
    pub application_subtype: u8,
    /// Software issuer
    pub software_issuer: u8,
    /// Software version
    pub software_version: u8,
    /// Software revision
    pub software_revision: u8,
}

impl StartupInfo {
    /// Length of the startup information
    pub const LEN: usize = 7;

    /// Read the first seven bytes of the discretionary data
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let [
            buffer_size_indicator,
            platform,
            application_type,
            application_subtype,
            software_issuer,
            software_version,
            software_revision,
        ] = ByteCursor::new(data).take_array::<{ Self::LEN }>()?;
        Some(Self {
            buffer_size_indicator,
            platform,
            application_type,
            application_subtype,
            software_issuer,
            software_version,
            software_revision,
        })
    }

    /// Raw bytes, in card order
    pub const fn to_bytes(&self) -> [u8; Self::LEN] {
        [
            self.buffer_size_indicator,
            self.platform,
            self.application_type,
            self.application_subtype,
            self.software_issuer,
            self.software_version,
            self.software_revision,
        ]
    }

    /// Card revision announced by the application type
    pub const fn revision(&self) -> Revision {
        Revision::from_application_type(self.application_type)
    }
}

/// Decoded File Control Information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fci {
    /// DF name
    pub aid: Option<Bytes>,
    /// Content of the proprietary template
    pub proprietary_template: Option<Bytes>,
    /// Content of the issuer discretionary data
    pub issuer_discretionary_data: Option<Bytes>,
    /// Application serial number
    pub serial_number: Option<Bytes>,
    /// Startup information
    pub startup_info: Option<StartupInfo>,
}

impl Fci {
    /// Whether every field was found
    pub const fn is_complete(&self) -> bool {
        self.aid.is_some()
            && self.proprietary_template.is_some()
            && self.issuer_discretionary_data.is_some()
            && self.serial_number.is_some()
            && self.startup_info.is_some()
    }
}

/// Walk an FCI template
pub fn decode_fci(data: &[u8]) -> Fci {
    let mut fci = Fci::default();
    if walk(data, &mut fci).is_none() {
        debug!(
            aid = fci.aid.is_some(),
            serial = fci.serial_number.is_some(),
            startup = fci.startup_info.is_some(),
            "FCI partially decoded"
        );
    }
    fci
}

fn walk(data: &[u8], fci: &mut Fci) -> Option<()> {
    let mut template = ByteCursor::new(data).enter_tlv(&[tags::FCI_TEMPLATE])?;
    fci.aid = Some(Bytes::copy_from_slice(template.read_tlv(&[tags::DF_NAME])?));

    let proprietary = template.read_tlv(&[tags::PROPRIETARY_TEMPLATE])?;
    fci.proprietary_template = Some(Bytes::copy_from_slice(proprietary));

    let issuer = ByteCursor::new(proprietary).read_tlv(&tags::ISSUER_DISCRETIONARY)?;
    fci.issuer_discretionary_data = Some(Bytes::copy_from_slice(issuer));

    let mut issuer = ByteCursor::new(issuer);
    fci.serial_number = Some(Bytes::copy_from_slice(
        issuer.read_tlv(&[tags::APPLICATION_SERIAL_NUMBER])?,
    ));

    let discretionary = issuer.read_tlv(&[tags::DISCRETIONARY_DATA])?;
    fci.startup_info = Some(StartupInfo::from_bytes(discretionary)?);
    Some(())
}
