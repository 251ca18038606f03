//! Secure session settings

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SAM_CHALLENGE_LENGTH;
use crate::revision::SamRevision;

/// Access level a session is opened with, selecting the card key
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionAccessLevel {
    /// Issuer key
    #[display("personalization")]
    Personalization,
    /// Load key
    #[display("load")]
    Load,
    /// Debit key
    #[display("debit")]
    Debit,
}

impl SessionAccessLevel {
    /// Every access level
    pub const ALL: [Self; 3] = [Self::Personalization, Self::Load, Self::Debit];

    const fn slot(self) -> usize {
        match self {
            Self::Personalization => 0,
            Self::Load => 1,
            Self::Debit => 2,
        }
    }
}

/// Whether the card is asked to ratify the session on close
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RatificationMode {
    /// Ratification requested in Close Secure Session, followed by the
    /// Ratification command
    #[default]
    #[display("ratified")]
    CloseRatified,
    /// Close without ratification
    #[display("not ratified")]
    CloseNotRatified,
}

/// Settings of a secure session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// KIF used when the card does not report one, per access level
    pub default_kif: [u8; 3],
    /// Card key index, per access level
    pub key_index: [u8; 3],
    /// Ratification requested on close
    pub ratification_mode: RatificationMode,
    /// Overrides the capacity derived from the startup information
    pub session_buffer_capacity: Option<usize>,
    /// Revision of the SAM
    pub sam_revision: SamRevision,
    /// Length of the SAM challenge, 4 or 8
    pub sam_challenge_length: u8,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_kif: [0x21, 0x27, 0x30],
            key_index: [0x01, 0x02, 0x03],
            ratification_mode: RatificationMode::CloseRatified,
            session_buffer_capacity: None,
            sam_revision: SamRevision::C1,
            sam_challenge_length: DEFAULT_SAM_CHALLENGE_LENGTH,
        }
    }
}

impl SessionSettings {
    /// Create the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the KIF used for an access level when the card reports none
    pub const fn with_default_kif(mut self, level: SessionAccessLevel, kif: u8) -> Self {
        self.default_kif[level.slot()] = kif;
        self
    }

    /// Set the card key index of an access level
    pub const fn with_key_index(mut self, level: SessionAccessLevel, key_index: u8) -> Self {
        self.key_index[level.slot()] = key_index;
        self
    }

    /// Set the ratification mode
    pub const fn with_ratification_mode(mut self, mode: RatificationMode) -> Self {
        self.ratification_mode = mode;
        self
    }

    /// Override the session buffer capacity
    pub const fn with_session_buffer_capacity(mut self, capacity: usize) -> Self {
        self.session_buffer_capacity = Some(capacity);
        self
    }

    /// Set the SAM revision
    pub const fn with_sam_revision(mut self, revision: SamRevision) -> Self {
        self.sam_revision = revision;
        self
    }

    /// Set the SAM challenge length
    pub const fn with_sam_challenge_length(mut self, length: u8) -> Self {
        self.sam_challenge_length = length;
        self
    }

    /// KIF used for an access level when the card reports none
    pub const fn kif_for(&self, level: SessionAccessLevel) -> u8 {
        self.default_kif[level.slot()]
    }

    /// Card key index of an access level
    pub const fn key_index_for(&self, level: SessionAccessLevel) -> u8 {
        self.key_index[level.slot()]
    }

    /// Whether ratification is requested on close
    pub const fn ratify_on_close(&self) -> bool {
        matches!(self.ratification_mode, RatificationMode::CloseRatified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SessionSettings::new();
        assert_eq!(settings.kif_for(SessionAccessLevel::Personalization), 0x21);
        assert_eq!(settings.kif_for(SessionAccessLevel::Load), 0x27);
        assert_eq!(settings.kif_for(SessionAccessLevel::Debit), 0x30);
        assert_eq!(settings.key_index_for(SessionAccessLevel::Debit), 3);
        assert!(settings.ratify_on_close());
        assert_eq!(settings.sam_challenge_length, 4);
    }

    #[test]
    fn test_builder() {
        let settings = SessionSettings::new()
            .with_default_kif(SessionAccessLevel::Load, 0x2A)
            .with_key_index(SessionAccessLevel::Load, 1)
            .with_ratification_mode(RatificationMode::CloseNotRatified)
            .with_session_buffer_capacity(430)
            .with_sam_revision(SamRevision::S1D)
            .with_sam_challenge_length(8);
        assert_eq!(settings.kif_for(SessionAccessLevel::Load), 0x2A);
        assert_eq!(settings.key_index_for(SessionAccessLevel::Load), 1);
        assert_eq!(settings.kif_for(SessionAccessLevel::Debit), 0x30);
        assert!(!settings.ratify_on_close());
        assert_eq!(settings.session_buffer_capacity, Some(430));
        assert_eq!(settings.sam_revision, SamRevision::S1D);
    }

    #[test]
    fn test_json_roundtrip_with_missing_fields() {
        let settings: SessionSettings =
            serde_json::from_str(r#"{"ratification_mode":"CloseNotRatified","sam_challenge_length":8}"#)
                .unwrap();
        assert!(!settings.ratify_on_close());
        assert_eq!(settings.sam_challenge_length, 8);
        assert_eq!(settings.default_kif, [0x21, 0x27, 0x30]);

        let json = serde_json::to_string(&SessionSettings::default()).unwrap();
        let back: SessionSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SessionSettings::default());
    }
}
