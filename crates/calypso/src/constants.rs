//! Constants used in Calypso operations
//!
//! Class bytes, instruction codes, TLV tags and short file identifiers
//! as defined for Calypso portable objects and SAMs.

/// Command classes
pub mod cla {
    /// ISO 7816 class, used by revision 3 cards
    pub const ISO: u8 = 0x00;
    /// Legacy Calypso class, used by revision 1 and 2 cards and S1D SAMs
    pub const LEGACY: u8 = 0x94;
    /// Proprietary class used by C1 and S1E SAMs
    pub const SAM: u8 = 0x80;
}

/// Card instruction codes
pub mod ins {
    /// GET DATA
    pub const GET_DATA: u8 = 0xCA;
    /// OPEN SECURE SESSION
    pub const OPEN_SESSION: u8 = 0x8A;
    /// CLOSE SECURE SESSION
    pub const CLOSE_SESSION: u8 = 0x8E;
    /// GET CHALLENGE
    pub const GET_CHALLENGE: u8 = 0x84;
    /// READ RECORD(S)
    pub const READ_RECORDS: u8 = 0xB2;
    /// UPDATE RECORD
    pub const UPDATE_RECORD: u8 = 0xDC;
    /// WRITE RECORD
    pub const WRITE_RECORD: u8 = 0xD2;
    /// APPEND RECORD
    pub const APPEND_RECORD: u8 = 0xE2;
    /// INCREASE
    pub const INCREASE: u8 = 0x32;
    /// DECREASE
    pub const DECREASE: u8 = 0x30;
    /// SELECT FILE
    pub const SELECT_FILE: u8 = 0xA4;
    /// VERIFY PIN
    pub const VERIFY_PIN: u8 = 0x20;
    /// CHANGE KEY
    pub const CHANGE_KEY: u8 = 0xD8;
    /// INVALIDATE
    pub const INVALIDATE: u8 = 0x04;
    /// REHABILITATE
    pub const REHABILITATE: u8 = 0x44;
}

/// SAM instruction codes
pub mod sam_ins {
    /// SELECT DIVERSIFIER
    pub const SELECT_DIVERSIFIER: u8 = 0x14;
    /// GET CHALLENGE
    pub const GET_CHALLENGE: u8 = 0x84;
    /// DIGEST INIT
    pub const DIGEST_INIT: u8 = 0x8A;
    /// DIGEST UPDATE
    pub const DIGEST_UPDATE: u8 = 0x8C;
    /// DIGEST CLOSE
    pub const DIGEST_CLOSE: u8 = 0x8E;
    /// DIGEST AUTHENTICATE
    pub const DIGEST_AUTHENTICATE: u8 = 0x82;
    /// GIVE RANDOM
    pub const GIVE_RANDOM: u8 = 0x86;
    /// CARD GENERATE KEY
    pub const CARD_GENERATE_KEY: u8 = 0x12;
}

/// TLV tags found in card responses
pub mod tags {
    /// FCI template
    pub const FCI_TEMPLATE: u8 = 0x6F;
    /// DF name
    pub const DF_NAME: u8 = 0x84;
    /// FCI proprietary template
    pub const PROPRIETARY_TEMPLATE: u8 = 0xA5;
    /// FCI issuer discretionary data (two byte tag)
    pub const ISSUER_DISCRETIONARY: [u8; 2] = [0xBF, 0x0C];
    /// Application serial number
    pub const APPLICATION_SERIAL_NUMBER: u8 = 0xC7;
    /// Discretionary data, carrying the startup information
    pub const DISCRETIONARY_DATA: u8 = 0x53;
    /// AID of the current DF
    pub const AID: u8 = 0x4F;
    /// List of EF
    pub const EF_LIST: u8 = 0xC0;
    /// List of AID
    pub const AID_LIST: u8 = 0xD0;
    /// EF descriptor
    pub const EF_DESCRIPTOR: u8 = 0xC1;
    /// Historical bytes (two byte tag)
    pub const HISTORICAL_BYTES: [u8; 2] = [0x5F, 0x52];
    /// Proprietary information returned by SELECT FILE
    pub const PROPRIETARY_INFORMATION: u8 = 0x85;
}

/// GET DATA P1-P2 selectors
pub mod get_data {
    /// FCI of the current DF
    pub const FCI: [u8; 2] = [0x00, 0x6F];
    /// List of EF of the current DF
    pub const EF_LIST: [u8; 2] = [0x00, 0xC0];
    /// List of AID
    pub const AID_LIST: [u8; 2] = [0x00, 0xD0];
    /// ATR historical bytes
    pub const HISTORICAL_BYTES: [u8; 2] = [0x5F, 0x52];
}

/// Short file identifiers of the standard Calypso ticketing files
pub mod sfi {
    /// Environment and holder file
    pub const ENVIRONMENT: u8 = 0x07;
    /// Event log file
    pub const EVENT_LOG: u8 = 0x08;
    /// Contracts file
    pub const CONTRACTS: u8 = 0x09;
    /// Counters file
    pub const COUNTERS: u8 = 0x19;
    /// Special events file
    pub const SPECIAL_EVENTS: u8 = 0x1D;
    /// Contract list file
    pub const CONTRACT_LIST: u8 = 0x1E;
}

/// Status words with a Calypso specific meaning
pub mod status {
    use calypso_apdu_core::StatusWord;

    pub use calypso_apdu_core::prelude::status::*;

    /// Incorrect PIN, one attempt remaining (63 C1)
    pub const PIN_ONE_ATTEMPT_LEFT: StatusWord = StatusWord::new(0x63, 0xC1);
    /// Incorrect PIN, two attempts remaining (63 C2)
    pub const PIN_TWO_ATTEMPTS_LEFT: StatusWord = StatusWord::new(0x63, 0xC2);
    /// Incorrect signature (69 88)
    pub const INCORRECT_SIGNATURE: StatusWord = StatusWord::new(0x69, 0x88);
    /// FCI returned for an invalidated DF (62 83)
    pub const DF_INVALIDATED: StatusWord = StatusWord::new(0x62, 0x83);
}

/// Length of the SAM challenge requested by default
pub const DEFAULT_SAM_CHALLENGE_LENGTH: u8 = 4;

/// Length of the card challenge returned by GET CHALLENGE
pub const CARD_CHALLENGE_LENGTH: u8 = 8;

/// KIF substituted when a card reports the `0xFF` placeholder
pub const DEFAULT_KIF_SUBSTITUTE: u8 = 0x30;
