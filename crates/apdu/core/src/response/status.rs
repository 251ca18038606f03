//! Status words closing every APDU response

use std::fmt;

/// SW1-SW2 pair returned by a card or SAM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusWord {
    /// SW1
    pub sw1: u8,
    /// SW2
    pub sw2: u8,
}

/// Meaning of the status words seen from Calypso cards and SAMs, sorted by value
const ISO_MEANINGS: &[(u16, &str)] = &[
    (0x6200, "No information given"),
    (0x6281, "Part of returned data may be corrupted"),
    (0x6282, "End of file or record reached before reading Le bytes"),
    (0x6283, "Selected file invalidated"),
    (0x6400, "State of non-volatile memory unchanged"),
    (0x6581, "Memory failure"),
    (0x6700, "Wrong length"),
    (0x6981, "Command incompatible with file structure"),
    (0x6982, "Security status not satisfied"),
    (0x6983, "Authentication method blocked"),
    (0x6984, "Referenced data invalidated"),
    (0x6985, "Conditions of use not satisfied"),
    (0x6986, "Command not allowed, no current EF"),
    (0x6988, "Incorrect secure messaging data objects"),
    (0x6A80, "Incorrect parameters in the data field"),
    (0x6A81, "Function not supported"),
    (0x6A82, "File not found"),
    (0x6A83, "Record not found"),
    (0x6A84, "Not enough memory space in the file"),
    (0x6A86, "Incorrect parameters P1-P2"),
    (0x6A87, "Lc inconsistent with P1-P2"),
    (0x6A88, "Referenced data not found"),
    (0x6B00, "Wrong parameters P1-P2"),
    (0x6D00, "Instruction code not supported or invalid"),
    (0x6E00, "Class not supported"),
    (0x6F00, "No precise diagnosis"),
    (0x9000, "Success"),
];

impl StatusWord {
    /// Create a status word from its two bytes
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Create from the big-endian value
    pub const fn from_u16(status: u16) -> Self {
        let [sw1, sw2] = status.to_be_bytes();
        Self { sw1, sw2 }
    }

    /// Big-endian value
    pub const fn to_u16(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// `90 00`
    pub const fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// SW1 is `62` or `63`: the command completed with a warning
    pub const fn is_warning(&self) -> bool {
        matches!(self.sw1, 0x62 | 0x63)
    }

    /// Generic ISO 7816-4 meaning
    ///
    /// Command specific meanings take precedence and live with the protocol
    /// layer.
    pub fn description(&self) -> &'static str {
        let value = self.to_u16();
        if let Ok(index) = ISO_MEANINGS.binary_search_by_key(&value, |&(sw, _)| sw) {
            return ISO_MEANINGS[index].1;
        }
        match self.sw1 {
            0x61 => "More data available",
            0x63 if self.sw2 & 0xF0 == 0xC0 => "Counter value",
            0x6C => "Wrong Le field",
            _ => "Unknown status word",
        }
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self::new(sw1, sw2)
    }
}

impl From<u16> for StatusWord {
    fn from(status: u16) -> Self {
        Self::from_u16(status)
    }
}

impl From<StatusWord> for u16 {
    fn from(status: StatusWord) -> Self {
        status.to_u16()
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.to_u16())
    }
}

/// Status words shared by every command set
pub mod common {
    use super::StatusWord;

    /// 90 00
    pub const SUCCESS: StatusWord = StatusWord::new(0x90, 0x00);

    /// 69 83
    pub const AUTHENTICATION_METHOD_BLOCKED: StatusWord = StatusWord::new(0x69, 0x83);

    /// 6A 82
    pub const FILE_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x82);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_conversions() {
        let sw = StatusWord::from_u16(0x6A82);
        assert_eq!((sw.sw1, sw.sw2), (0x6A, 0x82));
        assert_eq!(u16::from(StatusWord::new(0x90, 0x00)), 0x9000);
        assert_eq!(StatusWord::from((0x63, 0xC1)).to_u16(), 0x63C1);
    }

    #[test]
    fn test_success_and_warning() {
        assert!(StatusWord::new(0x90, 0x00).is_success());
        assert!(!StatusWord::new(0x00, 0x00).is_success());
        assert!(!StatusWord::new(0x90, 0x01).is_success());
        assert!(StatusWord::new(0x62, 0x83).is_warning());
        assert!(StatusWord::new(0x63, 0xC2).is_warning());
        assert!(!StatusWord::new(0x64, 0x00).is_warning());
    }

    #[test]
    fn test_meanings_sorted() {
        assert!(ISO_MEANINGS.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn test_description() {
        assert_eq!(StatusWord::new(0x90, 0x00).description(), "Success");
        assert_eq!(StatusWord::new(0x6A, 0x84).description(), "Not enough memory space in the file");
        assert_eq!(StatusWord::new(0x63, 0xC1).description(), "Counter value");
        assert_eq!(StatusWord::new(0x61, 0x10).description(), "More data available");
        assert_eq!(StatusWord::new(0x12, 0x34).description(), "Unknown status word");
        assert_eq!(StatusWord::new(0x6A, 0x82).to_string(), "6A82");
    }
}
