//! APDU command definitions
//!
//! This module provides the immutable command value type used by every
//! builder, according to ISO/IEC 7816-4 (cases 1 to 4).

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Response, StatusWord};

/// Expected length type for APDU commands
pub type ExpectedLength = u8;

/// Largest data field a short APDU can carry
pub const MAX_DATA_LENGTH: usize = 0xFF;

/// Generic APDU command structure
///
/// A command is built once and never mutated afterwards: every `with_*`
/// method consumes the command and returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    cla: u8,
    /// Instruction byte
    ins: u8,
    /// Parameter 1
    p1: u8,
    /// Parameter 2
    p2: u8,
    /// Command data (optional)
    data: Option<Bytes>,
    /// Expected length (optional)
    le: Option<ExpectedLength>,
    /// The card may answer with data even if the ISO case says otherwise
    case4: bool,
    /// Status words accepted as successful on top of 90 00
    successful_status: Vec<StatusWord>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
            case4: false,
            successful_status: Vec::new(),
        }
    }

    /// Set the data field
    ///
    /// Data longer than [`MAX_DATA_LENGTH`] is kept but the command fails
    /// [`check_length`](Self::check_length); use
    /// [`try_with_data`](Self::try_with_data) when the length is not bounded.
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the data field, refusing more than [`MAX_DATA_LENGTH`] bytes
    pub fn try_with_data<T: Into<Bytes>>(self, data: T) -> Result<Self, Error> {
        let data = data.into();
        if data.len() > MAX_DATA_LENGTH {
            return Err(Error::InvalidCommandLength(data.len()));
        }
        Ok(self.with_data(data))
    }

    /// Set the expected length field
    pub fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Flag the command as case 4
    pub fn with_case4(mut self, case4: bool) -> Self {
        self.case4 = case4;
        self
    }

    /// Accept an additional status word as successful
    pub fn with_successful_status(mut self, status: impl Into<StatusWord>) -> Self {
        self.successful_status.push(status.into());
        self
    }

    /// Command class (CLA)
    pub const fn class(&self) -> u8 {
        self.cla
    }

    /// Instruction code (INS)
    pub const fn instruction(&self) -> u8 {
        self.ins
    }

    /// First parameter (P1)
    pub const fn p1(&self) -> u8 {
        self.p1
    }

    /// Second parameter (P2)
    pub const fn p2(&self) -> u8 {
        self.p2
    }

    /// Command payload data (optional)
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Expected response length (optional)
    pub const fn expected_length(&self) -> Option<ExpectedLength> {
        self.le
    }

    /// Whether the command is flagged as case 4
    pub const fn is_case4(&self) -> bool {
        self.case4
    }

    /// Additional status words considered successful
    pub fn successful_status(&self) -> &[StatusWord] {
        &self.successful_status
    }

    /// Length of the data field (Lc), zero when absent
    pub fn lc(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len())
    }

    /// Fail when the data field does not fit in a one byte Lc
    pub fn check_length(&self) -> Result<(), Error> {
        match self.lc() {
            lc if lc > MAX_DATA_LENGTH => Err(Error::InvalidCommandLength(lc)),
            _ => Ok(()),
        }
    }

    /// Check a response against this command's accepted status words
    pub fn is_successful(&self, response: &Response) -> bool {
        response.is_successful(&self.successful_status)
    }

    /// Convert to raw APDU bytes
    ///
    /// Lc is only meaningful for a command passing
    /// [`check_length`](Self::check_length); the executor refuses any other.
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.command_length());

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        if let Some(data) = &self.data {
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }

        if let Some(le) = self.le {
            buffer.put_u8(le);
        }

        buffer.freeze()
    }

    /// Calculate length of serialized command
    pub fn command_length(&self) -> usize {
        // Header (CLA, INS, P1, P2) is always 4 bytes
        let mut length = 4;

        if let Some(data) = &self.data {
            length += 1 + data.len();
        }

        if self.le.is_some() {
            length += 1;
        }

        length
    }

    /// Parse a command from raw bytes
    ///
    /// Only short APDUs are recognized. The case 4 flag and the accepted
    /// status words are not part of the wire format and come back empty.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 4 {
            return Err(Error::InvalidCommandLength(data.len()));
        }

        let mut command = Self::new(data[0], data[1], data[2], data[3]);

        if data.len() == 5 {
            // Only Le present, no data
            command.le = Some(data[4]);
        } else if data.len() > 5 {
            let lc = data[4] as usize;
            if data.len() < 5 + lc || data.len() > 6 + lc {
                return Err(Error::InvalidCommandLength(data.len()));
            }
            if lc > 0 {
                command.data = Some(Bytes::copy_from_slice(&data[5..5 + lc]));
            }
            if data.len() == 6 + lc {
                command.le = Some(data[5 + lc]);
            }
        }

        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.to_bytes()))
    }
}
