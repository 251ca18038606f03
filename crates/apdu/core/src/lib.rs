//! Core types for APDU (Application Protocol Data Unit) operations
//!
//! This crate provides the byte level building blocks used by the Calypso
//! toolkit, according to ISO/IEC 7816-4:
//!
//! - Immutable [`Command`] values serialized to short APDUs (cases 1 to 4)
//! - [`Response`] values split into data and [`StatusWord`]
//! - The [`CardTransport`] trait implemented by reader drivers
//! - The [`CardExecutor`] that pairs the two
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod error;
pub mod executor;
pub mod response;
pub mod transport;

pub use command::{Command, ExpectedLength, MAX_DATA_LENGTH};
pub use error::{Error, Result, ResultExt};
pub use executor::CardExecutor;
pub use response::Response;
pub use response::status::StatusWord;
pub use transport::CardTransport;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{Bytes, BytesMut, Error, Result, ResultExt};

    pub use crate::Command;
    pub use crate::command::ExpectedLength;

    pub use crate::Response;
    pub use crate::response::status::{StatusWord, common as status};

    pub use crate::CardTransport;
    pub use crate::executor::CardExecutor;
}
