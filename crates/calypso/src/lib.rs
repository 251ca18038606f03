//! Calypso card command codec and secure session engine
//!
//! This crate builds the APDUs a terminal exchanges with a Calypso card and
//! its SAM, decodes their responses, and drives the secure session that
//! certifies a set of card modifications.
//!
//! ## Overview
//!
//! - [`PoCommand`] and [`SamCommand`] build commands for a card or SAM revision
//! - [`responses`] decodes FCI, EF lists, session data and the rest
//! - [`catalog`] names every command and holds the status word tables
//! - [`SecureSession`] opens, processes, closes and aborts a session over
//!   two [`Channel`]s, one to the card and one to the SAM
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod card;
pub mod catalog;
pub mod channel;
pub mod commands;
pub mod constants;
pub mod cursor;
mod error;
pub mod responses;
pub mod revision;
pub mod sam;
pub mod session;
pub mod settings;

pub use card::CalypsoCard;
pub use catalog::{CommandRef, DecoderKind, StatusTable};
pub use channel::{CardChannel, Channel, Selection};
pub use commands::{PoCommand, ReadMode};
pub use error::{Error, Result};
pub use revision::{BufferMode, Revision, SamRevision};
pub use sam::{KeyReference, Sam, SamCommand};
pub use session::{SecureSession, SessionState};
pub use settings::{RatificationMode, SessionAccessLevel, SessionSettings};

pub use calypso_apdu_core::{Bytes, CardExecutor, CardTransport, Command, Response, StatusWord};
