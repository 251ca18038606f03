use calypso_apdu_core::StatusWord;
use thiserror::Error;

use crate::session::SessionState;

/// Result type for Calypso operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Calypso operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Response bytes too short or structurally invalid for the decoder
    #[error("Malformed response: {0}")]
    MalformedResponse(&'static str),

    /// Card or SAM answered with a status word outside the accepted set
    #[error("{command} failed with status {status}: {message}")]
    UnsuccessfulStatus {
        /// Display name of the command
        command: &'static str,
        /// Status word returned
        status: StatusWord,
        /// Human readable meaning of the status word
        message: &'static str,
    },

    /// The command would not fit in what remains of the session buffer
    #[error("Session buffer overflow: {required} required, {remaining} remaining of {capacity}")]
    SessionBufferOverflow {
        /// Cost of the rejected command
        required: usize,
        /// Space left before the command
        remaining: usize,
        /// Total capacity of the buffer
        capacity: usize,
    },

    /// Revision code outside the supported set
    #[error("Unsupported card revision code: {0:#04x}")]
    UnsupportedRevision(u8),

    /// Argument rejected before any byte was built
    #[error("Inconsistent argument: {0}")]
    InconsistentArgument(&'static str),

    /// Failure reported by the channel or transport
    #[error("Channel I/O error: {0}")]
    ChannelIo(#[from] calypso_apdu_core::Error),

    /// Application selection rejected by the card
    #[error("Selection failed with status {0}")]
    SelectionFailed(StatusWord),

    /// The session could not be opened
    #[error("Session opening failed: {reason}")]
    OpeningFailed {
        /// What went wrong
        reason: &'static str,
        /// Refusal from the card or SAM, absent when nothing was sent
        source: Option<Box<Self>>,
    },

    /// Operation invoked in the wrong session state
    #[error("Invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        /// State the operation requires
        expected: SessionState,
        /// State the session is in
        actual: SessionState,
    },

    /// Response decoded but does not carry what the protocol requires
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(&'static str),
}

impl Error {
    /// Whether the error was raised before any byte reached a device
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::SessionBufferOverflow { .. }
                | Self::UnsupportedRevision(_)
                | Self::InconsistentArgument(_)
                | Self::InvalidState { .. }
        )
    }
}
