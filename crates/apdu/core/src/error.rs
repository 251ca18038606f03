//! Error type of the byte codec and transport layer

/// Failure below the protocol layer: the reader, or bytes that are not an APDU
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The reader lost the card or never reached it
    #[error("Connection error: no card reachable")]
    Connection,

    /// The exchange did not complete
    #[error("Transmission error: failed to transmit data")]
    Transmission,

    /// The reader gave up waiting for the card
    #[error("Operation timed out")]
    Timeout,

    /// Raw response too short to carry a status word
    #[error("Malformed response: {0} bytes, status word missing")]
    MalformedResponse(usize),

    /// Raw command that is not a short APDU
    #[error("Invalid command length: {0}")]
    InvalidCommandLength(usize),

    /// Another error with what was being done when it happened
    #[error("{context}: {source}")]
    Context {
        /// What was being done
        context: String,
        /// Underlying error
        source: Box<Self>,
    },
}

impl Error {
    /// Wrap the error with what was being done
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Underlying error, context wrappers removed
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type of the byte codec and transport layer
pub type Result<T> = std::result::Result<T, Error>;

/// Attach context to a failed [`Result`]
pub trait ResultExt<T> {
    /// Wrap the error, if any, with what was being done
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<S: Into<String>>(self, context: S) -> Self {
        self.map_err(|e| e.with_context(context))
    }
}
