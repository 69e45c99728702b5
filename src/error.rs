//! Error types for pktstat.

use thiserror::Error;

/// Result type alias for pktstat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the capture tool can report.
///
/// None of these are fatal: the interactive menu prints the message and
/// returns to the main prompt.
#[derive(Error, Debug)]
pub enum Error {
    /// libpcap could not list the capture devices (often missing privileges).
    #[error("cannot enumerate network interfaces: {0}")]
    Enumeration(#[source] pcap::Error),

    /// The selected interface could not be opened for live capture.
    #[error("cannot open interface '{name}': {source}")]
    Open {
        name: String,
        #[source]
        source: pcap::Error,
    },

    /// A 1-based interface index outside `1..=count`.
    #[error("invalid interface index {index}, expected 1..={count}")]
    IndexOutOfRange { index: usize, count: usize },

    /// The interface prompt received something that is not a number.
    #[error("invalid interface selection '{input}'")]
    InvalidSelection { input: String },

    /// The capture source failed while a session was running.
    #[error("capture stream failed: {0}")]
    Stream(String),

    /// The consumption task ended abnormally.
    #[error("capture worker failed: {0}")]
    Worker(String),

    /// `Session::run` was called on a session that already ran.
    #[error("session on '{0}' has already run")]
    SessionFinished(String),

    /// Standard input was closed while waiting for a selection.
    #[error("input closed")]
    InputClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a stream error from any displayable cause.
    pub fn stream<S: ToString>(cause: S) -> Self {
        Error::Stream(cause.to_string())
    }
}
