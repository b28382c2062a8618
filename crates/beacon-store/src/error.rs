use std::fmt;

/// Result type for beacon-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the cache layer
///
/// Corruption of a stored payload is deliberately not represented here: a
/// payload that fails to decode is treated as a cache miss and never
/// surfaced to the caller.
#[derive(Debug)]
pub enum Error {
    /// Backing store rejected a write (storage quota exhaustion, I/O failure)
    WriteFailure(String),

    /// Backing store read failed
    ReadFailure(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WriteFailure(msg) => write!(f, "Cache write failure: {}", msg),
            Error::ReadFailure(msg) => write!(f, "Cache read failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
