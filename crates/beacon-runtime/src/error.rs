use std::fmt;

/// Result type for beacon-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Collaborator repository failed (network/auth); the view build aborts
    /// and callers fall back to default metrics instead of crashing
    Repository(String),

    /// Cache layer error
    Store(beacon_store::Error),

    /// Export pipeline failed; no partial output was produced
    Export(beacon_engine::ExportError),

    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Repository(msg) => write!(f, "Repository error: {}", msg),
            Error::Store(err) => write!(f, "Store error: {}", err),
            Error::Export(err) => write!(f, "Export error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Export(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Repository(_) | Error::Config(_) => None,
        }
    }
}

impl From<beacon_store::Error> for Error {
    fn from(err: beacon_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<beacon_engine::ExportError> for Error {
    fn from(err: beacon_engine::ExportError) -> Self {
        Error::Export(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
