use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Input root or file does not exist
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Input root exists but a directory was expected
    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Filesystem failure outside of per-entry scanning
    #[error("Failed to {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// The monolithic run log is not a valid stream of JSON values
    #[error("Invalid run log {}: {source}", path.display())]
    InvalidLog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A complete pass produced nothing to report
    #[error("No {what} found")]
    NoResults { what: String },

    /// Configuration could not be loaded or failed validation
    #[error(transparent)]
    Config(#[from] Box<figment::Error>),

    /// Report serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an I/O error with the operation that failed, e.g. `"read /tmp/x"`
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Type alias for tool operation results
pub type Result<T> = std::result::Result<T, Error>;
