use crate::validation::KeyRejection;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SupakeyError {
    Io(io::Error),
    SerdeJson(serde_json::Error),
    EnvFileNotFound(PathBuf),
    InvalidKey(KeyRejection),
    Config(String),
    Browser(String),
    Cancelled,
}

impl SupakeyError {
    /// Process exit code for this error. Operator cancellation is not a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SupakeyError::Cancelled => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for SupakeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SupakeyError::Io(e) => write!(f, "IO error: {}", e),
            SupakeyError::SerdeJson(e) => write!(f, "JSON serialization error: {}", e),
            SupakeyError::EnvFileNotFound(path) => {
                write!(f, "Env file not found at {}", path.display())
            }
            SupakeyError::InvalidKey(reason) => write!(f, "Final validation failed: {}", reason),
            SupakeyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SupakeyError::Browser(msg) => write!(f, "Browser automation error: {}", msg),
            SupakeyError::Cancelled => write!(f, "Cancelled by user"),
        }
    }
}

impl Error for SupakeyError {}

impl From<io::Error> for SupakeyError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::Interrupted {
            return SupakeyError::Cancelled;
        }
        SupakeyError::Io(error)
    }
}

impl From<serde_json::Error> for SupakeyError {
    fn from(error: serde_json::Error) -> Self {
        SupakeyError::SerdeJson(error)
    }
}

impl From<KeyRejection> for SupakeyError {
    fn from(reason: KeyRejection) -> Self {
        SupakeyError::InvalidKey(reason)
    }
}
