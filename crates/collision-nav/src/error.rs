//! Error types for the navigation crate.

use std::fmt;

use collision_decode::ParseError;

/// Result type for navigation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading zones or serving searches.
///
/// Failing to find a safe point is not an error; see
/// [`SearchFailure`](crate::SearchFailure).
#[derive(Debug)]
pub enum Error {
    /// The zone's collision file could not be decoded.
    Parse(ParseError),
    /// No zone is loaded.
    NoZone,
    /// The handle refers to a zone generation that has since been replaced.
    StaleZone {
        /// Generation the handle was issued for.
        held: u64,
        /// Generation currently installed.
        current: u64,
    },
    /// The blocking worker running the job panicked or was cancelled.
    Worker {
        /// The error message.
        message: String,
    },
    /// Configuration could not be read or is out of range.
    Config {
        /// Description of what was invalid.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "collision file error: {e}"),
            Error::NoZone => write!(f, "no zone is loaded"),
            Error::StaleZone { held, current } => {
                write!(
                    f,
                    "zone generation {held} was superseded by generation {current}"
                )
            }
            Error::Worker { message } => write!(f, "navigation worker failed: {message}"),
            Error::Config { message } => write!(f, "invalid navigation config: {message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Worker {
            message: e.to_string(),
        }
    }
}
