//! Unified error type.

use std::fmt;

/// The error type returned by chain's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// configuration and infrastructure failures: a route that cannot be
/// registered, or a port that cannot be bound.
#[derive(Debug)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    Io(std::io::Error),
    /// A pattern was rejected at registration time.
    Route { pattern: String, reason: RouteError },
}

/// Why a pattern could not be registered.
#[derive(Debug)]
pub enum RouteError {
    /// The method prefix is not a valid HTTP method token.
    InvalidMethod(String),
    /// The path collides with an existing route or is malformed.
    Insert(matchit::InsertError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Route { pattern, reason } => write!(f, "invalid route `{pattern}`: {reason}"),
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMethod(m) => write!(f, "invalid method `{m}`"),
            Self::Insert(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Route { reason: RouteError::Insert(e), .. } => Some(e),
            Self::Route { .. } => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
