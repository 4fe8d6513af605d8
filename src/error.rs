//! Error types and driver error classification.

use mongodb::error::{Error as DriverError, ErrorKind as DriverErrorKind, WriteFailure};
use thiserror::Error;

/// Message used when a lookup matched no document.
pub const NO_DOCUMENTS: &str = "no documents in result";

/// Label the server attaches to transport failures.
const NETWORK_ERROR_LABEL: &str = "NetworkError";

/// Errors surfaced to callers of the facade.
#[derive(Debug, Error)]
pub enum MongoError {
    /// No document matched the query.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// A unique index rejected the write.
    #[error("INDEX_DUPLICATED: {0}")]
    IndexDuplicated(#[source] DriverError),

    /// The driver could not reach the server.
    #[error("NETWORK_ERROR: {0}")]
    Network(#[source] DriverError),

    /// Any other driver error, kept as-is.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl MongoError {
    /// Create a not-found error with the default message.
    pub fn not_found() -> Self {
        MongoError::NotFound(NO_DOCUMENTS.to_string())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        MongoError::InvalidArgument(msg.into())
    }

    /// Check if no document matched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MongoError::NotFound(_))
    }

    /// Check if this is a duplicate key error.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, MongoError::IndexDuplicated(_))
    }

    /// Check if this is a network error.
    pub fn is_network_error(&self) -> bool {
        matches!(self, MongoError::Network(_))
    }

    /// Get the wrapped driver error, if any.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            MongoError::IndexDuplicated(e) | MongoError::Network(e) | MongoError::Driver(e) => {
                Some(e)
            }
            MongoError::NotFound(_) | MongoError::InvalidArgument(_) => None,
        }
    }

    /// Relabel a generic driver error; other variants are returned as-is.
    ///
    /// ```ignore
    /// let facade = connect(uri, "mydb").await.map_err(MongoError::classified)?;
    /// ```
    pub fn classified(self) -> Self {
        match self {
            MongoError::Driver(e) => classify(e),
            other => other,
        }
    }
}

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, MongoError>;

/// Error kind enumeration for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No matching document.
    NotFound,
    /// Unique index violation.
    IndexDuplicated,
    /// Transport failure.
    Network,
    /// Invalid argument.
    InvalidArgument,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// The tag prefixed to the error message, if this kind carries one.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ErrorKind::NotFound => Some("NOT_FOUND"),
            ErrorKind::IndexDuplicated => Some("INDEX_DUPLICATED"),
            ErrorKind::Network => Some("NETWORK_ERROR"),
            ErrorKind::InvalidArgument | ErrorKind::Other => None,
        }
    }
}

impl MongoError {
    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MongoError::NotFound(_) => ErrorKind::NotFound,
            MongoError::IndexDuplicated(_) => ErrorKind::IndexDuplicated,
            MongoError::Network(_) => ErrorKind::Network,
            MongoError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            MongoError::Driver(_) => ErrorKind::Other,
        }
    }
}

/// Relabel a driver error.
///
/// Duplicate key violations become [`MongoError::IndexDuplicated`], transport
/// failures become [`MongoError::Network`], and everything else is wrapped
/// unchanged in [`MongoError::Driver`].
pub fn classify(err: DriverError) -> MongoError {
    if has_duplicate_key(&err) {
        return MongoError::IndexDuplicated(err);
    }
    if is_transport_failure(&err) {
        return MongoError::Network(err);
    }
    MongoError::Driver(err)
}

/// Pass a successful driver result through and classify a failed one.
///
/// # Example
///
/// ```ignore
/// let result = check_mongo_error(facade.insert_one("users", doc! { "name": "a" }, None).await);
/// ```
pub fn check_mongo_error<T>(result: std::result::Result<T, DriverError>) -> Result<T> {
    result.map_err(classify)
}

/// Like [`check_mongo_error`], but an empty lookup becomes [`MongoError::NotFound`].
///
/// The driver reports a lookup without a match as `Ok(None)`.
pub fn check_found<T>(result: std::result::Result<Option<T>, DriverError>) -> Result<T> {
    check_mongo_error(result)?.ok_or_else(MongoError::not_found)
}

/// Whether a server error code and message describe a duplicate key.
pub fn is_duplicate_key_code(code: i32, message: &str) -> bool {
    match code {
        11000 | 11001 | 12582 => true,
        16460 => message.contains("E11000"),
        _ => false,
    }
}

fn has_duplicate_key(err: &DriverError) -> bool {
    match err.kind.as_ref() {
        DriverErrorKind::Write(WriteFailure::WriteError(e)) => {
            is_duplicate_key_code(e.code, &e.message)
        }
        DriverErrorKind::InsertMany(e) => e
            .write_errors
            .iter()
            .flatten()
            .any(|w| is_duplicate_key_code(w.code, &w.message)),
        DriverErrorKind::Command(e) => is_duplicate_key_code(e.code, &e.message),
        _ => false,
    }
}

fn is_transport_failure(err: &DriverError) -> bool {
    has_network_label(err.labels().iter().map(String::as_str))
        || matches!(
            err.kind.as_ref(),
            DriverErrorKind::Io(_)
                | DriverErrorKind::DnsResolve { .. }
                | DriverErrorKind::ServerSelection { .. }
                | DriverErrorKind::ConnectionPoolCleared { .. }
        )
}

fn has_network_label<'a>(mut labels: impl Iterator<Item = &'a str>) -> bool {
    labels.any(|label| label == NETWORK_ERROR_LABEL)
}
