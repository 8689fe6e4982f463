//! Error types for flatkit operations.
//!
//! Errors are grouped into categories so that front ends can tell a user
//! abort apart from a real failure and give appropriate feedback.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for flatkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of flatkit errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The user supplied something that could not be understood.
    Input,
    /// The remote listing API answered with a non-success status.
    Remote,
    /// The user cancelled the operation.
    Aborted,
    /// A single archive entry could not be produced.
    Entry,
    /// The archive itself could not be produced.
    Archive,
    /// Transport-level failure (DNS, TLS, connection reset, bad payload).
    Network,
    /// Local filesystem failure.
    Io,
}

impl ErrorCategory {
    /// Whether this category represents a user-initiated stop rather than a failure.
    #[must_use]
    pub fn is_user_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Whether an error of this category only affects one entry of a batch.
    #[must_use]
    pub fn is_per_entry(&self) -> bool {
        matches!(self, Self::Entry)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Input => "Invalid input",
            Self::Remote => "Remote API error",
            Self::Aborted => "Cancelled by user",
            Self::Entry => "File could not be fetched",
            Self::Archive => "Archive could not be created",
            Self::Network => "Network connectivity issue",
            Self::Io => "Filesystem error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Input => "Use a URL like https://github.com/owner/repo/tree/branch/path",
            Self::Remote => {
                "Check the repository exists; set a GitHub token if you hit the rate limit"
            }
            Self::Aborted => "Run the command again to start over",
            Self::Entry => "The rest of the archive was still written",
            Self::Archive => "Try again with fewer files or check free memory",
            Self::Network => "Check your internet connection and try again",
            Self::Io => "Check that the paths exist and are readable",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while enumerating, collecting, or archiving files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The repository reference could not be parsed into owner and repository.
    #[error("invalid GitHub URL: {0}")]
    InvalidReference(String),

    /// The listing API returned a non-success status.
    #[error("remote fetch failed with status {status}: {body}")]
    RemoteFetchFailed {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The cancellation flag was observed.
    #[error("operation aborted by user")]
    OperationAborted,

    /// The bytes of one archive entry could not be obtained.
    #[error("failed to fetch file: {path} ({message})")]
    EntryRetrievalFailed {
        /// Original path of the entry.
        path: String,
        /// Underlying cause.
        message: String,
    },

    /// An entry with the same name was already written to the archive.
    #[error("duplicate entry name in archive: {name}")]
    DuplicateEntry {
        /// Flattened name that collided.
        name: String,
    },

    /// The archive could not be serialized.
    #[error("failed to create zip file: {0}")]
    ArchiveSerializationFailed(String),

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
    },

    /// The API answered with a payload we could not understand.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an HTTP transport error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidReference(_) => ErrorCategory::Input,
            Error::RemoteFetchFailed { .. } => ErrorCategory::Remote,
            Error::OperationAborted => ErrorCategory::Aborted,
            Error::EntryRetrievalFailed { .. } => ErrorCategory::Entry,
            Error::DuplicateEntry { .. } => ErrorCategory::Entry,
            Error::ArchiveSerializationFailed(_) => ErrorCategory::Archive,
            Error::Http { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Network,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Whether this error is a user-initiated cancellation.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.category().is_user_abort()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::RemoteFetchFailed {
                status: code,
                body: String::new(),
            },
            other => Self::http(other.to_string()),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ArchiveSerializationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_is_not_a_failure_category() {
        assert!(ErrorCategory::Aborted.is_user_abort());
        assert!(!ErrorCategory::Remote.is_user_abort());
        assert!(!ErrorCategory::Network.is_user_abort());
        assert!(Error::OperationAborted.is_aborted());
    }

    #[test]
    fn test_entry_errors_are_per_entry() {
        let err = Error::EntryRetrievalFailed {
            path: "repo/a.txt".to_string(),
            message: "404".to_string(),
        };
        assert!(err.category().is_per_entry());

        let dup = Error::DuplicateEntry {
            name: "a.txt".to_string(),
        };
        assert!(dup.category().is_per_entry());
        assert!(!Error::ArchiveSerializationFailed("x".into()).category().is_per_entry());
    }

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Input.advice().is_empty());
        assert!(!ErrorCategory::Remote.advice().is_empty());
        assert!(!ErrorCategory::Aborted.advice().is_empty());
    }

    #[test]
    fn test_remote_fetch_failed_display() {
        let err = Error::RemoteFetchFailed {
            status: 403,
            body: "API rate limit exceeded".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("403"));
        assert!(display.contains("API rate limit exceeded"));
        assert_eq!(err.category(), ErrorCategory::Remote);
    }

    #[test]
    fn test_entry_failure_mentions_path() {
        let err = Error::EntryRetrievalFailed {
            path: "repo/src/main.rs".to_string(),
            message: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("repo/src/main.rs"));
    }

    #[test]
    fn test_error_io_constructor() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/some/path", io_err);
        match err {
            Error::Io { path, .. } => assert_eq!(path, PathBuf::from("/some/path")),
            _ => panic!("Expected Error::Io"),
        }
    }

    #[test]
    fn test_error_from_ureq_status() {
        let err: Error = ureq::Error::StatusCode(404).into();
        match err {
            Error::RemoteFetchFailed { status, .. } => assert_eq!(status, 404),
            _ => panic!("Expected Error::RemoteFetchFailed"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Network);
    }
}
