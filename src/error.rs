/*!
 * Error types for the DCOR client
 */

use std::fmt;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DcorError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_REMOTE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

#[derive(Error, Debug)]
pub enum DcorError {
    /// Transport failure, non-success response or malformed payload
    #[error("Error accessing {target}: {reason}")]
    RemoteAccess { target: String, reason: String },

    /// Name is not part of the feature vocabulary at all
    #[error("Unknown feature name: '{0}'")]
    UnknownFeature(String),

    /// Name is a valid feature but this dataset does not provide it
    #[error("Feature '{0}' not found!")]
    FeatureNotFound(String),

    /// Trace channel is not in the dataset's trace list
    #[error("Trace '{0}' not found!")]
    TraceNotFound(String),

    /// Locator could not be resolved to scheme, host and path
    #[error("Malformed locator '{locator}': {reason}")]
    MalformedLocator { locator: String, reason: String },

    /// Client settings or dataset configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DcorError {
    /// Shorthand for a remote access failure
    pub fn remote(target: impl Into<String>, reason: impl Into<String>) -> Self {
        DcorError::RemoteAccess {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DcorError::RemoteAccess { .. } | DcorError::Io(_) => EXIT_REMOTE,
            _ => EXIT_USAGE,
        }
    }

    /// Absent-from-this-dataset conditions that callers are expected to skip
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DcorError::FeatureNotFound(_) | DcorError::TraceNotFound(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            DcorError::RemoteAccess { .. } => ErrorCategory::Network,
            DcorError::UnknownFeature(_) | DcorError::MalformedLocator { .. } => {
                ErrorCategory::Usage
            }
            DcorError::FeatureNotFound(_) | DcorError::TraceNotFound(_) => ErrorCategory::Lookup,
            DcorError::Config(_) => ErrorCategory::Configuration,
            DcorError::Io(_) => ErrorCategory::Io,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Remote service or transport errors
    Network,
    /// Caller errors (bad feature names, bad locators)
    Usage,
    /// Data not present in this dataset
    Lookup,
    /// Configuration errors
    Configuration,
    /// Local I/O errors
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Usage => write!(f, "usage"),
            ErrorCategory::Lookup => write!(f, "lookup"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

impl From<toml::de::Error> for DcorError {
    fn from(err: toml::de::Error) -> Self {
        DcorError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for DcorError {
    fn from(err: toml::ser::Error) -> Self {
        DcorError::Config(format!("TOML serialize error: {}", err))
    }
}
