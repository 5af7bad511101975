//! Error types for the storage writer

use compactor_core::CompactorError;
use thiserror::Error;

/// Error codes for programmatic handling
///
/// Numbered to match the `CompactorError` codes they convert into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Storage configuration missing or invalid
    E001InvalidConfig,
    /// E002: Object write failed
    E002WriteFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidConfig => "E001",
            Self::E002WriteFailure => "E002",
        }
    }
}

#[derive(Debug, Error)]
pub enum WriterError {
    /// Operator could not be built from the storage section
    #[error("[{code}] Invalid storage configuration: {message}")]
    InvalidConfig { code: &'static str, message: String },

    /// The object store rejected the write
    #[error("[{code}] Write to '{path}' failed: {message}")]
    WriteFailure {
        code: &'static str,
        path: String,
        message: String,
    },
}

impl WriterError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E001InvalidConfig.as_str(),
            message: message.into(),
        }
    }

    pub fn write_failure(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailure {
            code: ErrorCode::E002WriteFailure.as_str(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<WriterError> for CompactorError {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::InvalidConfig { message, .. } => CompactorError::configuration(message),
            WriterError::WriteFailure { path, message, .. } => {
                CompactorError::io_failure(path, message)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WriterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use compactor_core::ErrorCode as CoreCode;

    #[test]
    fn write_failures_become_io_failures() {
        let err: CompactorError = WriterError::write_failure("daily/a.txt", "denied").into();
        assert_eq!(err.code(), CoreCode::E002IoFailure);
        assert!(err.to_string().contains("daily/a.txt"));

        let err: CompactorError = WriterError::invalid_config("no bucket").into();
        assert_eq!(err.code(), CoreCode::E001Configuration);
    }
}
