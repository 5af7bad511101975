//! Error taxonomy for a compaction run.
//!
//! Every variant except notification failures ends the execution. Recovery
//! relies on the queue redelivering unacknowledged messages and on an operator
//! re-triggering the chain from the first invocation.

use thiserror::Error;

/// Error codes for programmatic handling and log searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Configuration missing or invalid
    E001Configuration,
    /// E002: Storage write failed
    E002IoFailure,
    /// E003: Continuation could not be dispatched
    E003SchedulingFailure,
    /// E004: Message body could not be decoded
    E004MalformedMessage,
    /// E005: Queue receive or delete failed
    E005QueueFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001Configuration => "E001",
            Self::E002IoFailure => "E002",
            Self::E003SchedulingFailure => "E003",
            Self::E004MalformedMessage => "E004",
            Self::E005QueueFailure => "E005",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CompactorError {
    /// Required destination missing; raised before any side effect
    #[error("[{code}] Invalid configuration: {message}")]
    Configuration { code: ErrorCode, message: String },

    /// Storage write failed; the accumulated batch was not persisted
    #[error("[{code}] Failed to write batch to '{path}': {message}")]
    IoFailure {
        code: ErrorCode,
        path: String,
        message: String,
    },

    /// The continuation was not delivered; the remaining backlog is stranded
    #[error("[{code}] Failed to schedule invocation {invocation}: {message}")]
    SchedulingFailure {
        code: ErrorCode,
        invocation: u32,
        message: String,
    },

    #[error("[{code}] Malformed message '{message_id}': {reason}")]
    MalformedMessage {
        code: ErrorCode,
        message_id: String,
        reason: String,
    },

    #[error("[{code}] Queue {operation} failed: {message}")]
    QueueFailure {
        code: ErrorCode,
        operation: &'static str,
        message: String,
    },
}

impl CompactorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            code: ErrorCode::E001Configuration,
            message: message.into(),
        }
    }

    pub fn io_failure(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IoFailure {
            code: ErrorCode::E002IoFailure,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn scheduling_failure(invocation: u32, message: impl Into<String>) -> Self {
        Self::SchedulingFailure {
            code: ErrorCode::E003SchedulingFailure,
            invocation,
            message: message.into(),
        }
    }

    pub fn malformed(message_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            code: ErrorCode::E004MalformedMessage,
            message_id: message_id.into(),
            reason: reason.into(),
        }
    }

    pub fn queue_failure(operation: &'static str, message: impl Into<String>) -> Self {
        Self::QueueFailure {
            code: ErrorCode::E005QueueFailure,
            operation,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { code, .. }
            | Self::IoFailure { code, .. }
            | Self::SchedulingFailure { code, .. }
            | Self::MalformedMessage { code, .. }
            | Self::QueueFailure { code, .. } => *code,
        }
    }
}

impl From<compactor_config::ConfigError> for CompactorError {
    fn from(err: compactor_config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CompactorError>;
