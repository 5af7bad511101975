//! Validation errors for runtime configuration.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting the pipeline cannot run without is absent
    #[error("missing required setting '{field}' (hint: {hint})")]
    MissingField {
        field: &'static str,
        hint: &'static str,
    },

    /// A setting is present but unusable
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingField { field, hint }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
