//! Storage operator construction
//!
//! The operator is built once per process by the caller and shared through
//! the writer; nothing is cached globally.

use compactor_core::compactor_config::{StorageBackend, StorageConfig};
use opendal::Operator;

use crate::error::{Result, WriterError};

/// Build an OpenDAL operator for the configured backend.
pub fn build_operator(config: &StorageConfig) -> Result<Operator> {
    let operator = match config.backend {
        StorageBackend::Fs => {
            let fs = config.fs.as_ref().ok_or_else(|| {
                WriterError::invalid_config("fs config required for filesystem backend")
            })?;

            let fs_builder = opendal::services::Fs::default().root(&fs.path);
            Operator::new(fs_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!(
                        "Failed to create filesystem operator: {}",
                        e
                    ))
                })?
                .finish()
        }
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                WriterError::invalid_config("s3 config required for S3 backend")
            })?;

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&s3.bucket)
                .region(&s3.region);

            if let Some(endpoint) = &s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }

            Operator::new(s3_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!("Failed to create S3 operator: {}", e))
                })?
                .finish()
        }
    };

    tracing::debug!(backend = %config.backend, prefix = %config.prefix, "Storage operator initialized");
    Ok(operator)
}
