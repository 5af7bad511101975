//! Batch writes against an OpenDAL operator

use std::time::Instant;

use async_trait::async_trait;
use compactor_core::{BatchWriter, WriteReceipt};
use opendal::Operator;

use crate::error::WriterError;
use crate::partition::KeyGenerator;

/// Writes every batch as a new object; storage errors are not retried.
#[derive(Debug, Clone)]
pub struct ObjectStoreWriter {
    operator: Operator,
    keys: KeyGenerator,
}

impl ObjectStoreWriter {
    pub fn new(operator: Operator, prefix: impl Into<String>) -> Self {
        Self {
            operator,
            keys: KeyGenerator::new(prefix),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

#[async_trait]
impl BatchWriter for ObjectStoreWriter {
    async fn write(&self, blob: Vec<u8>, records: usize) -> compactor_core::Result<WriteReceipt> {
        let path = self.keys.next_key();
        let bytes = blob.len();
        let start = Instant::now();

        tracing::debug!(path = %path, records, bytes, "Writing batch");
        self.operator
            .write(&path, blob)
            .await
            .map_err(|e| WriterError::write_failure(path.as_str(), e.to_string()))?;

        Ok(WriteReceipt {
            path,
            bytes,
            records,
            elapsed: start.elapsed(),
        })
    }
}
