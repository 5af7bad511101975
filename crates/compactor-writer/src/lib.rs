//! Durable storage for compacted batches
//!
//! Builds an OpenDAL operator from the storage section of `RuntimeConfig`
//! and writes each batch under a date-partitioned key that is never reused.

mod error;
mod partition;
mod storage;
mod write;

pub use error::{ErrorCode, Result, WriterError};
pub use partition::KeyGenerator;
pub use storage::build_operator;
pub use write::ObjectStoreWriter;
