//! Port for the object store holding post images.

use async_trait::async_trait;

use crate::domain::BlobPath;

use super::define_port_error;

define_port_error! {
    /// Errors raised by blob store adapters.
    pub enum BlobStoreError {
        /// The store could not be reached.
        Unavailable { message: String } => ServiceUnavailable:
            "blob store unavailable: {message}",
        /// The store rejected the operation.
        Io { path: String, message: String } => InternalError:
            "blob store operation on {path} failed: {message}",
    }
}

/// Outcome of deleting a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobDeletion {
    /// The object existed and was removed.
    Deleted,
    /// There was nothing to remove.
    NotFound,
}

/// Port over blob storage. Only post deletion uses it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether an object exists at `path`.
    async fn exists(&self, path: &BlobPath) -> Result<bool, BlobStoreError>;

    /// Remove the object at `path`.
    async fn delete(&self, path: &BlobPath) -> Result<BlobDeletion, BlobStoreError>;
}
