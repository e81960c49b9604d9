//! Port for the `likes` collection.

use async_trait::async_trait;

use crate::domain::{Like, LikeKey, PostId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by like repository adapters.
    pub enum LikeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable:
            "like repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError:
            "like repository query failed: {message}",
    }
}

/// Result of inserting a like under its composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeInsertion {
    /// A new record was written.
    Inserted,
    /// A record with the same key already existed; nothing was written.
    AlreadyExists,
}

/// Port over the `likes` collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Whether a like exists for `key`.
    async fn exists(&self, key: &LikeKey) -> Result<bool, LikeRepositoryError>;

    /// Insert a like; a second insert for the same key never succeeds.
    async fn insert(&self, like: &Like) -> Result<LikeInsertion, LikeRepositoryError>;

    /// Delete one like. Returns `false` when it was already gone.
    async fn delete(&self, key: &LikeKey) -> Result<bool, LikeRepositoryError>;

    /// Likes referencing `post_id`.
    async fn list_for_post(&self, post_id: &PostId) -> Result<Vec<Like>, LikeRepositoryError>;

    /// Likes given by `user_id`.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Like>, LikeRepositoryError>;

    /// Delete every listed like as one all-or-nothing write.
    ///
    /// Keys that no longer exist are ignored. Returns how many were removed.
    async fn delete_batch(&self, keys: &[LikeKey]) -> Result<u64, LikeRepositoryError>;

    /// Delete every like `user_id` gave and decrement the `like_count` of
    /// each post those likes referenced, in one all-or-nothing write.
    ///
    /// Decrements are taken from the records this call actually removed, so
    /// a like withdrawn concurrently is never subtracted twice. Counters are
    /// floored at zero. Returns how many likes were removed.
    async fn withdraw_all_by_user(&self, user_id: &UserId) -> Result<u64, LikeRepositoryError>;

    /// Number of likes referencing `post_id`.
    async fn count_for_post(&self, post_id: &PostId) -> Result<u64, LikeRepositoryError>;

    /// Number of likes overall.
    async fn count(&self) -> Result<u64, LikeRepositoryError>;
}
