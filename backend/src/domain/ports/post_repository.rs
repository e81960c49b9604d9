//! Port for the `posts` collection, including the like-count primitives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Post, PostContent, PostId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable:
            "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError:
            "post repository query failed: {message}",
    }
}

/// Port over the `posts` collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post.
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError>;

    /// Fetch a post by identifier.
    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// Every post, newest first.
    async fn list_recent(&self) -> Result<Vec<Post>, PostRepositoryError>;

    /// Posts owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Post>, PostRepositoryError>;

    /// Posts created in `[start, end)`, in no guaranteed order.
    async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Post>, PostRepositoryError>;

    /// Up to `limit` posts ordered by `like_count` descending, then oldest
    /// first.
    async fn list_most_liked(&self, limit: usize) -> Result<Vec<Post>, PostRepositoryError>;

    /// Replace the editable content. Returns `false` when the post is missing.
    async fn update_content(
        &self,
        id: &PostId,
        content: &PostContent,
    ) -> Result<bool, PostRepositoryError>;

    /// Atomically add `delta` to `like_count`, flooring at zero.
    ///
    /// Concurrent calls for one post are linearised by the store. Returns the
    /// new count, or `None` when the post does not exist.
    async fn increment_like_count(
        &self,
        id: &PostId,
        delta: i64,
    ) -> Result<Option<u32>, PostRepositoryError>;

    /// Overwrite `like_count`. Returns `false` when the post is missing.
    async fn set_like_count(&self, id: &PostId, count: u32) -> Result<bool, PostRepositoryError>;

    /// Delete a post record. Returns `false` when it was already gone.
    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError>;

    /// Number of posts.
    async fn count(&self) -> Result<u64, PostRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{Error, ErrorCode};
    use rstest::rstest;

    #[rstest]
    fn query_error_formats_message() {
        let err = PostRepositoryError::query("broken sql");
        assert!(err.to_string().contains("broken sql"));
    }

    #[rstest]
    fn query_error_maps_to_internal() {
        let err: Error = PostRepositoryError::query("broken sql").into();
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
