//! Like records keyed by (user, post).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PostId, UserId};

/// Composite identity of a like.
///
/// At most one [`Like`] exists per key. Stores that address documents by a
/// single string use [`LikeKey::document_id`], which is deterministic, so a
/// repeated insert collides instead of creating a second record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeKey {
    /// User who liked.
    pub user_id: UserId,
    /// Post that was liked.
    pub post_id: PostId,
}

impl LikeKey {
    /// Build a key from its parts.
    pub fn new(user_id: UserId, post_id: PostId) -> Self {
        Self { user_id, post_id }
    }

    /// Single-string document key, `"{user_id}_{post_id}"`.
    ///
    /// # Examples
    /// ```
    /// use lunchbox::domain::{LikeKey, PostId, UserId};
    ///
    /// let user = UserId::new("11111111-1111-1111-1111-111111111111").unwrap();
    /// let post = PostId::new("22222222-2222-2222-2222-222222222222").unwrap();
    /// assert_eq!(
    ///     LikeKey::new(user, post).document_id(),
    ///     "11111111-1111-1111-1111-111111111111_22222222-2222-2222-2222-222222222222",
    /// );
    /// ```
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.user_id, self.post_id)
    }
}

impl fmt::Display for LikeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.user_id, self.post_id)
    }
}

/// A single like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    /// Composite identity.
    #[serde(flatten)]
    pub key: LikeKey,
    /// When the like was given.
    pub created_at: DateTime<Utc>,
}

impl Like {
    /// Build a like stamped at `created_at`.
    pub fn new(key: LikeKey, created_at: DateTime<Utc>) -> Self {
        Self { key, created_at }
    }
}
