//! Lunch posts and their editable content.
//!
//! A [`Post`] carries two denormalized values: the author's nickname as it
//! was when the post was written, and `like_count`, a cache of how many
//! [`Like`](crate::domain::Like) records reference the post. The Like set is
//! authoritative; only the like ledger and the cascade mutate the counter.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Nickname, UserId};

/// Maximum comment length in characters.
pub const COMMENT_MAX: usize = 500;
/// Maximum shop name length in characters.
pub const SHOP_NAME_MAX: usize = 100;

/// Validation errors raised while building post values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    /// The identifier was not a UUID.
    #[error("post id must be a valid UUID")]
    InvalidId,
    /// The comment was blank.
    #[error("comment must not be empty")]
    EmptyComment,
    /// The comment exceeded [`COMMENT_MAX`].
    #[error("comment must be at most {max} characters")]
    CommentTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The shop name exceeded [`SHOP_NAME_MAX`].
    #[error("shop name must be at most {max} characters")]
    ShopNameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The blob path was empty, absolute or escaped its root.
    #[error("image path must be a non-empty relative path without `..` segments")]
    InvalidBlobPath,
}

/// Stable post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostId(Uuid);

impl PostId {
    /// Parse a [`PostId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, PostValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| PostValidationError::InvalidId)
    }

    /// Generate a new random [`PostId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<PostId> for String {
    fn from(value: PostId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for PostId {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Relative key of an image object in blob storage.
///
/// Each path is owned by exactly one post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobPath(String);

impl BlobPath {
    /// Validate and construct a [`BlobPath`].
    ///
    /// # Examples
    /// ```
    /// use lunchbox::domain::BlobPath;
    ///
    /// assert!(BlobPath::new("images/ramen.jpg").is_ok());
    /// assert!(BlobPath::new("../etc/passwd").is_err());
    /// ```
    pub fn new(path: impl Into<String>) -> Result<Self, PostValidationError> {
        let path = path.into();
        let escapes = path.split('/').any(|segment| segment == "..");
        if path.trim().is_empty() || path.starts_with('/') || escapes {
            return Err(PostValidationError::InvalidBlobPath);
        }
        Ok(Self(path))
    }
}

impl AsRef<str> for BlobPath {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<BlobPath> for String {
    fn from(value: BlobPath) -> Self {
        value.0
    }
}

impl TryFrom<String> for BlobPath {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// The owner-editable part of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    /// Free-text comment.
    pub comment: String,
    /// Where the lunch came from.
    pub shop_name: Option<String>,
    /// What it cost, in whole currency units.
    pub price: Option<u32>,
}

impl PostContent {
    /// Validate comment and shop name, trimming surrounding whitespace.
    ///
    /// A blank shop name is treated as absent.
    pub fn new(
        comment: impl Into<String>,
        shop_name: Option<String>,
        price: Option<u32>,
    ) -> Result<Self, PostValidationError> {
        let comment = comment.into().trim().to_owned();
        if comment.is_empty() {
            return Err(PostValidationError::EmptyComment);
        }
        if comment.chars().count() > COMMENT_MAX {
            return Err(PostValidationError::CommentTooLong { max: COMMENT_MAX });
        }
        let shop_name = shop_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        if shop_name
            .as_deref()
            .is_some_and(|name| name.chars().count() > SHOP_NAME_MAX)
        {
            return Err(PostValidationError::ShopNameTooLong { max: SHOP_NAME_MAX });
        }
        Ok(Self {
            comment,
            shop_name,
            price,
        })
    }
}

/// Input for creating a post; the author is supplied separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    /// Comment, shop and price.
    pub content: PostContent,
    /// Blob key of an already uploaded image; every post carries a photo.
    pub image_path: BlobPath,
}

/// A lunch post.
///
/// # Examples
///
/// ```
/// # use lunchbox::domain::{BlobPath, Nickname, Post, PostContent, PostId, UserId};
/// # use chrono::Utc;
/// let post = Post {
///     id: PostId::random(),
///     user_id: UserId::random(),
///     nickname: Nickname::new("alice").expect("valid nickname"),
///     content: PostContent::new("Ramen", None, Some(950)).expect("valid content"),
///     image_path: BlobPath::new("images/ramen.jpg").expect("valid path"),
///     like_count: 0,
///     created_at: Utc::now(),
/// };
///
/// assert_eq!(post.like_count, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique identifier.
    pub id: PostId,
    /// Owning user.
    pub user_id: UserId,
    /// Author nickname captured at post time; not kept in sync.
    pub nickname: Nickname,
    /// Editable content.
    #[serde(flatten)]
    pub content: PostContent,
    /// Image object owned by this post.
    pub image_path: BlobPath,
    /// Cached cardinality of the post's Like set.
    pub like_count: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Whether `user_id` owns this post.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }
}
