//! Cascade deletion of posts and users.
//!
//! Deletions span three collections and the blob store, none of which share
//! a transaction. Each cascade is therefore an ordered sequence: blob and
//! likes before their post, posts before their user. Steps already applied
//! are kept when a later one fails, and every step re-reads current state so
//! the whole cascade can simply be run again.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    BlobDeletion, BlobStore, LikeRepository, PostRepository, UserRepository,
};
use crate::domain::{BlobPath, Error, LikeKey, PostId, UserId};

/// What happened to a post's image during deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BlobCleanup {
    /// The image was removed.
    Removed,
    /// The image was already gone.
    AlreadyAbsent,
    /// The blob store failed; the post was deleted regardless.
    Failed {
        /// Store error text.
        message: String,
    },
}

/// Summary of a completed post deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeletionReport {
    /// Deleted post.
    pub post_id: PostId,
    /// Like records removed alongside it.
    pub likes_removed: u64,
    /// Image cleanup result.
    pub blob: BlobCleanup,
}

/// Result of [`CascadeDeletion::delete_post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostDeletion {
    /// The post and its dependents are gone.
    Deleted(PostDeletionReport),
    /// No such post.
    NotFound,
}

/// Step of a user cascade, reported when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStage {
    /// Deleting the user's posts.
    Posts,
    /// Withdrawing likes the user gave, with their counter decrements.
    LikesGiven,
    /// Deleting the user record.
    User,
}

impl fmt::Display for CascadeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Posts => "posts",
            Self::LikesGiven => "likes_given",
            Self::User => "user",
        };
        f.write_str(label)
    }
}

/// Summary of a completed user deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletionReport {
    /// Deleted user.
    pub user_id: UserId,
    /// Posts removed, each with its own report.
    pub posts: Vec<PostDeletionReport>,
    /// Likes the user had given to other posts.
    pub likes_given_removed: u64,
    /// False when the user record was already gone, e.g. on a retry.
    pub user_record_removed: bool,
}

/// Cascade deletion engine.
#[derive(Clone)]
pub struct CascadeDeletion<U, P, L, B> {
    users: Arc<U>,
    posts: Arc<P>,
    likes: Arc<L>,
    blobs: Arc<B>,
}

impl<U, P, L, B> CascadeDeletion<U, P, L, B> {
    /// Create an engine over the given stores.
    pub fn new(users: Arc<U>, posts: Arc<P>, likes: Arc<L>, blobs: Arc<B>) -> Self {
        Self {
            users,
            posts,
            likes,
            blobs,
        }
    }
}

impl<U, P, L, B> CascadeDeletion<U, P, L, B>
where
    U: UserRepository,
    P: PostRepository,
    L: LikeRepository,
    B: BlobStore,
{
    /// Delete a post, its likes and its image.
    ///
    /// Blob failures are logged and reported in the outcome but never fail
    /// the deletion. Like and post store failures are returned unchanged.
    pub async fn delete_post(&self, post_id: PostId) -> Result<PostDeletion, Error> {
        let Some(post) = self.posts.find_by_id(&post_id).await? else {
            return Ok(PostDeletion::NotFound);
        };

        let blob = self.release_blob(&post_id, &post.image_path).await;

        let keys: Vec<LikeKey> = self
            .likes
            .list_for_post(&post_id)
            .await?
            .into_iter()
            .map(|like| like.key)
            .collect();
        let likes_removed = if keys.is_empty() {
            0
        } else {
            self.likes.delete_batch(&keys).await?
        };

        if !self.posts.delete(&post_id).await? {
            debug!(%post_id, "post record already removed");
        }
        info!(%post_id, likes_removed, "post deleted");

        Ok(PostDeletion::Deleted(PostDeletionReport {
            post_id,
            likes_removed,
            blob,
        }))
    }

    async fn release_blob(&self, post_id: &PostId, path: &BlobPath) -> BlobCleanup {
        let deletion = match self.blobs.exists(path).await {
            Ok(false) => Ok(BlobDeletion::NotFound),
            Ok(true) => self.blobs.delete(path).await,
            Err(error) => Err(error),
        };
        match deletion {
            Ok(BlobDeletion::Deleted) => BlobCleanup::Removed,
            Ok(BlobDeletion::NotFound) => BlobCleanup::AlreadyAbsent,
            Err(error) => {
                warn!(%post_id, %path, %error, "image cleanup failed; deleting post anyway");
                BlobCleanup::Failed {
                    message: error.to_string(),
                }
            }
        }
    }

    /// Delete a user with their posts, the likes they gave and the counts
    /// those likes contributed.
    ///
    /// The likes the user gave are withdrawn in one store write that also
    /// decrements every counter they contributed to, so a failure leaves both
    /// untouched for the retry. A failure at any stage returns
    /// [`ErrorCode::PartialCascadeFailure`](crate::domain::ErrorCode) with
    /// details `{ userId, stage, postsDeleted, cause }`; earlier stages stay
    /// applied.
    pub async fn delete_user(&self, user_id: UserId) -> Result<UserDeletionReport, Error> {
        let mut posts = Vec::new();
        let fail = |stage: CascadeStage, posts_deleted: usize, cause: Error| {
            warn!(%user_id, %stage, posts_deleted, %cause, "user cascade stopped");
            Error::partial_cascade_failure(format!(
                "deleting user {user_id} stopped at stage {stage}: {cause}"
            ))
            .with_details(json!({
                "userId": user_id,
                "stage": stage,
                "postsDeleted": posts_deleted,
                "cause": cause,
            }))
        };

        let owned = self
            .posts
            .list_by_user(&user_id)
            .await
            .map_err(|error| fail(CascadeStage::Posts, 0, error.into()))?;
        for post in owned {
            match self.delete_post(post.id).await {
                Ok(PostDeletion::Deleted(report)) => posts.push(report),
                Ok(PostDeletion::NotFound) => {}
                Err(error) => return Err(fail(CascadeStage::Posts, posts.len(), error)),
            }
        }

        let likes_given_removed = self
            .likes
            .withdraw_all_by_user(&user_id)
            .await
            .map_err(|error| fail(CascadeStage::LikesGiven, posts.len(), error.into()))?;

        let user_record_removed = self
            .users
            .delete(&user_id)
            .await
            .map_err(|error| fail(CascadeStage::User, posts.len(), error.into()))?;

        info!(
            %user_id,
            posts_deleted = posts.len(),
            likes_given_removed,
            user_record_removed,
            "user deleted"
        );
        Ok(UserDeletionReport {
            user_id,
            posts,
            likes_given_removed,
            user_record_removed,
        })
    }
}

#[cfg(test)]
mod tests;
