//! Like ledger: one like per (user, post) and a counter that follows it.
//!
//! The Like set is authoritative and `Post::like_count` caches its size. A
//! like is written first and the counter adjusted second through the store's
//! atomic increment, so concurrent toggles on one post never lose an update.
//! The two writes are not one transaction: if the counter write fails the
//! error is returned and the counter stays off by one until
//! [`LikeLedger::reconcile`] runs.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::ports::{LikeInsertion, LikeRepository, PostRepository};
use crate::domain::{Error, Like, LikeKey, PostId, UserId};

/// Result of [`LikeLedger::add_like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LikeOutcome {
    /// A like was recorded; carries the post's new count.
    Added {
        /// Count after the increment.
        like_count: u32,
    },
    /// The pair was already liked; nothing changed.
    AlreadyLiked,
}

/// Result of [`LikeLedger::remove_like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlikeOutcome {
    /// The like was removed; carries the post's new count.
    Removed {
        /// Count after the decrement.
        like_count: u32,
    },
    /// There was no like to remove; nothing changed.
    NotLiked,
}

/// Result of [`LikeLedger::toggle_like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    /// The pair was not liked and now is.
    Liked(LikeOutcome),
    /// The pair was liked and now is not.
    Unliked(UnlikeOutcome),
}

/// Result of [`LikeLedger::reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Post that was checked.
    pub post_id: PostId,
    /// Counter value before the pass.
    pub previous: u32,
    /// Number of Like records found, now stored as the counter.
    pub corrected: u32,
}

impl Reconciliation {
    /// Whether the counter had drifted from the ledger.
    pub fn drifted(&self) -> bool {
        self.previous != self.corrected
    }
}

/// Like ledger service.
#[derive(Clone)]
pub struct LikeLedger<P, L> {
    posts: Arc<P>,
    likes: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<P, L> LikeLedger<P, L> {
    /// Create a ledger over the given repositories.
    pub fn new(posts: Arc<P>, likes: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            posts,
            likes,
            clock,
        }
    }
}

impl<P, L> LikeLedger<P, L>
where
    P: PostRepository,
    L: LikeRepository,
{
    fn post_not_found(post_id: &PostId) -> Error {
        Error::not_found(format!("post {post_id} not found"))
    }

    /// Whether `user_id` has liked `post_id`.
    pub async fn has_liked(&self, user_id: UserId, post_id: PostId) -> Result<bool, Error> {
        Ok(self.likes.exists(&LikeKey::new(user_id, post_id)).await?)
    }

    /// Record a like and increment the post's counter.
    ///
    /// Idempotent: a second call for the same pair, sequential or
    /// concurrent, reports [`LikeOutcome::AlreadyLiked`] and leaves the count
    /// alone because the composite key admits one record only.
    pub async fn add_like(&self, user_id: UserId, post_id: PostId) -> Result<LikeOutcome, Error> {
        let key = LikeKey::new(user_id, post_id);
        if self.likes.exists(&key).await? {
            return Ok(LikeOutcome::AlreadyLiked);
        }
        if self.posts.find_by_id(&post_id).await?.is_none() {
            return Err(Self::post_not_found(&post_id));
        }

        let like = Like::new(key, self.clock.utc());
        if self.likes.insert(&like).await? == LikeInsertion::AlreadyExists {
            debug!(%key, "concurrent like already recorded");
            return Ok(LikeOutcome::AlreadyLiked);
        }

        match self.posts.increment_like_count(&post_id, 1).await {
            Ok(Some(like_count)) => Ok(LikeOutcome::Added { like_count }),
            Ok(None) => {
                // The post went away between the existence check and the
                // increment; drop the like so it does not dangle.
                self.likes.delete(&key).await?;
                Err(Self::post_not_found(&post_id))
            }
            Err(error) => {
                warn!(%key, %error, "like recorded but like_count not incremented");
                Err(error.into())
            }
        }
    }

    /// Remove a like and decrement the post's counter, floored at zero.
    pub async fn remove_like(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<UnlikeOutcome, Error> {
        let key = LikeKey::new(user_id, post_id);
        // Only the caller whose delete removed the record adjusts the count.
        if !self.likes.delete(&key).await? {
            return Ok(UnlikeOutcome::NotLiked);
        }

        match self.posts.increment_like_count(&post_id, -1).await {
            Ok(Some(like_count)) => Ok(UnlikeOutcome::Removed { like_count }),
            Ok(None) => Err(Self::post_not_found(&post_id)),
            Err(error) => {
                warn!(%key, %error, "like removed but like_count not decremented");
                Err(error.into())
            }
        }
    }

    /// Like when not yet liked, otherwise unlike.
    pub async fn toggle_like(&self, user_id: UserId, post_id: PostId) -> Result<LikeToggle, Error> {
        if self.has_liked(user_id, post_id).await? {
            self.remove_like(user_id, post_id)
                .await
                .map(LikeToggle::Unliked)
        } else {
            self.add_like(user_id, post_id).await.map(LikeToggle::Liked)
        }
    }

    /// Recompute a post's `like_count` from its Like records.
    ///
    /// Likes written while the pass runs may be missed; running it again
    /// converges once traffic on the post settles.
    pub async fn reconcile(&self, post_id: PostId) -> Result<Reconciliation, Error> {
        let Some(post) = self.posts.find_by_id(&post_id).await? else {
            return Err(Self::post_not_found(&post_id));
        };
        let ledger_count = self.likes.count_for_post(&post_id).await?;
        let corrected = u32::try_from(ledger_count)
            .map_err(|_| Error::internal("like count exceeds supported range"))?;

        let reconciliation = Reconciliation {
            post_id,
            previous: post.like_count,
            corrected,
        };
        if reconciliation.drifted() {
            if !self.posts.set_like_count(&post_id, corrected).await? {
                return Err(Self::post_not_found(&post_id));
            }
            info!(
                %post_id,
                previous = reconciliation.previous,
                corrected,
                "like_count reconciled"
            );
        }
        Ok(reconciliation)
    }
}
