//! Post creation, owner edits and timelines.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::cascade::{CascadeDeletion, PostDeletion, PostDeletionReport};
use crate::domain::ports::{BlobStore, LikeRepository, PostRepository, UserRepository};
use crate::domain::{Error, Post, PostContent, PostDraft, PostId, PostingWindow, User, UserId};

/// Post service.
#[derive(Clone)]
pub struct PostService<U, P, L, B> {
    posts: Arc<P>,
    cascade: CascadeDeletion<U, P, L, B>,
    window: PostingWindow,
    clock: Arc<dyn Clock>,
}

impl<U, P, L, B> PostService<U, P, L, B> {
    /// Create the service. Deletion goes through `cascade`.
    pub fn new(
        posts: Arc<P>,
        cascade: CascadeDeletion<U, P, L, B>,
        window: PostingWindow,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            cascade,
            window,
            clock,
        }
    }
}

impl<U, P, L, B> PostService<U, P, L, B>
where
    U: UserRepository,
    P: PostRepository,
    L: LikeRepository,
    B: BlobStore,
{
    async fn owned_post(&self, requester: &UserId, post_id: &PostId) -> Result<Post, Error> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("post {post_id} not found")))?;
        if !post.is_owned_by(requester) {
            return Err(Error::forbidden("only the author may change this post"));
        }
        Ok(post)
    }

    /// Whether the posting window is open on the service clock.
    pub fn posting_open(&self) -> bool {
        self.window.is_open_at(self.clock.utc())
    }

    /// Publish a post for `author`.
    ///
    /// Rejected with `Forbidden` outside the posting window. The author's
    /// current nickname is copied onto the post.
    pub async fn create_post(&self, author: &User, draft: PostDraft) -> Result<Post, Error> {
        let now = self.clock.utc();
        if !self.window.is_open_at(now) {
            return Err(Error::forbidden("posting is closed at this time"));
        }
        let post = Post {
            id: PostId::random(),
            user_id: *author.id(),
            nickname: author.nickname().clone(),
            content: draft.content,
            image_path: draft.image_path,
            like_count: 0,
            created_at: now,
        };
        self.posts.insert(&post).await?;
        info!(post_id = %post.id, user_id = %post.user_id, "post created");
        Ok(post)
    }

    /// Replace comment, shop name and price of a post the editor owns.
    pub async fn edit_post(
        &self,
        editor: UserId,
        post_id: PostId,
        content: PostContent,
    ) -> Result<Post, Error> {
        let mut post = self.owned_post(&editor, &post_id).await?;
        if !self.posts.update_content(&post_id, &content).await? {
            return Err(Error::not_found(format!("post {post_id} not found")));
        }
        post.content = content;
        Ok(post)
    }

    /// Delete a post the requester owns, with its likes and image.
    pub async fn delete_post(
        &self,
        requester: UserId,
        post_id: PostId,
    ) -> Result<PostDeletionReport, Error> {
        self.owned_post(&requester, &post_id).await?;
        match self.cascade.delete_post(post_id).await? {
            PostDeletion::Deleted(report) => Ok(report),
            PostDeletion::NotFound => Err(Error::not_found(format!("post {post_id} not found"))),
        }
    }

    /// All posts, newest first.
    pub async fn timeline(&self) -> Result<Vec<Post>, Error> {
        Ok(self.posts.list_recent().await?)
    }

    /// Posts by one user, newest first.
    pub async fn posts_by_user(&self, user_id: UserId) -> Result<Vec<Post>, Error> {
        Ok(self.posts.list_by_user(&user_id).await?)
    }
}
