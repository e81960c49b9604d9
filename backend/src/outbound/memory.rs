//! In-memory store and blob store for tests and local experiments.
//!
//! State sits behind one mutex, so each port call is atomic with respect to
//! every other call, like a single-row statement in PostgreSQL. Individual
//! operations can be made to fail to exercise partial-failure paths.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    BlobDeletion, BlobStore, BlobStoreError, LikeInsertion, LikeRepository,
    LikeRepositoryError, PostRepository, PostRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    BlobPath, Like, LikeKey, Nickname, PasswordHash, Post, PostContent, PostId, User, UserId,
};

/// Store operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `PostRepository::increment_like_count`.
    IncrementLikeCount,
    /// `LikeRepository::delete_batch`.
    DeleteLikeBatch,
    /// `LikeRepository::withdraw_all_by_user`.
    WithdrawLikesByUser,
    /// `UserRepository::delete`.
    DeleteUser,
}

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    likes: BTreeMap<LikeKey, Like>,
    failures: HashSet<FailurePoint>,
}

impl State {
    fn check(&self, point: FailurePoint) -> Result<(), String> {
        if self.failures.contains(&point) {
            return Err(format!("injected failure at {point:?}"));
        }
        Ok(())
    }
}

/// Users, posts and likes held in memory.
#[derive(Default)]
pub struct InMemoryLunchStore {
    state: Mutex<State>,
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn apply_delta(current: u32, delta: i64) -> u32 {
    let next = i64::from(current).saturating_add(delta).max(0);
    u32::try_from(next).unwrap_or(u32::MAX)
}

impl InMemoryLunchStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }

    /// Make `point` fail until [`InMemoryLunchStore::clear_failures`].
    pub fn fail_on(&self, point: FailurePoint) {
        if let Ok(mut state) = self.state() {
            state.failures.insert(point);
        }
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state() {
            state.failures.clear();
        }
    }

    /// Overwrite a post's counter without touching likes, to simulate drift.
    pub fn force_like_count(&self, post_id: &PostId, count: u32) {
        if let Ok(mut state) = self.state() {
            if let Some(post) = state.posts.get_mut(post_id) {
                post.like_count = count;
            }
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryLunchStore {
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.state().map_err(UserRepositoryError::query)?;
        if state
            .users
            .values()
            .any(|existing| existing.nickname() == user.nickname())
        {
            return Err(UserRepositoryError::duplicate_nickname(
                user.nickname().as_ref(),
            ));
        }
        state.users.insert(*user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.state().map_err(UserRepositoryError::query)?;
        Ok(state.users.get(id).cloned())
    }

    async fn find_by_nickname(
        &self,
        nickname: &Nickname,
    ) -> Result<Option<User>, UserRepositoryError> {
        let state = self.state().map_err(UserRepositoryError::query)?;
        Ok(state
            .users
            .values()
            .find(|user| user.nickname() == nickname)
            .cloned())
    }

    async fn list_excluding(
        &self,
        excluded: &Nickname,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let state = self.state().map_err(UserRepositoryError::query)?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| user.nickname() != excluded)
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(users)
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserRepositoryError> {
        let mut state = self.state().map_err(UserRepositoryError::query)?;
        let Some(user) = state.users.remove(id) else {
            return Ok(false);
        };
        state
            .users
            .insert(*id, user.with_password_hash(password_hash.clone()));
        Ok(true)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut state = self.state().map_err(UserRepositoryError::query)?;
        state
            .check(FailurePoint::DeleteUser)
            .map_err(UserRepositoryError::connection)?;
        Ok(state.users.remove(id).is_some())
    }

    async fn count(&self) -> Result<u64, UserRepositoryError> {
        let state = self.state().map_err(UserRepositoryError::query)?;
        Ok(state.users.len() as u64)
    }
}

#[async_trait]
impl PostRepository for InMemoryLunchStore {
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut state = self.state().map_err(PostRepositoryError::query)?;
        state.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        let state = self.state().map_err(PostRepositoryError::query)?;
        Ok(state.posts.get(id).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<Post>, PostRepositoryError> {
        let state = self.state().map_err(PostRepositoryError::query)?;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        let state = self.state().map_err(PostRepositoryError::query)?;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| post.is_owned_by(user_id))
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let state = self.state().map_err(PostRepositoryError::query)?;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| start <= post.created_at && post.created_at < end)
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn list_most_liked(&self, limit: usize) -> Result<Vec<Post>, PostRepositoryError> {
        let state = self.state().map_err(PostRepositoryError::query)?;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| {
            b.like_count
                .cmp(&a.like_count)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        posts.truncate(limit);
        Ok(posts)
    }

    async fn update_content(
        &self,
        id: &PostId,
        content: &PostContent,
    ) -> Result<bool, PostRepositoryError> {
        let mut state = self.state().map_err(PostRepositoryError::query)?;
        Ok(state
            .posts
            .get_mut(id)
            .map(|post| post.content = content.clone())
            .is_some())
    }

    async fn increment_like_count(
        &self,
        id: &PostId,
        delta: i64,
    ) -> Result<Option<u32>, PostRepositoryError> {
        let mut state = self.state().map_err(PostRepositoryError::query)?;
        state
            .check(FailurePoint::IncrementLikeCount)
            .map_err(PostRepositoryError::connection)?;
        Ok(state.posts.get_mut(id).map(|post| {
            post.like_count = apply_delta(post.like_count, delta);
            post.like_count
        }))
    }

    async fn set_like_count(&self, id: &PostId, count: u32) -> Result<bool, PostRepositoryError> {
        let mut state = self.state().map_err(PostRepositoryError::query)?;
        Ok(state
            .posts
            .get_mut(id)
            .map(|post| post.like_count = count)
            .is_some())
    }

    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError> {
        let mut state = self.state().map_err(PostRepositoryError::query)?;
        Ok(state.posts.remove(id).is_some())
    }

    async fn count(&self) -> Result<u64, PostRepositoryError> {
        let state = self.state().map_err(PostRepositoryError::query)?;
        Ok(state.posts.len() as u64)
    }
}

#[async_trait]
impl LikeRepository for InMemoryLunchStore {
    async fn exists(&self, key: &LikeKey) -> Result<bool, LikeRepositoryError> {
        let state = self.state().map_err(LikeRepositoryError::query)?;
        Ok(state.likes.contains_key(key))
    }

    async fn insert(&self, like: &Like) -> Result<LikeInsertion, LikeRepositoryError> {
        let mut state = self.state().map_err(LikeRepositoryError::query)?;
        if state.likes.contains_key(&like.key) {
            return Ok(LikeInsertion::AlreadyExists);
        }
        state.likes.insert(like.key, like.clone());
        Ok(LikeInsertion::Inserted)
    }

    async fn delete(&self, key: &LikeKey) -> Result<bool, LikeRepositoryError> {
        let mut state = self.state().map_err(LikeRepositoryError::query)?;
        Ok(state.likes.remove(key).is_some())
    }

    async fn list_for_post(&self, post_id: &PostId) -> Result<Vec<Like>, LikeRepositoryError> {
        let state = self.state().map_err(LikeRepositoryError::query)?;
        Ok(state
            .likes
            .values()
            .filter(|like| like.key.post_id == *post_id)
            .cloned()
            .collect())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Like>, LikeRepositoryError> {
        let state = self.state().map_err(LikeRepositoryError::query)?;
        Ok(state
            .likes
            .values()
            .filter(|like| like.key.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn delete_batch(&self, keys: &[LikeKey]) -> Result<u64, LikeRepositoryError> {
        let mut state = self.state().map_err(LikeRepositoryError::query)?;
        state
            .check(FailurePoint::DeleteLikeBatch)
            .map_err(LikeRepositoryError::connection)?;
        let removed = keys
            .iter()
            .filter(|key| state.likes.remove(*key).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn withdraw_all_by_user(&self, user_id: &UserId) -> Result<u64, LikeRepositoryError> {
        let mut state = self.state().map_err(LikeRepositoryError::query)?;
        state
            .check(FailurePoint::WithdrawLikesByUser)
            .map_err(LikeRepositoryError::connection)?;
        let given: Vec<LikeKey> = state
            .likes
            .keys()
            .filter(|key| key.user_id == *user_id)
            .copied()
            .collect();
        for key in &given {
            state.likes.remove(key);
            if let Some(post) = state.posts.get_mut(&key.post_id) {
                post.like_count = apply_delta(post.like_count, -1);
            }
        }
        Ok(given.len() as u64)
    }

    async fn count_for_post(&self, post_id: &PostId) -> Result<u64, LikeRepositoryError> {
        let state = self.state().map_err(LikeRepositoryError::query)?;
        Ok(state
            .likes
            .keys()
            .filter(|key| key.post_id == *post_id)
            .count() as u64)
    }

    async fn count(&self) -> Result<u64, LikeRepositoryError> {
        let state = self.state().map_err(LikeRepositoryError::query)?;
        Ok(state.likes.len() as u64)
    }
}

/// Blob store over an in-memory set of keys.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<BTreeSet<String>>,
    unavailable: Mutex<bool>,
}

impl InMemoryBlobStore {
    /// Empty blob store.
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> Result<MutexGuard<'_, BTreeSet<String>>, BlobStoreError> {
        self.objects
            .lock()
            .map_err(|_| BlobStoreError::unavailable("in-memory blob lock poisoned"))
    }

    /// Store an object at `path`.
    pub fn put(&self, path: &BlobPath) {
        if let Ok(mut objects) = self.objects() {
            objects.insert(path.as_ref().to_owned());
        }
    }

    /// Whether an object is stored at `path`.
    pub fn contains(&self, path: &BlobPath) -> bool {
        self.objects()
            .map(|objects| objects.contains(path.as_ref()))
            .unwrap_or(false)
    }

    /// Make every call fail with [`BlobStoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.unavailable.lock() {
            *flag = unavailable;
        }
    }

    fn ensure_available(&self) -> Result<(), BlobStoreError> {
        match self.unavailable.lock() {
            Ok(flag) if *flag => Err(BlobStoreError::unavailable("blob store switched off")),
            Ok(_) => Ok(()),
            Err(_) => Err(BlobStoreError::unavailable("in-memory blob lock poisoned")),
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn exists(&self, path: &BlobPath) -> Result<bool, BlobStoreError> {
        self.ensure_available()?;
        Ok(self.objects()?.contains(path.as_ref()))
    }

    async fn delete(&self, path: &BlobPath) -> Result<BlobDeletion, BlobStoreError> {
        self.ensure_available()?;
        if self.objects()?.remove(path.as_ref()) {
            Ok(BlobDeletion::Deleted)
        } else {
            Ok(BlobDeletion::NotFound)
        }
    }
}
