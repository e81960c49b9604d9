//! Test utilities for the lunchbox crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`, via
//! the `test-support` feature).

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    BlobPath, Nickname, PasswordHash, Post, PostContent, PostId, User, UserId,
};
use crate::outbound::blob_fs::CapStdBlobStore;

/// Clock whose reading only changes when a test moves it.
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    /// Clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock frozen at the given UTC wall time.
    pub fn at_utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self::new(utc(year, month, day, hour, minute))
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    /// Move forward by `minutes`.
    pub fn advance_minutes(&self, minutes: i64) {
        *self.lock_clock() += TimeDelta::minutes(minutes);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Build a UTC timestamp, panicking on impossible input.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single() {
        Some(value) => value,
        None => panic!("invalid fixture timestamp {year}-{month}-{day} {hour}:{minute}"),
    }
}

/// A user with a placeholder credential.
pub fn sample_user(nickname: &str, created_at: DateTime<Utc>) -> User {
    let nickname = match Nickname::new(nickname) {
        Ok(value) => value,
        Err(error) => panic!("fixture nickname invalid: {error}"),
    };
    let password_hash = match PasswordHash::new("fixture-digest") {
        Ok(value) => value,
        Err(error) => panic!("fixture hash invalid: {error}"),
    };
    User::new(UserId::random(), nickname, password_hash, created_at)
}

/// A post by `author` with the given comment, like count and timestamp.
///
/// The image path is derived from the post id so every post owns a
/// distinct blob.
pub fn sample_post(
    author: &User,
    comment: &str,
    like_count: u32,
    created_at: DateTime<Utc>,
) -> Post {
    let id = PostId::random();
    let content = match PostContent::new(comment, None, None) {
        Ok(value) => value,
        Err(error) => panic!("fixture content invalid: {error}"),
    };
    let image_path = match BlobPath::new(format!("images/{id}.jpg")) {
        Ok(value) => value,
        Err(error) => panic!("fixture blob path invalid: {error}"),
    };
    Post {
        id,
        user_id: *author.id(),
        nickname: author.nickname().clone(),
        content,
        image_path,
        like_count,
        created_at,
    }
}

/// A filesystem blob store rooted in a fresh temporary directory.
///
/// Keep the returned [`TempDir`](tempfile::TempDir) alive for as long as the
/// store is used.
pub fn temp_blob_store() -> (tempfile::TempDir, CapStdBlobStore) {
    let root = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("temp dir: {error}"),
    };
    match CapStdBlobStore::open(root.path()) {
        Ok(store) => (root, store),
        Err(error) => panic!("blob store: {error}"),
    }
}

/// Write a placeholder image at `path` under `root`.
pub fn write_blob(root: &tempfile::TempDir, path: &BlobPath) {
    let target = root.path().join(path.as_ref());
    if let Some(parent) = target.parent() {
        if let Err(error) = std::fs::create_dir_all(parent) {
            panic!("blob parent dir: {error}");
        }
    }
    if let Err(error) = std::fs::write(&target, b"jpeg") {
        panic!("blob write: {error}");
    }
}
