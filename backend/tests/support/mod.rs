//! Shared world for the lunch store behaviour tests.
//!
//! Every scenario runs against the in-memory adapters with a frozen clock at
//! 12:00 in UTC+09:00 on 2026-04-01, inside the default posting window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::FixedOffset;
use lunchbox::domain::{
    AccountService, BlobPath, CascadeDeletion, DailyAward, Error, LikeLedger, LikeOutcome, Post,
    PostContent, PostDraft, PostId, PostService, PostingWindow, UnlikeOutcome, User,
};
use lunchbox::outbound::credentials::Sha256CredentialHasher;
use lunchbox::outbound::memory::{InMemoryBlobStore, InMemoryLunchStore};
use lunchbox::test_support::FixtureClock;
use tokio::runtime::Runtime;

pub type Store = InMemoryLunchStore;

/// Scenario state shared between steps.
pub struct LunchWorld {
    runtime: Runtime,
    pub store: Arc<Store>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub clock: Arc<FixtureClock>,
    users: Mutex<HashMap<String, User>>,
    posts: Mutex<HashMap<String, PostId>>,
    last_error: Mutex<Option<Error>>,
    pub last_like: Mutex<Option<LikeOutcome>>,
    pub last_unlike: Mutex<Option<UnlikeOutcome>>,
}

pub type SharedWorld = Arc<LunchWorld>;

pub fn tokyo() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("valid offset")
}

impl LunchWorld {
    pub fn new() -> SharedWorld {
        Arc::new(Self {
            runtime: Runtime::new().expect("create runtime"),
            store: Arc::new(Store::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
            clock: Arc::new(FixtureClock::at_utc(2026, 4, 1, 3, 0)),
            users: Mutex::new(HashMap::new()),
            posts: Mutex::new(HashMap::new()),
            last_error: Mutex::new(None),
            last_like: Mutex::new(None),
            last_unlike: Mutex::new(None),
        })
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn accounts(&self) -> AccountService<Store, Sha256CredentialHasher> {
        AccountService::new(
            Arc::clone(&self.store),
            Arc::new(Sha256CredentialHasher),
            self.clock.clone(),
        )
    }

    pub fn ledger(&self) -> LikeLedger<Store, Store> {
        LikeLedger::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            self.clock.clone(),
        )
    }

    pub fn cascade(&self) -> CascadeDeletion<Store, Store, Store, InMemoryBlobStore> {
        CascadeDeletion::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.blobs),
        )
    }

    pub fn post_service(&self) -> PostService<Store, Store, Store, InMemoryBlobStore> {
        let window = PostingWindow::new(
            chrono::NaiveTime::from_hms_opt(11, 0, 0).expect("valid time"),
            chrono::NaiveTime::from_hms_opt(14, 0, 0).expect("valid time"),
            tokyo(),
        );
        PostService::new(
            Arc::clone(&self.store),
            self.cascade(),
            window,
            self.clock.clone(),
        )
    }

    pub fn award(&self) -> DailyAward<Store> {
        DailyAward::new(Arc::clone(&self.store), self.clock.clone())
    }

    pub fn register(&self, nickname: &str) -> User {
        let user = self
            .block_on(self.accounts().register(nickname, "lunch-pass"))
            .expect("register user");
        self.users
            .lock()
            .expect("users lock")
            .insert(nickname.to_owned(), user.clone());
        user
    }

    pub fn user(&self, nickname: &str) -> User {
        self.users
            .lock()
            .expect("users lock")
            .get(nickname)
            .cloned()
            .unwrap_or_else(|| panic!("unknown user {nickname}"))
    }

    /// Publish a post with an uploaded image under `label`.
    pub fn publish(&self, author: &str, label: &str) -> Post {
        let author = self.user(author);
        let image = BlobPath::new(format!("images/{}/{label}.jpg", author.id()))
            .expect("valid blob path");
        self.blobs.put(&image);
        let draft = PostDraft {
            content: PostContent::new(label, Some("Menya".to_owned()), Some(950))
                .expect("valid content"),
            image_path: image,
        };
        let post = self
            .block_on(self.post_service().create_post(&author, draft))
            .expect("publish post");
        self.posts
            .lock()
            .expect("posts lock")
            .insert(label.to_owned(), post.id);
        post
    }

    pub fn post_id(&self, label: &str) -> PostId {
        *self
            .posts
            .lock()
            .expect("posts lock")
            .get(label)
            .unwrap_or_else(|| panic!("unknown post {label}"))
    }

    /// Current stored state of the post named `label`.
    pub fn stored_post(&self, label: &str) -> Option<Post> {
        use lunchbox::domain::ports::PostRepository as _;
        self.block_on(self.store.find_by_id(&self.post_id(label)))
            .expect("find post")
    }

    pub fn like_count(&self, label: &str) -> u32 {
        self.stored_post(label).expect("post exists").like_count
    }

    pub fn ledger_count(&self, label: &str) -> u64 {
        use lunchbox::domain::ports::LikeRepository as _;
        self.block_on(self.store.count_for_post(&self.post_id(label)))
            .expect("count likes")
    }

    pub fn record_error(&self, error: Error) {
        *self.last_error.lock().expect("error lock") = Some(error);
    }

    pub fn take_error(&self) -> Option<Error> {
        self.last_error.lock().expect("error lock").take()
    }
}
