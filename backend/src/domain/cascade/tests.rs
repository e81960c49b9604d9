//! Unit tests for cascade deletion ordering and failure reporting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockall::predicate::eq;
use mockall::Sequence;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    BlobStoreError, LikeRepositoryError, MockBlobStore, MockLikeRepository, MockPostRepository,
    MockUserRepository,
};
use crate::domain::{ErrorCode, Like, Post, User};
use crate::test_support::{sample_post, sample_user, utc};

type Engine =
    CascadeDeletion<MockUserRepository, MockPostRepository, MockLikeRepository, MockBlobStore>;

struct Mocks {
    users: MockUserRepository,
    posts: MockPostRepository,
    likes: MockLikeRepository,
    blobs: MockBlobStore,
}

impl Mocks {
    fn new() -> Self {
        Self {
            users: MockUserRepository::new(),
            posts: MockPostRepository::new(),
            likes: MockLikeRepository::new(),
            blobs: MockBlobStore::new(),
        }
    }

    fn engine(self) -> Engine {
        CascadeDeletion::new(
            Arc::new(self.users),
            Arc::new(self.posts),
            Arc::new(self.likes),
            Arc::new(self.blobs),
        )
    }
}

fn noon() -> DateTime<Utc> {
    utc(2026, 4, 1, 3, 0)
}

fn alice() -> User {
    sample_user("alice", utc(2026, 3, 1, 0, 0))
}

fn like(user_id: UserId, post_id: PostId) -> Like {
    Like::new(LikeKey::new(user_id, post_id), noon())
}

#[rstest]
#[tokio::test]
async fn delete_post_reports_missing_posts() {
    let mut mocks = Mocks::new();
    mocks.posts.expect_find_by_id().return_once(|_| Ok(None));
    mocks.posts.expect_delete().never();
    mocks.blobs.expect_delete().never();

    let outcome = mocks
        .engine()
        .delete_post(PostId::random())
        .await
        .expect("delete post");

    assert_eq!(outcome, PostDeletion::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_post_releases_blob_then_likes_then_record() {
    let post = sample_post(&alice(), "Ramen", 2, noon());
    let post_id = post.id;
    let likes = vec![like(UserId::random(), post_id), like(UserId::random(), post_id)];
    let keys: Vec<LikeKey> = likes.iter().map(|like| like.key).collect();

    let mut seq = Sequence::new();
    let mut mocks = Mocks::new();
    mocks
        .posts
        .expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(post)));
    mocks
        .blobs
        .expect_exists()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(true));
    mocks
        .blobs
        .expect_delete()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(BlobDeletion::Deleted));
    mocks
        .likes
        .expect_list_for_post()
        .with(eq(post_id))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(likes));
    mocks
        .likes
        .expect_delete_batch()
        .withf(move |batch| batch == keys.as_slice())
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(2));
    mocks
        .posts
        .expect_delete()
        .with(eq(post_id))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(true));

    let outcome = mocks.engine().delete_post(post_id).await.expect("delete");

    assert_eq!(
        outcome,
        PostDeletion::Deleted(PostDeletionReport {
            post_id,
            likes_removed: 2,
            blob: BlobCleanup::Removed,
        })
    );
}

#[rstest]
#[case::absent(Ok(false), BlobCleanup::AlreadyAbsent)]
#[case::store_down(
    Err(BlobStoreError::unavailable("bucket offline")),
    BlobCleanup::Failed { message: "blob store unavailable: bucket offline".into() }
)]
#[tokio::test]
async fn blob_problems_do_not_block_post_deletion(
    #[case] exists: Result<bool, BlobStoreError>,
    #[case] expected: BlobCleanup,
) {
    let post = sample_post(&alice(), "Soba", 0, noon());
    let post_id = post.id;

    let mut mocks = Mocks::new();
    mocks
        .posts
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(post)));
    mocks.blobs.expect_exists().return_once(move |_| exists);
    mocks.blobs.expect_delete().never();
    mocks
        .likes
        .expect_list_for_post()
        .return_once(|_| Ok(Vec::new()));
    mocks.likes.expect_delete_batch().never();
    mocks.posts.expect_delete().times(1).return_once(|_| Ok(true));

    let outcome = mocks.engine().delete_post(post_id).await.expect("delete");

    let PostDeletion::Deleted(report) = outcome else {
        panic!("expected deletion, got {outcome:?}");
    };
    assert_eq!(report.blob, expected);
}

#[rstest]
#[tokio::test]
async fn like_batch_failure_keeps_the_post() {
    let post = sample_post(&alice(), "Curry", 1, noon());
    let post_id = post.id;

    let mut mocks = Mocks::new();
    mocks.blobs.expect_exists().return_once(|_| Ok(false));
    mocks
        .posts
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(post)));
    mocks
        .likes
        .expect_list_for_post()
        .return_once(move |_| Ok(vec![like(UserId::random(), post_id)]));
    mocks
        .likes
        .expect_delete_batch()
        .return_once(|_| Err(LikeRepositoryError::connection("timeout")));
    mocks.posts.expect_delete().never();

    let err = mocks
        .engine()
        .delete_post(post_id)
        .await
        .expect_err("batch failure");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn delete_user_runs_posts_then_likes_then_record() {
    let author = alice();
    let user_id = *author.id();
    let own = sample_post(&author, "Bento", 0, noon());
    let own_id = own.id;

    let mut seq = Sequence::new();
    let mut mocks = Mocks::new();
    mocks
        .posts
        .expect_list_by_user()
        .with(eq(user_id))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(vec![own.clone()]));
    mocks
        .posts
        .expect_find_by_id()
        .with(eq(own_id))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Some(sample_post(&alice(), "Bento", 0, noon()))));
    mocks
        .likes
        .expect_list_for_post()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(Vec::new()));
    mocks
        .posts
        .expect_delete()
        .with(eq(own_id))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(true));
    mocks
        .likes
        .expect_withdraw_all_by_user()
        .with(eq(user_id))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(1));
    mocks
        .users
        .expect_delete()
        .with(eq(user_id))
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(true));
    mocks.blobs.expect_exists().returning(|_| Ok(true));
    mocks
        .blobs
        .expect_delete()
        .returning(|_| Ok(BlobDeletion::Deleted));

    let report = mocks.engine().delete_user(user_id).await.expect("delete user");

    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.likes_given_removed, 1);
    assert!(report.user_record_removed);
}

#[rstest]
#[tokio::test]
async fn failure_mid_cascade_names_stage_and_progress() {
    let author = alice();
    let user_id = *author.id();
    let post: Post = sample_post(&author, "Gyudon", 0, noon());
    let post_id = post.id;
    let listed = post.clone();

    let mut mocks = Mocks::new();
    mocks.blobs.expect_exists().return_once(|_| Ok(false));
    mocks
        .posts
        .expect_list_by_user()
        .return_once(move |_| Ok(vec![listed]));
    mocks
        .posts
        .expect_find_by_id()
        .with(eq(post_id))
        .return_once(move |_| Ok(Some(post)));
    mocks
        .likes
        .expect_list_for_post()
        .return_once(|_| Ok(Vec::new()));
    mocks.posts.expect_delete().return_once(|_| Ok(true));
    mocks
        .likes
        .expect_withdraw_all_by_user()
        .return_once(|_| Err(LikeRepositoryError::query("relation missing")));
    mocks.users.expect_delete().never();

    let err = mocks
        .engine()
        .delete_user(user_id)
        .await
        .expect_err("cascade failure");

    assert_eq!(err.code(), ErrorCode::PartialCascadeFailure);
    let details = err.details().expect("details present");
    assert_eq!(details["stage"], "likes_given");
    assert_eq!(details["postsDeleted"], 1);
    assert_eq!(details["userId"], user_id.to_string());
    assert_eq!(details["cause"]["code"], "internal_error");
}

#[rstest]
#[tokio::test]
async fn likes_given_and_their_counts_go_in_one_store_call() {
    let user_id = UserId::random();

    let mut mocks = Mocks::new();
    mocks
        .posts
        .expect_list_by_user()
        .return_once(|_| Ok(Vec::new()));
    mocks
        .likes
        .expect_withdraw_all_by_user()
        .with(eq(user_id))
        .times(1)
        .return_once(|_| Ok(3));
    mocks.likes.expect_list_by_user().never();
    mocks.likes.expect_delete_batch().never();
    mocks.posts.expect_increment_like_count().never();
    mocks.posts.expect_set_like_count().never();
    mocks.users.expect_delete().return_once(|_| Ok(true));

    let report = mocks.engine().delete_user(user_id).await.expect("delete user");

    assert_eq!(report.likes_given_removed, 3);
}

#[rstest]
#[tokio::test]
async fn rerun_on_a_removed_user_completes_without_the_record() {
    let user_id = UserId::random();
    let mut mocks = Mocks::new();
    mocks
        .posts
        .expect_list_by_user()
        .return_once(|_| Ok(Vec::new()));
    mocks
        .likes
        .expect_withdraw_all_by_user()
        .return_once(|_| Ok(0));
    mocks.users.expect_delete().return_once(|_| Ok(false));

    let report = mocks.engine().delete_user(user_id).await.expect("rerun");

    assert!(report.posts.is_empty());
    assert!(!report.user_record_removed);
}
