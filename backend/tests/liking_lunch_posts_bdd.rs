//! Scenarios from `liking_lunch_posts.feature`: the like round trip of one
//! post and an unlike that finds nothing to remove.

use lunchbox::domain::{LikeOutcome, UnlikeOutcome};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

mod support;

use support::{LunchWorld, SharedWorld, tokyo};

#[fixture]
fn world() -> SharedWorld {
    LunchWorld::new()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("alice has posted {label}")]
fn alice_has_posted(world: &SharedWorld, label: String) {
    world.register("alice");
    world.publish("alice", &label);
}

#[given("member {nickname} exists")]
fn member_exists(world: &SharedWorld, nickname: String) {
    world.register(&nickname);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("{nickname} likes {label}")]
fn member_likes(world: &SharedWorld, nickname: String, label: String) {
    let user = world.user(&nickname);
    let outcome = world
        .block_on(world.ledger().add_like(*user.id(), world.post_id(&label)))
        .expect("add like");
    *world.last_like.lock().expect("like slot") = Some(outcome);
}

#[when("{nickname} unlikes {label}")]
fn member_unlikes(world: &SharedWorld, nickname: String, label: String) {
    let user = world.user(&nickname);
    let outcome = world
        .block_on(world.ledger().remove_like(*user.id(), world.post_id(&label)))
        .expect("remove like");
    *world.last_unlike.lock().expect("unlike slot") = Some(outcome);
}

#[when("alice deletes {label}")]
fn alice_deletes(world: &SharedWorld, label: String) {
    let alice = world.user("alice");
    world
        .block_on(
            world
                .post_service()
                .delete_post(*alice.id(), world.post_id(&label)),
        )
        .expect("delete post");
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the like is recorded with count {count}")]
fn like_is_recorded(world: &SharedWorld, count: u32) {
    let outcome = world.last_like.lock().expect("like slot").take();
    assert_eq!(outcome, Some(LikeOutcome::Added { like_count: count }));
}

#[then("the like is ignored")]
fn like_is_ignored(world: &SharedWorld) {
    let outcome = world.last_like.lock().expect("like slot").take();
    assert_eq!(outcome, Some(LikeOutcome::AlreadyLiked));
}

#[then("the unlike reports {expected}")]
fn unlike_reports(world: &SharedWorld, expected: String) {
    let outcome = world.last_unlike.lock().expect("unlike slot").take();
    match (expected.as_str(), outcome) {
        ("removed", Some(UnlikeOutcome::Removed { .. }))
        | ("not liked", Some(UnlikeOutcome::NotLiked)) => {}
        (_, other) => panic!("expected {expected}, got {other:?}"),
    }
}

#[then("{label} has {count} likes")]
fn post_has_likes(world: &SharedWorld, label: String, count: u32) {
    assert_eq!(world.like_count(&label), count);
    assert_eq!(world.ledger_count(&label), u64::from(count));
}

#[then("{nickname} has liked {label}")]
fn member_has_liked(world: &SharedWorld, nickname: String, label: String) {
    let user = world.user(&nickname);
    let liked = world
        .block_on(world.ledger().has_liked(*user.id(), world.post_id(&label)))
        .expect("has liked");
    assert!(liked, "{nickname} should have liked {label}");
}

#[then("today's award is empty")]
fn award_is_empty(world: &SharedWorld) {
    let award = world
        .block_on(world.award().daily_award(&tokyo()))
        .expect("award");
    assert_eq!(award, None);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/liking_lunch_posts.feature",
    name = "A member likes, re-likes and unlikes a post"
)]
fn a_member_likes_relikes_and_unlikes_a_post(world: SharedWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/liking_lunch_posts.feature",
    name = "Unliking a post the member never liked changes nothing"
)]
fn unliking_a_post_never_liked_changes_nothing(world: SharedWorld) {
    let _ = world;
}
