//! Administrator dashboard read model.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use crate::domain::ports::{LikeRepository, PostRepository, UserRepository};
use crate::domain::{Error, Post};

/// Number of posts listed in [`DashboardStats::popular_posts`].
pub const POPULAR_POSTS_LIMIT: usize = 10;

/// Posts created on one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPostCount {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Posts created that day.
    pub count: u64,
}

/// Aggregate figures shown to the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub user_count: u64,
    pub post_count: u64,
    pub like_count: u64,
    /// Ascending by date; days without posts are omitted.
    pub posts_per_day: Vec<DailyPostCount>,
    /// Most liked first, at most [`POPULAR_POSTS_LIMIT`].
    pub popular_posts: Vec<Post>,
}

/// Dashboard query.
#[derive(Clone)]
pub struct DashboardQuery<U, P, L> {
    users: Arc<U>,
    posts: Arc<P>,
    likes: Arc<L>,
}

impl<U, P, L> DashboardQuery<U, P, L> {
    /// Create the query.
    pub fn new(users: Arc<U>, posts: Arc<P>, likes: Arc<L>) -> Self {
        Self {
            users,
            posts,
            likes,
        }
    }
}

impl<U, P, L> DashboardQuery<U, P, L>
where
    U: UserRepository,
    P: PostRepository,
    L: LikeRepository,
{
    /// Collect dashboard figures, bucketing posts by local date in `tz`.
    pub async fn stats<Tz: TimeZone>(&self, tz: &Tz) -> Result<DashboardStats, Error> {
        let user_count = self.users.count().await?;
        let post_count = self.posts.count().await?;
        let like_count = self.likes.count().await?;
        let posts = self.posts.list_recent().await?;
        let popular_posts = self.posts.list_most_liked(POPULAR_POSTS_LIMIT).await?;

        Ok(DashboardStats {
            user_count,
            post_count,
            like_count,
            posts_per_day: posts_per_day(&posts, tz),
            popular_posts,
        })
    }
}

fn posts_per_day<Tz: TimeZone>(posts: &[Post], tz: &Tz) -> Vec<DailyPostCount> {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for post in posts {
        *buckets
            .entry(post.created_at.with_timezone(tz).date_naive())
            .or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(date, count)| DailyPostCount { date, count })
        .collect()
}
