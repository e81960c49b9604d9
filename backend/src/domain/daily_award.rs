//! Most-liked post of a local calendar day.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::PostRepository;
use crate::domain::{Error, Post};

/// Daily award read model.
#[derive(Clone)]
pub struct DailyAward<P> {
    posts: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P> DailyAward<P> {
    /// Create the query over a post repository.
    pub fn new(posts: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { posts, clock }
    }
}

impl<P: PostRepository> DailyAward<P> {
    /// Award for the local day that contains "now" in `tz`.
    pub async fn daily_award<Tz: TimeZone>(&self, tz: &Tz) -> Result<Option<Post>, Error> {
        let today = self.clock.utc().with_timezone(tz).date_naive();
        self.award_for_day(today, tz).await
    }

    /// Award for an explicit local `date` in `tz`.
    ///
    /// Picks the highest `like_count` among posts created in
    /// `[date 00:00, date+1 00:00)` local time. Ties go to the earliest post,
    /// then to the smallest id. Nothing is awarded when the day has no posts
    /// or the best post has no likes.
    pub async fn award_for_day<Tz: TimeZone>(
        &self,
        date: NaiveDate,
        tz: &Tz,
    ) -> Result<Option<Post>, Error> {
        let (start, end) = local_day_bounds(date, tz)?;
        let candidates = self.posts.list_created_between(start, end).await?;
        Ok(pick_winner(candidates))
    }
}

/// UTC instants bounding the local calendar day `date` in `tz`.
pub(crate) fn local_day_bounds<Tz: TimeZone>(
    date: NaiveDate,
    tz: &Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), Error> {
    let next = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| Error::invalid_request(format!("date {date} is out of range")))?;
    Ok((start_of_day(date, tz)?, start_of_day(next, tz)?))
}

fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>, Error> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| Error::invalid_request(format!("no local midnight on {date}")))
}

fn pick_winner(candidates: Vec<Post>) -> Option<Post> {
    candidates
        .into_iter()
        .filter(|post| post.like_count > 0)
        .min_by(|a, b| {
            b.like_count
                .cmp(&a.like_count)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        })
}
