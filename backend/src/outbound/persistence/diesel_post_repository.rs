//! `PostRepository` over the `posts` table.
//!
//! Counter changes are single `UPDATE ... RETURNING` statements, so
//! PostgreSQL's row lock serialises concurrent likes on one post. The value
//! is clamped at zero in SQL with `greatest`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{Post, PostContent, PostId, UserId};

use super::diesel_lunch_store::DieselLunchStore;
use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewPostRow, PostContentUpdate, PostRow};
use super::pool::PoolError;
use super::schema::posts;

diesel::define_sql_function! {
    /// PostgreSQL `greatest` over two integers.
    fn greatest(a: Integer, b: Integer) -> Integer;
}

fn pool_error(error: PoolError) -> PostRepositoryError {
    map_pool_error(error, PostRepositoryError::connection)
}

fn diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> PostRepositoryError {
    move |error| {
        map_diesel_error(
            error,
            operation,
            PostRepositoryError::query,
            PostRepositoryError::connection,
        )
    }
}

fn to_domain(rows: Vec<PostRow>) -> Result<Vec<Post>, PostRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(PostRepositoryError::query))
        .collect()
}

fn delta_for_db(delta: i64) -> Result<i32, PostRepositoryError> {
    i32::try_from(delta)
        .map_err(|_| PostRepositoryError::query(format!("like delta {delta} out of range")))
}

fn count_from_db(value: i32) -> Result<u32, PostRepositoryError> {
    u32::try_from(value)
        .map_err(|_| PostRepositoryError::query(format!("stored like_count {value} is negative")))
}

#[async_trait]
impl PostRepository for DieselLunchStore {
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let row = NewPostRow::try_from_post(post).map_err(PostRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(posts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(diesel_error("insert post"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        posts::table
            .find(*id.as_uuid())
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find post"))?
            .map(|row| row.into_domain().map_err(PostRepositoryError::query))
            .transpose()
    }

    async fn list_recent(&self) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = posts::table
            .order((posts::created_at.desc(), posts::id.asc()))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list posts"))?;
        to_domain(rows)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = posts::table
            .filter(posts::user_id.eq(*user_id.as_uuid()))
            .order((posts::created_at.desc(), posts::id.asc()))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list posts by user"))?;
        to_domain(rows)
    }

    async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = posts::table
            .filter(posts::created_at.ge(start))
            .filter(posts::created_at.lt(end))
            .order((posts::created_at.asc(), posts::id.asc()))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list posts in range"))?;
        to_domain(rows)
    }

    async fn list_most_liked(&self, limit: usize) -> Result<Vec<Post>, PostRepositoryError> {
        let limit = i64::try_from(limit)
            .map_err(|_| PostRepositoryError::query("limit out of range"))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = posts::table
            .order((
                posts::like_count.desc(),
                posts::created_at.asc(),
                posts::id.asc(),
            ))
            .limit(limit)
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list most liked posts"))?;
        to_domain(rows)
    }

    async fn update_content(
        &self,
        id: &PostId,
        content: &PostContent,
    ) -> Result<bool, PostRepositoryError> {
        let changes =
            PostContentUpdate::try_from_content(content).map_err(PostRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(posts::table.find(*id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(diesel_error("update post content"))?;
        Ok(updated > 0)
    }

    async fn increment_like_count(
        &self,
        id: &PostId,
        delta: i64,
    ) -> Result<Option<u32>, PostRepositoryError> {
        let delta = delta_for_db(delta)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::update(posts::table.find(*id.as_uuid()))
            .set(posts::like_count.eq(greatest(posts::like_count + delta, 0)))
            .returning(posts::like_count)
            .get_result::<i32>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("increment like_count"))?
            .map(count_from_db)
            .transpose()
    }

    async fn set_like_count(&self, id: &PostId, count: u32) -> Result<bool, PostRepositoryError> {
        let count = i32::try_from(count)
            .map_err(|_| PostRepositoryError::query(format!("like_count {count} out of range")))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(posts::table.find(*id.as_uuid()))
            .set(posts::like_count.eq(count))
            .execute(&mut conn)
            .await
            .map_err(diesel_error("set like_count"))?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(posts::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error("delete post"))?;
        Ok(deleted > 0)
    }

    async fn count(&self) -> Result<u64, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let total: i64 = posts::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error("count posts"))?;
        u64::try_from(total).map_err(|_| PostRepositoryError::query("negative row count"))
    }
}
