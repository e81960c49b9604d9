//! `LikeRepository` over the `likes` table.
//!
//! The composite primary key `(user_id, post_id)` is what makes a like
//! idempotent: a second insert for the same pair hits the conflict clause and
//! affects no row. Withdrawing a user's likes touches `posts` too, inside the
//! same transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{LikeInsertion, LikeRepository, LikeRepositoryError};
use crate::domain::{Like, LikeKey, PostId, UserId};

use super::diesel_lunch_store::DieselLunchStore;
use super::diesel_post_repository::greatest;
use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::LikeRow;
use super::pool::PoolError;
use super::schema::{likes, posts};

fn pool_error(error: PoolError) -> LikeRepositoryError {
    map_pool_error(error, LikeRepositoryError::connection)
}

fn diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> LikeRepositoryError {
    move |error| {
        map_diesel_error(
            error,
            operation,
            LikeRepositoryError::query,
            LikeRepositoryError::connection,
        )
    }
}

fn to_count<T: TryInto<u64>>(value: T) -> Result<u64, LikeRepositoryError> {
    value
        .try_into()
        .map_err(|_| LikeRepositoryError::query("row count out of range"))
}

#[async_trait]
impl LikeRepository for DieselLunchStore {
    async fn exists(&self, key: &LikeKey) -> Result<bool, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::select(diesel::dsl::exists(
            likes::table.find((*key.user_id.as_uuid(), *key.post_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error("check like"))
    }

    async fn insert(&self, like: &Like) -> Result<LikeInsertion, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let inserted = diesel::insert_into(likes::table)
            .values(LikeRow::from(like))
            .on_conflict((likes::user_id, likes::post_id))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error("insert like"))?;
        if inserted == 0 {
            debug!(key = %like.key, "like already present");
            return Ok(LikeInsertion::AlreadyExists);
        }
        Ok(LikeInsertion::Inserted)
    }

    async fn delete(&self, key: &LikeKey) -> Result<bool, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(
            likes::table.find((*key.user_id.as_uuid(), *key.post_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error("delete like"))?;
        Ok(deleted > 0)
    }

    async fn list_for_post(&self, post_id: &PostId) -> Result<Vec<Like>, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<LikeRow> = likes::table
            .filter(likes::post_id.eq(*post_id.as_uuid()))
            .order((likes::created_at.asc(), likes::user_id.asc()))
            .select(LikeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list likes for post"))?;
        Ok(rows.into_iter().map(Like::from).collect())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Like>, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<LikeRow> = likes::table
            .filter(likes::user_id.eq(*user_id.as_uuid()))
            .order((likes::created_at.asc(), likes::post_id.asc()))
            .select(LikeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list likes by user"))?;
        Ok(rows.into_iter().map(Like::from).collect())
    }

    async fn delete_batch(&self, keys: &[LikeKey]) -> Result<u64, LikeRepositoryError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let pairs: Vec<_> = keys
            .iter()
            .map(|key| (*key.user_id.as_uuid(), *key.post_id.as_uuid()))
            .collect();

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = conn
            .transaction(|conn| {
                async move {
                    let mut deleted = 0_usize;
                    for pair in pairs {
                        deleted += diesel::delete(likes::table.find(pair))
                            .execute(conn)
                            .await?;
                    }
                    Ok::<usize, diesel::result::Error>(deleted)
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("delete like batch"))?;
        to_count(deleted)
    }

    async fn withdraw_all_by_user(&self, user_id: &UserId) -> Result<u64, LikeRepositoryError> {
        let user_id = *user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let withdrawn = conn
            .transaction(|conn| {
                async move {
                    let liked: Vec<Uuid> =
                        diesel::delete(likes::table.filter(likes::user_id.eq(user_id)))
                            .returning(likes::post_id)
                            .get_results(conn)
                            .await?;
                    if !liked.is_empty() {
                        // One row per post: the key makes (user, post) unique.
                        diesel::update(posts::table.filter(posts::id.eq_any(&liked)))
                            .set(posts::like_count.eq(greatest(posts::like_count - 1, 0)))
                            .execute(conn)
                            .await?;
                    }
                    Ok::<usize, diesel::result::Error>(liked.len())
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("withdraw likes by user"))?;
        debug!(%user_id, withdrawn, "likes withdrawn");
        to_count(withdrawn)
    }

    async fn count_for_post(&self, post_id: &PostId) -> Result<u64, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let total: i64 = likes::table
            .filter(likes::post_id.eq(*post_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error("count likes for post"))?;
        to_count(total)
    }

    async fn count(&self) -> Result<u64, LikeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let total: i64 = likes::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error("count likes"))?;
        to_count(total)
    }
}
