//! `UserRepository` over the `users` table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{Nickname, PasswordHash, User, UserId};

use super::diesel_lunch_store::DieselLunchStore;
use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::PoolError;
use super::schema::users;

const NICKNAME_CONSTRAINT: &str = "users_nickname_key";

fn pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> UserRepositoryError {
    move |error| {
        map_diesel_error(
            error,
            operation,
            UserRepositoryError::query,
            UserRepositoryError::connection,
        )
    }
}

fn to_domain(row: UserRow) -> Result<User, UserRepositoryError> {
    row.into_domain().map_err(UserRepositoryError::query)
}

fn to_count(value: i64) -> Result<u64, UserRepositoryError> {
    u64::try_from(value).map_err(|_| UserRepositoryError::query("negative row count"))
}

#[async_trait]
impl UserRepository for DieselLunchStore {
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewUserRow::from(user);

        match diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error, NICKNAME_CONSTRAINT) => Err(
                UserRepositoryError::duplicate_nickname(user.nickname().as_ref()),
            ),
            Err(error) => Err(diesel_error("insert user")(error)),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find user by id"))?
            .map(to_domain)
            .transpose()
    }

    async fn find_by_nickname(
        &self,
        nickname: &Nickname,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        users::table
            .filter(users::nickname.eq(nickname.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find user by nickname"))?
            .map(to_domain)
            .transpose()
    }

    async fn list_excluding(
        &self,
        excluded: &Nickname,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::nickname.ne(excluded.as_ref()))
            .order((users::created_at.desc(), users::id.asc()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list users"))?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set(users::password_hash.eq(password_hash.as_ref()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error("update password hash"))?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(users::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error("delete user"))?;
        Ok(deleted > 0)
    }

    async fn count(&self) -> Result<u64, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error("count users"))?;
        to_count(total)
    }
}
