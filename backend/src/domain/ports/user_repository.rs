//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Nickname, PasswordHash, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable:
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError:
            "user repository query failed: {message}",
        /// Another user already holds the nickname.
        DuplicateNickname { nickname: String } => Conflict:
            "nickname already taken: {nickname}",
    }
}

/// Port over the `users` collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// Fails with [`UserRepositoryError::DuplicateNickname`] when the nickname
    /// is taken; the check and the write are one atomic step.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by exact, case-sensitive nickname.
    async fn find_by_nickname(
        &self,
        nickname: &Nickname,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// All users except `excluded`, newest first.
    async fn list_excluding(
        &self,
        excluded: &Nickname,
    ) -> Result<Vec<User>, UserRepositoryError>;

    /// Replace a user's credential. Returns `false` when the user is missing.
    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserRepositoryError>;

    /// Delete a user record. Returns `false` when it was already gone.
    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError>;

    /// Number of users.
    async fn count(&self) -> Result<u64, UserRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{Error, ErrorCode};
    use rstest::rstest;

    #[rstest]
    fn duplicate_nickname_maps_to_conflict() {
        let err: Error = UserRepositoryError::duplicate_nickname("alice").into();
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(err.message().contains("alice"));
    }

    #[rstest]
    fn connection_maps_to_service_unavailable() {
        let err: Error = UserRepositoryError::connection("refused").into();
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
