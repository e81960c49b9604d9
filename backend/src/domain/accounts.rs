//! Account registration, credential checks and administrator bootstrap.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::ports::{CredentialHasher, UserRepository};
use crate::domain::{Error, ErrorCode, Nickname, User, UserId};

/// Result of [`AccountService::ensure_admin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum AdminBootstrap {
    /// The administrator account was created now.
    Created(User),
    /// An account with the administrator nickname already existed.
    Existing(User),
}

impl AdminBootstrap {
    /// The administrator account either way.
    pub fn user(&self) -> &User {
        match self {
            Self::Created(user) | Self::Existing(user) => user,
        }
    }
}

/// Account service.
#[derive(Clone)]
pub struct AccountService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<U, H> AccountService<U, H> {
    /// Create the service.
    pub fn new(users: Arc<U>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

impl<U, H> AccountService<U, H>
where
    U: UserRepository,
    H: CredentialHasher,
{
    /// Register a new account.
    ///
    /// Fails with `Conflict` when the nickname is taken; the store's unique
    /// constraint decides races between concurrent registrations.
    pub async fn register(&self, nickname: &str, password: &str) -> Result<User, Error> {
        let nickname =
            Nickname::new(nickname).map_err(|err| Error::invalid_request(err.to_string()))?;
        if password.is_empty() {
            return Err(Error::invalid_request("password must not be empty"));
        }
        let user = User::new(
            UserId::random(),
            nickname,
            self.hasher.hash(password),
            self.clock.utc(),
        );
        self.users.insert(&user).await?;
        info!(user_id = %user.id(), nickname = %user.nickname(), "user registered");
        Ok(user)
    }

    /// Check a nickname and password pair.
    ///
    /// Unknown nicknames and wrong passwords yield the same error.
    pub async fn authenticate(&self, nickname: &str, password: &str) -> Result<User, Error> {
        let rejected = || Error::unauthorized("invalid nickname or password");
        let Ok(nickname) = Nickname::new(nickname) else {
            return Err(rejected());
        };
        let Some(user) = self.users.find_by_nickname(&nickname).await? else {
            debug!(%nickname, "login for unknown nickname");
            return Err(rejected());
        };
        if !self.hasher.verify(password, user.password_hash()) {
            debug!(%nickname, "login with wrong password");
            return Err(rejected());
        }
        Ok(user)
    }

    /// Replace a user's password.
    pub async fn change_password(&self, user_id: UserId, password: &str) -> Result<(), Error> {
        if password.is_empty() {
            return Err(Error::invalid_request("password must not be empty"));
        }
        let hash = self.hasher.hash(password);
        if !self.users.update_password_hash(&user_id, &hash).await? {
            return Err(Error::not_found(format!("user {user_id} not found")));
        }
        info!(%user_id, "password changed");
        Ok(())
    }

    /// Make sure an administrator account named `nickname` exists.
    ///
    /// An existing account keeps its password.
    pub async fn ensure_admin(
        &self,
        nickname: &str,
        password: &str,
    ) -> Result<AdminBootstrap, Error> {
        let parsed =
            Nickname::new(nickname).map_err(|err| Error::invalid_request(err.to_string()))?;
        if let Some(user) = self.users.find_by_nickname(&parsed).await? {
            return Ok(AdminBootstrap::Existing(user));
        }
        match self.register(nickname, password).await {
            Ok(user) => Ok(AdminBootstrap::Created(user)),
            Err(err) if err.code() == ErrorCode::Conflict => self
                .users
                .find_by_nickname(&parsed)
                .await?
                .map(AdminBootstrap::Existing)
                .ok_or(err),
            Err(err) => Err(err),
        }
    }

    /// Every account except the administrator, newest first.
    pub async fn members(&self, admin_nickname: &Nickname) -> Result<Vec<User>, Error> {
        Ok(self.users.list_excluding(admin_nickname).await?)
    }
}
