//! The lunch store's PostgreSQL pool.
//!
//! Each admin command opens one [`DbPool`] over `diesel-async` connections
//! handed out by `bb8`. Connections open on first checkout unless
//! [`PoolConfig::with_warm_connections`] asks for some up front, and every
//! error that names the server carries the URL with its password masked.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection, RunError};
use tracing::debug;

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);
const POSTGRES_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];

/// Why the lunch store could not reach PostgreSQL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The configured URL does not use a PostgreSQL scheme.
    #[error("database url {url} is not a postgres:// url")]
    NotPostgres { url: String },

    /// The server refused or dropped a new connection.
    #[error("cannot connect to {url}: {message}")]
    Unreachable { url: String, message: String },

    /// Every connection stayed busy for the whole checkout timeout.
    #[error("no database connection became free within {waited:?}")]
    Exhausted { waited: Duration },
}

/// Replace the password in `url` with `***`.
///
/// URLs without credentials come back unchanged.
pub fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_owned();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_owned(),
    }
}

/// Where the pool connects and how many connections it may hold.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lunchbox::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://lunch@localhost/lunchbox")
///     .with_max_connections(2)
///     .with_checkout_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_connections(), 2);
/// assert_eq!(config.warm_connections(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_connections: u32,
    warm_connections: Option<u32>,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Four connections at most, none opened ahead of use, ten second
    /// checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            warm_connections: None,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap the number of open connections.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Open this many connections while building the pool and keep them
    /// idle. `None` defers every connection to its first checkout.
    pub fn with_warm_connections(mut self, warm: Option<u32>) -> Self {
        self.warm_connections = warm;
        self
    }

    /// How long a checkout waits before [`PoolError::Exhausted`].
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// Connection string, password included.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Connection cap.
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Connections opened while building the pool.
    pub fn warm_connections(&self) -> Option<u32> {
        self.warm_connections
    }

    /// Checkout wait limit.
    pub fn checkout_timeout(&self) -> Duration {
        self.checkout_timeout
    }
}

/// Shared PostgreSQL connection pool. Clones share one set of connections.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
    display_url: String,
    checkout_timeout: Duration,
}

impl DbPool {
    /// Build the pool for `config`.
    ///
    /// # Errors
    ///
    /// [`PoolError::NotPostgres`] for a non-PostgreSQL URL and
    /// [`PoolError::Unreachable`] when warm connections cannot be opened.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let display_url = redact_password(&config.database_url);
        if !POSTGRES_SCHEMES
            .iter()
            .any(|scheme| config.database_url.starts_with(scheme))
        {
            return Err(PoolError::NotPostgres { url: display_url });
        }

        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let builder = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(config.warm_connections)
            .connection_timeout(config.checkout_timeout);
        let inner = match config.warm_connections {
            None => builder.build_unchecked(manager),
            Some(_) => builder
                .build(manager)
                .await
                .map_err(|err| PoolError::Unreachable {
                    url: display_url.clone(),
                    message: err.to_string(),
                })?,
        };
        debug!(
            url = %display_url,
            max_connections = config.max_connections,
            warm = ?config.warm_connections,
            "database pool ready"
        );
        Ok(Self {
            inner,
            display_url,
            checkout_timeout: config.checkout_timeout,
        })
    }

    /// Check out a connection, opening one when the pool has room.
    ///
    /// # Errors
    ///
    /// [`PoolError::Unreachable`] when a new connection fails and
    /// [`PoolError::Exhausted`] when none frees up in time.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner.get().await.map_err(|err| match err {
            RunError::User(cause) => PoolError::Unreachable {
                url: self.display_url.clone(),
                message: cause.to_string(),
            },
            RunError::TimedOut => PoolError::Exhausted {
                waited: self.checkout_timeout,
            },
        })
    }
}
