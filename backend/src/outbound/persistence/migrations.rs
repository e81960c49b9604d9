//! Embedded schema migrations.
//!
//! Migrations run over a short-lived synchronous connection; async callers
//! should wrap [`run_pending_migrations`] in `spawn_blocking`.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// SQL migrations from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while migrating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("failed to connect for migrations: {message}")]
    Connect { message: String },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
}

/// Apply every pending migration and return the versions applied.
///
/// # Errors
///
/// [`MigrationError::Connect`] when the connection fails and
/// [`MigrationError::Apply`] when a migration is rejected.
pub fn run_pending_migrations(database_url: &str) -> Result<Vec<String>, MigrationError> {
    let mut conn = PgConnection::establish(database_url).map_err(|err| MigrationError::Connect {
        message: err.to_string(),
    })?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?
        .into_iter()
        .map(|version| version.to_string())
        .collect::<Vec<_>>();
    info!(count = applied.len(), "migrations applied");
    Ok(applied)
}
