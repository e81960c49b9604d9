//! PostgreSQL persistence adapters using Diesel.
//!
//! [`DieselLunchStore`] implements the user, post and like repository ports
//! over a shared `bb8` pool of `diesel-async` connections.
//!
//! - **Thin adapters**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) stay private; only domain types cross the boundary.
//! - **Atomic counters**: like counts change through single `UPDATE`
//!   statements, never read-modify-write round trips.
//! - **Typed errors**: pool and Diesel failures map onto each port's
//!   `Connection` and `Query` variants.
//!
//! # Example
//!
//! ```no_run
//! use lunchbox::outbound::persistence::{DbPool, DieselLunchStore, PoolConfig};
//!
//! # async fn connect() -> Result<(), lunchbox::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/lunchbox")).await?;
//! let store = DieselLunchStore::new(pool);
//! # let _ = store;
//! # Ok(())
//! # }
//! ```

mod diesel_like_repository;
mod diesel_lunch_store;
mod diesel_post_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_lunch_store::DieselLunchStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError, redact_password};
