//! The PostgreSQL lunch store client.
//!
//! One `DieselLunchStore` implements the user, post and like repository
//! ports; each port's implementation lives in its own module.

use super::pool::DbPool;

/// Diesel-backed store for the `users`, `posts` and `likes` tables.
///
/// Cloning is cheap and every clone shares the same pool.
#[derive(Clone)]
pub struct DieselLunchStore {
    pub(super) pool: DbPool,
}

impl DieselLunchStore {
    /// Create a store over an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}
