//! Consistency core for a daily lunch-sharing app.
//!
//! Members post what they ate for lunch and like each other's posts. This
//! crate keeps each post's like counter consistent with the like records,
//! deletes posts and users together with everything that depends on them,
//! and picks the most-liked post of a local day.
//!
//! - [`domain`]: entities, services and the ports they depend on.
//! - [`outbound`]: PostgreSQL, filesystem and in-memory adapters.
//! - [`settings`]: OrthoConfig-backed runtime settings.

pub mod domain;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
