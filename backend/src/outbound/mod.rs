//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel.
//! - **blob_fs**: post images on a local directory via `cap-std`.
//! - **credentials**: SHA-256 credential hasher.
//! - **memory**: in-memory store and blob store (tests and the
//!   `test-support` feature).
//!
//! Adapters translate between domain types and storage representations and
//! carry no business rules.

pub mod blob_fs;
pub mod credentials;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod persistence;
