//! Embedded PostgreSQL helpers for the Diesel integration suite.
//!
//! The cluster is shared across the test binary and each test gets its own
//! temporary database with the crate's migrations applied. Set
//! `SKIP_TEST_CLUSTER=1` where PostgreSQL cannot be started.

use std::time::Duration;

use lunchbox::outbound::persistence::run_pending_migrations;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};

const SHARED_CLUSTER_RETRIES: usize = 5;
const SHARED_CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// True when `SKIP_TEST_CLUSTER` is "1", "true" or "yes" (any case).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Returns `None` with a skip marker when skipping is enabled, otherwise
/// panics so CI breakage is not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Keep `PG_PASSWORD` stable so a reused data directory still accepts it.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster bootstrap spawns any threads.
        unsafe {
            std::env::set_var("PG_PASSWORD", "lunchbox_embedded_test");
        }
    }
}

/// The process-wide cluster, started on first use.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    ensure_stable_password();
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < SHARED_CLUSTER_RETRIES => {
                eprintln!("pg-embed: attempt {attempt}/{SHARED_CLUSTER_RETRIES} failed: {error:?}");
                std::thread::sleep(SHARED_CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(format!("{error:?}")),
        }
    }
}

/// A fresh database on `cluster` with every migration applied.
pub fn provision_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let name = format!("lunchbox_test_{}", uuid::Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|error| format!("create database: {error:?}"))?;
    run_pending_migrations(database.url()).map_err(|error| error.to_string())?;
    Ok(database)
}
