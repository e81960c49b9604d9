//! Diesel and pool failure mapping shared by the lunch store repositories.
//!
//! Every repository port exposes `connection` and `query` constructors
//! through `define_port_error!`; these helpers take those constructors so a
//! single mapping serves all three collections.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure through the repository's connection constructor.
pub(super) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.to_string())
}

/// Map a Diesel failure into `query` or `connection` errors.
///
/// Closed connections count as connection failures; everything else is a
/// query failure. The detailed database message is logged at debug level
/// and kept out of the returned error.
pub(super) fn map_diesel_error<E>(
    error: DieselError,
    operation: &'static str,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), operation, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            operation,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection(format!("{operation}: database connection error"))
        }
        DieselError::NotFound => query(format!("{operation}: record not found")),
        DieselError::QueryBuilderError(_) => query(format!("{operation}: database query error")),
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            query(format!("{operation}: referenced record missing"))
        }
        _ => query(format!("{operation}: database error")),
    }
}

/// Whether `error` is a unique violation on the named constraint.
pub(super) fn is_unique_violation(error: &DieselError, constraint: &str) -> bool {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => info
            .constraint_name()
            .is_none_or(|name| name == constraint),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::PostRepositoryError;
    use rstest::rstest;

    #[derive(Debug)]
    struct FakeInfo(&'static str, Option<&'static str>);

    impl diesel::result::DatabaseErrorInformation for FakeInfo {
        fn message(&self) -> &str {
            self.0
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.1
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(FakeInfo("boom", constraint)))
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let err = map_pool_error(
            PoolError::Exhausted {
                waited: std::time::Duration::from_secs(10),
            },
            PostRepositoryError::connection,
        );
        assert_eq!(
            err,
            PostRepositoryError::connection("no database connection became free within 10s")
        );
    }

    #[rstest]
    fn closed_connections_are_connection_errors() {
        let err = map_diesel_error(
            database_error(DatabaseErrorKind::ClosedConnection, None),
            "load posts",
            PostRepositoryError::query,
            PostRepositoryError::connection,
        );
        assert!(matches!(err, PostRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn other_failures_are_query_errors_without_database_detail() {
        let err = map_diesel_error(
            database_error(DatabaseErrorKind::CheckViolation, None),
            "update like_count",
            PostRepositoryError::query,
            PostRepositoryError::connection,
        );
        assert_eq!(
            err,
            PostRepositoryError::query("update like_count: database error")
        );
    }

    #[rstest]
    #[case(Some("users_nickname_key"), true)]
    #[case(None, true)]
    #[case(Some("users_pkey"), false)]
    fn unique_violation_matches_constraint(
        #[case] constraint: Option<&'static str>,
        #[case] expected: bool,
    ) {
        let error = database_error(DatabaseErrorKind::UniqueViolation, constraint);
        assert_eq!(is_unique_violation(&error, "users_nickname_key"), expected);
    }
}
