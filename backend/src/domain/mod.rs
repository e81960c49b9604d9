//! Domain primitives, services and ports.
//!
//! Purpose: keep the like counter consistent with the like ledger, and run
//! post and user deletions as ordered cascades across the `users`, `posts`
//! and `likes` collections plus blob storage. Services are generic over the
//! ports in [`ports`] and receive their adapters explicitly.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Post, Like and their identifiers: validated entities.
//! - LikeLedger, CascadeDeletion, DailyAward: the consistency core.
//! - AccountService, PostService, DashboardQuery: application services.

pub mod accounts;
pub mod cascade;
pub mod daily_award;
pub mod dashboard;
pub mod error;
pub mod like;
pub mod like_ledger;
pub mod ports;
pub mod post;
pub mod posting_window;
pub mod posts;
pub mod user;

pub use self::accounts::{AccountService, AdminBootstrap};
pub use self::cascade::{
    BlobCleanup, CascadeDeletion, CascadeStage, PostDeletion, PostDeletionReport,
    UserDeletionReport,
};
pub use self::daily_award::DailyAward;
pub use self::dashboard::{DailyPostCount, DashboardQuery, DashboardStats};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::like::{Like, LikeKey};
pub use self::like_ledger::{LikeLedger, LikeOutcome, LikeToggle, Reconciliation, UnlikeOutcome};
pub use self::post::{BlobPath, Post, PostContent, PostDraft, PostId, PostValidationError};
pub use self::posting_window::PostingWindow;
pub use self::posts::PostService;
pub use self::user::{Nickname, PasswordHash, User, UserId, UserValidationError};

/// Result alias for domain operations.
///
/// # Examples
/// ```
/// use lunchbox::domain::{DomainResult, Error};
///
/// fn guard(open: bool) -> DomainResult<()> {
///     if open {
///         Ok(())
///     } else {
///         Err(Error::forbidden("posting is closed"))
///     }
/// }
///
/// assert!(guard(true).is_ok());
/// ```
pub type DomainResult<T> = Result<T, Error>;
