//! Domain ports and supporting types for the hexagonal boundary.
//!
//! The three repository ports together form the document store adapter: one
//! long-lived client implements all of them and is shared, via `Arc`, by
//! every service.

mod macros;
pub(crate) use macros::define_port_error;

mod blob_store;
mod credential_hasher;
mod like_repository;
mod post_repository;
mod user_repository;

#[cfg(test)]
pub use blob_store::MockBlobStore;
pub use blob_store::{BlobDeletion, BlobStore, BlobStoreError};
#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::CredentialHasher;
#[cfg(test)]
pub use like_repository::MockLikeRepository;
pub use like_repository::{LikeInsertion, LikeRepository, LikeRepositoryError};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostRepository, PostRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
