//! Filesystem blob store confined to one root directory.
//!
//! Paths are resolved through a `cap-std` [`Dir`] handle, so a blob key can
//! never reach outside the root even if it contains `..` or symlinks.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::BlobPath;
use crate::domain::ports::{BlobDeletion, BlobStore, BlobStoreError};

/// Blob store over a local directory.
#[derive(Clone)]
pub struct CapStdBlobStore {
    root: Arc<Dir>,
}

impl CapStdBlobStore {
    /// Open (creating if needed) the directory at `root`.
    ///
    /// # Errors
    ///
    /// [`BlobStoreError::Unavailable`] when the directory cannot be created or
    /// opened.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, BlobStoreError> {
        let root = root.as_ref();
        Dir::create_ambient_dir_all(root, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(root, ambient_authority()))
            .map(Self::from_dir)
            .map_err(|err| BlobStoreError::unavailable(format!("{}: {err}", root.display())))
    }

    /// Wrap an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self {
            root: Arc::new(dir),
        }
    }

    async fn run<T, F>(&self, path: &BlobPath, op: F) -> Result<T, BlobStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir, &Path) -> io::Result<T> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        let key = path.as_ref().to_owned();
        let blocking_key = key.clone();
        tokio::task::spawn_blocking(move || op(&root, Path::new(&blocking_key)))
            .await
            .map_err(|err| BlobStoreError::unavailable(format!("blob task failed: {err}")))?
            .map_err(|err| BlobStoreError::io(key, err.to_string()))
    }
}

#[async_trait]
impl BlobStore for CapStdBlobStore {
    async fn exists(&self, path: &BlobPath) -> Result<bool, BlobStoreError> {
        self.run(path, |root, key| Ok(root.exists(key))).await
    }

    async fn delete(&self, path: &BlobPath) -> Result<BlobDeletion, BlobStoreError> {
        let outcome = self
            .run(path, |root, key| match root.remove_file(key) {
                Ok(()) => Ok(BlobDeletion::Deleted),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BlobDeletion::NotFound),
                Err(err) => Err(err),
            })
            .await?;
        debug!(%path, ?outcome, "blob delete");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn root() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn blob(key: &str) -> BlobPath {
        BlobPath::new(key).expect("valid blob path")
    }

    #[rstest]
    #[tokio::test]
    async fn delete_removes_an_existing_blob(root: TempDir) {
        std::fs::create_dir_all(root.path().join("images")).expect("mkdir");
        std::fs::write(root.path().join("images/ramen.jpg"), b"jpeg").expect("write");
        let store = CapStdBlobStore::open(root.path()).expect("open");
        let path = blob("images/ramen.jpg");

        assert!(store.exists(&path).await.expect("exists"));
        assert_eq!(store.delete(&path).await.expect("delete"), BlobDeletion::Deleted);
        assert!(!store.exists(&path).await.expect("exists"));
        assert!(!root.path().join("images/ramen.jpg").exists());
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_twice_reports_not_found(root: TempDir) {
        std::fs::write(root.path().join("soba.png"), b"png").expect("write");
        let store = CapStdBlobStore::open(root.path()).expect("open");
        let path = blob("soba.png");

        store.delete(&path).await.expect("first delete");
        assert_eq!(
            store.delete(&path).await.expect("second delete"),
            BlobDeletion::NotFound
        );
    }

    #[rstest]
    #[tokio::test]
    async fn open_creates_missing_root(root: TempDir) {
        let nested = root.path().join("blobs/posts");
        let store = CapStdBlobStore::open(&nested).expect("open");

        assert!(nested.is_dir());
        assert!(!store.exists(&blob("missing.jpg")).await.expect("exists"));
    }
}
