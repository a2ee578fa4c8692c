//! Uploaded file storage.
//!
//! Storage paths embed the owning record's id, which is allocated before the
//! file is written so a record and its file are created in one pass.

use crate::error::{CredentialsError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

pub fn signatory_image_path(id: Uuid, filename: &str) -> String {
    format!("signatories/{}/{}", id, filename)
}

pub fn template_asset_path(id: Uuid, filename: &str) -> String {
    format!("certificate_template_assets/{}/{}", id, filename)
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, path: &str, data: &[u8]) -> Result<()>;

    /// `None` when nothing is stored at `path`.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Missing files are not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;

    fn url(&self, path: &str) -> String;
}

/// Files under a local media root, served under `base_url`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !safe {
            return Err(CredentialsError::storage(format!(
                "refusing storage path {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, path: &str, data: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, data).await?;
        tracing::debug!(path = %path, bytes = data.len(), "stored file");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_embed_id() {
        let id = Uuid::new_v4();
        assert_eq!(
            signatory_image_path(id, "sig.png"),
            format!("signatories/{}/sig.png", id)
        );
        assert_eq!(
            template_asset_path(id, "logo.svg"),
            format!("certificate_template_assets/{}/logo.svg", id)
        );
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "/media/");
        let path = signatory_image_path(Uuid::new_v4(), "sig.png");

        store.save(&path, b"png-bytes").await.unwrap();
        assert!(store.exists(&path).await.unwrap());
        assert_eq!(
            std::fs::read(dir.path().join(&path)).unwrap(),
            b"png-bytes".to_vec()
        );
        assert_eq!(store.url(&path), format!("/media/{}", path));
        assert_eq!(store.read(&path).await.unwrap(), Some(b"png-bytes".to_vec()));

        store.delete(&path).await.unwrap();
        assert!(!store.exists(&path).await.unwrap());
        assert_eq!(store.read(&path).await.unwrap(), None);
        // 再次删除不报错
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "/media/");

        for bad in ["../outside.txt", "/etc/passwd", "", "./a/b"] {
            let err = store.save(bad, b"x").await.unwrap_err();
            assert!(matches!(err, CredentialsError::Storage(_)), "{bad:?}");
        }
    }
}
