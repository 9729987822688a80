//! Persisted bearer credential

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;
use crate::utils::paths::{ensure_dir, get_credentials_path};

/// File-backed store for the session token.
///
/// The token is read on every request, so a logout in another terminal (or
/// a 401 that cleared it) takes effect on the next call.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default data-dir location
    pub fn default_location() -> Self {
        Self::new(get_credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token, if any
    pub async fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).await?;
        let token = content.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    pub async fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(&parent.to_string_lossy()).await?;
        }
        fs::write(&self.path, token).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }

    /// Forget the token. Clearing an absent token is not an error.
    pub async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("token"));

        assert_eq!(store.load().await.unwrap(), None);
        store.save("eyJhbGciOi").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("eyJhbGciOi"));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_file_means_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(CredentialStore::new(path).load().await.unwrap(), None);
    }
}
