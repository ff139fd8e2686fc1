//! Filesystem storage for note attachments.
//!
//! Files land under the uploads directory as `{id}_{sanitized original name}`
//! so two uploads with the same name never collide.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use rapport_core::{new_id, Result};

/// Longest original-name fragment kept in a stored filename.
const MAX_NAME_CHARS: usize = 120;

/// Storage backend for attachment bytes.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Remove a stored file. Missing files are not an error.
    async fn delete(&self, name: &str) -> Result<()>;

    async fn exists(&self, name: &str) -> Result<bool>;

    /// Remove every stored file, returning how many were removed.
    async fn clear(&self) -> Result<u64>;
}

/// Flat directory of uploaded files.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Create the uploads directory and check it is writable.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", self.base_path, e))?;

        let check = self.base_path.join(".write-check");
        fs::write(&check, b"ok")
            .await
            .map_err(|e| format!("write({:?}): {}", check, e))?;
        let _ = fs::remove_file(&check).await;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(name);
        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "write",
            stored_name = %name,
            size = data.len(),
            "Writing attachment"
        );

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            warn!(path = %self.base_path.display(), error = %e, "Failed to create uploads directory");
            e
        })?;

        // temp file + rename keeps readers from seeing partial writes
        let temp_path = full_path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "Failed to create temp file");
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "Rename failed");
            e
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.full_path(name)).await?)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let full_path = self.full_path(name);
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(name)).await?)
    }

    async fn clear(&self) -> Result<u64> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(0);
        }
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        debug!(subsystem = "storage", component = "filesystem", op = "clear", removed, "Cleared uploads");
        Ok(removed)
    }
}

/// Reduce an uploaded filename to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Empty results fall back to `file`.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Generate the on-disk name for a new upload.
pub fn stored_filename(original: &str) -> String {
    format!("{}_{}", new_id(), sanitize_filename(original))
}
