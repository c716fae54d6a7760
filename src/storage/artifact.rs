//! Export artifact storage
//!
//! Artifacts are append-only byte streams: once bytes are written for a
//! cursor position they are never rewritten, only extended. The default
//! implementation keeps them as files under a configured directory.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::utils::error::{EngineError, Result};

/// Append-only artifact store
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Allocate a new empty artifact and return its id.
    async fn create(&self) -> Result<String>;

    /// Append bytes to an artifact.
    async fn append(&self, artifact_id: &str, bytes: &[u8]) -> Result<()>;

    /// Read the full artifact and delete it in one step.
    async fn read_and_delete(&self, artifact_id: &str) -> Result<Bytes>;

    /// Delete an artifact. Deleting an absent artifact is not an error.
    async fn delete(&self, artifact_id: &str) -> Result<()>;
}

/// Filesystem-backed artifact store
pub struct FsArtifactStore {
    base_path: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await.map_err(|e| {
            EngineError::storage(format!(
                "failed to create artifact directory {:?}: {}",
                base_path, e
            ))
        })?;
        info!("Artifact store initialized at {:?}", base_path);
        Ok(Self { base_path })
    }

    fn path_for(&self, artifact_id: &str) -> Result<PathBuf> {
        // Ids are engine-generated UUIDs; reject anything else so a stored
        // id can never traverse outside the base directory.
        if !artifact_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(EngineError::validation(format!(
                "invalid artifact id: {}",
                artifact_id
            )));
        }
        Ok(self.base_path.join(format!("{}.csv", artifact_id)))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn create(&self) -> Result<String> {
        let artifact_id = Uuid::new_v4().to_string();
        let path = self.path_for(&artifact_id)?;
        fs::File::create(&path)
            .await
            .map_err(|e| EngineError::storage(format!("failed to create artifact: {}", e)))?;
        debug!(artifact_id, "created artifact");
        Ok(artifact_id)
    }

    async fn append(&self, artifact_id: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(artifact_id)?;
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                EngineError::storage(format!("failed to open artifact {}: {}", artifact_id, e))
            })?;
        file.write_all(bytes)
            .await
            .map_err(|e| EngineError::storage(format!("artifact append failed: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| EngineError::storage(format!("artifact flush failed: {}", e)))?;
        Ok(())
    }

    async fn read_and_delete(&self, artifact_id: &str) -> Result<Bytes> {
        let path = self.path_for(artifact_id)?;
        let content = fs::read(&path).await.map_err(|e| {
            EngineError::storage(format!("failed to read artifact {}: {}", artifact_id, e))
        })?;
        fs::remove_file(&path)
            .await
            .map_err(|e| EngineError::storage(format!("failed to delete artifact: {}", e)))?;
        debug!(artifact_id, size = content.len(), "artifact consumed");
        Ok(Bytes::from(content))
    }

    async fn delete(&self, artifact_id: &str) -> Result<()> {
        let path = self.path_for(artifact_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::storage(format!(
                "failed to delete artifact {}: {}",
                artifact_id, e
            ))),
        }
    }
}
