//! Snapshot persistence for the entity store.
//!
//! Serializes the full network state to human-readable JSON with a save
//! format version, so snapshots can be inspected and rejected cleanly when
//! the format moves on.

use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved network snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedNetwork {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created (epoch seconds).
    pub saved_at: String,

    /// The complete entity store.
    pub store: EntityStore,

    /// Metadata about the save.
    pub metadata: SaveMetadata,
}

/// Metadata about the save file, readable without the full store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub user_count: usize,
    pub post_count: usize,
    pub area_count: usize,

    /// When the save was created (duplicated from parent for peek access).
    #[serde(default)]
    pub saved_at: String,
}

impl SavedNetwork {
    /// Create a snapshot from the current store state.
    pub fn new(store: EntityStore) -> Self {
        let saved_at = epoch_now();
        let metadata = SaveMetadata {
            user_count: store.user_count(),
            post_count: store.post_count(),
            area_count: store.area_count(),
            saved_at: saved_at.clone(),
        };

        Self {
            version: SAVE_VERSION,
            saved_at,
            store,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read a save file's metadata without loading the full store.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        // Parse just enough to get metadata
        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SaveMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

fn epoch_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}
