use std::path::{Path, PathBuf};

use super::coords::TileKey;
use crate::Result;

/// On-disk layout of a tile set: `{root}/{zoom}/{x}/{y}.{ext}`
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
    extension: String,
}

impl TileStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Deterministic location of a tile
    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        self.root
            .join(key.zoom.to_string())
            .join(key.x.to_string())
            .join(format!("{}.{}", key.y, self.extension))
    }

    /// Whether a finished tile is already on disk
    pub async fn contains(&self, key: TileKey) -> bool {
        tokio::fs::try_exists(self.tile_path(key))
            .await
            .unwrap_or(false)
    }

    /// Persist tile bytes, returning the final path
    pub async fn write(&self, key: TileKey, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.tile_path(key);
        write_atomic(&path, bytes).await?;
        Ok(path)
    }
}

/// Write to a sibling temp file then rename over `path`.
///
/// A crash mid-write leaves only the `.tmp` file, which is never mistaken
/// for a finished file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    if let Err(e) = tokio::fs::write(&temp_path, bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}
