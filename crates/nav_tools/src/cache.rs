//! Binary snapshot cache.
//!
//! Parsing a large RON world is slow compared to decoding bincode, so a
//! validated snapshot can be written once and reloaded on later runs.
//! Only snapshots that pass validation are ever written.

use std::path::Path;

use nav_core::snapshot::WorldSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ToolError};

/// Current cache format version.
pub const CACHE_VERSION: u32 = 1;

/// File extension used for cache files.
pub const CACHE_EXTENSION: &str = "navcache";

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    snapshot: WorldSnapshot,
}

/// True when `path` carries the cache extension.
#[must_use]
pub fn is_cache_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CACHE_EXTENSION)
}

/// Validate and write `snapshot` to `path`.
pub fn save(snapshot: &WorldSnapshot, path: &Path) -> Result<()> {
    snapshot.validate()?;
    let file = CacheFile {
        version: CACHE_VERSION,
        snapshot: snapshot.clone(),
    };
    let bytes = bincode::serialize(&file)?;
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        maps = snapshot.maps.len(),
        bytes = bytes.len(),
        "Snapshot cache written"
    );
    Ok(())
}

/// Read a snapshot back from a cache file.
pub fn load(path: &Path) -> Result<WorldSnapshot> {
    let bytes = std::fs::read(path)?;
    let file: CacheFile = bincode::deserialize(&bytes)?;
    if file.version != CACHE_VERSION {
        return Err(ToolError::CacheVersion {
            expected: CACHE_VERSION,
            found: file.version,
        });
    }
    debug!(path = %path.display(), maps = file.snapshot.maps.len(), "Snapshot cache loaded");
    Ok(file.snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_test_utils::fixtures::door_world;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("world.navcache");
        let snapshot = door_world();

        save(&snapshot, &path).unwrap();
        assert!(is_cache_file(&path));
        assert_eq!(load(&path).unwrap(), snapshot);
    }

    #[test]
    fn test_invalid_snapshot_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.navcache");
        let mut snapshot = door_world();
        snapshot.maps[0].spawns.clear();

        assert!(save(&snapshot, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.navcache");
        let stale = CacheFile {
            version: CACHE_VERSION + 1,
            snapshot: door_world(),
        };
        std::fs::write(&path, bincode::serialize(&stale).unwrap()).unwrap();

        assert!(matches!(load(&path), Err(ToolError::CacheVersion { .. })));
    }

    #[test]
    fn test_garbage_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.navcache");
        std::fs::write(&path, b"not a cache").unwrap();
        assert!(matches!(load(&path), Err(ToolError::Cache(_))));
    }
}
