//! # Nav Tools
//!
//! Command-line tooling around [`nav_core`]:
//! - Snapshot validation and a binary snapshot cache
//! - Route queries with JSON output
//! - ASCII terrain rendering
//! - Connection graph export

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cache;
pub mod error;
pub mod render;

use std::path::Path;

use nav_core::snapshot::WorldSnapshot;

use crate::error::Result;

/// Load a world snapshot from RON, or from a binary cache when the file
/// has the cache extension.
pub fn load_snapshot(path: &Path) -> Result<WorldSnapshot> {
    if cache::is_cache_file(path) {
        cache::load(path)
    } else {
        Ok(WorldSnapshot::load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_test_utils::fixtures::door_world;
    use tempfile::TempDir;

    #[test]
    fn test_load_snapshot_by_extension() {
        let dir = TempDir::new().unwrap();
        let snapshot = door_world();

        let ron_path = dir.path().join("world.ron");
        std::fs::write(&ron_path, ron::ser::to_string(&snapshot).unwrap()).unwrap();
        let cache_path = dir.path().join(format!("world.{}", cache::CACHE_EXTENSION));
        cache::save(&snapshot, &cache_path).unwrap();

        assert_eq!(load_snapshot(&ron_path).unwrap(), snapshot);
        assert_eq!(load_snapshot(&cache_path).unwrap(), snapshot);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_snapshot(&dir.path().join("absent.ron")).is_err());
    }
}
