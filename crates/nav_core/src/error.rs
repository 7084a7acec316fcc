//! Error types for world loading and navigation.
//!
//! Unreachable queries are not errors: they come back as empty results
//! (`GridPath::is_found() == false`, `None`, an empty [`Route`](crate::route::Route)).

use thiserror::Error;

/// Result type alias using [`NavError`].
pub type Result<T> = std::result::Result<T, NavError>;

/// Top-level error type for navigation data errors.
#[derive(Debug, Error)]
pub enum NavError {
    /// Failed to read a data file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a RON data file.
    #[error("Failed to parse data file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Map bounds are empty or inverted.
    #[error("Map '{map}' has invalid bounds ({min_x}, {min_y})..({max_x}, {max_y})")]
    InvalidBounds {
        /// Map name.
        map: String,
        /// Minimum X.
        min_x: f32,
        /// Minimum Y.
        min_y: f32,
        /// Maximum X.
        max_x: f32,
        /// Maximum Y.
        max_y: f32,
    },

    /// Map declares no spawn points.
    #[error("Map '{0}' has no spawn points")]
    NoSpawns(String),

    /// Rasterization left no walkable cell on the map.
    #[error("Map '{0}' has no walkable cells reachable from its spawns")]
    NoWalkableCells(String),

    /// Referenced map does not exist in the world.
    #[error("Unknown map: {0}")]
    UnknownMap(String),

    /// A connection points at a spawn the destination map does not have.
    #[error("Map '{map}' has no spawn #{spawn} (it has {available})")]
    InvalidSpawn {
        /// Destination map name.
        map: String,
        /// Requested spawn index.
        spawn: usize,
        /// Number of spawns on the destination map.
        available: usize,
    },

    /// Duplicate map name in a snapshot.
    #[error("Map '{0}' is declared more than once")]
    DuplicateMap(String),
}
