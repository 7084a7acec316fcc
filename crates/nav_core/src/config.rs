//! Tunable navigation parameters.
//!
//! Every field has a default, so a RON file only needs to list what it
//! overrides:
//!
//! ```ron
//! (
//!     terrain: (cell_size: 10.0),
//!     traversal: (look_ahead_distance: 48.0),
//! )
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pathfinding::Heuristic;

/// Complete navigation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Rasterization parameters.
    pub terrain: TerrainConfig,
    /// Path post-processing parameters.
    pub smoothing: SmoothingConfig,
    /// Graph routing parameters.
    pub routing: RoutingConfig,
    /// Real-time route traversal parameters.
    pub traversal: TraversalConfig,
}

impl NavConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse a configuration from RON text.
    pub fn from_ron(contents: &str) -> Result<Self> {
        Ok(ron::from_str(contents)?)
    }
}

/// Terrain rasterization parameters, in world units unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Side length of one grid cell.
    pub cell_size: f32,
    /// Cells closer than this to a wall are unwalkable.
    pub unwalkable_distance: f32,
    /// Cells closer than this to a wall pay an avoidance penalty.
    pub avoidance_distance: f32,
    /// Extra cost at the unwalkable boundary; the cost falls to 1 at the
    /// avoidance boundary.
    pub avoidance_penalty: f32,
    /// Length of the eight corner probes cast from each cell centre.
    pub corner_probe_length: f32,
    /// Semantic sample quality (0..=1) at or below which a cell is blocked.
    pub semantic_blocked_threshold: f32,
    /// Extra cost for a semantic cell of quality just above the threshold.
    pub semantic_penalty: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cell_size: 8.0,
            unwalkable_distance: 6.0,
            avoidance_distance: 18.0,
            avoidance_penalty: 4.0,
            corner_probe_length: 24.0,
            semantic_blocked_threshold: 0.0,
            semantic_penalty: 4.0,
        }
    }
}

impl TerrainConfig {
    /// Set the cell size.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the unwalkable and avoidance distances.
    #[must_use]
    pub fn with_clearance(mut self, unwalkable: f32, avoidance: f32) -> Self {
        self.unwalkable_distance = unwalkable;
        self.avoidance_distance = avoidance.max(unwalkable);
        self
    }
}

/// Path post-processing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Apply B-spline smoothing after diagonal merging.
    pub enabled: bool,
    /// Points sampled per spline segment.
    pub samples_per_segment: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            samples_per_segment: 4,
        }
    }
}

/// Cross-map routing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Heuristic used when a query does not name one.
    pub default_heuristic: Heuristic,
    /// Flat cost added to every edge so routes prefer fewer hops.
    pub hop_penalty: f32,
    /// Add "return to town" teleport edges to the graph.
    pub teleport_edges: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_heuristic: Heuristic::Diagonal,
            hop_penalty: 1.0,
            teleport_edges: true,
        }
    }
}

/// Route traversal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Seconds between re-emitting a door/transporter/leave action.
    pub inter_map_retry_secs: f32,
    /// Seconds between re-emitting a return-to-town action.
    pub teleport_retry_secs: f32,
    /// How close to a door the agent must stand to use it.
    pub door_usable_distance: f32,
    /// How close to a transporter the agent must stand to use it.
    pub transporter_usable_distance: f32,
    /// How far ahead of the agent the issued move target leads.
    pub look_ahead_distance: f32,
    /// Distance at which a waypoint or destination counts as reached.
    pub arrival_epsilon: f32,
    /// Radius around a spawn that a teleport may land the agent in.
    pub spawn_scatter: f32,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            inter_map_retry_secs: 1.0,
            teleport_retry_secs: 4.5,
            door_usable_distance: 40.0,
            transporter_usable_distance: 75.0,
            look_ahead_distance: 40.0,
            arrival_epsilon: 8.0,
            spawn_scatter: 40.0,
        }
    }
}

impl TraversalConfig {
    /// Interval between inter-map action re-emissions.
    #[must_use]
    pub fn inter_map_retry(&self) -> Duration {
        Duration::from_secs_f32(self.inter_map_retry_secs.max(0.0))
    }

    /// Interval between teleport re-emissions.
    #[must_use]
    pub fn teleport_retry(&self) -> Duration {
        Duration::from_secs_f32(self.teleport_retry_secs.max(0.0))
    }

    /// Set the look-ahead distance.
    #[must_use]
    pub fn with_look_ahead(mut self, distance: f32) -> Self {
        self.look_ahead_distance = distance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = NavConfig::from_ron("(terrain: (cell_size: 10.0))").unwrap();

        assert_eq!(config.terrain.cell_size, 10.0);
        assert_eq!(
            config.terrain.unwalkable_distance,
            TerrainConfig::default().unwalkable_distance
        );
        assert_eq!(config.traversal, TraversalConfig::default());
    }

    #[test]
    fn test_heuristic_from_ron() {
        let config = NavConfig::from_ron("(routing: (default_heuristic: Euclidean))").unwrap();
        assert_eq!(config.routing.default_heuristic, Heuristic::Euclidean);
    }

    #[test]
    fn test_retry_intervals() {
        let traversal = TraversalConfig::default();
        assert_eq!(traversal.inter_map_retry(), Duration::from_secs(1));
        assert_eq!(traversal.teleport_retry(), Duration::from_millis(4500));
    }

    #[test]
    fn test_invalid_ron_is_parse_error() {
        assert!(NavConfig::from_ron("(terrain: (cell_size: \"big\"))").is_err());
    }
}
