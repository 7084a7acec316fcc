//! Cached intra-map path queries.
//!
//! [`MapNavigator`] wraps one map's [`TerrainGrid`] with two insert-only
//! concurrent caches:
//!
//! - nearest walkable cell per queried cell, and
//! - smoothed [`WorldPath`] per snapped (start, goal, heuristic) triple.
//!
//! Terrain never changes after load, so entries are never invalidated.
//! Two threads racing on the same key both compute the same value; the
//! first insert wins and the duplicate work is discarded.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::config::SmoothingConfig;
use crate::geometry::{GridCell, MapLocation, WorldPosition};
use crate::pathfinding::{find_nearest_walkable, find_path, DynamicCosts, Heuristic};
use crate::route::WorldPath;
use crate::smoothing::post_process;
use crate::terrain::TerrainGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PathKey {
    start: GridCell,
    goal: GridCell,
    heuristic: Heuristic,
}

impl PathKey {
    fn reversed(self) -> Self {
        Self {
            start: self.goal,
            goal: self.start,
            heuristic: self.heuristic,
        }
    }
}

/// Path queries against one map, with caching.
#[derive(Debug)]
pub struct MapNavigator {
    grid: TerrainGrid,
    smoothing: SmoothingConfig,
    paths: DashMap<PathKey, Option<Arc<WorldPath>>>,
    nearest: DashMap<GridCell, GridCell>,
}

impl MapNavigator {
    /// Wrap a rasterized grid.
    #[must_use]
    pub fn new(grid: TerrainGrid, smoothing: SmoothingConfig) -> Self {
        Self {
            grid,
            smoothing,
            paths: DashMap::new(),
            nearest: DashMap::new(),
        }
    }

    /// The terrain grid.
    #[must_use]
    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    /// Number of cached path entries (both directions count).
    #[must_use]
    pub fn cached_paths(&self) -> usize {
        self.paths.len()
    }

    /// Nearest walkable cell to a world position.
    pub fn snap(&self, pos: WorldPosition) -> GridCell {
        self.snap_cell(self.grid.world_to_grid(pos))
    }

    /// Nearest walkable cell to a cell.
    pub fn snap_cell(&self, cell: GridCell) -> GridCell {
        if self.grid.is_walkable(cell) {
            return cell;
        }
        if let Some(found) = self.nearest.get(&cell) {
            return *found;
        }
        let found = find_nearest_walkable(&self.grid, cell, Heuristic::Euclidean);
        *self.nearest.entry(cell).or_insert(found)
    }

    /// Centre of the nearest walkable cell to a world position.
    pub fn snap_position(&self, pos: WorldPosition) -> WorldPosition {
        self.grid.grid_to_world(self.snap(pos))
    }

    /// Smoothed path between two positions on this map.
    ///
    /// Both ends are snapped to walkable cells. The returned path starts
    /// and ends at the exact requested positions where those have line of
    /// sight to the neighbouring waypoint; otherwise at the snapped cell
    /// centres. Returns `None` when the goal is unreachable.
    pub fn find_path(
        &self,
        start: WorldPosition,
        goal: WorldPosition,
        heuristic: Heuristic,
    ) -> Option<WorldPath> {
        let key = PathKey {
            start: self.snap(start),
            goal: self.snap(goal),
            heuristic,
        };

        let cached = self.paths.get(&key).map(|entry| entry.value().clone());
        let base = match cached {
            Some(entry) => entry?,
            None => {
                debug!(
                    map = %self.grid.map(),
                    start = %key.start,
                    goal = %key.goal,
                    "Path cache miss"
                );
                let computed = self.compute(key, None).map(Arc::new);
                // Insert the reverse first so the forward entry, once visible,
                // always has its partner.
                self.paths
                    .entry(key.reversed())
                    .or_insert_with(|| computed.as_ref().map(|p| Arc::new(p.reversed())));
                let stored = self.paths.entry(key).or_insert(computed).value().clone();
                stored?
            }
        };

        Some(self.with_exact_endpoints(&base, start, goal))
    }

    /// Uncached path that weighs `dynamic_costs` on top of terrain cost.
    pub fn find_path_with_costs(
        &self,
        start: WorldPosition,
        goal: WorldPosition,
        heuristic: Heuristic,
        dynamic_costs: &DynamicCosts,
    ) -> Option<WorldPath> {
        let key = PathKey {
            start: self.snap(start),
            goal: self.snap(goal),
            heuristic,
        };
        let base = self.compute(key, Some(dynamic_costs))?;
        Some(self.with_exact_endpoints(&base, start, goal))
    }

    /// Search and post-process a snapped query.
    fn compute(&self, key: PathKey, dynamic_costs: Option<&DynamicCosts>) -> Option<WorldPath> {
        let map = self.grid.map().clone();
        let (points, cost) = if key.start == key.goal {
            let centre = self.grid.grid_to_world(key.start);
            (vec![centre, centre], 0.0)
        } else {
            let path = find_path(&self.grid, key.start, key.goal, key.heuristic, dynamic_costs);
            if !path.is_found() {
                return None;
            }
            let points = post_process(&self.grid, &path.cells, &self.smoothing);
            (points, path.cost * self.grid.cell_size())
        };

        Some(WorldPath {
            source: MapLocation::at(map.clone(), points[0]),
            dest: MapLocation::at(map, points[points.len() - 1]),
            points,
            cost,
        })
    }

    /// Whether `pos` can stand in for the waypoint `anchor`.
    fn can_substitute(&self, pos: WorldPosition, anchor: WorldPosition) -> bool {
        self.grid.bounds().contains(pos) && self.grid.line_of_sight(pos, anchor)
    }

    /// Copy of `base` whose ends are replaced by the exact positions when visible.
    fn with_exact_endpoints(
        &self,
        base: &WorldPath,
        start: WorldPosition,
        goal: WorldPosition,
    ) -> WorldPath {
        let mut path = base.clone();
        let last = path.points.len() - 1;

        if path.points[0] != start && self.can_substitute(start, path.points[1.min(last)]) {
            path.points[0] = start;
            path.source.position = start;
        }
        let before_last = path.points[last.saturating_sub(1)];
        if path.points[last] != goal && self.can_substitute(goal, before_last) {
            path.points[last] = goal;
            path.dest.position = goal;
        }
        path
    }
}
