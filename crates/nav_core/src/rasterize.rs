//! Terrain rasterization.
//!
//! Turns a map's raw geometry into a [`TerrainGrid`]. Two sources are
//! supported and both produce the same [`TerrainCell`] shape:
//!
//! - Wall lines: axis-aligned segments indexed in an R-tree. Each cell
//!   measures its clearance to the nearest wall and casts eight short
//!   probes to score how enclosed it is.
//! - Semantic samples: a precomputed quality hash sampled at the four
//!   corners of every cell, keeping the worst score.
//!
//! Cells are independent, so both passes run per-cell in parallel over
//! a read-only index. A flood fill from the map's spawns then blocks any
//! open pocket an agent could never reach.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use rstar::primitives::Line;
use rstar::{PointDistance, RTree};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TerrainConfig;
use crate::error::{NavError, Result};
use crate::geometry::{segment_intersection, GridCell, MapId, WorldPosition};
use crate::pathfinding::{find_nearest_walkable, Heuristic};
use crate::terrain::{Bounds, TerrainCell, TerrainGrid, DIRECTIONS};

/// Axis-aligned wall segments bounding a map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallGeometry {
    /// Vertical walls as `[x, y1, y2]`.
    pub x_lines: Vec<[f32; 3]>,
    /// Horizontal walls as `[y, x1, x2]`.
    pub y_lines: Vec<[f32; 3]>,
}

impl WallGeometry {
    /// All walls as world-space segments.
    #[must_use]
    pub fn segments(&self) -> Vec<(WorldPosition, WorldPosition)> {
        let vertical = self
            .x_lines
            .iter()
            .map(|&[x, y1, y2]| (WorldPosition::new(x, y1), WorldPosition::new(x, y2)));
        let horizontal = self
            .y_lines
            .iter()
            .map(|&[y, x1, x2]| (WorldPosition::new(x1, y), WorldPosition::new(x2, y)));
        vertical.chain(horizontal).collect()
    }

    /// Number of wall segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x_lines.len() + self.y_lines.len()
    }

    /// True when the map has no walls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Precomputed walkability samples on a regular lattice.
///
/// Keys are lattice coordinates `(round(x / spacing), round(y / spacing))`;
/// values are quality scores in `[0, 1]` where 0 is solid. Missing
/// samples count as solid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticSamples {
    /// World distance between lattice points.
    pub spacing: f32,
    /// Sample quality by lattice coordinate.
    pub samples: HashMap<(i32, i32), f32>,
}

impl SemanticSamples {
    /// Quality at the lattice point nearest to `pos`.
    #[must_use]
    pub fn quality_at(&self, pos: WorldPosition) -> f32 {
        if self.spacing <= 0.0 {
            return 0.0;
        }
        let key = (
            (pos.x / self.spacing).round() as i32,
            (pos.y / self.spacing).round() as i32,
        );
        self.samples.get(&key).copied().unwrap_or(0.0).clamp(0.0, 1.0)
    }
}

/// Source geometry for one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapGeometry {
    /// Wall line segments.
    Lines(WallGeometry),
    /// Precomputed semantic walkability samples.
    Semantic(SemanticSamples),
}

impl Default for MapGeometry {
    fn default() -> Self {
        Self::Lines(WallGeometry::default())
    }
}

/// Rasterize a map's geometry and prune cells unreachable from `spawns`.
///
/// # Errors
///
/// Returns [`NavError::InvalidBounds`] for empty bounds and
/// [`NavError::NoWalkableCells`] when nothing is left walkable.
pub fn rasterize(
    map: &MapId,
    bounds: Bounds,
    geometry: &MapGeometry,
    spawns: &[WorldPosition],
    config: &TerrainConfig,
) -> Result<TerrainGrid> {
    if !bounds.is_valid() || config.cell_size <= 0.0 {
        return Err(NavError::InvalidBounds {
            map: map.to_string(),
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            max_x: bounds.max_x,
            max_y: bounds.max_y,
        });
    }

    let started = Instant::now();
    let mut grid = match geometry {
        MapGeometry::Lines(walls) => rasterize_lines(map, bounds, walls, config),
        MapGeometry::Semantic(samples) => rasterize_semantic(map, bounds, samples, config),
    };
    let open = grid.walkable_count();

    let reachable = prune_unreachable(&mut grid, spawns);
    if reachable == 0 {
        return Err(NavError::NoWalkableCells(map.to_string()));
    }

    info!(
        map = %map,
        width = grid.width(),
        height = grid.height(),
        open,
        reachable,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Rasterized terrain"
    );
    Ok(grid)
}

/// Rasterize wall lines into a grid, without reachability pruning.
#[must_use]
pub fn rasterize_lines(
    map: &MapId,
    bounds: Bounds,
    walls: &WallGeometry,
    config: &TerrainConfig,
) -> TerrainGrid {
    let index = WallIndex::new(walls);
    let template = TerrainGrid::new(map.clone(), bounds, config.cell_size, TerrainCell::open());

    let cells: Vec<TerrainCell> = (0..template.cells().len())
        .into_par_iter()
        .map(|i| {
            let centre = template.grid_to_world(template.cell_at(i));
            index.classify(centre, config)
        })
        .collect();

    debug!(map = %map, walls = walls.len(), "Line rasterization complete");
    TerrainGrid::from_cells(map.clone(), bounds, config.cell_size, cells)
}

/// Rasterize semantic samples into a grid, without reachability pruning.
#[must_use]
pub fn rasterize_semantic(
    map: &MapId,
    bounds: Bounds,
    samples: &SemanticSamples,
    config: &TerrainConfig,
) -> TerrainGrid {
    let template = TerrainGrid::new(map.clone(), bounds, config.cell_size, TerrainCell::open());
    let half = config.cell_size / 2.0;

    let cells: Vec<TerrainCell> = (0..template.cells().len())
        .into_par_iter()
        .map(|i| {
            let centre = template.grid_to_world(template.cell_at(i));
            let worst = [(-half, -half), (half, -half), (-half, half), (half, half)]
                .iter()
                .map(|&(dx, dy)| {
                    samples.quality_at(WorldPosition::new(centre.x + dx, centre.y + dy))
                })
                .fold(1.0_f32, f32::min);

            if worst <= config.semantic_blocked_threshold {
                TerrainCell::blocked()
            } else {
                TerrainCell::with_cost(1.0 + config.semantic_penalty * (1.0 - worst))
                    .with_corner_score(1.0 - worst)
            }
        })
        .collect();

    debug!(map = %map, samples = samples.samples.len(), "Semantic rasterization complete");
    TerrainGrid::from_cells(map.clone(), bounds, config.cell_size, cells)
}

/// Flood fill from `spawns`; block everything not reached.
///
/// Spawns inside blocked cells are moved to their nearest walkable cell
/// first. Returns the number of walkable cells left.
fn prune_unreachable(grid: &mut TerrainGrid, spawns: &[WorldPosition]) -> usize {
    if grid.walkable_count() == 0 {
        return 0;
    }

    let seeds: Vec<GridCell> = spawns
        .iter()
        .map(|&spawn| {
            let cell = grid.world_to_grid(spawn);
            if grid.is_walkable(cell) {
                cell
            } else {
                let snapped = find_nearest_walkable(grid, cell, Heuristic::Euclidean);
                warn!(
                    map = %grid.map(),
                    %spawn,
                    %snapped,
                    "Spawn is not walkable, seeding flood fill from nearest cell"
                );
                snapped
            }
        })
        .collect();

    grid.retain_reachable(&seeds)
}

/// Read-only spatial index over a map's walls.
struct WallIndex {
    tree: RTree<Line<[f32; 2]>>,
}

impl WallIndex {
    fn new(walls: &WallGeometry) -> Self {
        let lines = walls
            .segments()
            .into_iter()
            // Zero-length segments have no direction to measure against.
            .filter(|(a, b)| a != b)
            .map(|(a, b)| Line::new(a.to_array(), b.to_array()))
            .collect();
        Self {
            tree: RTree::bulk_load(lines),
        }
    }

    /// Terrain data for a cell centred on `centre`.
    fn classify(&self, centre: WorldPosition, config: &TerrainConfig) -> TerrainCell {
        let point = centre.to_array();
        let avoid = config.avoidance_distance.max(config.unwalkable_distance);
        let nearest_sq = self
            .tree
            .locate_within_distance(point, avoid * avoid)
            .map(|line| line.distance_2(&point))
            .fold(f32::INFINITY, f32::min);

        if nearest_sq.is_infinite() {
            let corner_score = self.corner_score(centre, config.corner_probe_length);
            return TerrainCell::open().with_corner_score(corner_score);
        }

        let distance = nearest_sq.sqrt();
        if distance < config.unwalkable_distance {
            return TerrainCell::blocked();
        }

        let corner_score = self.corner_score(centre, config.corner_probe_length);

        let band = (avoid - config.unwalkable_distance).max(f32::EPSILON);
        let closeness = ((avoid - distance) / band).clamp(0.0, 1.0);
        TerrainCell::with_cost(1.0 + config.avoidance_penalty * closeness * closeness)
            .with_corner_score(corner_score)
    }

    /// Mean closeness of the eight probe hits, 0 when nothing is hit.
    fn corner_score(&self, centre: WorldPosition, probe_length: f32) -> f32 {
        if probe_length <= 0.0 {
            return 0.0;
        }
        let point = centre.to_array();
        let nearby: Vec<&Line<[f32; 2]>> = self
            .tree
            .locate_within_distance(point, probe_length * probe_length)
            .collect();
        if nearby.is_empty() {
            return 0.0;
        }

        let total: f32 = DIRECTIONS
            .iter()
            .map(|&(dx, dy)| {
                let len = ((dx * dx + dy * dy) as f32).sqrt();
                let tip = WorldPosition::new(
                    centre.x + dx as f32 / len * probe_length,
                    centre.y + dy as f32 / len * probe_length,
                );
                nearby
                    .iter()
                    .filter_map(|line| {
                        segment_intersection(
                            centre,
                            tip,
                            WorldPosition::new(line.from[0], line.from[1]),
                            WorldPosition::new(line.to[0], line.to[1]),
                        )
                    })
                    .fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))))
                    .map_or(0.0, |t| 1.0 - t)
            })
            .sum();

        total / DIRECTIONS.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_walls(size: f32) -> WallGeometry {
        WallGeometry {
            x_lines: vec![[0.0, 0.0, size], [size, 0.0, size]],
            y_lines: vec![[0.0, 0.0, size], [size, 0.0, size]],
        }
    }

    fn config() -> TerrainConfig {
        TerrainConfig::default().with_cell_size(10.0).with_clearance(6.0, 18.0)
    }

    fn room_bounds() -> Bounds {
        Bounds::new(0.0, 0.0, 200.0, 200.0)
    }

    fn room_grid() -> TerrainGrid {
        rasterize_lines(&MapId::new("room"), room_bounds(), &room_walls(200.0), &config())
    }

    #[test]
    fn test_room_centre_is_open() {
        let grid = room_grid();

        let centre = grid.get(GridCell::new(10, 10)).unwrap();
        assert!(centre.walkable);
        assert_eq!(centre.cost, 1.0);
        assert_eq!(centre.corner_score, 0.0);
    }

    #[test]
    fn test_cells_touching_walls_are_blocked() {
        let grid = room_grid();

        // Centre (5, 5) is 5 units from two walls
        assert!(!grid.is_walkable(GridCell::new(0, 0)));
        assert!(!grid.is_walkable(GridCell::new(0, 10)));
        assert!(!grid.is_walkable(GridCell::new(19, 10)));
    }

    #[test]
    fn test_avoidance_band_costs_more_closer_to_walls() {
        let grid = room_grid();

        // Centres at x = 15 and x = 25 (distances 15 and 25 to the wall at x = 0)
        let near = grid.get(GridCell::new(1, 10)).unwrap();
        let far = grid.get(GridCell::new(2, 10)).unwrap();
        assert!(near.walkable);
        assert!(near.cost > 1.0);
        assert_eq!(far.cost, 1.0);
    }

    #[test]
    fn test_corner_cells_score_higher() {
        let grid = room_grid();

        let corner = grid.get(GridCell::new(1, 1)).unwrap();
        let edge = grid.get(GridCell::new(1, 10)).unwrap();
        assert!(corner.corner_score > edge.corner_score);
        assert!(edge.corner_score > 0.0);
        assert!(corner.corner_score <= 1.0);
    }

    #[test]
    fn test_flood_fill_blocks_sealed_pocket() {
        let mut walls = room_walls(200.0);
        // A sealed 60x60 box in the middle of the room
        walls.x_lines.extend([[70.0, 70.0, 130.0], [130.0, 70.0, 130.0]]);
        walls.y_lines.extend([[70.0, 70.0, 130.0], [130.0, 70.0, 130.0]]);

        let grid = rasterize(
            &MapId::new("room"),
            Bounds::new(0.0, 0.0, 200.0, 200.0),
            &MapGeometry::Lines(walls.clone()),
            &[WorldPosition::new(30.0, 30.0)],
            &config(),
        )
        .unwrap();

        // Box interior was geometrically open but is unreachable
        let unpruned = rasterize_lines(&MapId::new("room"), room_bounds(), &walls, &config());
        assert!(unpruned.is_walkable(GridCell::new(10, 10)));
        assert!(!grid.is_walkable(GridCell::new(10, 10)));
        assert!(grid.is_walkable(GridCell::new(3, 3)));
    }

    #[test]
    fn test_no_walkable_cells_is_error() {
        let walls = WallGeometry {
            x_lines: (0..20).map(|i| [i as f32 * 5.0, 0.0, 100.0]).collect(),
            y_lines: Vec::new(),
        };
        let result = rasterize(
            &MapId::new("solid"),
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            &MapGeometry::Lines(walls),
            &[WorldPosition::new(50.0, 50.0)],
            &config(),
        );
        assert!(matches!(result, Err(NavError::NoWalkableCells(_))));
    }

    #[test]
    fn test_invalid_bounds_is_error() {
        let result = rasterize(
            &MapId::new("flat"),
            Bounds::new(0.0, 0.0, 0.0, 100.0),
            &MapGeometry::default(),
            &[WorldPosition::ZERO],
            &config(),
        );
        assert!(matches!(result, Err(NavError::InvalidBounds { .. })));
    }

    #[test]
    fn test_semantic_worst_corner_wins() {
        let mut samples = SemanticSamples {
            spacing: 10.0,
            samples: HashMap::new(),
        };
        for x in 0..=4 {
            for y in 0..=4 {
                samples.samples.insert((x, y), 1.0);
            }
        }
        // One poor sample shared by four cells, one solid sample
        samples.samples.insert((2, 2), 0.5);
        samples.samples.insert((4, 4), 0.0);

        let bounds = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let grid = rasterize_semantic(&MapId::new("sem"), bounds, &samples, &config());

        assert_eq!(grid.get(GridCell::new(0, 0)).unwrap().cost, 1.0);
        let poor = grid.get(GridCell::new(1, 1)).unwrap();
        assert!(poor.walkable);
        assert!((poor.cost - 3.0).abs() < 1e-5);
        assert!((poor.corner_score - 0.5).abs() < 1e-5);
        assert!(!grid.is_walkable(GridCell::new(3, 3)));
    }

    #[test]
    fn test_spawn_in_wall_still_seeds_fill() {
        let grid = rasterize(
            &MapId::new("room"),
            Bounds::new(0.0, 0.0, 200.0, 200.0),
            &MapGeometry::Lines(room_walls(200.0)),
            &[WorldPosition::new(1.0, 1.0)],
            &config(),
        )
        .unwrap();
        assert!(grid.is_walkable(GridCell::new(10, 10)));
    }
}
