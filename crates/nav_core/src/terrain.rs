//! Rasterized terrain grids.
//!
//! A [`TerrainGrid`] is produced once per map by the
//! [`rasterize`](crate::rasterize) module and is immutable afterwards.
//! It owns the map's world-space bounds, so it is also the single place
//! that converts between world positions and grid cells.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::geometry::{GridCell, MapId, WorldPosition};

/// Offsets for 8-directional movement.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// Per-cell terrain data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainCell {
    /// Whether an agent may stand in this cell.
    pub walkable: bool,
    /// Movement cost multiplier (1.0 = unobstructed).
    pub cost: f32,
    /// How enclosed the cell is, 0 (open) to 1 (boxed in).
    pub corner_score: f32,
}

impl Default for TerrainCell {
    fn default() -> Self {
        Self::open()
    }
}

impl TerrainCell {
    /// Unobstructed walkable cell.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            walkable: true,
            cost: 1.0,
            corner_score: 0.0,
        }
    }

    /// Unwalkable cell.
    #[must_use]
    pub const fn blocked() -> Self {
        Self {
            walkable: false,
            cost: f32::INFINITY,
            corner_score: 1.0,
        }
    }

    /// Walkable cell with a cost multiplier.
    #[must_use]
    pub const fn with_cost(cost: f32) -> Self {
        Self {
            walkable: true,
            cost,
            corner_score: 0.0,
        }
    }

    /// Set the corner score.
    #[must_use]
    pub const fn with_corner_score(mut self, corner_score: f32) -> Self {
        self.corner_score = corner_score;
        self
    }
}

/// World-space bounding box of a map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum X.
    pub min_x: f32,
    /// Minimum Y.
    pub min_y: f32,
    /// Maximum X.
    pub max_x: f32,
    /// Maximum Y.
    pub max_y: f32,
}

impl Bounds {
    /// Create new bounds.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounds enclose a positive area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.max_x > self.min_x && self.max_y > self.min_y
    }

    /// Whether `pos` lies inside the bounds (edges included).
    #[must_use]
    pub fn contains(&self, pos: WorldPosition) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.y >= self.min_y && pos.y <= self.max_y
    }

    /// Width in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Rasterized terrain for one map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    map: MapId,
    bounds: Bounds,
    cell_size: f32,
    width: u32,
    height: u32,
    /// Cell data stored in row-major order.
    cells: Vec<TerrainCell>,
}

impl TerrainGrid {
    /// Create a grid covering `bounds` with every cell set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are empty or `cell_size` is not positive.
    #[must_use]
    pub fn new(map: MapId, bounds: Bounds, cell_size: f32, fill: TerrainCell) -> Self {
        assert!(bounds.is_valid(), "TerrainGrid bounds must enclose an area");
        assert!(cell_size > 0.0, "TerrainGrid cell_size must be positive");

        let width = ((bounds.width() / cell_size).ceil() as u32).max(1);
        let height = ((bounds.height() / cell_size).ceil() as u32).max(1);
        Self {
            map,
            bounds,
            cell_size,
            width,
            height,
            cells: vec![fill; (width as usize) * (height as usize)],
        }
    }

    /// Create a grid from precomputed row-major cells.
    ///
    /// # Panics
    ///
    /// Panics if `cells` does not match the dimensions implied by `bounds`.
    #[must_use]
    pub fn from_cells(map: MapId, bounds: Bounds, cell_size: f32, cells: Vec<TerrainCell>) -> Self {
        let mut grid = Self::new(map, bounds, cell_size, TerrainCell::blocked());
        assert_eq!(
            cells.len(),
            grid.cells.len(),
            "cell count does not match grid dimensions"
        );
        grid.cells = cells;
        grid
    }

    /// Map this grid belongs to.
    #[must_use]
    pub fn map(&self) -> &MapId {
        &self.map
    }

    /// World-space bounds.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Cell size in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a cell is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }

    #[inline]
    fn index(&self, cell: GridCell) -> usize {
        (cell.y as usize) * (self.width as usize) + (cell.x as usize)
    }

    /// Cell for a row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> GridCell {
        let width = self.width as usize;
        GridCell::new((index % width) as i32, (index / width) as i32)
    }

    /// Terrain data for a cell, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, cell: GridCell) -> Option<&TerrainCell> {
        self.in_bounds(cell).then(|| &self.cells[self.index(cell)])
    }

    /// Replace the terrain data of a cell. Returns `false` if out of bounds.
    pub fn set(&mut self, cell: GridCell, data: TerrainCell) -> bool {
        if self.in_bounds(cell) {
            let index = self.index(cell);
            self.cells[index] = data;
            true
        } else {
            false
        }
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    /// Check if a cell is walkable. Out-of-bounds cells are not.
    #[must_use]
    pub fn is_walkable(&self, cell: GridCell) -> bool {
        self.get(cell).is_some_and(|c| c.walkable)
    }

    /// Movement cost multiplier, `None` for blocked or out-of-bounds cells.
    #[must_use]
    pub fn cost(&self, cell: GridCell) -> Option<f32> {
        self.get(cell).filter(|c| c.walkable).map(|c| c.cost)
    }

    /// Number of walkable cells.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.walkable).count()
    }

    /// Position in fractional grid units.
    fn to_grid_space(&self, pos: WorldPosition) -> (f32, f32) {
        (
            (pos.x - self.bounds.min_x) / self.cell_size,
            (pos.y - self.bounds.min_y) / self.cell_size,
        )
    }

    /// Convert a world position to the cell containing it.
    ///
    /// Positions outside the map are clamped onto the nearest edge cell.
    #[must_use]
    pub fn world_to_grid(&self, pos: WorldPosition) -> GridCell {
        let (gx, gy) = self.to_grid_space(pos);
        GridCell::new(
            (gx.floor() as i64).clamp(0, i64::from(self.width) - 1) as i32,
            (gy.floor() as i64).clamp(0, i64::from(self.height) - 1) as i32,
        )
    }

    /// World position of a cell centre.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridCell) -> WorldPosition {
        WorldPosition::new(
            self.bounds.min_x + (cell.x as f32 + 0.5) * self.cell_size,
            self.bounds.min_y + (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    /// Check if a diagonal move is valid (no corner cutting through blocked cells).
    #[inline]
    fn is_step_valid(&self, from: GridCell, dx: i32, dy: i32) -> bool {
        if dx != 0 && dy != 0 {
            self.is_walkable(from.offset(dx, 0)) && self.is_walkable(from.offset(0, dy))
        } else {
            true
        }
    }

    /// Walkable 8-connected neighbours of `cell`, with their step offsets.
    ///
    /// Diagonal steps require both adjacent orthogonal cells to be walkable.
    /// Flood fill and A* share this rule, so anything flood fill reaches is
    /// reachable by A* as well.
    pub fn neighbors(&self, cell: GridCell) -> impl Iterator<Item = (GridCell, (i32, i32))> + '_ {
        DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
            let next = cell.offset(dx, dy);
            (self.is_walkable(next) && self.is_step_valid(cell, dx, dy)).then_some((next, (dx, dy)))
        })
    }

    /// First unwalkable cell crossed by the segment `from`-`to`, if any.
    ///
    /// Walks every cell the segment passes through. When the segment
    /// crosses a cell corner exactly, both side cells must be walkable.
    #[must_use]
    pub fn first_blocked_cell(&self, from: WorldPosition, to: WorldPosition) -> Option<GridCell> {
        let (ax, ay) = self.to_grid_space(from);
        let (bx, by) = self.to_grid_space(to);
        let mut cell = self.world_to_grid(from);
        let end = self.world_to_grid(to);

        let dx = bx - ax;
        let dy = by - ay;
        let step_x = if dx > 0.0 { 1 } else if dx < 0.0 { -1 } else { 0 };
        let step_y = if dy > 0.0 { 1 } else if dy < 0.0 { -1 } else { 0 };
        let t_delta_x = if dx != 0.0 { 1.0 / dx.abs() } else { f32::INFINITY };
        let t_delta_y = if dy != 0.0 { 1.0 / dy.abs() } else { f32::INFINITY };
        let mut t_max_x = match step_x {
            1 => (cell.x as f32 + 1.0 - ax) / dx,
            -1 => (ax - cell.x as f32) / -dx,
            _ => f32::INFINITY,
        };
        let mut t_max_y = match step_y {
            1 => (cell.y as f32 + 1.0 - ay) / dy,
            -1 => (ay - cell.y as f32) / -dy,
            _ => f32::INFINITY,
        };

        let max_steps = (self.width + self.height) as usize * 2 + 2;
        for _ in 0..max_steps {
            if !self.is_walkable(cell) {
                return Some(cell);
            }
            if cell == end {
                return None;
            }

            if (t_max_x - t_max_y).abs() <= 1e-6 {
                for side in [cell.offset(step_x, 0), cell.offset(0, step_y)] {
                    if !self.is_walkable(side) {
                        return Some(side);
                    }
                }
                cell = cell.offset(step_x, step_y);
                t_max_x += t_delta_x;
                t_max_y += t_delta_y;
            } else if t_max_x < t_max_y {
                cell = cell.offset(step_x, 0);
                t_max_x += t_delta_x;
            } else {
                cell = cell.offset(0, step_y);
                t_max_y += t_delta_y;
            }

            if !self.in_bounds(cell) {
                break;
            }
        }

        // Float drift walked us off the segment; judge by the end cell.
        (!self.is_walkable(end)).then_some(end)
    }

    /// True when no unwalkable cell lies between `from` and `to`.
    #[must_use]
    pub fn line_of_sight(&self, from: WorldPosition, to: WorldPosition) -> bool {
        self.first_blocked_cell(from, to).is_none()
    }

    /// Force every walkable cell not reachable from `seeds` to unwalkable.
    ///
    /// Seeds that are themselves unwalkable are ignored. Returns the number
    /// of walkable cells left.
    pub fn retain_reachable(&mut self, seeds: &[GridCell]) -> usize {
        let mut reached = vec![false; self.cells.len()];
        let mut frontier = VecDeque::new();

        for &seed in seeds {
            if self.is_walkable(seed) && !reached[self.index(seed)] {
                reached[self.index(seed)] = true;
                frontier.push_back(seed);
            }
        }

        while let Some(cell) = frontier.pop_front() {
            let next: Vec<GridCell> = self.neighbors(cell).map(|(n, _)| n).collect();
            for n in next {
                let index = self.index(n);
                if !reached[index] {
                    reached[index] = true;
                    frontier.push_back(n);
                }
            }
        }

        let mut remaining = 0;
        for (cell, reached) in self.cells.iter_mut().zip(reached) {
            if reached {
                remaining += 1;
            } else if cell.walkable {
                *cell = TerrainCell::blocked();
            }
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: f32, height: f32, cell_size: f32) -> TerrainGrid {
        TerrainGrid::new(
            MapId::new("test"),
            Bounds::new(0.0, 0.0, width, height),
            cell_size,
            TerrainCell::open(),
        )
    }

    #[test]
    fn test_grid_dimensions() {
        let grid = open_grid(100.0, 45.0, 10.0);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.walkable_count(), 50);
    }

    #[test]
    fn test_world_to_grid_conversion() {
        let grid = TerrainGrid::new(
            MapId::new("test"),
            Bounds::new(-50.0, -50.0, 50.0, 50.0),
            10.0,
            TerrainCell::open(),
        );

        assert_eq!(grid.world_to_grid(WorldPosition::new(-50.0, -50.0)), GridCell::new(0, 0));
        assert_eq!(grid.world_to_grid(WorldPosition::new(0.0, 0.0)), GridCell::new(5, 5));
        assert_eq!(grid.world_to_grid(WorldPosition::new(49.9, 49.9)), GridCell::new(9, 9));

        // Outside positions clamp onto the edge
        assert_eq!(grid.world_to_grid(WorldPosition::new(500.0, -500.0)), GridCell::new(9, 0));
    }

    #[test]
    fn test_grid_to_world_is_cell_centre() {
        let grid = open_grid(100.0, 100.0, 10.0);
        assert_eq!(grid.grid_to_world(GridCell::new(0, 0)), WorldPosition::new(5.0, 5.0));
        assert_eq!(grid.grid_to_world(GridCell::new(3, 7)), WorldPosition::new(35.0, 75.0));
        let cell = GridCell::new(3, 7);
        assert_eq!(grid.world_to_grid(grid.grid_to_world(cell)), cell);
    }

    #[test]
    fn test_neighbors_no_corner_cutting() {
        let mut grid = open_grid(30.0, 30.0, 10.0);
        grid.set(GridCell::new(2, 1), TerrainCell::blocked());

        let neighbors: Vec<GridCell> =
            grid.neighbors(GridCell::new(1, 1)).map(|(c, _)| c).collect();
        assert!(!neighbors.contains(&GridCell::new(2, 1)));
        assert!(!neighbors.contains(&GridCell::new(2, 2)));
        assert!(!neighbors.contains(&GridCell::new(2, 0)));
        assert!(neighbors.contains(&GridCell::new(0, 0)));
        assert_eq!(neighbors.len(), 5);
    }

    #[test]
    fn test_line_of_sight() {
        let mut grid = open_grid(100.0, 100.0, 10.0);
        assert!(grid.line_of_sight(WorldPosition::new(5.0, 5.0), WorldPosition::new(95.0, 95.0)));

        for y in 0..9 {
            grid.set(GridCell::new(5, y), TerrainCell::blocked());
        }
        let from = WorldPosition::new(15.0, 45.0);
        let to = WorldPosition::new(85.0, 45.0);
        assert!(!grid.line_of_sight(from, to));
        assert_eq!(grid.first_blocked_cell(from, to), Some(GridCell::new(5, 4)));

        // Row 9 is still open
        assert!(grid.line_of_sight(WorldPosition::new(15.0, 95.0), WorldPosition::new(85.0, 95.0)));
    }

    #[test]
    fn test_line_of_sight_exact_corner() {
        let mut grid = open_grid(30.0, 30.0, 10.0);
        grid.set(GridCell::new(1, 0), TerrainCell::blocked());

        // Diagonal through the corner shared by (0,0), (1,0), (0,1), (1,1)
        assert!(!grid.line_of_sight(WorldPosition::new(5.0, 5.0), WorldPosition::new(15.0, 15.0)));
    }

    #[test]
    fn test_retain_reachable_removes_pockets() {
        let mut grid = open_grid(50.0, 50.0, 10.0);
        // Wall off the right two columns
        for y in 0..5 {
            grid.set(GridCell::new(2, y), TerrainCell::blocked());
        }

        let remaining = grid.retain_reachable(&[GridCell::new(0, 0)]);
        assert_eq!(remaining, 10);
        assert!(grid.is_walkable(GridCell::new(1, 4)));
        assert!(!grid.is_walkable(GridCell::new(3, 2)));
        assert!(!grid.is_walkable(GridCell::new(4, 4)));
    }

    #[test]
    fn test_blocked_cells_have_no_cost() {
        let mut grid = open_grid(20.0, 20.0, 10.0);
        grid.set(GridCell::new(0, 0), TerrainCell::blocked());
        grid.set(GridCell::new(1, 0), TerrainCell::with_cost(2.5));

        assert_eq!(grid.cost(GridCell::new(0, 0)), None);
        assert_eq!(grid.cost(GridCell::new(1, 0)), Some(2.5));
        assert_eq!(grid.cost(GridCell::new(9, 9)), None);
    }
}
