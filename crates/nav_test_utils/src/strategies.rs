//! Proptest strategies for navigation testing.
//!
//! Grids are small so a failing case shrinks to something readable.

use nav_core::geometry::{GridCell, WorldPosition};
use nav_core::pathfinding::Heuristic;
use nav_core::rasterize::WallGeometry;
use nav_core::terrain::{TerrainCell, TerrainGrid};
use proptest::prelude::*;

use crate::fixtures::open_grid;

/// Generate any heuristic.
pub fn arb_heuristic() -> impl Strategy<Value = Heuristic> {
    prop_oneof![
        Just(Heuristic::Manhattan),
        Just(Heuristic::Euclidean),
        Just(Heuristic::Diagonal),
    ]
}

/// Generate a cell inside a `width` x `height` grid.
pub fn arb_cell(width: u32, height: u32) -> impl Strategy<Value = GridCell> {
    (0..width as i32, 0..height as i32).prop_map(|(x, y)| GridCell::new(x, y))
}

/// Generate a grid with roughly a quarter of its cells blocked and a
/// sprinkling of costly cells.
pub fn arb_grid(width: u32, height: u32) -> impl Strategy<Value = TerrainGrid> {
    let count = (width * height) as usize;
    proptest::collection::vec(0u8..8, count).prop_map(move |rolls| {
        let mut grid = open_grid(width, height);
        for (index, roll) in rolls.into_iter().enumerate() {
            let cell = match roll {
                0 | 1 => TerrainCell::blocked(),
                2 => TerrainCell::with_cost(2.5),
                _ => continue,
            };
            grid.set(grid.cell_at(index), cell);
        }
        grid
    })
}

/// Generate a grid with two cells forced walkable, for search queries.
pub fn arb_query(
    width: u32,
    height: u32,
) -> impl Strategy<Value = (TerrainGrid, GridCell, GridCell)> {
    let cells = (arb_cell(width, height), arb_cell(width, height));
    (arb_grid(width, height), cells).prop_map(|(mut grid, (start, goal))| {
        for cell in [start, goal] {
            if !grid.is_walkable(cell) {
                grid.set(cell, TerrainCell::open());
            }
        }
        (grid, start, goal)
    })
}

/// Generate a position inside a `size` x `size` map, away from its edges.
pub fn arb_position(size: f32) -> impl Strategy<Value = WorldPosition> {
    let margin = size * 0.1;
    (margin..size - margin, margin..size - margin).prop_map(|(x, y)| WorldPosition::new(x, y))
}

/// Generate a handful of axis-aligned interior walls for a `size` map.
pub fn arb_walls(size: f32, max_walls: usize) -> impl Strategy<Value = WallGeometry> {
    let line = (0.0..size, 0.0..size, 1.0..size / 2.0)
        .prop_map(|(at, from, length)| [at, from, from + length]);
    (
        proptest::collection::vec(line.clone(), 0..=max_walls),
        proptest::collection::vec(line, 0..=max_walls),
    )
        .prop_map(|(x_lines, y_lines)| WallGeometry { x_lines, y_lines })
}
