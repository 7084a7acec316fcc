//! ASCII rendering of terrain grids.
//!
//! One character per block of `scale` x `scale` cells, row 0 at the top.
//! A block shows its most notable content, in this order: path, spawn,
//! connection, blocked, costly, walkable.

use nav_core::geometry::{GridCell, WorldPosition};
use nav_core::terrain::TerrainGrid;
use nav_core::world::NavMap;

/// Glyph for a block of plain walkable cells.
pub const WALKABLE: char = '.';
/// Glyph for a block containing a cell that costs more than 1.
pub const COSTLY: char = '+';
/// Glyph for a block containing an unwalkable cell.
pub const BLOCKED: char = '#';
/// Glyph for a spawn point.
pub const SPAWN: char = 'S';
/// Glyph for a door, transporter or leave point.
pub const CONNECTION: char = 'D';
/// Glyph for a path waypoint.
pub const PATH: char = '*';

/// Rendering options.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Cells per character along each axis.
    pub scale: u32,
    /// Append a glyph legend and cell counts.
    pub legend: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1,
            legend: true,
        }
    }
}

/// Render a map's grid with its spawns and connection points.
#[must_use]
pub fn render_map(map: &NavMap, path: &[WorldPosition], config: &RenderConfig) -> String {
    let connections: Vec<WorldPosition> = map.connections().iter().map(|c| c.source).collect();
    render_grid(map.grid(), map.spawns(), &connections, path, config)
}

/// Render a grid with optional overlays.
#[must_use]
pub fn render_grid(
    grid: &TerrainGrid,
    spawns: &[WorldPosition],
    connections: &[WorldPosition],
    path: &[WorldPosition],
    config: &RenderConfig,
) -> String {
    let scale = config.scale.max(1);
    let cols = grid.width().div_ceil(scale);
    let rows = grid.height().div_ceil(scale);
    let block_of = |pos: WorldPosition| {
        let cell = grid.world_to_grid(pos);
        (cell.x as u32 / scale, cell.y as u32 / scale)
    };

    let mut canvas: Vec<Vec<char>> = (0..rows)
        .map(|by| (0..cols).map(|bx| terrain_glyph(grid, bx, by, scale)).collect())
        .collect();

    // Later overlays win.
    for (glyph, points) in [(CONNECTION, connections), (SPAWN, spawns), (PATH, path)] {
        for &pos in points {
            let (bx, by) = block_of(pos);
            let slot = canvas
                .get_mut(by as usize)
                .and_then(|row| row.get_mut(bx as usize));
            if let Some(slot) = slot {
                *slot = glyph;
            }
        }
    }

    let mut out = String::with_capacity(((cols + 1) * rows) as usize);
    for row in canvas {
        out.extend(row);
        out.push('\n');
    }

    if config.legend {
        out.push_str(&format!(
            "{} {WALKABLE} walkable  {COSTLY} costly  {BLOCKED} blocked  \
             {SPAWN} spawn  {CONNECTION} connection  {PATH} path\n",
            grid.map()
        ));
        out.push_str(&format!(
            "{}x{} cells of {}, {} walkable\n",
            grid.width(),
            grid.height(),
            grid.cell_size(),
            grid.walkable_count()
        ));
    }
    out
}

fn terrain_glyph(grid: &TerrainGrid, bx: u32, by: u32, scale: u32) -> char {
    let mut glyph = WALKABLE;
    for dy in 0..scale {
        for dx in 0..scale {
            let cell = GridCell::new((bx * scale + dx) as i32, (by * scale + dy) as i32);
            match grid.get(cell) {
                Some(data) if !data.walkable => return BLOCKED,
                Some(data) if data.cost > 1.0 => glyph = COSTLY,
                _ => {}
            }
        }
    }
    glyph
}
