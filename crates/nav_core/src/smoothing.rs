//! Path post-processing.
//!
//! Raw A* output steps cell by cell. Before a path is handed to an agent
//! it is simplified to its turning points, stair-step corners are merged
//! where the terrain allows it, and the result is smoothed with a clamped
//! uniform cubic B-spline into a world-space polyline.

use crate::config::SmoothingConfig;
use crate::geometry::{GridCell, WorldPosition};
use crate::terrain::TerrainGrid;

/// Turn a raw cell path into a world-space waypoint list.
///
/// The first and last cells map to the first and last points exactly.
/// An empty input gives an empty output.
#[must_use]
pub fn post_process(
    grid: &TerrainGrid,
    cells: &[GridCell],
    config: &SmoothingConfig,
) -> Vec<WorldPosition> {
    let merged = merge_steps(grid, cells);
    let waypoints: Vec<WorldPosition> = merged.iter().map(|&c| grid.grid_to_world(c)).collect();

    if !config.enabled {
        return waypoints;
    }

    let smoothed = bspline(&waypoints, config.samples_per_segment);
    let clear = smoothed
        .windows(2)
        .all(|pair| grid.line_of_sight(pair[0], pair[1]));
    if clear {
        smoothed
    } else {
        waypoints
    }
}

/// Chebyshev distance between two cells.
fn chebyshev(a: GridCell, b: GridCell) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Reduce a cell path to turning points, then merge short corner steps.
///
/// A turning point is dropped when it sits one cell away from a
/// neighbouring point and the straight line that skips it stays on
/// walkable terrain.
#[must_use]
pub fn merge_steps(grid: &TerrainGrid, cells: &[GridCell]) -> Vec<GridCell> {
    if cells.len() <= 2 {
        return cells.to_vec();
    }

    let mut turns = Vec::with_capacity(cells.len());
    turns.push(cells[0]);
    for window in cells.windows(3) {
        let incoming = (window[1].x - window[0].x, window[1].y - window[0].y);
        let outgoing = (window[2].x - window[1].x, window[2].y - window[1].y);
        if incoming != outgoing {
            turns.push(window[1]);
        }
    }
    turns.push(cells[cells.len() - 1]);

    if turns.len() <= 2 {
        return turns;
    }

    let mut merged = Vec::with_capacity(turns.len());
    merged.push(turns[0]);
    for i in 1..turns.len() - 1 {
        let prev = merged[merged.len() - 1];
        let here = turns[i];
        let next = turns[i + 1];
        let short_step = chebyshev(prev, here) <= 1 || chebyshev(here, next) <= 1;
        if short_step && grid.line_of_sight(grid.grid_to_world(prev), grid.grid_to_world(next)) {
            continue;
        }
        merged.push(here);
    }
    merged.push(turns[turns.len() - 1]);
    merged
}

/// Sample a clamped uniform cubic B-spline through `points`.
///
/// End points are tripled so the curve starts and ends on them exactly.
/// Inputs shorter than three points are returned unchanged.
#[must_use]
pub fn bspline(points: &[WorldPosition], samples_per_segment: usize) -> Vec<WorldPosition> {
    if points.len() < 3 || samples_per_segment == 0 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];
    let mut control = Vec::with_capacity(points.len() + 4);
    control.extend([first, first]);
    control.extend_from_slice(points);
    control.extend([last, last]);

    let mut out = Vec::with_capacity((control.len() - 3) * samples_per_segment + 1);
    for segment in control.windows(4) {
        for step in 0..samples_per_segment {
            let t = step as f32 / samples_per_segment as f32;
            out.push(bspline_point(segment, t));
        }
    }
    out.push(last);

    out[0] = first;
    out.dedup_by(|a, b| a.equivalent(*b, 1e-4));
    out
}

/// Uniform cubic B-spline basis evaluated over four control points.
fn bspline_point(p: &[WorldPosition], t: f32) -> WorldPosition {
    let t2 = t * t;
    let t3 = t2 * t;
    let b0 = (1.0 - t).powi(3) / 6.0;
    let b1 = (3.0 * t3 - 6.0 * t2 + 4.0) / 6.0;
    let b2 = (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) / 6.0;
    let b3 = t3 / 6.0;
    WorldPosition::new(
        b0 * p[0].x + b1 * p[1].x + b2 * p[2].x + b3 * p[3].x,
        b0 * p[0].y + b1 * p[1].y + b2 * p[2].y + b3 * p[3].y,
    )
}

/// Total polyline length.
#[must_use]
pub fn polyline_length(points: &[WorldPosition]) -> f32 {
    points.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}
