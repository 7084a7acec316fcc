//! Grid-based pathfinding using the A* algorithm.
//!
//! Searches a map's [`TerrainGrid`] over 8-connected neighbours. The
//! selected [`Heuristic`] doubles as the step metric: the cost of moving
//! into a neighbour is the heuristic distance of the step, times the
//! neighbour's terrain cost, times any caller-supplied dynamic cost.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::geometry::GridCell;
use crate::terrain::TerrainGrid;

/// Distance metric used for both step costs and search guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Heuristic {
    /// |dx| + |dy|.
    Manhattan,
    /// Straight-line distance.
    Euclidean,
    /// Octile distance: diagonal steps cost sqrt(2).
    #[default]
    Diagonal,
}

impl Heuristic {
    /// Distance between two cells, in cells.
    #[must_use]
    pub fn distance(self, a: GridCell, b: GridCell) -> f32 {
        let dx = a.x.abs_diff(b.x) as f32;
        let dy = a.y.abs_diff(b.y) as f32;
        match self {
            Self::Manhattan => dx + dy,
            Self::Euclidean => (dx * dx + dy * dy).sqrt(),
            Self::Diagonal => {
                let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
                long + (std::f32::consts::SQRT_2 - 1.0) * short
            }
        }
    }
}

/// Per-cell cost multipliers supplied per query, e.g. to steer around
/// transient obstacles. Cells not listed use a multiplier of 1.
pub type DynamicCosts = HashMap<GridCell, f32>;

/// Raw output of the grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPath {
    /// Cells from start to goal, both included.
    pub cells: Vec<GridCell>,
    /// Total traversal cost, in cells. Infinite when no path exists.
    pub cost: f32,
}

impl GridPath {
    /// The "no path" result.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            cells: Vec::new(),
            cost: f32::INFINITY,
        }
    }

    /// The no-op path from a cell to itself.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cells: Vec::new(),
            cost: 0.0,
        }
    }

    /// Whether a path exists.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.cost.is_finite()
    }
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy)]
struct AStarNode {
    cell: GridCell,
    /// f_score = g_score + heuristic
    f_score: f32,
    /// Insertion counter; earlier pushes win ties.
    sequence: u64,
}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AStarNode {}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so we reverse the comparison for min-heap behavior.
        match other.f_score.total_cmp(&self.f_score) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest path from `start` to `goal`.
///
/// Returns [`GridPath::empty`] when `start == goal` and
/// [`GridPath::not_found`] when the goal cannot be reached.
///
/// # Panics
///
/// Panics if `start` or `goal` is not walkable. Snap query points with
/// [`find_nearest_walkable`] first.
#[must_use]
pub fn find_path(
    grid: &TerrainGrid,
    start: GridCell,
    goal: GridCell,
    heuristic: Heuristic,
    dynamic_costs: Option<&DynamicCosts>,
) -> GridPath {
    assert!(
        grid.is_walkable(start),
        "find_path start {start} on map {} is not walkable",
        grid.map()
    );
    assert!(
        grid.is_walkable(goal),
        "find_path goal {goal} on map {} is not walkable",
        grid.map()
    );

    if start == goal {
        return GridPath::empty();
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
    let mut g_score: HashMap<GridCell, f32> = HashMap::new();
    let mut sequence = 0u64;

    g_score.insert(start, 0.0);
    open_set.push(AStarNode {
        cell: start,
        f_score: heuristic.distance(start, goal),
        sequence,
    });

    while let Some(current) = open_set.pop() {
        let current_g = g_score.get(&current.cell).copied().unwrap_or(f32::INFINITY);

        if current.cell == goal {
            return GridPath {
                cells: reconstruct_path(&came_from, goal),
                cost: current_g,
            };
        }

        // Stale entry superseded by a cheaper push
        if current.f_score > current_g + heuristic.distance(current.cell, goal) + 1e-4 {
            continue;
        }

        for (neighbor, (dx, dy)) in grid.neighbors(current.cell) {
            let Some(cell_cost) = grid.cost(neighbor) else {
                continue;
            };
            let dynamic = dynamic_costs
                .and_then(|costs| costs.get(&neighbor))
                .copied()
                .unwrap_or(1.0);
            let step = heuristic.distance(GridCell::new(0, 0), GridCell::new(dx, dy));

            let tentative_g = current_g + step * cell_cost * dynamic;
            let neighbor_g = g_score.get(&neighbor).copied().unwrap_or(f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.cell);
                g_score.insert(neighbor, tentative_g);

                sequence += 1;
                open_set.push(AStarNode {
                    cell: neighbor,
                    f_score: tentative_g + heuristic.distance(neighbor, goal),
                    sequence,
                });
            }
        }
    }

    GridPath::not_found()
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<GridCell, GridCell>, goal: GridCell) -> Vec<GridCell> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

/// Nearest walkable cell to `cell`, by `heuristic` distance.
///
/// Returns `cell` unchanged when it is already walkable. Cells outside the
/// grid are clamped onto it first.
///
/// # Panics
///
/// Panics if the grid has no walkable cell at all. World loading rejects
/// such maps, so this is a programming error.
#[must_use]
pub fn find_nearest_walkable(grid: &TerrainGrid, cell: GridCell, heuristic: Heuristic) -> GridCell {
    let origin = GridCell::new(
        cell.x.clamp(0, grid.width() as i32 - 1),
        cell.y.clamp(0, grid.height() as i32 - 1),
    );
    if grid.is_walkable(origin) {
        return origin;
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut seen: HashSet<GridCell> = HashSet::new();
    let mut sequence = 0u64;

    seen.insert(origin);
    open_set.push(AStarNode {
        cell: origin,
        f_score: 0.0,
        sequence,
    });

    while let Some(current) = open_set.pop() {
        if grid.is_walkable(current.cell) {
            return current.cell;
        }

        // Expand through blocked cells too; only bounds limit the search.
        for &(dx, dy) in &crate::terrain::DIRECTIONS {
            let next = current.cell.offset(dx, dy);
            if grid.in_bounds(next) && seen.insert(next) {
                sequence += 1;
                open_set.push(AStarNode {
                    cell: next,
                    f_score: heuristic.distance(origin, next),
                    sequence,
                });
            }
        }
    }

    panic!("terrain grid for map {} has no walkable cell", grid.map());
}
