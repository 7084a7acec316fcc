//! Test fixtures and helpers.
//!
//! Small hand-built worlds with known geometry, for consistent testing.
//! Every map uses the default [`NavConfig`] unless a helper says
//! otherwise.

use nav_core::config::NavConfig;
use nav_core::geometry::{MapId, WorldPosition};
use nav_core::rasterize::{MapGeometry, WallGeometry};
use nav_core::snapshot::{Destination, DoorDescriptor, MapDescriptor, WorldSnapshot};
use nav_core::terrain::{Bounds, TerrainCell, TerrainGrid};
use nav_core::world::World;

/// Shorthand for a world position.
#[must_use]
pub fn pos(x: f32, y: f32) -> WorldPosition {
    WorldPosition::new(x, y)
}

/// Walls along the four edges of a `width` x `height` map.
#[must_use]
pub fn perimeter(width: f32, height: f32) -> WallGeometry {
    WallGeometry {
        x_lines: vec![[0.0, 0.0, height], [width, 0.0, height]],
        y_lines: vec![[0.0, 0.0, width], [height, 0.0, width]],
    }
}

/// An open walled room with one spawn near its corner.
#[must_use]
pub fn open_room(name: &str, size: f32) -> MapDescriptor {
    MapDescriptor {
        name: name.to_string(),
        bounds: Bounds::new(0.0, 0.0, size, size),
        geometry: MapGeometry::Lines(perimeter(size, size)),
        spawns: vec![pos(40.0, 40.0)],
        doors: Vec::new(),
        transporters: Vec::new(),
        leave: None,
    }
}

/// A 400x200 room split by a wall from the bottom edge up to y = 130.
///
/// Anything crossing from the left half to the right half has to go
/// around the top of the wall.
#[must_use]
pub fn walled_corridor() -> MapDescriptor {
    let mut walls = perimeter(400.0, 200.0);
    walls.x_lines.push([200.0, 0.0, 130.0]);
    MapDescriptor {
        name: "corridor".to_string(),
        bounds: Bounds::new(0.0, 0.0, 400.0, 200.0),
        geometry: MapGeometry::Lines(walls),
        spawns: vec![pos(40.0, 40.0)],
        doors: Vec::new(),
        transporters: Vec::new(),
        leave: None,
    }
}

/// A 320x320 room with a sealed 80x80 box in one corner.
///
/// The box interior is geometrically open but unreachable from the spawn.
#[must_use]
pub fn room_with_pocket() -> MapDescriptor {
    let mut room = open_room("pocket", 320.0);
    if let MapGeometry::Lines(walls) = &mut room.geometry {
        walls.x_lines.extend([[200.0, 200.0, 280.0], [280.0, 200.0, 280.0]]);
        walls.y_lines.extend([[200.0, 200.0, 280.0], [280.0, 200.0, 280.0]]);
    }
    room
}

/// Centre of the sealed box in [`room_with_pocket`].
#[must_use]
pub fn pocket_centre() -> WorldPosition {
    pos(240.0, 240.0)
}

/// Position of the only door in [`door_world`].
#[must_use]
pub fn door_position() -> WorldPosition {
    pos(290.0, 160.0)
}

/// Two rooms, "town" and "cave", joined by one door from town to cave.
#[must_use]
pub fn door_world() -> WorldSnapshot {
    let mut town = open_room("town", 320.0);
    town.doors.push(DoorDescriptor {
        position: door_position(),
        to: Destination::new("cave", 0),
    });
    let mut cave = open_room("cave", 320.0);
    cave.spawns = vec![pos(40.0, 160.0)];
    WorldSnapshot {
        maps: vec![town, cave],
    }
}

/// Two rooms with no connection between them.
#[must_use]
pub fn isolated_world() -> WorldSnapshot {
    WorldSnapshot {
        maps: vec![open_room("town", 320.0), open_room("island", 320.0)],
    }
}

/// A single-map world holding [`walled_corridor`].
#[must_use]
pub fn corridor_world() -> WorldSnapshot {
    WorldSnapshot {
        maps: vec![walled_corridor()],
    }
}

/// Load a snapshot with the default configuration.
///
/// # Panics
///
/// Panics if the snapshot does not load; fixtures always should.
#[must_use]
pub fn load(snapshot: &WorldSnapshot) -> World {
    World::load(snapshot, NavConfig::default()).expect("fixture world should load")
}

/// An open grid of `width` x `height` unit cells.
#[must_use]
pub fn open_grid(width: u32, height: u32) -> TerrainGrid {
    TerrainGrid::new(
        MapId::new("grid"),
        Bounds::new(0.0, 0.0, width as f32, height as f32),
        1.0,
        TerrainCell::open(),
    )
}

/// Parse an ASCII grid: `#` is blocked, `~` costs 3, anything else is open.
///
/// Rows are listed top (y = 0) first.
#[must_use]
pub fn grid_from_ascii(rows: &[&str]) -> TerrainGrid {
    let height = rows.len() as u32;
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
    let mut grid = open_grid(width.max(1), height.max(1));
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let cell = match ch {
                '#' => TerrainCell::blocked(),
                '~' => TerrainCell::with_cost(3.0),
                _ => continue,
            };
            grid.set(nav_core::geometry::GridCell::new(x as i32, y as i32), cell);
        }
    }
    grid
}
