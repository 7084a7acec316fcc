//! Loaded world state.
//!
//! [`World`] owns every [`NavMap`]: its rasterized terrain, path cache,
//! spawns and outgoing connections. Maps are keyed by [`MapId`] in a
//! `BTreeMap` so iteration (and therefore graph construction) is
//! deterministic. Routers and traversals borrow the world; nothing here
//! is global.

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::config::NavConfig;
use crate::error::Result;
use crate::geometry::{MapId, MapLocation, WorldPosition};
use crate::path_cache::MapNavigator;
use crate::pathfinding::Heuristic;
use crate::rasterize::rasterize;
use crate::route::{InterMapKind, WorldPath};
use crate::snapshot::{MapDescriptor, WorldSnapshot};
use crate::terrain::TerrainGrid;

/// An outgoing connection from a map.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Door, transporter or leave.
    pub kind: InterMapKind,
    /// Where on the source map the connection is used.
    pub source: WorldPosition,
    /// Destination map.
    pub dest_map: MapId,
    /// Spawn index on the destination map.
    pub spawn: usize,
}

/// One navigable map.
#[derive(Debug)]
pub struct NavMap {
    id: MapId,
    navigator: MapNavigator,
    spawns: Vec<WorldPosition>,
    connections: Vec<Connection>,
}

impl NavMap {
    /// Rasterize a validated descriptor.
    fn build(descriptor: &MapDescriptor, config: &NavConfig) -> Result<Self> {
        let id = MapId::new(&descriptor.name);
        let grid = rasterize(
            &id,
            descriptor.bounds,
            &descriptor.geometry,
            &descriptor.spawns,
            &config.terrain,
        )?;

        // Leave works anywhere; it is anchored at the default spawn.
        let leave_anchor = descriptor.spawns[0];
        let doors = descriptor.doors.iter().map(|door| Connection {
            kind: InterMapKind::Door,
            source: door.position,
            dest_map: MapId::new(&door.to.map),
            spawn: door.to.spawn,
        });
        let transporters = descriptor.transporters.iter().flat_map(|t| {
            t.destinations.iter().map(move |dest| Connection {
                kind: InterMapKind::Transporter,
                source: t.position,
                dest_map: MapId::new(&dest.map),
                spawn: dest.spawn,
            })
        });
        let leave = descriptor.leave.iter().map(|dest| Connection {
            kind: InterMapKind::Leave,
            source: leave_anchor,
            dest_map: MapId::new(&dest.map),
            spawn: dest.spawn,
        });

        Ok(Self {
            id,
            navigator: MapNavigator::new(grid, config.smoothing.clone()),
            spawns: descriptor.spawns.clone(),
            connections: doors.chain(transporters).chain(leave).collect(),
        })
    }

    /// Map identifier.
    #[must_use]
    pub fn id(&self) -> &MapId {
        &self.id
    }

    /// Rasterized terrain.
    #[must_use]
    pub fn grid(&self) -> &TerrainGrid {
        self.navigator.grid()
    }

    /// Cached path queries on this map.
    #[must_use]
    pub fn navigator(&self) -> &MapNavigator {
        &self.navigator
    }

    /// Spawn points; never empty.
    #[must_use]
    pub fn spawns(&self) -> &[WorldPosition] {
        &self.spawns
    }

    /// Spawn by index.
    #[must_use]
    pub fn spawn(&self, index: usize) -> Option<WorldPosition> {
        self.spawns.get(index).copied()
    }

    /// The default spawn, used as the teleport target.
    #[must_use]
    pub fn default_spawn(&self) -> WorldPosition {
        self.spawns[0]
    }

    /// Outgoing connections.
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The leave connection, if the map has one.
    #[must_use]
    pub fn leave(&self) -> Option<&Connection> {
        self.connections.iter().find(|c| c.kind == InterMapKind::Leave)
    }

    /// Smoothed, cached path between two positions on this map.
    pub fn find_path(
        &self,
        start: WorldPosition,
        goal: WorldPosition,
        heuristic: Heuristic,
    ) -> Option<WorldPath> {
        self.navigator.find_path(start, goal, heuristic)
    }
}

/// Every map of a loaded world.
#[derive(Debug)]
pub struct World {
    maps: BTreeMap<MapId, NavMap>,
    config: NavConfig,
}

impl World {
    /// Validate a snapshot and rasterize all of its maps in parallel.
    ///
    /// # Errors
    ///
    /// Returns the snapshot's validation error, or the first map that
    /// rasterizes to zero walkable cells.
    pub fn load(snapshot: &WorldSnapshot, config: NavConfig) -> Result<Self> {
        snapshot.validate()?;
        let started = Instant::now();

        let built: Vec<NavMap> = snapshot
            .maps
            .par_iter()
            .map(|descriptor| NavMap::build(descriptor, &config))
            .collect::<Result<_>>()?;
        let maps: BTreeMap<MapId, NavMap> = built.into_iter().map(|m| (m.id.clone(), m)).collect();

        let cells: usize = maps.values().map(|m| m.grid().walkable_count()).sum();
        info!(
            maps = maps.len(),
            walkable_cells = cells,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "World loaded"
        );
        Ok(Self { maps, config })
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Look up a map.
    #[must_use]
    pub fn map(&self, id: &MapId) -> Option<&NavMap> {
        self.maps.get(id)
    }

    /// All maps in id order.
    pub fn maps(&self) -> impl Iterator<Item = &NavMap> {
        self.maps.values()
    }

    /// Number of maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// True when the world has no maps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Location of a spawn, if both map and spawn exist.
    #[must_use]
    pub fn spawn_location(&self, map: &MapId, spawn: usize) -> Option<MapLocation> {
        let position = self.maps.get(map)?.spawn(spawn)?;
        Some(MapLocation::at(map.clone(), position))
    }

    /// Intra-map path between two locations on the same known map.
    #[must_use]
    pub fn find_path(
        &self,
        start: &MapLocation,
        goal: &MapLocation,
        heuristic: Heuristic,
    ) -> Option<WorldPath> {
        if start.map != goal.map {
            return None;
        }
        self.maps.get(&start.map)?.find_path(start.position, goal.position, heuristic)
    }
}
