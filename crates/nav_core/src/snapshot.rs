//! World snapshot input.
//!
//! A snapshot is the immutable description of every map handed over at
//! world load: bounds, wall geometry or semantic samples, spawns and the
//! connections between maps. Snapshots are plain serde data loaded from
//! RON and validated before any rasterization starts.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::geometry::WorldPosition;
use crate::rasterize::MapGeometry;
use crate::terrain::Bounds;

/// Target of a connection: a map and one of its spawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Destination map name.
    pub map: String,
    /// Spawn index on the destination map.
    #[serde(default)]
    pub spawn: usize,
}

impl Destination {
    /// Create a destination.
    #[must_use]
    pub fn new(map: &str, spawn: usize) -> Self {
        Self {
            map: map.to_string(),
            spawn,
        }
    }
}

/// A door the agent walks into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorDescriptor {
    /// Door position on its own map.
    pub position: WorldPosition,
    /// Where the door leads.
    pub to: Destination,
}

/// A transporter NPC offering one or more destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransporterDescriptor {
    /// Transporter position on its own map.
    pub position: WorldPosition,
    /// Reachable destinations.
    pub destinations: Vec<Destination>,
}

/// Everything needed to build one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDescriptor {
    /// Unique map name.
    pub name: String,
    /// World-space bounds.
    pub bounds: Bounds,
    /// Wall lines or semantic samples.
    #[serde(default)]
    pub geometry: MapGeometry,
    /// Spawn points. Index 0 is the default spawn.
    pub spawns: Vec<WorldPosition>,
    /// Doors on this map.
    #[serde(default)]
    pub doors: Vec<DoorDescriptor>,
    /// Transporters on this map.
    #[serde(default)]
    pub transporters: Vec<TransporterDescriptor>,
    /// Where the leave action takes the agent, if the map has one.
    #[serde(default)]
    pub leave: Option<Destination>,
}

impl MapDescriptor {
    /// Every outgoing connection target on this map.
    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.doors
            .iter()
            .map(|door| &door.to)
            .chain(self.transporters.iter().flat_map(|t| t.destinations.iter()))
            .chain(self.leave.iter())
    }
}

/// The full set of maps making up a world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Maps in declaration order.
    pub maps: Vec<MapDescriptor>,
}

impl WorldSnapshot {
    /// Load a snapshot from a RON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse a snapshot from RON text and validate it.
    pub fn from_ron(contents: &str) -> Result<Self> {
        let snapshot: Self = ron::from_str(contents)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Look up a map by name.
    #[must_use]
    pub fn map(&self, name: &str) -> Option<&MapDescriptor> {
        self.maps.iter().find(|m| m.name == name)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a duplicate map name, empty
    /// bounds, a map without spawns, or a connection to a missing map or
    /// spawn.
    pub fn validate(&self) -> Result<()> {
        let mut spawn_counts: HashMap<&str, usize> = HashMap::with_capacity(self.maps.len());

        for map in &self.maps {
            if spawn_counts.insert(&map.name, map.spawns.len()).is_some() {
                return Err(NavError::DuplicateMap(map.name.clone()));
            }
            let b = map.bounds;
            if !b.is_valid() {
                return Err(NavError::InvalidBounds {
                    map: map.name.clone(),
                    min_x: b.min_x,
                    min_y: b.min_y,
                    max_x: b.max_x,
                    max_y: b.max_y,
                });
            }
            if map.spawns.is_empty() {
                return Err(NavError::NoSpawns(map.name.clone()));
            }
        }

        for map in &self.maps {
            for dest in map.destinations() {
                let available = *spawn_counts
                    .get(dest.map.as_str())
                    .ok_or_else(|| NavError::UnknownMap(dest.map.clone()))?;
                if dest.spawn >= available {
                    return Err(NavError::InvalidSpawn {
                        map: dest.map.clone(),
                        spawn: dest.spawn,
                        available,
                    });
                }
            }
        }

        Ok(())
    }
}
