//! # Nav Core
//!
//! Hierarchical pathfinding across a world made of many 2D maps joined by
//! doors, transporters, leave actions and return-to-town teleports.
//!
//! Data flows leaf first:
//! - Map geometry is rasterized once into a cost grid per map
//! - A* searches a grid between two cells
//! - Raw paths are merged, smoothed and cached per map
//! - A connection graph links every map's connection points
//! - A router stitches per-map paths into one cross-map route
//! - A traversal state machine turns a route into movement intents
//!
//! ## Crate Structure
//!
//! - [`terrain`] / [`rasterize`] - Terrain grids and how they are built
//! - [`pathfinding`] - A* and nearest-walkable search
//! - [`smoothing`] / [`path_cache`] - Post-processing and cached queries
//! - [`snapshot`] / [`world`] - World input and loaded maps
//! - [`graph`] / [`router`] - Connection graph and route search
//! - [`traversal`] - Route-following state machine

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod path_cache;
pub mod pathfinding;
pub mod rasterize;
pub mod route;
pub mod router;
pub mod smoothing;
pub mod snapshot;
pub mod terrain;
pub mod traversal;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        NavConfig, RoutingConfig, SmoothingConfig, TerrainConfig, TraversalConfig,
    };
    pub use crate::error::{NavError, Result};
    pub use crate::geometry::{GridCell, MapId, MapLocation, WorldPosition};
    pub use crate::graph::ConnectionGraph;
    pub use crate::pathfinding::{
        find_nearest_walkable, find_path, DynamicCosts, GridPath, Heuristic,
    };
    pub use crate::rasterize::{MapGeometry, SemanticSamples, WallGeometry};
    pub use crate::route::{GraphEdge, InterMapEdge, InterMapKind, Route, TeleportEdge, WorldPath};
    pub use crate::router::Router;
    pub use crate::snapshot::{
        Destination, DoorDescriptor, MapDescriptor, TransporterDescriptor, WorldSnapshot,
    };
    pub use crate::terrain::{Bounds, TerrainCell, TerrainGrid};
    pub use crate::traversal::{MovementIntent, RouteTraversal, TraversalState};
    pub use crate::world::{NavMap, World};
}
