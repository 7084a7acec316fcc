//! Cross-map connection graph.
//!
//! Vertices are connection endpoints (door, transporter and leave sources
//! and their destination spawns) plus every map's default spawn. Edges
//! are inter-map hops, teleports to the default spawn, and walking paths
//! between every pair of vertices that share a map.
//!
//! The graph is built once after the [`World`] is loaded. Walking paths
//! are the expensive part: they are computed in parallel across maps and
//! across vertex pairs, each worker collecting into its own buffer, and
//! merged into the adjacency lists afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::geometry::{MapId, MapLocation};
use crate::pathfinding::Heuristic;
use crate::route::{GraphEdge, InterMapEdge, TeleportEdge};
use crate::world::{NavMap, World};

/// Index of a vertex in a [`ConnectionGraph`].
pub type VertexId = usize;

/// Precomputed connectivity between all maps of a world.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    vertices: Vec<MapLocation>,
    index: HashMap<MapLocation, VertexId>,
    by_map: BTreeMap<MapId, Vec<VertexId>>,
    adjacency: Vec<Vec<(VertexId, GraphEdge)>>,
}

impl ConnectionGraph {
    /// Build the graph for a loaded world.
    #[must_use]
    pub fn build(world: &World) -> Self {
        let started = Instant::now();
        let heuristic = world.config().routing.default_heuristic;
        let mut graph = Self::default();

        for map in world.maps() {
            graph.add_vertex(MapLocation::at(map.id().clone(), map.default_spawn()));
        }

        let mut hops = Vec::new();
        for map in world.maps() {
            for connection in map.connections() {
                let Some(dest) = world.spawn_location(&connection.dest_map, connection.spawn) else {
                    continue;
                };
                let source = MapLocation::at(map.id().clone(), connection.source);
                let from = graph.add_vertex(source.clone());
                let to = graph.add_vertex(dest.clone());
                hops.push((
                    from,
                    to,
                    GraphEdge::InterMap(InterMapEdge {
                        source,
                        dest,
                        kind: connection.kind,
                        spawn: connection.spawn,
                    }),
                ));
            }
        }
        let inter_map = hops.len();
        for (from, to, edge) in hops {
            graph.add_edge(from, to, edge);
        }

        let mut teleports = 0;
        if world.config().routing.teleport_edges {
            for map in world.maps() {
                let town = MapLocation::at(map.id().clone(), map.default_spawn());
                let town_id = graph.add_vertex(town.clone());
                let ids = graph.vertices_on(map.id()).to_vec();
                for vertex in ids {
                    if vertex == town_id {
                        continue;
                    }
                    let edge = GraphEdge::Teleport(TeleportEdge {
                        source: graph.vertices[vertex].clone(),
                        dest: town.clone(),
                    });
                    graph.add_edge(vertex, town_id, edge);
                    teleports += 1;
                }
            }
        }

        let per_map: Vec<(&NavMap, Vec<VertexId>)> = world
            .maps()
            .map(|map| (map, graph.vertices_on(map.id()).to_vec()))
            .collect();
        let walks: Vec<(VertexId, VertexId, GraphEdge)> = per_map
            .par_iter()
            .flat_map(|(map, ids)| graph.walking_edges(map, ids, heuristic))
            .collect();
        let intra_map = walks.len();
        for (from, to, edge) in walks {
            graph.add_edge(from, to, edge);
        }

        info!(
            vertices = graph.vertex_count(),
            inter_map,
            intra_map,
            teleports,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Connection graph built"
        );
        graph
    }

    /// Walking edges in both directions for every vertex pair on one map.
    fn walking_edges(
        &self,
        map: &NavMap,
        ids: &[VertexId],
        heuristic: Heuristic,
    ) -> Vec<(VertexId, VertexId, GraphEdge)> {
        let pairs: Vec<(VertexId, VertexId)> = ids
            .iter()
            .enumerate()
            .flat_map(|(i, &a)| ids[i + 1..].iter().map(move |&b| (a, b)))
            .collect();

        let edges: Vec<(VertexId, VertexId, GraphEdge)> = pairs
            .par_iter()
            .flat_map_iter(|&(a, b)| {
                let from = self.vertices[a].position;
                let to = self.vertices[b].position;
                let forward = map.find_path(from, to, heuristic);
                let backward = map.find_path(to, from, heuristic);
                forward
                    .map(|p| (a, b, GraphEdge::IntraMap(Arc::new(p))))
                    .into_iter()
                    .chain(backward.map(|p| (b, a, GraphEdge::IntraMap(Arc::new(p)))))
            })
            .collect();

        debug!(
            map = %map.id(),
            vertices = ids.len(),
            edges = edges.len(),
            "Walking edges computed"
        );
        edges
    }

    fn add_vertex(&mut self, location: MapLocation) -> VertexId {
        if let Some(&id) = self.index.get(&location) {
            return id;
        }
        let id = self.vertices.len();
        self.by_map.entry(location.map.clone()).or_default().push(id);
        self.index.insert(location.clone(), id);
        self.vertices.push(location);
        self.adjacency.push(Vec::new());
        id
    }

    fn add_edge(&mut self, from: VertexId, to: VertexId, edge: GraphEdge) {
        self.adjacency[from].push((to, edge));
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// All vertices, indexed by [`VertexId`].
    #[must_use]
    pub fn vertices(&self) -> &[MapLocation] {
        &self.vertices
    }

    /// Vertex at an index.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&MapLocation> {
        self.vertices.get(id)
    }

    /// Index of an exact vertex location.
    #[must_use]
    pub fn vertex_id(&self, location: &MapLocation) -> Option<VertexId> {
        self.index.get(location).copied()
    }

    /// Vertices lying on a map.
    #[must_use]
    pub fn vertices_on(&self, map: &MapId) -> &[VertexId] {
        self.by_map.get(map).map_or(&[], Vec::as_slice)
    }

    /// Outgoing edges of a vertex with their destination vertex.
    #[must_use]
    pub fn edges_from(&self, id: VertexId) -> &[(VertexId, GraphEdge)] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    /// Every edge with its endpoints.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId, &GraphEdge)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(from, edges)| edges.iter().map(move |(to, edge)| (from, *to, edge)))
    }

    /// Graphviz DOT rendering of the whole graph.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<String, String> =
            DiGraph::with_capacity(self.vertex_count(), self.edge_count());
        let nodes: Vec<_> = self.vertices.iter().map(|v| graph.add_node(v.to_string())).collect();
        for (from, to, edge) in self.edges() {
            graph.add_edge(nodes[from], nodes[to], edge.label());
        }

        let body = Dot::with_config(&graph, &[Config::GraphContentOnly]).to_string();
        format!("digraph connections {{\n    rankdir=LR;\n{}\n}}\n", body.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::geometry::WorldPosition;
    use crate::rasterize::MapGeometry;
    use crate::route::InterMapKind;
    use crate::snapshot::{Destination, DoorDescriptor, MapDescriptor, WorldSnapshot};
    use crate::terrain::Bounds;

    fn room(name: &str) -> MapDescriptor {
        MapDescriptor {
            name: name.to_string(),
            bounds: Bounds::new(0.0, 0.0, 160.0, 160.0),
            geometry: MapGeometry::default(),
            spawns: vec![WorldPosition::new(20.0, 20.0), WorldPosition::new(140.0, 140.0)],
            doors: Vec::new(),
            transporters: Vec::new(),
            leave: None,
        }
    }

    fn linked_world(config: NavConfig) -> World {
        let mut town = room("town");
        town.doors.push(DoorDescriptor {
            position: WorldPosition::new(140.0, 80.0),
            to: Destination::new("cave", 1),
        });
        let mut cave = room("cave");
        cave.leave = Some(Destination::new("town", 0));
        World::load(&WorldSnapshot { maps: vec![town, cave] }, config).unwrap()
    }

    #[test]
    fn test_vertices_cover_spawns_and_connections() {
        let world = linked_world(NavConfig::default());
        let graph = ConnectionGraph::build(&world);

        // cave: default spawn, spawn #1 (door target), leave anchor == default spawn
        // town: default spawn, door
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.vertices_on(&MapId::new("cave")).len(), 2);
        assert_eq!(graph.vertices_on(&MapId::new("town")).len(), 2);
        assert!(graph.vertex_id(&MapLocation::new("town", 140.0, 80.0)).is_some());
        assert!(graph.vertices_on(&MapId::new("nowhere")).is_empty());
    }

    #[test]
    fn test_edges_by_kind() {
        let world = linked_world(NavConfig::default());
        let graph = ConnectionGraph::build(&world);

        let door = graph.vertex_id(&MapLocation::new("town", 140.0, 80.0)).unwrap();
        let hops: Vec<&GraphEdge> = graph
            .edges_from(door)
            .iter()
            .map(|(_, e)| e)
            .filter(|e| matches!(e, GraphEdge::InterMap(_)))
            .collect();
        assert_eq!(hops.len(), 1);
        let GraphEdge::InterMap(hop) = hops[0] else { unreachable!() };
        assert_eq!(hop.kind, InterMapKind::Door);
        assert_eq!(hop.dest, MapLocation::new("cave", 140.0, 140.0));

        let walks = graph
            .edges()
            .filter(|(_, _, e)| matches!(e, GraphEdge::IntraMap(_)))
            .count();
        let teleports = graph
            .edges()
            .filter(|(_, _, e)| matches!(e, GraphEdge::Teleport(_)))
            .count();
        // One vertex pair per map, both directions
        assert_eq!(walks, 4);
        // Every non-default vertex teleports home
        assert_eq!(teleports, 2);
        assert_eq!(graph.edge_count(), walks + teleports + 2);
    }

    #[test]
    fn test_teleport_edges_can_be_disabled() {
        let mut config = NavConfig::default();
        config.routing.teleport_edges = false;
        let graph = ConnectionGraph::build(&linked_world(config));
        assert!(graph
            .edges()
            .all(|(_, _, e)| !matches!(e, GraphEdge::Teleport(_))));
    }

    #[test]
    fn test_walking_edges_stay_on_their_map() {
        let graph = ConnectionGraph::build(&linked_world(NavConfig::default()));
        for (from, to, edge) in graph.edges() {
            if let GraphEdge::IntraMap(path) = edge {
                assert_eq!(graph.vertices()[from].map, graph.vertices()[to].map);
                assert_eq!(path.map(), &graph.vertices()[from].map);
            }
        }
    }

    #[test]
    fn test_dot_export() {
        let graph = ConnectionGraph::build(&linked_world(NavConfig::default()));
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph connections {"));
        assert!(dot.contains("door #1"));
        assert!(dot.contains("town"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
