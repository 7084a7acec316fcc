//! Multi-map route search.
//!
//! Routing runs Dijkstra over the precomputed [`ConnectionGraph`]. Query
//! endpoints are rarely graph vertices, so each query adds temporary
//! edges on top of the shared graph:
//!
//! - walking paths from the start to every vertex on its map,
//! - walking paths from every vertex on the goal's map to the goal,
//! - a direct walking path when start and goal share a map,
//! - the start map's leave hop and a teleport to its default spawn.
//!
//! Every edge weighs a flat hop penalty plus its own cost, which biases
//! the search toward fewer transitions. Queries only read the graph, so
//! one [`Router`] can serve many agents concurrently.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::geometry::{MapLocation, POSITION_EPSILON};
use crate::graph::{ConnectionGraph, VertexId};
use crate::pathfinding::Heuristic;
use crate::route::{GraphEdge, InterMapEdge, Route, TeleportEdge};
use crate::world::{NavMap, World};

/// Dijkstra queue entry ordered as a min-heap on cost.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cost: f32,
    /// Insertion counter; earlier pushes win ties.
    sequence: u64,
    node: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.cost.total_cmp(&self.cost) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Answers route queries against a loaded world.
#[derive(Debug)]
pub struct Router<'w> {
    world: &'w World,
    graph: ConnectionGraph,
}

impl<'w> Router<'w> {
    /// Build the connection graph for `world` and wrap it.
    #[must_use]
    pub fn new(world: &'w World) -> Self {
        Self::with_graph(world, ConnectionGraph::build(world))
    }

    /// Wrap an already built graph.
    #[must_use]
    pub fn with_graph(world: &'w World, graph: ConnectionGraph) -> Self {
        Self { world, graph }
    }

    /// The world being routed over.
    #[must_use]
    pub fn world(&self) -> &'w World {
        self.world
    }

    /// The precomputed graph.
    #[must_use]
    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    /// Cheapest route from `start` to `goal`.
    ///
    /// Uses the configured default heuristic when `heuristic` is `None`.
    /// A goal visible from the start on the same map is a single walk.
    /// Returns an empty route when the goal cannot be reached, including
    /// when either location names an unknown map.
    #[must_use]
    pub fn find_route(
        &self,
        start: &MapLocation,
        goal: &MapLocation,
        heuristic: Option<Heuristic>,
    ) -> Route {
        let routing = &self.world.config().routing;
        let heuristic = heuristic.unwrap_or(routing.default_heuristic);

        let (Some(start_map), Some(goal_map)) =
            (self.world.map(&start.map), self.world.map(&goal.map))
        else {
            warn!(%start, %goal, "Route query on unknown map");
            return Route::unreachable();
        };

        // Temporary nodes sit after the graph's vertices.
        let vertex_count = self.graph.vertex_count();
        let start_node = vertex_count;
        let goal_node = vertex_count + 1;

        let direct = if start.map == goal.map {
            start_map.find_path(start.position, goal.position, heuristic)
        } else {
            None
        };
        if let Some(path) = &direct {
            // A goal in plain sight is always walked to, whatever hops cost.
            if start_map.grid().line_of_sight(start.position, goal.position) {
                debug!(%start, %goal, "Goal visible, walking directly");
                return Route::new(vec![GraphEdge::IntraMap(Arc::new(path.clone()))]);
            }
        }

        let mut from_start = self.start_edges(start, start_map, heuristic);
        if let Some(path) = direct {
            from_start.push((goal_node, GraphEdge::IntraMap(Arc::new(path))));
        }
        let to_goal: HashMap<VertexId, (usize, GraphEdge)> = self
            .goal_edges(goal, goal_map, heuristic)
            .into_iter()
            .map(|(from, edge)| (from, (goal_node, edge)))
            .collect();

        let mut dist = vec![f32::INFINITY; vertex_count + 2];
        let mut prev: Vec<Option<(usize, &GraphEdge)>> = vec![None; vertex_count + 2];
        let mut queue = BinaryHeap::new();
        let mut sequence = 0u64;

        dist[start_node] = 0.0;
        queue.push(QueueEntry {
            cost: 0.0,
            sequence,
            node: start_node,
        });

        while let Some(QueueEntry { cost, node, .. }) = queue.pop() {
            if node == goal_node {
                break;
            }
            if cost > dist[node] {
                continue;
            }
            let temporary: &[(usize, GraphEdge)] =
                if node == start_node { &from_start } else { &[] };
            let outgoing = self
                .graph
                .edges_from(node)
                .iter()
                .chain(temporary)
                .chain(to_goal.get(&node));
            for (next, edge) in outgoing {
                let candidate = cost + edge.weight(routing.hop_penalty);
                if candidate < dist[*next] {
                    dist[*next] = candidate;
                    prev[*next] = Some((node, edge));
                    sequence += 1;
                    queue.push(QueueEntry {
                        cost: candidate,
                        sequence,
                        node: *next,
                    });
                }
            }
        }

        if dist[goal_node].is_infinite() {
            debug!(%start, %goal, "No route found");
            return Route::unreachable();
        }

        let mut edges = Vec::new();
        let mut node = goal_node;
        while let Some((from, edge)) = prev[node] {
            edges.push(edge.clone());
            node = from;
        }
        edges.reverse();

        let route = Route::new(edges);
        debug!(
            %start,
            %goal,
            edges = route.len(),
            cost = dist[goal_node],
            "Route found"
        );
        route
    }

    /// Edges leaving the query start: walks to every vertex on its map,
    /// the map's leave hop, and the teleport home.
    fn start_edges(
        &self,
        start: &MapLocation,
        map: &NavMap,
        heuristic: Heuristic,
    ) -> Vec<(usize, GraphEdge)> {
        let vertices = self.graph.vertices_on(&start.map);
        let mut edges: Vec<(usize, GraphEdge)> = vertices
            .par_iter()
            .filter_map(|&id| {
                let target = self.graph.vertices()[id].position;
                let path = map.find_path(start.position, target, heuristic)?;
                Some((id, GraphEdge::IntraMap(Arc::new(path))))
            })
            .collect();

        if let Some(leave) = map.leave() {
            let dest = self.world.spawn_location(&leave.dest_map, leave.spawn);
            if let Some(to) = dest.as_ref().and_then(|d| self.graph.vertex_id(d)) {
                edges.push((
                    to,
                    GraphEdge::InterMap(InterMapEdge {
                        source: start.clone(),
                        dest: self.graph.vertices()[to].clone(),
                        kind: leave.kind,
                        spawn: leave.spawn,
                    }),
                ));
            }
        }

        if self.world.config().routing.teleport_edges {
            let town = MapLocation::at(start.map.clone(), map.default_spawn());
            if let Some(to) = self.graph.vertex_id(&town) {
                if !start.position.equivalent(town.position, POSITION_EPSILON) {
                    edges.push((
                        to,
                        GraphEdge::Teleport(TeleportEdge {
                            source: start.clone(),
                            dest: town,
                        }),
                    ));
                }
            }
        }
        edges
    }

    /// Walks from every vertex on the goal's map to the goal, keyed by
    /// their source vertex.
    fn goal_edges(
        &self,
        goal: &MapLocation,
        map: &NavMap,
        heuristic: Heuristic,
    ) -> Vec<(VertexId, GraphEdge)> {
        self.graph
            .vertices_on(&goal.map)
            .par_iter()
            .filter_map(|&id| {
                let source = self.graph.vertices()[id].position;
                let path = map.find_path(source, goal.position, heuristic)?;
                Some((id, GraphEdge::IntraMap(Arc::new(path))))
            })
            .collect()
    }
}
