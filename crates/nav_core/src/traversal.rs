//! Real-time route traversal.
//!
//! [`RouteTraversal`] consumes a [`Route`] one edge at a time and is
//! driven by an external tick loop. Each tick takes the agent's reported
//! location and returns at most one [`MovementIntent`] for the network
//! layer to act on.
//!
//! Inter-map hops and teleports are re-emitted on a timer until the agent
//! shows up where the hop leads: the server may drop or delay them, and
//! from here a lost request and a slow one look the same. Walking edges
//! emit a move target every tick that leads the agent along the path.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::TraversalConfig;
use crate::geometry::{MapId, MapLocation, WorldPosition};
use crate::route::{GraphEdge, InterMapKind, Route, WorldPath};
use crate::terrain::TerrainGrid;
use crate::world::World;

/// What the agent should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum MovementIntent {
    /// Walk toward a position on the current map.
    MoveTo(WorldPosition),
    /// Use a door or transporter.
    Enter {
        /// Door or transporter.
        kind: InterMapKind,
        /// Destination map.
        map: MapId,
        /// Destination spawn index.
        spawn: usize,
    },
    /// Use the map's leave action.
    Leave,
    /// Return to the default spawn.
    ReturnToTown,
}

/// Coarse traversal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    /// Not ticked yet.
    Idle,
    /// Waiting to arrive through a door, transporter or leave.
    InterMap,
    /// Walking a path.
    IntraMap,
    /// Waiting for a teleport to land.
    Teleport,
    /// Every edge is done.
    Finished,
}

/// Walking progress along an intra-map edge.
#[derive(Debug, Clone)]
struct Walk {
    waypoints: VecDeque<WorldPosition>,
    /// Where the edge counts as complete.
    target: WorldPosition,
    /// Nearest walkable cell centre to `target`.
    snapped_target: WorldPosition,
}

#[derive(Debug, Clone)]
struct ActiveEdge {
    edge: GraphEdge,
    last_emit: Option<Duration>,
    walk: Option<Walk>,
}

/// Drives an agent along a route.
#[derive(Debug, Clone)]
pub struct RouteTraversal {
    config: TraversalConfig,
    pending: VecDeque<GraphEdge>,
    current: Option<ActiveEdge>,
    completed: usize,
    started: bool,
}

impl RouteTraversal {
    /// Start traversing `route`.
    #[must_use]
    pub fn new(route: Route, config: TraversalConfig) -> Self {
        Self {
            config,
            pending: route.edges.into(),
            current: None,
            completed: 0,
            started: false,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TraversalState {
        match &self.current {
            Some(active) => match active.edge {
                GraphEdge::InterMap(_) => TraversalState::InterMap,
                GraphEdge::IntraMap(_) => TraversalState::IntraMap,
                GraphEdge::Teleport(_) => TraversalState::Teleport,
            },
            None if !self.started => TraversalState::Idle,
            None if self.pending.is_empty() => TraversalState::Finished,
            None => TraversalState::Idle,
        }
    }

    /// True once every edge has been completed or dropped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state() == TraversalState::Finished
    }

    /// The edge being traversed.
    #[must_use]
    pub fn current_edge(&self) -> Option<&GraphEdge> {
        self.current.as_ref().map(|active| &active.edge)
    }

    /// Edges finished so far, including dropped ones.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Edges not yet started.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Waypoints left on the current walking edge.
    #[must_use]
    pub fn waypoints(&self) -> Option<&VecDeque<WorldPosition>> {
        self.current.as_ref()?.walk.as_ref().map(|walk| &walk.waypoints)
    }

    /// Advance with the agent's latest reported location.
    ///
    /// `now` is any monotonic clock reading; only differences matter.
    pub fn tick(
        &mut self,
        world: &World,
        agent: &MapLocation,
        now: Duration,
    ) -> Option<MovementIntent> {
        self.started = true;

        loop {
            if self.current.is_none() {
                let edge = self.pending.pop_front()?;
                debug!(edge = %edge, remaining = self.pending.len(), "Starting route edge");
                self.current = Some(ActiveEdge {
                    edge,
                    last_emit: None,
                    walk: None,
                });
            }
            let active = self.current.as_mut()?;

            if !is_valid(&active.edge, agent) {
                warn!(edge = %active.edge, %agent, "Agent left the edge's map, dropping edge");
                self.finish_current();
                continue;
            }

            if let GraphEdge::IntraMap(path) = &active.edge {
                if active.walk.is_none() {
                    let Some(map) = world.map(path.map()) else {
                        warn!(map = %path.map(), "Walking edge on unknown map, dropping edge");
                        self.finish_current();
                        continue;
                    };
                    let walk = start_walk(
                        path,
                        self.pending.front(),
                        map.grid(),
                        agent.position,
                        &self.config,
                    );
                    let snapped_target = map.navigator().snap_position(walk.target);
                    debug!(
                        waypoints = walk.waypoints.len(),
                        distance = remaining_distance(agent.position, &walk.waypoints),
                        "Walk started"
                    );
                    active.walk = Some(Walk { snapped_target, ..walk });
                }
            }

            if is_complete(active, agent, &self.config) {
                debug!(edge = %active.edge, "Route edge complete");
                self.finish_current();
                continue;
            }
            break;
        }

        let config = &self.config;
        let active = self.current.as_mut()?;
        let (retry, intent) = match &active.edge {
            GraphEdge::InterMap(hop) => {
                let intent = match hop.kind {
                    InterMapKind::Leave => MovementIntent::Leave,
                    kind => MovementIntent::Enter {
                        kind,
                        map: hop.dest.map.clone(),
                        spawn: hop.spawn,
                    },
                };
                (config.inter_map_retry(), intent)
            }
            GraphEdge::Teleport(_) => (config.teleport_retry(), MovementIntent::ReturnToTown),
            GraphEdge::IntraMap(path) => {
                let grid = world.map(path.map())?.grid();
                let walk = active.walk.as_mut()?;
                advance_waypoints(walk, grid, agent.position, config.arrival_epsilon);
                let target = look_ahead_target(
                    grid,
                    agent.position,
                    &walk.waypoints,
                    config.look_ahead_distance,
                );
                return Some(MovementIntent::MoveTo(target));
            }
        };
        emit_timed(active, now, retry, intent)
    }

    fn finish_current(&mut self) {
        self.current = None;
        self.completed += 1;
    }
}

/// An edge stays valid while the agent is on its source map, or on its
/// destination map for inter-map hops.
fn is_valid(edge: &GraphEdge, agent: &MapLocation) -> bool {
    match edge {
        GraphEdge::InterMap(hop) => agent.map == hop.source.map || agent.map == hop.dest.map,
        GraphEdge::IntraMap(path) => &agent.map == path.map(),
        GraphEdge::Teleport(hop) => agent.map == hop.source.map || agent.map == hop.dest.map,
    }
}

fn is_complete(active: &ActiveEdge, agent: &MapLocation, config: &TraversalConfig) -> bool {
    match &active.edge {
        GraphEdge::InterMap(hop) => agent.map == hop.dest.map,
        GraphEdge::Teleport(hop) => agent
            .distance(&hop.dest)
            .is_some_and(|d| d <= config.spawn_scatter),
        GraphEdge::IntraMap(_) => active.walk.as_ref().is_some_and(|walk| {
            agent.position.equivalent(walk.target, config.arrival_epsilon)
                || agent.position.equivalent(walk.snapped_target, config.arrival_epsilon)
        }),
    }
}

/// Emit `intent` if it has never been sent or `retry` has elapsed since.
fn emit_timed(
    active: &mut ActiveEdge,
    now: Duration,
    retry: Duration,
    intent: MovementIntent,
) -> Option<MovementIntent> {
    let due = active
        .last_emit
        .map_or(true, |last| now.saturating_sub(last) >= retry);
    if !due {
        return None;
    }
    if active.last_emit.is_some() {
        debug!(edge = %active.edge, "Re-emitting unacknowledged action");
    }
    active.last_emit = Some(now);
    Some(intent)
}

/// Prepare the waypoint queue for a walking edge.
fn start_walk(
    path: &WorldPath,
    next: Option<&GraphEdge>,
    grid: &TerrainGrid,
    agent: WorldPosition,
    config: &TraversalConfig,
) -> Walk {
    let mut points = path.points.clone();

    if let Some(GraphEdge::InterMap(hop)) = next {
        let usable = match hop.kind {
            InterMapKind::Door => Some(config.door_usable_distance),
            InterMapKind::Transporter => Some(config.transporter_usable_distance),
            InterMapKind::Leave => None,
        };
        if let Some(usable) = usable {
            points = trim_for_usable_distance(&points, hop.source.position, usable);
        }
    }

    let target = points[points.len() - 1];
    // Skip the prefix the agent can already see past.
    let visible = points.partition_point(|&p| grid.line_of_sight(agent, p));
    let skip = visible.saturating_sub(1);
    Walk {
        waypoints: points.into_iter().skip(skip).collect(),
        target,
        snapped_target: target,
    }
}

/// Cut `points` after the first waypoint within `usable` of `anchor`.
///
/// The first waypoint is always kept. Paths that never come within range
/// are returned unchanged.
#[must_use]
pub fn trim_for_usable_distance(
    points: &[WorldPosition],
    anchor: WorldPosition,
    usable: f32,
) -> Vec<WorldPosition> {
    match points.iter().position(|p| p.distance(anchor) <= usable) {
        Some(index) => points[..=index].to_vec(),
        None => points.to_vec(),
    }
}

/// Drop waypoints the agent has reached or already cut past.
fn advance_waypoints(walk: &mut Walk, grid: &TerrainGrid, agent: WorldPosition, epsilon: f32) {
    while walk.waypoints.len() > 1 {
        let front = walk.waypoints[0];
        let next = walk.waypoints[1];
        let reached = agent.equivalent(front, epsilon);
        let cut_past =
            agent.distance(next) <= front.distance(next) && grid.line_of_sight(agent, next);
        if !(reached || cut_past) {
            break;
        }
        walk.waypoints.pop_front();
    }
}

/// Farthest point along the remaining path, up to `distance` ahead of
/// the agent, that the agent can see. Falls back to the next waypoint.
fn look_ahead_target(
    grid: &TerrainGrid,
    agent: WorldPosition,
    waypoints: &VecDeque<WorldPosition>,
    distance: f32,
) -> WorldPosition {
    let Some(&front) = waypoints.front() else {
        return agent;
    };

    let step = grid.cell_size() / 2.0;
    let mut best = None;
    let mut travelled = 0.0;
    let mut from = agent;

    'segments: for &to in waypoints {
        let length = from.distance(to);
        let mut along = step;
        while along < length {
            if travelled + along > distance {
                break 'segments;
            }
            let sample = from.lerp(to, along / length);
            if !grid.line_of_sight(agent, sample) {
                break 'segments;
            }
            best = Some(sample);
            along += step;
        }
        travelled += length;
        if travelled > distance || !grid.line_of_sight(agent, to) {
            break;
        }
        best = Some(to);
        from = to;
    }

    best.unwrap_or(front)
}

/// Remaining walking distance from `agent` through every waypoint.
fn remaining_distance(agent: WorldPosition, waypoints: &VecDeque<WorldPosition>) -> f32 {
    let mut total = 0.0;
    let mut from = agent;
    for &to in waypoints {
        total += from.distance(to);
        from = to;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::NavConfig;
    use crate::rasterize::{MapGeometry, WallGeometry};
    use crate::route::{InterMapEdge, TeleportEdge};
    use crate::snapshot::{MapDescriptor, WorldSnapshot};
    use crate::geometry::GridCell;
    use crate::terrain::{Bounds, TerrainCell};

    fn descriptor(name: &str, walls: WallGeometry) -> MapDescriptor {
        MapDescriptor {
            name: name.to_string(),
            bounds: Bounds::new(0.0, 0.0, 400.0, 400.0),
            geometry: MapGeometry::Lines(walls),
            spawns: vec![WorldPosition::new(40.0, 40.0)],
            doors: Vec::new(),
            transporters: Vec::new(),
            leave: None,
        }
    }

    fn world() -> World {
        // A wall splitting the middle of "field", open at the top
        let walls = WallGeometry {
            x_lines: vec![[200.0, 120.0, 400.0]],
            y_lines: Vec::new(),
        };
        World::load(
            &WorldSnapshot {
                maps: vec![
                    descriptor("field", walls),
                    descriptor("cave", WallGeometry::default()),
                ],
            },
            NavConfig::default(),
        )
        .unwrap()
    }

    fn walk(world: &World, from: (f32, f32), to: (f32, f32)) -> GraphEdge {
        let path = world
            .find_path(
                &MapLocation::new("field", from.0, from.1),
                &MapLocation::new("field", to.0, to.1),
                crate::pathfinding::Heuristic::Diagonal,
            )
            .unwrap();
        GraphEdge::IntraMap(Arc::new(path))
    }

    fn door(from: (f32, f32)) -> GraphEdge {
        GraphEdge::InterMap(InterMapEdge {
            source: MapLocation::new("field", from.0, from.1),
            dest: MapLocation::new("cave", 40.0, 40.0),
            kind: InterMapKind::Door,
            spawn: 0,
        })
    }

    /// Move the agent up to `speed` toward a target.
    fn step(agent: &mut MapLocation, target: WorldPosition, speed: f32) {
        let d = agent.position.distance(target);
        agent.position = if d <= speed {
            target
        } else {
            agent.position.lerp(target, speed / d)
        };
    }

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn test_two_walks_then_finished() {
        let world = world();
        let first = walk(&world, (60.0, 300.0), (120.0, 60.0));
        let second = walk(&world, (120.0, 60.0), (330.0, 300.0));
        let route = Route::new(vec![first, second]);
        let mut traversal = RouteTraversal::new(route, TraversalConfig::default());
        assert_eq!(traversal.state(), TraversalState::Idle);

        let mut agent = MapLocation::new("field", 60.0, 300.0);
        let mut seen = vec![(traversal.state(), traversal.completed())];
        for tick in 0..500 {
            let intent = traversal.tick(&world, &agent, secs(tick as f32 * 0.1));
            let now = (traversal.state(), traversal.completed());
            if seen.last() != Some(&now) {
                seen.push(now);
            }
            match intent {
                Some(MovementIntent::MoveTo(target)) => step(&mut agent, target, 6.0),
                Some(other) => panic!("unexpected intent {other:?}"),
                None => break,
            }
        }

        assert_eq!(
            seen,
            vec![
                (TraversalState::Idle, 0),
                (TraversalState::IntraMap, 0),
                (TraversalState::IntraMap, 1),
                (TraversalState::Finished, 2),
            ]
        );
        assert_eq!(traversal.completed(), 2);
        assert!(agent.position.equivalent(WorldPosition::new(330.0, 300.0), 8.0));
        // Finished traversals stay quiet
        assert_eq!(traversal.tick(&world, &agent, secs(100.0)), None);
    }

    #[test]
    fn test_walk_never_crosses_walls() {
        let world = world();
        let grid = world.map(&MapId::new("field")).unwrap().grid();
        let route = Route::new(vec![walk(&world, (60.0, 300.0), (330.0, 300.0))]);
        let mut traversal = RouteTraversal::new(route, TraversalConfig::default());

        let mut agent = MapLocation::new("field", 60.0, 300.0);
        for tick in 0..500 {
            let intent = traversal.tick(&world, &agent, secs(tick as f32 * 0.1));
            let Some(MovementIntent::MoveTo(target)) = intent else {
                break;
            };
            assert!(
                grid.line_of_sight(agent.position, target),
                "look-ahead {target} not visible from {agent}"
            );
            step(&mut agent, target, 6.0);
        }
        assert!(traversal.is_finished());
    }

    #[test]
    fn test_door_is_reemitted_until_arrival() {
        let world = world();
        let route = Route::new(vec![door((40.0, 40.0))]);
        let mut traversal = RouteTraversal::new(route, TraversalConfig::default());
        let mut agent = MapLocation::new("field", 40.0, 40.0);

        let expected = MovementIntent::Enter {
            kind: InterMapKind::Door,
            map: MapId::new("cave"),
            spawn: 0,
        };
        assert_eq!(traversal.tick(&world, &agent, secs(0.0)), Some(expected.clone()));
        assert_eq!(traversal.state(), TraversalState::InterMap);
        assert_eq!(traversal.tick(&world, &agent, secs(0.5)), None);
        assert_eq!(traversal.tick(&world, &agent, secs(1.0)), Some(expected));

        agent = MapLocation::new("cave", 40.0, 40.0);
        assert_eq!(traversal.tick(&world, &agent, secs(2.5)), None);
        assert!(traversal.is_finished());
        assert_eq!(traversal.tick(&world, &agent, secs(5.0)), None);
    }

    #[test]
    fn test_leave_and_teleport_intents() {
        let world = world();
        let leave = GraphEdge::InterMap(InterMapEdge {
            source: MapLocation::new("cave", 40.0, 40.0),
            dest: MapLocation::new("field", 40.0, 40.0),
            kind: InterMapKind::Leave,
            spawn: 0,
        });
        let teleport = GraphEdge::Teleport(TeleportEdge {
            source: MapLocation::new("field", 300.0, 60.0),
            dest: MapLocation::new("field", 40.0, 40.0),
        });
        let route = Route::new(vec![leave, teleport]);
        let mut traversal = RouteTraversal::new(route, TraversalConfig::default());

        let mut agent = MapLocation::new("cave", 40.0, 40.0);
        assert_eq!(traversal.tick(&world, &agent, secs(0.0)), Some(MovementIntent::Leave));

        agent = MapLocation::new("field", 300.0, 60.0);
        let home = Some(MovementIntent::ReturnToTown);
        assert_eq!(traversal.tick(&world, &agent, secs(1.0)), home);
        assert_eq!(traversal.state(), TraversalState::Teleport);
        assert_eq!(traversal.tick(&world, &agent, secs(4.0)), None);
        assert_eq!(traversal.tick(&world, &agent, secs(5.5)), home);

        // Landed within scatter of the spawn
        agent = MapLocation::new("field", 60.0, 55.0);
        assert_eq!(traversal.tick(&world, &agent, secs(6.0)), None);
        assert!(traversal.is_finished());
    }

    #[test]
    fn test_walk_trimmed_before_door() {
        let world = world();
        let config = TraversalConfig::default();
        let route = Route::new(vec![
            walk(&world, (60.0, 60.0), (380.0, 60.0)),
            door((380.0, 60.0)),
        ]);
        let mut traversal = RouteTraversal::new(route, config.clone());

        let agent = MapLocation::new("field", 60.0, 60.0);
        traversal.tick(&world, &agent, Duration::ZERO);
        let waypoints = traversal.waypoints().unwrap();
        let last = *waypoints.back().unwrap();
        assert!(last.distance(WorldPosition::new(380.0, 60.0)) <= config.door_usable_distance);
    }

    #[test]
    fn test_trim_keeps_first_point() {
        let points = vec![
            WorldPosition::new(0.0, 0.0),
            WorldPosition::new(50.0, 0.0),
            WorldPosition::new(100.0, 0.0),
        ];
        let anchor = WorldPosition::new(10.0, 0.0);
        assert_eq!(trim_for_usable_distance(&points, anchor, 40.0), vec![points[0]]);
        let near_end = WorldPosition::new(100.0, 0.0);
        assert_eq!(trim_for_usable_distance(&points, near_end, 60.0), points[..2].to_vec());
        let far_away = WorldPosition::new(0.0, 500.0);
        assert_eq!(trim_for_usable_distance(&points, far_away, 10.0), points);
    }

    #[test]
    fn test_walk_dropped_when_agent_changes_map() {
        let world = world();
        let route = Route::new(vec![walk(&world, (60.0, 60.0), (380.0, 60.0))]);
        let mut traversal = RouteTraversal::new(route, TraversalConfig::default());

        let agent = MapLocation::new("cave", 60.0, 60.0);
        assert_eq!(traversal.tick(&world, &agent, Duration::ZERO), None);
        assert!(traversal.is_finished());
        assert_eq!(traversal.completed(), 1);
    }

    #[test]
    fn test_regenerated_path_skips_visible_prefix() {
        let world = world();
        let route = Route::new(vec![walk(&world, (60.0, 300.0), (330.0, 300.0))]);
        let mut traversal = RouteTraversal::new(route, TraversalConfig::default());

        // Agent is already at the top of the wall; earlier waypoints are behind it
        let agent = MapLocation::new("field", 200.0, 60.0);
        traversal.tick(&world, &agent, Duration::ZERO);
        let waypoints = traversal.waypoints().unwrap();
        assert!(!waypoints.contains(&WorldPosition::new(60.0, 300.0)));
        assert!(remaining_distance(agent.position, waypoints) < 300.0);
    }

    #[test]
    fn test_empty_route_finishes_immediately() {
        let world = world();
        let mut traversal = RouteTraversal::new(Route::unreachable(), TraversalConfig::default());
        assert_eq!(traversal.state(), TraversalState::Idle);
        let agent = MapLocation::new("field", 0.0, 0.0);
        assert_eq!(traversal.tick(&world, &agent, Duration::ZERO), None);
        assert!(traversal.is_finished());
    }

    /// 10 x 10 cells of size 10, so look-ahead samples every 5 units.
    fn open_grid() -> TerrainGrid {
        TerrainGrid::new(
            MapId::new("open"),
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            10.0,
            TerrainCell::open(),
        )
    }

    #[test]
    fn test_look_ahead_leads_along_straight_path() {
        let grid = open_grid();
        let agent = WorldPosition::new(5.0, 5.0);
        let waypoints = VecDeque::from([WorldPosition::new(95.0, 5.0)]);

        let target = look_ahead_target(&grid, agent, &waypoints, 40.0);
        assert!(target.equivalent(WorldPosition::new(45.0, 5.0), 0.01), "got {target}");
        assert_ne!(target, waypoints[0]);
    }

    #[test]
    fn test_look_ahead_follows_path_around_turn() {
        let grid = open_grid();
        let agent = WorldPosition::new(25.0, 5.0);
        let waypoints =
            VecDeque::from([WorldPosition::new(45.0, 5.0), WorldPosition::new(45.0, 95.0)]);

        // 20 along the first leg, the remaining 20 up the second.
        let target = look_ahead_target(&grid, agent, &waypoints, 40.0);
        assert!(target.equivalent(WorldPosition::new(45.0, 25.0), 0.01), "got {target}");
        assert!(remaining_distance(agent, &VecDeque::from([waypoints[0], target])) <= 40.0 + 0.01);
    }

    #[test]
    fn test_look_ahead_stops_at_last_visible_sample() {
        let mut grid = open_grid();
        // Wall in column 5 covering rows 0..=5, i.e. x 50..60, y 0..60.
        for y in 0..=5 {
            grid.set(GridCell::new(5, y), TerrainCell::blocked());
        }
        let agent = WorldPosition::new(25.0, 25.0);
        let waypoints =
            VecDeque::from([WorldPosition::new(25.0, 85.0), WorldPosition::new(85.0, 85.0)]);

        let target = look_ahead_target(&grid, agent, &waypoints, 200.0);
        assert!(target.equivalent(WorldPosition::new(65.0, 85.0), 0.01), "got {target}");
        assert!(grid.line_of_sight(agent, target));
        assert!(!grid.line_of_sight(agent, WorldPosition::new(70.0, 85.0)));
    }

    #[test]
    fn test_move_target_leads_by_look_ahead_distance() {
        let world = world();
        let config = TraversalConfig::default().with_look_ahead(80.0);
        let path = world
            .find_path(
                &MapLocation::new("cave", 40.0, 200.0),
                &MapLocation::new("cave", 360.0, 200.0),
                crate::pathfinding::Heuristic::Diagonal,
            )
            .unwrap();
        let route = Route::new(vec![GraphEdge::IntraMap(Arc::new(path))]);
        let mut traversal = RouteTraversal::new(route, config.clone());

        let agent = MapLocation::new("cave", 40.0, 200.0);
        let Some(MovementIntent::MoveTo(target)) = traversal.tick(&world, &agent, Duration::ZERO)
        else {
            panic!("walking edge should issue a move");
        };
        let lead = agent.position.distance(target);
        assert!(lead <= config.look_ahead_distance + 0.01, "lead {lead}");
        assert!(lead > config.look_ahead_distance - 8.0, "lead {lead}");
    }
}
