//! Waypoint navigation - command-line tools
//!
//! # Usage
//!
//! ```bash
//! # Check that a world snapshot loads and every map rasterizes
//! cargo run -p nav_tools -- validate worlds/town.ron
//!
//! # Cross-map route as JSON
//! cargo run -p nav_tools -- route worlds/town.ron --from town:100,100 --to cave:250,250
//!
//! # Terrain of one map, four cells per character
//! cargo run -p nav_tools -- render worlds/town.ron --map cave --scale 4
//!
//! # Connection graph as Graphviz DOT
//! cargo run -p nav_tools -- export-graph worlds/town.ron -o graph.dot
//!
//! # Binary snapshot cache for faster reloads
//! cargo run -p nav_tools -- cache worlds/town.ron -o worlds/town.navcache
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nav_core::prelude::*;
use nav_tools::error::{Result, ToolError};
use nav_tools::render::{render_map, RenderConfig};
use nav_tools::{cache, load_snapshot};

#[derive(Parser)]
#[command(name = "nav-tools")]
#[command(about = "Multi-map navigation tools: validation, routing, rendering")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Navigation config file (RON); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a snapshot, rasterize every map and build the graph
    Validate {
        /// World snapshot (RON or .navcache)
        snapshot: PathBuf,
    },

    /// Find a route between two locations
    Route {
        /// World snapshot (RON or .navcache)
        snapshot: PathBuf,

        /// Start as map:x,y
        #[arg(long, value_parser = parse_location)]
        from: MapLocation,

        /// Goal as map:x,y
        #[arg(long, value_parser = parse_location)]
        to: MapLocation,

        /// Heuristic; the configured default when omitted
        #[arg(long, value_enum)]
        heuristic: Option<HeuristicArg>,

        /// Print the full route as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Render one map's terrain as ASCII
    Render {
        /// World snapshot (RON or .navcache)
        snapshot: PathBuf,

        /// Map to render
        #[arg(short, long)]
        map: String,

        /// Cells per character
        #[arg(long, default_value = "1")]
        scale: u32,

        /// Overlay the path between two points on the map, as x,y
        #[arg(long, num_args = 2, value_parser = parse_position)]
        path: Option<Vec<WorldPosition>>,
    },

    /// Export the connection graph in Graphviz DOT format
    ExportGraph {
        /// World snapshot (RON or .navcache)
        snapshot: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a RON snapshot and write it as a binary cache
    Cache {
        /// World snapshot (RON)
        snapshot: PathBuf,

        /// Cache file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HeuristicArg {
    Manhattan,
    Euclidean,
    Diagonal,
}

impl From<HeuristicArg> for Heuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::Manhattan => Heuristic::Manhattan,
            HeuristicArg::Euclidean => Heuristic::Euclidean,
            HeuristicArg::Diagonal => Heuristic::Diagonal,
        }
    }
}

fn parse_position(s: &str) -> std::result::Result<WorldPosition, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok(WorldPosition::new(x, y))
}

fn parse_location(s: &str) -> std::result::Result<MapLocation, String> {
    let (map, position) = s
        .split_once(':')
        .ok_or_else(|| format!("expected map:x,y but got '{s}'"))?;
    Ok(MapLocation::at(MapId::new(map), parse_position(position)?))
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => NavConfig::load(path)?,
        None => NavConfig::default(),
    };

    match cli.command {
        Commands::Validate { snapshot } => {
            let world = load_world(&snapshot, config)?;
            let graph = ConnectionGraph::build(&world);
            for map in world.maps() {
                tracing::info!(
                    map = %map.id(),
                    walkable = map.grid().walkable_count(),
                    connections = map.connections().len(),
                    "Map ok"
                );
            }
            tracing::info!(
                maps = world.len(),
                vertices = graph.vertex_count(),
                edges = graph.edge_count(),
                "Validation passed"
            );
        }
        Commands::Route {
            snapshot,
            from,
            to,
            heuristic,
            json,
        } => {
            let world = load_world(&snapshot, config)?;
            let router = Router::new(&world);
            let hop_penalty = world.config().routing.hop_penalty;
            let started = Instant::now();
            let route = router.find_route(&from, &to, heuristic.map(Heuristic::from));
            tracing::info!(
                edges = route.len(),
                cost = route.total_cost(hop_penalty),
                elapsed_us = started.elapsed().as_micros() as u64,
                "Route query finished"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&route)?);
            } else if route.is_empty() {
                println!("No route from {from} to {to}");
            } else {
                for (i, edge) in route.iter().enumerate() {
                    println!("{:>3}. {edge}", i + 1);
                }
                println!(
                    "Total cost {:.1} across {} maps",
                    route.total_cost(hop_penalty),
                    route.maps().len()
                );
            }
        }
        Commands::Render {
            snapshot,
            map,
            scale,
            path,
        } => {
            let world = load_world(&snapshot, config)?;
            let nav_map = world
                .map(&MapId::new(&map))
                .ok_or_else(|| ToolError::UnknownMap(map.clone()))?;
            let points = match path.as_deref() {
                Some([from, to]) => nav_map
                    .find_path(*from, *to, world.config().routing.default_heuristic)
                    .map(|p| p.points)
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            let render = RenderConfig { scale, legend: true };
            print!("{}", render_map(nav_map, &points, &render));
        }
        Commands::ExportGraph { snapshot, output } => {
            let world = load_world(&snapshot, config)?;
            let dot = ConnectionGraph::build(&world).to_dot();
            match output {
                Some(path) => {
                    std::fs::write(&path, dot)?;
                    tracing::info!("Graph written to {}", path.display());
                }
                None => print!("{dot}"),
            }
        }
        Commands::Cache { snapshot, output } => {
            let parsed = WorldSnapshot::load(&snapshot)?;
            cache::save(&parsed, &output)?;
        }
    }
    Ok(())
}

fn load_world(path: &Path, config: NavConfig) -> Result<World> {
    tracing::info!("Loading world snapshot: {}", path.display());
    let snapshot = load_snapshot(path)?;
    Ok(World::load(&snapshot, config)?)
}
