use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

use grid_traffic::simulation::{SchedulerPolicy, SimConfig, SimWorld};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Caution,
    AgeFirst,
}

impl From<PolicyArg> for SchedulerPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Caution => SchedulerPolicy::Caution,
            PolicyArg::AgeFirst => SchedulerPolicy::AgeFirst,
        }
    }
}

#[derive(Parser)]
#[command(name = "grid_traffic")]
#[command(about = "Headless grid traffic simulation")]
struct Cli {
    /// Map file of road, light, obstacle and destination tokens
    #[arg(long, default_value = "maps/city.txt")]
    map: PathBuf,

    /// Number of ticks to simulate
    #[arg(long, default_value = "200")]
    ticks: u64,

    /// JSON config file; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Chance per spawn point per tick of a new vehicle
    #[arg(long)]
    spawn_probability: Option<f64>,

    /// Pause spawning while this many vehicles are on the grid (0 removes the cap)
    #[arg(long)]
    max_active: Option<usize>,

    /// Activation order policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Print a summary and the map every this many ticks (0 disables)
    #[arg(long, default_value = "50")]
    report_every: u64,

    /// Print the final vehicles, lights, obstacles and statistics as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(probability) = cli.spawn_probability {
        config.spawn_probability = probability;
    }
    if let Some(max) = cli.max_active {
        config.max_active_vehicles = (max > 0).then_some(max);
    }
    if let Some(policy) = cli.policy {
        config.policy = policy.into();
    }

    let text = std::fs::read_to_string(&cli.map)
        .with_context(|| format!("Failed to read map {}", cli.map.display()))?;
    let mut world = SimWorld::from_map_str(&text, config)?;

    let dimensions = world.dimensions();
    println!("Running grid traffic simulation in headless mode...");
    println!(
        "Map: {} ({}x{}), Ticks: {}",
        cli.map.display(),
        dimensions.width,
        dimensions.height,
        cli.ticks
    );
    println!();

    for _ in 0..cli.ticks {
        let report = world.step();
        if cli.report_every > 0 && report.tick % cli.report_every == 0 {
            println!("--- After tick {} ---", report.tick);
            world.print_summary();
            world.draw_map();
        }
    }

    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks: {}", stats.tick);
    info!("Total vehicles spawned: {}", stats.spawned);
    info!("Total arrivals: {}", stats.arrived);
    info!("Active vehicles: {}", stats.active);
    info!("Stranded vehicles: {}", stats.stranded);
    info!("Dropped spawns: {}", stats.dropped_spawns);
    info!("Route cache hits: {}", stats.cache_hits);
    info!("Route cache misses: {}", stats.cache_misses);
    info!("Success rate: {:.1}%", stats.success_rate());

    if cli.json {
        let dump = serde_json::json!({
            "dimensions": world.dimensions(),
            "vehicles": world.query_vehicles(),
            "trafficLights": world.query_traffic_lights(),
            "obstacles": world.query_obstacles(),
            "destinations": world.query_destinations(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
    }

    Ok(())
}
