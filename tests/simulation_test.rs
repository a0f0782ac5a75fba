//! Whole-simulation tests on the bundled city map
//!
//! Long seeded runs check the per-tick invariants; the last two tests run the
//! headless binary the way a user would.

use std::collections::HashSet;
use std::process::Command;

use grid_traffic::simulation::{
    Cell, ConfigError, SchedulerPolicy, SimConfig, SimWorld, DEFAULT_MAX_ACTIVE_VEHICLES,
};

const CITY: &str = include_str!("../maps/city.txt");
const CITY_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/maps/city.txt");

fn city_world(config: SimConfig) -> SimWorld {
    SimWorld::from_map_str(CITY, config).unwrap()
}

/// Every vehicle sits on its own cell and the grid agrees with its position
fn assert_no_overlap(world: &SimWorld) {
    let grid = &world.state().grid;
    let occupied: HashSet<Cell> = grid.vehicles().map(|(cell, _)| cell).collect();
    assert_eq!(occupied.len(), world.state().active_count());
    assert_eq!(grid.vehicles().count(), world.state().active_count());

    for vehicle in world.vehicles() {
        assert_eq!(grid.vehicle_at(vehicle.position()), Some(vehicle.id));
    }
}

#[test]
fn test_long_run_keeps_invariants() {
    let config = SimConfig {
        histogram_buckets: 1024,
        ..SimConfig::with_seed(11)
    };
    let mut world = city_world(config);

    for _ in 0..300 {
        let before = world.state().active_count();
        let report = world.step();

        assert_eq!(
            report.active,
            before + report.spawned - report.arrived - report.stranded
        );
        assert_eq!(report.active, world.state().active_count());
        assert!(report.active <= DEFAULT_MAX_ACTIVE_VEHICLES);
        assert_eq!(report.activation_order.len(), before);
        assert_no_overlap(&world);
    }

    let stats = world.stats();
    assert_eq!(stats.tick, 300);
    assert!(stats.spawned > 0);
    assert!(stats.arrived > 0);
    assert_eq!(
        stats.spawned,
        stats.arrived + stats.stranded + stats.active as u64
    );
    assert_eq!(stats.histogram.total(), stats.arrived);
    assert!(stats.cache_misses > 0);
    assert!(stats.success_rate() > 0.0);
}

#[test]
fn test_unreachable_spawns_are_dropped_not_stranded() {
    // From (3, 0) only the right-hand destination can be reached
    let config = SimConfig {
        spawn_probability: 1.0,
        spawn_points: Some(vec![Cell::new(3, 0)]),
        ..SimConfig::with_seed(7)
    };
    let mut world = SimWorld::from_map_str("D<<>>D", config).unwrap();

    let mut dropped = 0;
    let mut stranded = 0;
    for _ in 0..20 {
        let before = world.state().active_count();
        let report = world.step();
        assert_eq!(
            report.active,
            before + report.spawned - report.arrived - report.stranded
        );
        dropped += report.dropped_spawns as u64;
        stranded += report.stranded as u64;
    }

    let stats = world.stats();
    assert!(stats.spawned > 0);
    assert!(stats.dropped_spawns > 0);
    assert_eq!(stats.dropped_spawns, dropped);
    assert_eq!(stats.stranded, stranded);
    assert_eq!(stats.stranded, 0);
    assert_eq!(
        stats.spawned,
        stats.arrived + stats.stranded + stats.active as u64
    );
}

#[test]
fn test_same_seed_same_run() {
    let mut first = city_world(SimConfig::with_seed(5));
    let mut second = city_world(SimConfig::with_seed(5));

    for _ in 0..150 {
        assert_eq!(first.step(), second.step());
    }
    assert_eq!(first.query_vehicles(), second.query_vehicles());
    assert_eq!(first.stats(), second.stats());
}

#[test]
fn test_age_first_policy_runs_clean() {
    let config = SimConfig {
        policy: SchedulerPolicy::AgeFirst,
        ..SimConfig::with_seed(21)
    };
    let mut world = city_world(config);

    for _ in 0..200 {
        world.step();
        assert_no_overlap(&world);
    }
    assert!(world.stats().arrived > 0);
}

#[test]
fn test_spawning_respects_vehicle_cap() {
    let config = SimConfig {
        spawn_probability: 1.0,
        max_active_vehicles: Some(5),
        ..SimConfig::with_seed(2)
    };
    let mut world = city_world(config);

    let report = world.step();
    assert_eq!(report.spawned, 5);
    for _ in 0..50 {
        assert!(world.step().active <= 5);
    }
}

#[test]
fn test_explicit_spawn_points() {
    let config = SimConfig {
        spawn_probability: 1.0,
        spawn_points: Some(vec![Cell::new(0, 0)]),
        ..SimConfig::with_seed(4)
    };
    let mut world = SimWorld::from_map_str(">>>>>>>>>D", config).unwrap();
    assert_eq!(world.spawn_points(), &[Cell::new(0, 0)]);

    assert_eq!(world.step().spawned, 1);
    // The entry cell is free again once the first vehicle moves on
    assert_eq!(world.step().spawned, 1);
    assert_eq!(world.state().active_count(), 2);
}

#[test]
fn test_queries_describe_the_map() {
    let world = city_world(SimConfig::with_seed(1));

    let dimensions = world.dimensions();
    assert_eq!((dimensions.width, dimensions.height), (14, 12));
    assert_eq!(world.query_destinations().len(), 5);
    assert_eq!(world.query_obstacles().len(), 62);
    assert_eq!(world.query_traffic_lights().len(), 2);
    assert!(world.query_vehicles().is_empty());

    let rendered = world.render_map();
    let rows: Vec<&str> = rendered.lines().collect();
    assert_eq!(rows.len(), 12);
    assert!(rows.iter().all(|row| row.chars().count() == 14));
    // 'S' starts red and 's' starts green
    assert_eq!(rows[6].chars().nth(5), Some('R'));
    assert_eq!(rows[7].chars().nth(7), Some('G'));
}

#[test]
fn test_stats_serialize_to_json() {
    let mut world = city_world(SimConfig::with_seed(8));
    for _ in 0..20 {
        world.step();
    }

    let value = serde_json::to_value(world.stats()).unwrap();
    assert_eq!(value["tick"], 20);
    assert!(value["spawned"].is_u64());
    assert!(value["dropped_spawns"].is_u64());
    assert!(value["histogram"]["buckets"].is_array());
}

#[test]
fn test_config_from_json() {
    let config: SimConfig = serde_json::from_str(
        r#"{
            "seed": 5,
            "policy": "age_first",
            "max_active_vehicles": null,
            "danger_squares": [
                {"cell": {"x": 2, "y": 0}, "approach": "right", "turn": "down"}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(config.seed, Some(5));
    assert_eq!(config.policy, SchedulerPolicy::AgeFirst);
    assert_eq!(config.max_active_vehicles, None);
    assert_eq!(config.danger_squares.len(), 1);
    // Unnamed fields keep their defaults
    assert_eq!(config.red_duration, 7);
    assert_eq!(config.green_duration, 6);
    assert!(config.detect_danger_squares);

    assert!(serde_json::from_str::<SimConfig>(r#"{"policy": "random"}"#).is_err());
}

#[test]
fn test_config_from_json_file() {
    let path = std::env::temp_dir().join(format!("grid_traffic_config_{}.json", std::process::id()));
    std::fs::write(&path, r#"{"seed": 12, "red_duration": 3, "spawn_probability": 0.5}"#).unwrap();

    let config = SimConfig::from_json_file(&path).unwrap();
    assert_eq!(config.seed, Some(12));
    assert_eq!(config.red_duration, 3);
    assert_eq!(config.spawn_probability, 0.5);

    std::fs::write(&path, r#"{"green_duration": 0}"#).unwrap();
    assert!(SimConfig::from_json_file(&path).is_err());

    std::fs::remove_file(&path).unwrap();
    assert!(SimConfig::from_json_file(&path).is_err());
}

#[test]
fn test_config_validation() {
    let zero_red = SimConfig {
        red_duration: 0,
        ..SimConfig::default()
    };
    assert_eq!(
        zero_red.validate(),
        Err(ConfigError::InvalidDuration {
            name: "red_duration",
            value: 0
        })
    );

    let bad_probability = SimConfig {
        spawn_probability: 1.5,
        ..SimConfig::default()
    };
    assert_eq!(
        bad_probability.validate(),
        Err(ConfigError::InvalidProbability(1.5))
    );

    let no_buckets = SimConfig {
        histogram_buckets: 0,
        ..SimConfig::default()
    };
    assert_eq!(no_buckets.validate(), Err(ConfigError::InvalidHistogram));

    assert!(SimWorld::from_map_str(CITY, zero_red).is_err());
    assert!(SimConfig::default().validate().is_ok());
}

#[test]
fn test_bad_map_fails_world_construction() {
    let err = SimWorld::from_map_str(">>>>", SimConfig::with_seed(1))
        .err()
        .unwrap();
    assert!(format!("{:#}", err).contains("no cell it can drive into"));
}

/// Test that the headless binary runs to completion and logs its statistics
#[test]
fn test_headless_simulation_runs() {
    let output = Command::new(env!("CARGO_BIN_EXE_grid_traffic"))
        .args(["--map", CITY_PATH, "--ticks", "60", "--seed", "3"])
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute simulation");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        stderr
    );

    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
    assert!(stderr.contains("Total vehicles spawned:"));
    assert!(stderr.contains("Total arrivals:"));
    assert!(stderr.contains("Route cache hits:"));
    assert!(stderr.contains("Success rate:"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== World Map ==="));
}

/// Test that the JSON dump carries every query
#[test]
fn test_headless_json_dump() {
    let output = Command::new(env!("CARGO_BIN_EXE_grid_traffic"))
        .args([
            "--map",
            CITY_PATH,
            "--ticks",
            "10",
            "--seed",
            "3",
            "--report-every",
            "0",
            "--json",
        ])
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute simulation");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').unwrap();
    let dump: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();

    assert_eq!(dump["dimensions"]["width"], 14);
    assert_eq!(dump["trafficLights"].as_array().map(Vec::len), Some(2));
    assert_eq!(dump["destinations"].as_array().map(Vec::len), Some(5));
    assert_eq!(dump["stats"]["tick"], 10);
}
