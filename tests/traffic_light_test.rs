//! Traffic light cycle tests

use grid_traffic::simulation::{
    Cell, Direction, LightId, LightTiming, Phase, SimConfig, SimId, SimWorld, TrafficLight,
    DEFAULT_GREEN_DURATION, DEFAULT_RED_DURATION,
};

const CITY: &str = include_str!("../maps/city.txt");

fn default_light(phase: Phase) -> TrafficLight {
    TrafficLight::new(
        LightId(SimId(0)),
        Cell::new(0, 0),
        Direction::Right,
        phase,
        LightTiming {
            red_duration: DEFAULT_RED_DURATION,
            green_duration: DEFAULT_GREEN_DURATION,
        },
    )
}

#[test]
fn test_light_cycles_seven_red_six_green() {
    let mut light = default_light(Phase::Red);

    for _ in 0..6 {
        light.step();
        assert_eq!(light.phase(), Phase::Red);
    }
    light.step();
    assert_eq!(light.phase(), Phase::Green);
    assert_eq!(light.elapsed(), 0);

    for _ in 0..5 {
        light.step();
        assert_eq!(light.phase(), Phase::Green);
    }
    light.step();
    assert_eq!(light.phase(), Phase::Red);
}

#[test]
fn test_light_cycle_period() {
    let mut light = default_light(Phase::Green);
    let mut phases = Vec::new();
    for _ in 0..26 {
        light.step();
        phases.push(light.phase());
    }

    let period = (DEFAULT_RED_DURATION + DEFAULT_GREEN_DURATION) as usize;
    assert_eq!(period, 13);
    assert_eq!(phases[..period], phases[period..]);
}

#[test]
fn test_custom_timing_from_config() {
    let config = SimConfig {
        red_duration: 2,
        green_duration: 3,
        spawn_probability: 0.0,
        ..SimConfig::with_seed(1)
    };
    let mut world = SimWorld::from_map_str(">S>D", config).unwrap();

    let mut phases = Vec::new();
    for _ in 0..5 {
        world.step();
        phases.push(world.query_traffic_lights()[0].phase);
    }
    assert_eq!(
        phases,
        vec![Phase::Red, Phase::Green, Phase::Green, Phase::Green, Phase::Red]
    );
}

#[test]
fn test_city_lights_are_never_green_together() {
    let config = SimConfig {
        spawn_probability: 0.0,
        ..SimConfig::with_seed(3)
    };
    let mut world = SimWorld::from_map_str(CITY, config).unwrap();

    let lights = world.query_traffic_lights();
    assert_eq!(lights.len(), 2);
    assert_eq!(lights.iter().filter(|light| light.phase == Phase::Green).count(), 1);

    for _ in 0..100 {
        world.step();
        let green = world
            .query_traffic_lights()
            .iter()
            .filter(|light| light.phase == Phase::Green)
            .count();
        assert!(green <= 1);
    }
}
