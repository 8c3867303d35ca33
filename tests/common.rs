//! Common test utilities for the qracer test suite.
//!
//! Scripted sensor sequences and a tick driver shared by the integration tests.

use qracer::{
    Agent, Controller, Result, SensorVector, Tick, ValueTable,
    app::AgentConfig,
    policy::PolicyConfig,
    sensors::{
        BOMB_ANGLE, BOMB_DETECTED, BOMB_DIST, CHECKPOINT, DIST_CHECKPOINT, DIST_LEFT, DIST_RIGHT,
        ON_TRACK, SPEED,
    },
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Agent configuration with the default epsilon-greedy schedule and a fixed seed.
pub fn seeded_config(seed: u64) -> AgentConfig {
    AgentConfig::default()
        .with_policy(PolicyConfig::epsilon_greedy())
        .with_seed(seed)
}

/// A scripted drive: the car wanders across the road, sometimes leaves it,
/// crosses a checkpoint every 25 ticks and meets a bomb every so often.
///
/// The sequence depends only on `seed`. Episodes are `episode_length` ticks.
pub fn scripted_ticks(count: u64, episode_length: u64, seed: u64) -> Vec<Tick> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut lateral = 100.0;
    let mut speed = 0.0;

    (0..count)
        .map(|i| {
            let episode = i / episode_length;
            let step = i % episode_length;

            lateral += rng.random_range(-12.0..12.0);
            lateral = f64::clamp(lateral, -20.0, 220.0);
            speed = f64::clamp(speed + rng.random_range(-15.0..20.0), 0.0, 240.0);
            let to_checkpoint = 100.0 - (step % 25) as f64 * 4.0;
            let on_road = (0.0..=200.0).contains(&lateral);

            let mut sensors = SensorVector::default()
                .with(DIST_LEFT, lateral.max(0.0))
                .with(DIST_RIGHT, (200.0 - lateral).max(0.0))
                .with(ON_TRACK, if on_road { 1.0 } else { 0.0 })
                .with(DIST_CHECKPOINT, to_checkpoint)
                .with(CHECKPOINT, if step % 25 == 24 { 1.0 } else { 0.0 })
                .with(SPEED, speed);
            if rng.random_bool(0.2) {
                sensors = sensors
                    .with(BOMB_DIST, rng.random_range(5.0..120.0))
                    .with(BOMB_ANGLE, rng.random_range(-90.0..90.0))
                    .with(BOMB_DETECTED, 1.0);
            }

            Tick {
                sensors,
                episode,
                step,
                end_of_episode: step + 1 == episode_length,
            }
        })
        .collect()
}

/// Feed `ticks` to `agent` with learning enabled, returning the chosen actions.
pub fn drive(agent: &mut Agent, ticks: &[Tick]) -> Result<Vec<qracer::Action>> {
    ticks
        .iter()
        .map(|tick| {
            let outcome = agent.observe(tick, true)?;
            if tick.end_of_episode {
                agent.end_episode();
            }
            Ok(outcome.action)
        })
        .collect()
}

/// Bit patterns of every entry, for exact comparisons.
pub fn table_bits(table: &ValueTable) -> Vec<u64> {
    table.values().iter().map(|v| v.to_bits()).collect()
}
