//! Environment port - the simulator seen from the agent's side

use crate::sensors::{Action, SensorVector};

/// Result of advancing the world by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvStep {
    pub sensors: SensorVector,
    /// The episode ended on this tick (timeout or explicit end signal).
    pub done: bool,
}

/// A world that produces sensor readings and reacts to actions.
///
/// The real physics and rendering live outside this crate; anything that can
/// hand out sensor vectors tick by tick can train an agent.
pub trait RaceEnvironment {
    /// Start an episode and return the first readings.
    fn reset(&mut self, episode: u64) -> SensorVector;

    /// Apply `action` and advance one tick.
    fn step(&mut self, action: Action) -> EnvStep;

    /// Upper bound on ticks per episode.
    fn episode_length(&self) -> u64;

    /// Checkpoints crossed so far in the current episode.
    fn checkpoints(&self) -> u32 {
        0
    }
}
