//! Observer port - abstraction for training observation and data collection
//!
//! Observers let the training pipeline report progress and collect metrics
//! without coupling the loop to a particular output.

use crate::{Result, pipeline::EpisodeSummary, ports::TickOutcome};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - once
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_tick(episode, outcome)` - for every tick
///    - `on_episode_end(summary)`
/// 3. `on_training_end()` - once
///
/// Every method defaults to a no-op.
pub trait TrainingObserver {
    fn on_training_start(&mut self, _total_episodes: u64) -> Result<()> {
        Ok(())
    }

    fn on_episode_start(&mut self, _episode: u64) -> Result<()> {
        Ok(())
    }

    fn on_tick(&mut self, _episode: u64, _outcome: &TickOutcome) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
