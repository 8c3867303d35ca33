//! Training pipeline for racing controllers

use std::{fs::File, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Error, Result,
    ports::{Controller, RaceEnvironment, Tick, TrainingObserver},
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of episodes to run
    pub episodes: u64,

    /// Index of the first episode; continuing runs pass the count already done
    pub first_episode: u64,

    /// Update the value table; unset for evaluation runs
    pub learn: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 100,
            first_episode: 0,
            learn: true,
        }
    }
}

/// Per-episode totals reported to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: u64,
    pub ticks: u64,
    pub total_reward: f64,
    pub checkpoints: u32,
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Episodes run
    pub episodes: u64,

    /// Ticks across all episodes
    pub ticks: u64,

    /// Sum of rewards credited across all episodes
    pub total_reward: f64,

    /// Mean reward per episode
    pub mean_reward: f64,

    /// Checkpoints crossed across all episodes
    pub checkpoints: u64,

    /// Best single-episode reward
    pub best_episode_reward: Option<f64>,
}

impl TrainingResult {
    pub fn from_summaries(summaries: &[EpisodeSummary]) -> Self {
        let episodes = summaries.len() as u64;
        let total_reward: f64 = summaries.iter().map(|s| s.total_reward).sum();
        let mean_reward = if episodes > 0 {
            total_reward / episodes as f64
        } else {
            0.0
        };

        Self {
            episodes,
            ticks: summaries.iter().map(|s| s.ticks).sum(),
            total_reward,
            mean_reward,
            checkpoints: summaries.iter().map(|s| u64::from(s.checkpoints)).sum(),
            best_episode_reward: summaries
                .iter()
                .map(|s| s.total_reward)
                .max_by(f64::total_cmp),
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create {}", path.display()),
            source,
        })?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Runs a controller against an environment for a number of episodes
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn TrainingObserver>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run every configured episode and aggregate the results.
    pub fn run<C, E>(&mut self, controller: &mut C, env: &mut E) -> Result<TrainingResult>
    where
        C: Controller + ?Sized,
        E: RaceEnvironment + ?Sized,
    {
        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        let first = self.config.first_episode;
        let mut summaries = Vec::new();
        for episode in first..first + self.config.episodes {
            let summary = self.run_episode(episode, controller, env)?;
            info!(
                controller = controller.name(),
                episode = summary.episode,
                ticks = summary.ticks,
                reward = summary.total_reward,
                checkpoints = summary.checkpoints,
                "episode finished"
            );
            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }
            summaries.push(summary);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        Ok(TrainingResult::from_summaries(&summaries))
    }

    fn run_episode<C, E>(
        &mut self,
        episode: u64,
        controller: &mut C,
        env: &mut E,
    ) -> Result<EpisodeSummary>
    where
        C: Controller + ?Sized,
        E: RaceEnvironment + ?Sized,
    {
        for observer in &mut self.observers {
            observer.on_episode_start(episode)?;
        }

        let mut tick = Tick {
            sensors: env.reset(episode),
            episode,
            step: 0,
            end_of_episode: env.episode_length() == 0,
        };
        let mut total_reward = 0.0;

        loop {
            let outcome = controller.observe(&tick, self.config.learn)?;
            total_reward += outcome.reward.unwrap_or(0.0);
            for observer in &mut self.observers {
                observer.on_tick(episode, &outcome)?;
            }
            if tick.end_of_episode {
                break;
            }

            let next = env.step(outcome.action);
            tick = Tick {
                sensors: next.sensors,
                episode,
                step: tick.step + 1,
                end_of_episode: next.done,
            };
        }
        controller.end_episode();

        Ok(EpisodeSummary {
            episode,
            ticks: tick.step,
            total_reward,
            checkpoints: env.checkpoints(),
        })
    }
}
