//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::training::EpisodeSummary;
use crate::{
    Error, Result,
    ports::{TickOutcome, TrainingObserver},
    sensors::Action,
};

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    recent: VecDeque<f64>,
    window: usize,
}

impl ProgressObserver {
    /// Create a progress observer whose message shows the mean reward of the
    /// last 20 episodes.
    pub fn new() -> Self {
        Self::with_window(20)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            progress_bar: None,
            recent: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    fn message(&self) -> String {
        let mean = if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().sum::<f64>() / self.recent.len() as f64
        };
        format!("{mean:.1}")
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingObserver for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: u64) -> Result<()> {
        let pb = ProgressBar::new(total_episodes);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes (reward:{msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(summary.total_reward);

        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
#[derive(Debug, Default)]
pub struct MetricsObserver {
    rewards: Vec<f64>,
    ticks: Vec<u64>,
    checkpoints: Vec<u32>,
    action_counts: [u64; Action::COUNT],
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn episodes(&self) -> usize {
        self.rewards.len()
    }

    /// Per-episode reward totals in run order.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn mean_reward(&self) -> f64 {
        mean(&self.rewards)
    }

    /// Mean reward of the last `n` episodes.
    pub fn recent_mean_reward(&self, n: usize) -> f64 {
        let start = self.rewards.len().saturating_sub(n);
        mean(&self.rewards[start..])
    }

    pub fn avg_episode_length(&self) -> f64 {
        if self.ticks.is_empty() {
            0.0
        } else {
            self.ticks.iter().sum::<u64>() as f64 / self.ticks.len() as f64
        }
    }

    /// How often each action was chosen, indexed like [`Action::ALL`].
    pub fn action_counts(&self) -> &[u64] {
        &self.action_counts
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            episodes: self.episodes(),
            mean_reward: self.mean_reward(),
            recent_mean_reward: self.recent_mean_reward(20),
            best_reward: self.rewards.iter().copied().max_by(f64::total_cmp),
            avg_episode_length: self.avg_episode_length(),
            total_checkpoints: self.checkpoints.iter().map(|&c| u64::from(c)).sum(),
            action_counts: self.action_counts.to_vec(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub mean_reward: f64,
    pub recent_mean_reward: f64,
    pub best_reward: Option<f64>,
    pub avg_episode_length: f64,
    pub total_checkpoints: u64,
    pub action_counts: Vec<u64>,
}

impl TrainingObserver for MetricsObserver {
    fn on_tick(&mut self, _episode: u64, outcome: &TickOutcome) -> Result<()> {
        self.action_counts[outcome.action.index()] += 1;
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.rewards.push(summary.total_reward);
        self.ticks.push(summary.ticks);
        self.checkpoints.push(summary.checkpoints);
        Ok(())
    }
}

/// JSONL observer - Writes one episode summary per line
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create {}", path.display()),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl TrainingObserver for JsonlObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, summary)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Delegates to an observer behind `Arc<Mutex<_>>`, so the caller can read it
/// back after the pipeline has taken ownership of the box.
pub struct SharedObserver<T> {
    inner: Arc<Mutex<T>>,
}

impl<T: TrainingObserver> SharedObserver<T> {
    /// Wrap `observer`, returning the pipeline half and the handle to keep.
    pub fn new(observer: T) -> (Self, Arc<Mutex<T>>) {
        let inner = Arc::new(Mutex::new(observer));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            inner,
        )
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: TrainingObserver> TrainingObserver for SharedObserver<T> {
    fn on_training_start(&mut self, total_episodes: u64) -> Result<()> {
        self.lock().on_training_start(total_episodes)
    }

    fn on_episode_start(&mut self, episode: u64) -> Result<()> {
        self.lock().on_episode_start(episode)
    }

    fn on_tick(&mut self, episode: u64, outcome: &TickOutcome) -> Result<()> {
        self.lock().on_tick(episode, outcome)
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.lock().on_episode_end(summary)
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.lock().on_training_end()
    }
}
