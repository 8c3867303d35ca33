//! Training and evaluation pipeline
//!
//! This module provides:
//! - A training loop driving any [`Controller`](crate::ports::Controller)
//!   against any [`RaceEnvironment`](crate::ports::RaceEnvironment)
//! - A deterministic scripted track for offline training and tests
//! - Head-to-head competitions between two controllers
//! - Observers for progress display and metrics collection

pub mod competition;
pub mod observers;
pub mod track;
pub mod training;

pub use competition::{
    Competition, CompetitionConfig, CompetitionResult, POINTS_PER_WIN, RaceResult, RaceScore,
};
pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver, SharedObserver,
};
pub use track::{ScriptedTrack, TrackConfig};
pub use training::{EpisodeSummary, TrainingConfig, TrainingPipeline, TrainingResult};
