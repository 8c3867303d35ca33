//! Head-to-head races between two controllers
//!
//! Each track seed hosts one race per leg. In the first leg the first
//! controller starts in the left lane; with side swapping enabled a second
//! leg repeats every track with the lanes exchanged. A race is won on
//! checkpoints, then on total reward, and a win is worth
//! [`POINTS_PER_WIN`] points. Ties score nothing.

use std::{cmp::Ordering, fs::File, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Error, Result,
    pipeline::{ScriptedTrack, TrackConfig, TrainingConfig, TrainingPipeline},
    ports::Controller,
};

/// Points awarded for winning one race.
pub const POINTS_PER_WIN: u32 = 3;

/// Lane of the first controller in the first leg.
const LEFT_LANE: f64 = 0.35;
const RIGHT_LANE: f64 = 0.65;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Seeds of the tracks to race on, in order.
    pub tracks: Vec<u64>,
    /// Layout template; `seed` and `start_position` are set per race.
    pub track: TrackConfig,
    /// Race every track a second time with the lanes exchanged.
    pub swap_sides: bool,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            tracks: vec![0, 1, 2],
            track: TrackConfig::default(),
            swap_sides: true,
        }
    }
}

/// How far one car got in a race.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceScore {
    pub checkpoints: u64,
    pub reward: f64,
}

impl RaceScore {
    /// Checkpoints first, total reward breaks the tie.
    pub fn rank(&self, other: &RaceScore) -> Ordering {
        self.checkpoints
            .cmp(&other.checkpoints)
            .then(self.reward.total_cmp(&other.reward))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub track: u64,
    /// The lanes were exchanged for this race.
    pub swapped: bool,
    pub scores: [RaceScore; 2],
    /// Index of the winning controller, `None` on a tie.
    pub winner: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionResult {
    pub names: [String; 2],
    pub races: Vec<RaceResult>,
    pub points: [u32; 2],
}

impl CompetitionResult {
    /// Index of the controller with more points, `None` when level.
    pub fn winner(&self) -> Option<usize> {
        match self.points[0].cmp(&self.points[1]) {
            Ordering::Greater => Some(0),
            Ordering::Less => Some(1),
            Ordering::Equal => None,
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

/// Runs a two-controller competition over a list of tracks
pub struct Competition {
    config: CompetitionConfig,
}

impl Competition {
    pub fn new(config: CompetitionConfig) -> Result<Self> {
        if config.tracks.is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "a competition needs at least one track".to_string(),
            });
        }
        config.track.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompetitionConfig {
        &self.config
    }

    /// Race `first` against `second` on every track and leg.
    ///
    /// Controllers are run without learning; the caller chooses how greedy
    /// they act.
    pub fn run<A, B>(&self, first: &mut A, second: &mut B) -> Result<CompetitionResult>
    where
        A: Controller + ?Sized,
        B: Controller + ?Sized,
    {
        let legs: &[bool] = if self.config.swap_sides {
            &[false, true]
        } else {
            &[false]
        };

        let mut races = Vec::new();
        let mut points = [0; 2];
        for &swapped in legs {
            for &track in &self.config.tracks {
                let (first_lane, second_lane) = if swapped {
                    (RIGHT_LANE, LEFT_LANE)
                } else {
                    (LEFT_LANE, RIGHT_LANE)
                };
                let scores = [
                    self.race(first, track, first_lane)?,
                    self.race(second, track, second_lane)?,
                ];
                let winner = match scores[0].rank(&scores[1]) {
                    Ordering::Greater => Some(0),
                    Ordering::Less => Some(1),
                    Ordering::Equal => None,
                };
                if let Some(seat) = winner {
                    points[seat] += POINTS_PER_WIN;
                }

                info!(
                    track,
                    swapped,
                    first = first.name(),
                    second = second.name(),
                    winner = ?winner,
                    "race finished"
                );
                races.push(RaceResult {
                    track,
                    swapped,
                    scores,
                    winner,
                });
            }
        }

        Ok(CompetitionResult {
            names: [first.name().to_string(), second.name().to_string()],
            races,
            points,
        })
    }

    fn race<C: Controller + ?Sized>(
        &self,
        controller: &mut C,
        seed: u64,
        start_position: f64,
    ) -> Result<RaceScore> {
        let mut track = ScriptedTrack::new(TrackConfig {
            seed,
            start_position,
            ..self.config.track
        })?;
        let result = TrainingPipeline::new(TrainingConfig {
            episodes: 1,
            first_episode: 0,
            learn: false,
        })
        .run(controller, &mut track)?;
        Ok(RaceScore {
            checkpoints: result.checkpoints,
            reward: result.total_reward,
        })
    }
}
