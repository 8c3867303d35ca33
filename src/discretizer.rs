//! Sensor to discrete-state pipeline
//!
//! A [`Discretizer`] first derives a feature vector from the current and
//! previous sensor readings, then buckets the features into a
//! [`DiscreteState`]. Every bucketing rule used by [`RaceDiscretizer`] also
//! reports its level count, and `discretization_levels` is assembled from
//! those same rules, so the declared ranges and the produced states cannot
//! drift apart.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Error, Result,
    sensors::{DIST_LEFT, DIST_RIGHT, SensorVector, Surface},
    state_space::{DiscreteState, StateSpace},
};

/// Fixed-width binning with a saturating top bucket.
///
/// `v` maps to `floor(v / step)` while `v < step * levels`, and to
/// `levels - 1` above that. Values below zero (or NaN) are outside the
/// feature's domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    pub step: f64,
    pub levels: usize,
}

impl Binning {
    pub const fn new(step: f64, levels: usize) -> Self {
        Self { step, levels }
    }

    pub fn upper(&self) -> f64 {
        self.step * self.levels as f64
    }

    /// Strict bucketing: values below the range are a [`Error::Domain`].
    pub fn classify(&self, feature: &'static str, value: f64) -> Result<usize> {
        if value.is_nan() || value < 0.0 {
            return Err(Error::Domain {
                feature,
                value,
                bucket: 0,
            });
        }
        if value >= self.upper() {
            return Ok(self.levels - 1);
        }
        Ok(((value / self.step).floor() as usize).min(self.levels - 1))
    }

    /// Bucketing that recovers from domain errors by saturating into the
    /// nearest valid bucket.
    pub fn bucket(&self, feature: &'static str, value: f64) -> usize {
        self.classify(feature, value).unwrap_or_else(|err| {
            debug!(%err, "saturating out-of-range feature");
            match err {
                Error::Domain { bucket, .. } => bucket,
                _ => 0,
            }
        })
    }

    fn validate(&self, feature: &str) -> Result<()> {
        if self.levels == 0 || !self.step.is_finite() || self.step <= 0.0 {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "binning for '{feature}' needs a positive step and at least one level"
                ),
            });
        }
        Ok(())
    }
}

/// Maps raw sensors to a bounded discrete state.
pub trait Discretizer {
    /// Derived per-tick features.
    type Features;

    /// Derive features from the current readings and, for delta features,
    /// the previous tick's readings.
    fn compute_features(
        &self,
        sensors: &SensorVector,
        previous: Option<&SensorVector>,
    ) -> Self::Features;

    /// Bucket `features` into a state whose component `i` lies in
    /// `0..discretization_levels()[i]`.
    fn discretize(&self, features: &Self::Features, sensors: &SensorVector) -> DiscreteState;

    /// Level count of every state component.
    fn discretization_levels(&self) -> Vec<usize>;

    fn state_space(&self) -> Result<StateSpace> {
        StateSpace::new(self.discretization_levels())
    }

    fn current_state(
        &self,
        sensors: &SensorVector,
        previous: Option<&SensorVector>,
    ) -> DiscreteState {
        let features = self.compute_features(sensors, previous);
        self.discretize(&features, sensors)
    }
}

/// Position of the car relative to the track edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    Centered = 0,
    TooLeft = 1,
    TooRight = 2,
}

/// Collision risk with the nearest hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardRisk {
    None = 0,
    Left = 1,
    Right = 2,
}

/// Features used by [`RaceDiscretizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceFeatures {
    pub checkpoint_crossed: bool,
    pub on_track: bool,
    pub lane: Lane,
    pub hazard: HazardRisk,
    pub speed: f64,
    /// Reduction in checkpoint distance since the previous tick.
    pub progress: f64,
}

/// Tunable thresholds and bins for [`RaceDiscretizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscretizerConfig {
    /// Side distance below which the car counts as hugging that edge.
    pub lane_margin: f64,
    /// Hazard distance that counts as close on normal track.
    pub hazard_distance: f64,
    /// Hazard distance that counts as close on ice.
    pub hazard_distance_ice: f64,
    /// Half-width of the forward cone (degrees) in which a hazard is a risk.
    pub hazard_cone: f64,
    pub speed: Binning,
    pub progress: Binning,
}

impl Default for DiscretizerConfig {
    fn default() -> Self {
        Self {
            lane_margin: 35.0,
            hazard_distance: 50.0,
            hazard_distance_ice: 90.0,
            hazard_cone: 45.0,
            speed: Binning::new(40.0, 5),
            progress: Binning::new(4.0, 5),
        }
    }
}

impl DiscretizerConfig {
    pub fn validate(&self) -> Result<()> {
        self.speed.validate("speed")?;
        self.progress.validate("progress")?;
        for (name, value) in [
            ("lane_margin", self.lane_margin),
            ("hazard_distance", self.hazard_distance),
            ("hazard_distance_ice", self.hazard_distance_ice),
            ("hazard_cone", self.hazard_cone),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

const CHECKPOINT_LEVELS: usize = 2;
const ON_TRACK_LEVELS: usize = 2;
const LANE_LEVELS: usize = 3;
const HAZARD_LEVELS: usize = 3;

/// Discretizer for the racing car: checkpoint, surface, lane, hazard, speed
/// and progress features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceDiscretizer {
    config: DiscretizerConfig,
}

impl RaceDiscretizer {
    pub fn new(config: DiscretizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DiscretizerConfig {
        &self.config
    }

    fn lane(&self, sensors: &SensorVector) -> Lane {
        if sensors.get(DIST_LEFT) < self.config.lane_margin {
            Lane::TooLeft
        } else if sensors.get(DIST_RIGHT) < self.config.lane_margin {
            Lane::TooRight
        } else {
            Lane::Centered
        }
    }

    fn hazard(&self, sensors: &SensorVector) -> HazardRisk {
        let distance = sensors.bomb_distance();
        let angle = sensors.bomb_angle();
        // A negative distance means no hazard is in sight.
        if distance < 0.0 || angle.abs() >= self.config.hazard_cone {
            return HazardRisk::None;
        }
        let reach = match sensors.surface() {
            Surface::Ice => self.config.hazard_distance_ice,
            _ => self.config.hazard_distance,
        };
        if distance > reach {
            HazardRisk::None
        } else if angle >= 0.0 {
            HazardRisk::Left
        } else {
            HazardRisk::Right
        }
    }

    fn progress(&self, sensors: &SensorVector, previous: Option<&SensorVector>) -> f64 {
        let saturated = self.config.progress.upper();
        match previous {
            _ if sensors.checkpoint_crossed() => saturated,
            Some(prev) if prev.checkpoint_distance() != 0.0 => {
                prev.checkpoint_distance() - sensors.checkpoint_distance()
            }
            _ => saturated,
        }
    }
}

impl Discretizer for RaceDiscretizer {
    type Features = RaceFeatures;

    fn compute_features(
        &self,
        sensors: &SensorVector,
        previous: Option<&SensorVector>,
    ) -> RaceFeatures {
        RaceFeatures {
            checkpoint_crossed: sensors.checkpoint_crossed(),
            on_track: sensors.on_track(),
            lane: self.lane(sensors),
            hazard: self.hazard(sensors),
            speed: sensors.speed(),
            progress: self.progress(sensors, previous),
        }
    }

    fn discretize(&self, features: &RaceFeatures, _sensors: &SensorVector) -> DiscreteState {
        DiscreteState::new(vec![
            usize::from(features.checkpoint_crossed),
            usize::from(features.on_track),
            features.lane as usize,
            features.hazard as usize,
            self.config.speed.bucket("speed", features.speed),
            self.config.progress.bucket("progress", features.progress),
        ])
    }

    fn discretization_levels(&self) -> Vec<usize> {
        vec![
            CHECKPOINT_LEVELS,
            ON_TRACK_LEVELS,
            LANE_LEVELS,
            HAZARD_LEVELS,
            self.config.speed.levels,
            self.config.progress.levels,
        ]
    }
}
