//! Scripted race track
//!
//! A small deterministic stand-in for the physics simulator: the car moves
//! along a chain of checkpoint segments, each with its own curvature, surface
//! and optional bomb. Every episode's layout is derived from the track seed
//! and the episode index, so two runs with the same seed see the same world.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{EnvStep, RaceEnvironment},
    sensors::{
        Action, BOMB_ANGLE, BOMB_DETECTED, BOMB_DIST, CHECKPOINT, DIST_CENTER, DIST_CHECKPOINT,
        DIST_LEFT, DIST_RIGHT, ENEMY_DIST, ON_TRACK, SENSOR_COUNT, SPEED, SensorVector,
    },
};

/// Layout and dynamics parameters of the scripted track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub seed: u64,
    /// Ticks per episode.
    pub episode_length: u64,
    /// Distance between the edges of the road.
    pub width: f64,
    /// Distance from one checkpoint to the next.
    pub segment_length: f64,
    pub max_speed: f64,
    /// Speed cap while off the road.
    pub off_track_speed: f64,
    /// Probability that a segment is icy.
    pub ice_chance: f64,
    /// Probability that a segment holds a bomb.
    pub bomb_chance: f64,
    /// Starting lateral position as a fraction of the width, 0 at the left edge.
    pub start_position: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            episode_length: 400,
            width: 200.0,
            segment_length: 150.0,
            max_speed: 200.0,
            off_track_speed: 40.0,
            ice_chance: 0.2,
            bomb_chance: 0.3,
            start_position: 0.5,
        }
    }
}

impl TrackConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("width", self.width),
            ("segment_length", self.segment_length),
            ("max_speed", self.max_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfiguration {
                    message: format!("track {name} must be finite and positive, got {value}"),
                });
            }
        }
        if !self.off_track_speed.is_finite() || self.off_track_speed < 0.0 {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "track off_track_speed must be finite and non-negative, got {}",
                    self.off_track_speed
                ),
            });
        }
        for (name, value) in [
            ("ice_chance", self.ice_chance),
            ("bomb_chance", self.bomb_chance),
            ("start_position", self.start_position),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfiguration {
                    message: format!("track {name} must be in [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Bomb {
    /// Distance along the segment, measured from its start.
    along: f64,
    lateral: f64,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    /// Lateral drift per unit of speed.
    curvature: f64,
    icy: bool,
    bomb: Option<Bomb>,
}

/// Deterministic track implementing [`RaceEnvironment`].
#[derive(Debug, Clone)]
pub struct ScriptedTrack {
    config: TrackConfig,
    rng: StdRng,
    segment: Segment,
    lateral: f64,
    speed: f64,
    to_checkpoint: f64,
    crossed: bool,
    checkpoints: u32,
    step: u64,
}

impl ScriptedTrack {
    pub fn new(config: TrackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: TrackConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let segment = Self::draw_segment(&config, &mut rng);
        Self {
            rng,
            segment,
            lateral: Self::start_lateral(&config),
            speed: 0.0,
            to_checkpoint: config.segment_length,
            crossed: false,
            checkpoints: 0,
            step: 0,
            config,
        }
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    fn start_lateral(config: &TrackConfig) -> f64 {
        config.width * config.start_position
    }

    fn draw_segment(config: &TrackConfig, rng: &mut StdRng) -> Segment {
        let curvature = rng.random_range(-0.06..=0.06);
        let icy = rng.random_bool(config.ice_chance);
        let bomb = rng.random_bool(config.bomb_chance).then(|| Bomb {
            along: rng.random_range(0.3..0.8) * config.segment_length,
            lateral: rng.random_range(0.2..0.8) * config.width,
        });
        Segment {
            curvature,
            icy,
            bomb,
        }
    }

    fn on_road(&self) -> bool {
        (0.0..=self.config.width).contains(&self.lateral)
    }

    fn sensors(&self) -> SensorVector {
        let mut readings = [0.0; SENSOR_COUNT];
        readings[DIST_LEFT] = self.lateral.max(0.0);
        readings[DIST_RIGHT] = (self.config.width - self.lateral).max(0.0);
        readings[DIST_CENTER] = if self.on_road() {
            self.config.width * (1.0 - self.segment.curvature.abs() * 8.0)
        } else {
            0.0
        };
        readings[ON_TRACK] = match (self.on_road(), self.segment.icy) {
            (false, _) => 0.0,
            (true, false) => 1.0,
            (true, true) => 2.0,
        };
        readings[DIST_CHECKPOINT] = self.to_checkpoint;
        readings[SPEED] = self.speed;
        readings[ENEMY_DIST] = -1.0;
        readings[CHECKPOINT] = if self.crossed { 1.0 } else { 0.0 };

        let travelled = self.config.segment_length - self.to_checkpoint;
        match self.segment.bomb {
            Some(bomb) if bomb.along >= travelled => {
                let ahead = bomb.along - travelled;
                let side = bomb.lateral - self.lateral;
                readings[BOMB_DIST] = ahead.hypot(side);
                readings[BOMB_ANGLE] = side.atan2(ahead.max(1.0)).to_degrees();
                readings[BOMB_DETECTED] = 1.0;
            }
            _ => readings[BOMB_DIST] = -1.0,
        }
        SensorVector::new(readings)
    }
}

impl Default for ScriptedTrack {
    fn default() -> Self {
        Self::build(TrackConfig::default())
    }
}

impl RaceEnvironment for ScriptedTrack {
    fn reset(&mut self, episode: u64) -> SensorVector {
        self.rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(episode));
        self.segment = Self::draw_segment(&self.config, &mut self.rng);
        self.lateral = Self::start_lateral(&self.config);
        self.speed = 0.0;
        self.to_checkpoint = self.config.segment_length;
        self.crossed = false;
        self.checkpoints = 0;
        self.step = 0;
        self.sensors()
    }

    fn step(&mut self, action: Action) -> EnvStep {
        let grip = if self.segment.icy { 0.5 } else { 1.0 };
        let steer = (4.0 + self.speed * 0.04) * grip;
        match action {
            Action::Right => self.lateral += steer,
            Action::Left => self.lateral -= steer,
            Action::Accelerate => self.speed += 10.0 * grip,
            Action::Brake => self.speed -= 15.0,
            Action::NoOp => self.speed -= 2.0,
        }

        let cap = if self.on_road() {
            self.config.max_speed
        } else {
            self.config.off_track_speed
        };
        self.speed = self.speed.clamp(0.0, cap);
        self.lateral += self.segment.curvature * self.speed;

        self.to_checkpoint -= self.speed / 10.0;
        self.crossed = self.to_checkpoint <= 0.0;
        if self.crossed {
            self.checkpoints += 1;
            self.segment = Self::draw_segment(&self.config, &mut self.rng);
            self.to_checkpoint += self.config.segment_length;
        }

        self.step += 1;
        EnvStep {
            sensors: self.sensors(),
            done: self.step >= self.config.episode_length,
        }
    }

    fn episode_length(&self) -> u64 {
        self.config.episode_length
    }

    fn checkpoints(&self) -> u32 {
        self.checkpoints
    }
}
