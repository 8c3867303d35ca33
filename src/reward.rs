//! Reward shaping for the racing agent
//!
//! A [`RewardFunction`] is a pure function of one transition. It must be
//! defined for every sensor combination and bounded, so repeated TD updates
//! cannot push table values without limit. [`ShapedReward`] is the tuned
//! racing reward; every weight lives in [`RewardWeights`].

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    sensors::{Action, SensorVector},
};

/// One observed transition, as seen by a reward function.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub previous: &'a SensorVector,
    pub current: &'a SensorVector,
    pub action: Action,
    /// Ticks taken so far in the current episode.
    pub step: u64,
    pub end_of_episode: bool,
}

/// Deterministic, bounded reward for a transition.
pub trait RewardFunction {
    fn reward(&self, transition: &Transition<'_>) -> f64;

    /// Upper bound on `|reward|` over every possible transition.
    fn bound(&self) -> f64;
}

impl<F: RewardFunction + ?Sized> RewardFunction for &F {
    fn reward(&self, transition: &Transition<'_>) -> f64 {
        (**self).reward(transition)
    }

    fn bound(&self) -> f64 {
        (**self).bound()
    }
}

/// Penalty for leaving the track, by the action that led off it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeaveTrackPenalty {
    pub accelerate: f64,
    pub brake: f64,
    pub steer: f64,
    pub no_op: f64,
}

impl LeaveTrackPenalty {
    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("leave_track.accelerate", self.accelerate),
            ("leave_track.brake", self.brake),
            ("leave_track.steer", self.steer),
            ("leave_track.no_op", self.no_op),
        ]
    }

    fn for_action(&self, action: Action) -> f64 {
        match action {
            Action::Accelerate => self.accelerate,
            Action::Brake => self.brake,
            Action::Left | Action::Right => self.steer,
            Action::NoOp => self.no_op,
        }
    }

    fn max_abs(&self) -> f64 {
        [self.accelerate, self.brake, self.steer, self.no_op]
            .iter()
            .fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }
}

/// Weights of the shaped racing reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub on_track: f64,
    pub off_track: f64,
    /// Bonus for getting back on track by steering or accelerating.
    pub recovery: f64,
    pub leave_track: LeaveTrackPenalty,
    /// Penalty for braking or idling while stuck off track.
    pub idle_off_track: f64,
    /// Hazards closer than this are considered.
    pub hazard_radius: f64,
    /// Half-width (degrees) of the cone that counts as heading into a hazard.
    pub hazard_cone: f64,
    pub hazard_facing: f64,
    pub hazard_avoiding: f64,
    pub checkpoint_bonus: f64,
    /// Applied on every tick without a checkpoint crossing.
    pub checkpoint_urge: f64,
    pub progress: f64,
    /// Clamp on the per-tick checkpoint distance delta.
    pub max_progress: f64,
    pub speed: f64,
    pub max_speed: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            on_track: 10.0,
            off_track: -15.0,
            recovery: 10.0,
            leave_track: LeaveTrackPenalty {
                accelerate: -60.0,
                brake: -20.0,
                steer: -10.0,
                no_op: -40.0,
            },
            idle_off_track: -60.0,
            hazard_radius: 30.0,
            hazard_cone: 45.0,
            hazard_facing: -15.0,
            hazard_avoiding: 15.0,
            checkpoint_bonus: 40.0,
            checkpoint_urge: -10.0,
            progress: 2.0,
            max_progress: 20.0,
            speed: 0.2,
            max_speed: 200.0,
        }
    }
}

impl RewardWeights {
    /// Every weight must be finite; clamps, radii and cones must also be
    /// non-negative, so the reward stays total and bounded.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("on_track", self.on_track),
            ("off_track", self.off_track),
            ("recovery", self.recovery),
            ("idle_off_track", self.idle_off_track),
            ("hazard_facing", self.hazard_facing),
            ("hazard_avoiding", self.hazard_avoiding),
            ("checkpoint_bonus", self.checkpoint_bonus),
            ("checkpoint_urge", self.checkpoint_urge),
            ("progress", self.progress),
            ("speed", self.speed),
        ];
        for (name, value) in weights.into_iter().chain(self.leave_track.entries()) {
            if !value.is_finite() {
                return Err(Error::InvalidConfiguration {
                    message: format!("reward weight {name} must be finite, got {value}"),
                });
            }
        }

        for (name, value) in [
            ("max_progress", self.max_progress),
            ("max_speed", self.max_speed),
            ("hazard_radius", self.hazard_radius),
            ("hazard_cone", self.hazard_cone),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfiguration {
                    message: format!("reward {name} must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Per-term decomposition of a shaped reward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub surface: f64,
    pub recovery: f64,
    pub leaving: f64,
    pub hazard: f64,
    pub checkpoint: f64,
    pub speed: f64,
}

impl RewardBreakdown {
    pub fn total(&self) -> f64 {
        self.surface + self.recovery + self.leaving + self.hazard + self.checkpoint + self.speed
    }
}

/// Additive racing reward: surface, recovery, leaving the track, hazards,
/// checkpoint progress and speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapedReward {
    weights: RewardWeights,
}

impl ShapedReward {
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    pub fn breakdown(&self, t: &Transition<'_>) -> RewardBreakdown {
        let w = &self.weights;
        let was_on = t.previous.on_track();
        let is_on = t.current.on_track();

        let surface = if is_on { w.on_track } else { w.off_track };
        let driving = t.action.is_steering() || t.action == Action::Accelerate;

        let recovery = if is_on && !was_on && driving {
            w.recovery
        } else {
            0.0
        };

        let leaving = match (was_on, is_on) {
            (true, false) => w.leave_track.for_action(t.action),
            (false, false) if !driving => w.idle_off_track,
            _ => 0.0,
        };

        let hazard = {
            let distance = t.current.bomb_distance();
            let angle = t.current.bomb_angle().abs();
            // Negative distance: no hazard detected.
            if !(0.0..w.hazard_radius).contains(&distance) {
                0.0
            } else if angle < w.hazard_cone {
                w.hazard_facing
            } else if angle > w.hazard_cone {
                w.hazard_avoiding
            } else {
                0.0
            }
        };

        let checkpoint = if t.current.checkpoint_crossed() {
            w.checkpoint_bonus
        } else {
            let delta = t.previous.checkpoint_distance() - t.current.checkpoint_distance();
            let delta = if delta.is_finite() {
                delta.min(w.max_progress).max(-w.max_progress)
            } else {
                0.0
            };
            w.checkpoint_urge + w.progress * delta
        };

        let speed = {
            let s = t.current.speed();
            let s = if s.is_finite() {
                s.min(w.max_speed).max(0.0)
            } else {
                0.0
            };
            w.speed * s
        };

        RewardBreakdown {
            surface,
            recovery,
            leaving,
            hazard,
            checkpoint,
            speed,
        }
    }
}

impl RewardFunction for ShapedReward {
    fn reward(&self, transition: &Transition<'_>) -> f64 {
        self.breakdown(transition).total()
    }

    fn bound(&self) -> f64 {
        let w = &self.weights;
        w.on_track.abs().max(w.off_track.abs())
            + w.recovery.abs()
            + w.leave_track.max_abs().max(w.idle_off_track.abs())
            + w.hazard_facing.abs().max(w.hazard_avoiding.abs())
            + w
                .checkpoint_bonus
                .abs()
                .max(w.checkpoint_urge.abs() + w.progress.abs() * w.max_progress)
            + w.speed.abs() * w.max_speed
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::sensors::{
        BOMB_ANGLE, BOMB_DIST, CHECKPOINT, DIST_CHECKPOINT, ON_TRACK, SENSOR_COUNT, SPEED,
    };

    fn transition<'a>(
        previous: &'a SensorVector,
        current: &'a SensorVector,
        action: Action,
    ) -> Transition<'a> {
        Transition {
            previous,
            current,
            action,
            step: 1,
            end_of_episode: false,
        }
    }

    #[test]
    fn test_steady_driving_toward_checkpoint() {
        let reward = ShapedReward::default();
        let previous = SensorVector::default()
            .with(DIST_CHECKPOINT, 100.0)
            .with(SPEED, 50.0);
        let current = previous.with(DIST_CHECKPOINT, 95.0);
        let parts = reward.breakdown(&transition(&previous, &current, Action::Accelerate));

        assert_eq!(parts.surface, 10.0);
        assert_eq!(parts.recovery, 0.0);
        assert_eq!(parts.leaving, 0.0);
        assert_eq!(parts.hazard, 0.0);
        assert_eq!(parts.checkpoint, -10.0 + 2.0 * 5.0);
        assert_eq!(parts.speed, 10.0);
        assert_eq!(
            reward.reward(&transition(&previous, &current, Action::Accelerate)),
            20.0
        );
    }

    #[test]
    fn test_leaving_track_penalty_depends_on_action() {
        let reward = ShapedReward::default();
        let previous = SensorVector::default();
        let current = previous.with(ON_TRACK, 0.0);
        let leaving =
            |action| reward.breakdown(&transition(&previous, &current, action)).leaving;
        assert_eq!(leaving(Action::Accelerate), -60.0);
        assert_eq!(leaving(Action::Brake), -20.0);
        assert_eq!(leaving(Action::Left), -10.0);
        assert_eq!(leaving(Action::NoOp), -40.0);
    }

    #[test]
    fn test_recovery_and_idling_off_track() {
        let reward = ShapedReward::default();
        let off = SensorVector::default().with(ON_TRACK, 0.0);
        let on = SensorVector::default();

        let back = reward.breakdown(&transition(&off, &on, Action::Right));
        assert_eq!(back.recovery, 10.0);
        let coasting_back = reward.breakdown(&transition(&off, &on, Action::NoOp));
        assert_eq!(coasting_back.recovery, 0.0);

        let idle = reward.breakdown(&transition(&off, &off, Action::Brake));
        assert_eq!(idle.leaving, -60.0);
        assert_eq!(idle.surface, -15.0);
        let steering = reward.breakdown(&transition(&off, &off, Action::Left));
        assert_eq!(steering.leaving, 0.0);
    }

    #[test]
    fn test_hazard_terms() {
        let reward = ShapedReward::default();
        let previous = SensorVector::default();
        let facing = previous.with(BOMB_DIST, 20.0).with(BOMB_ANGLE, -10.0);
        let beside = facing.with(BOMB_ANGLE, 120.0);
        let far = facing.with(BOMB_DIST, 45.0);
        let unseen = facing.with(BOMB_DIST, -1.0);

        let hazard = |s: &SensorVector| reward.breakdown(&transition(&previous, s, Action::NoOp)).hazard;
        assert_eq!(hazard(&facing), -15.0);
        assert_eq!(hazard(&beside), 15.0);
        assert_eq!(hazard(&far), 0.0);
        assert_eq!(hazard(&unseen), 0.0);
    }

    #[test]
    fn test_checkpoint_bonus_and_progress_clamp() {
        let reward = ShapedReward::default();
        let previous = SensorVector::default().with(DIST_CHECKPOINT, 500.0);
        let crossed = previous.with(CHECKPOINT, 1.0).with(DIST_CHECKPOINT, 300.0);
        let teleported = previous.with(DIST_CHECKPOINT, 0.0);

        let parts = reward.breakdown(&transition(&previous, &crossed, Action::NoOp));
        assert_eq!(parts.checkpoint, 40.0);
        let parts = reward.breakdown(&transition(&previous, &teleported, Action::NoOp));
        assert_eq!(parts.checkpoint, -10.0 + 2.0 * 20.0);
    }

    #[test]
    fn test_reward_is_deterministic_and_bounded() {
        let reward = ShapedReward::default();
        let bound = reward.bound();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..5_000 {
            let mut a = [0.0; SENSOR_COUNT];
            let mut b = [0.0; SENSOR_COUNT];
            for (x, y) in a.iter_mut().zip(b.iter_mut()) {
                *x = rng.random_range(-1_000.0..1_000.0);
                *y = rng.random_range(-1_000.0..1_000.0);
            }
            let (previous, current) = (SensorVector::new(a), SensorVector::new(b));
            let action = Action::ALL[rng.random_range(0..Action::COUNT)];
            let t = transition(&previous, &current, action);
            let r = reward.reward(&t);
            assert!(r.is_finite());
            assert!(r.abs() <= bound, "{r} exceeds bound {bound}");
            assert_eq!(r, reward.reward(&t));
        }
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(RewardWeights::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_weights_are_rejected() {
        let base = RewardWeights::default();
        for weights in [
            RewardWeights {
                max_progress: -1.0,
                ..base
            },
            RewardWeights {
                max_speed: f64::NAN,
                ..base
            },
            RewardWeights {
                hazard_radius: -5.0,
                ..base
            },
            RewardWeights {
                on_track: f64::INFINITY,
                ..base
            },
            RewardWeights {
                leave_track: LeaveTrackPenalty {
                    brake: f64::NAN,
                    ..base.leave_track
                },
                ..base
            },
        ] {
            assert!(
                matches!(weights.validate(), Err(Error::InvalidConfiguration { .. })),
                "accepted {weights:?}"
            );
        }
    }

    #[test]
    fn test_non_finite_sensors_stay_bounded() {
        let reward = ShapedReward::default();
        let previous = SensorVector::default();
        let current = previous
            .with(SPEED, f64::INFINITY)
            .with(DIST_CHECKPOINT, f64::NAN);
        let r = reward.reward(&transition(&previous, &current, Action::Accelerate));
        assert!(r.is_finite());
        assert!(r.abs() <= reward.bound());
    }
}
