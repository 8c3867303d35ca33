//! Raw sensor readings and the car's action set
//!
//! The simulator delivers one [`SensorVector`] per tick and expects one
//! [`Action`] back. Sensor positions are fixed:
//!
//! | Index | Reading | Range |
//! |-------|---------|-------|
//! | 0 | track distance left | 1-100 |
//! | 1 | track distance center | 1-100 |
//! | 2 | track distance right | 1-100 |
//! | 3 | on track | 0 off, 1 normal, 2 ice |
//! | 4 | checkpoint distance | >= 0 |
//! | 5 | speed | 10-200 |
//! | 6 | enemy distance | -1 or >= 0 |
//! | 7 | enemy angle | -180..180 |
//! | 8 | enemy detected | 0 or 1 |
//! | 9 | checkpoint crossed | 0 or 1 |
//! | 10 | incoming track | 0 off, 1 normal, 2 ice |
//! | 11 | bomb distance | -1 or >= 0 |
//! | 12 | bomb angle | -180..180 |
//! | 13 | bomb detected | 0 or 1 |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const SENSOR_COUNT: usize = 14;

pub const DIST_LEFT: usize = 0;
pub const DIST_CENTER: usize = 1;
pub const DIST_RIGHT: usize = 2;
pub const ON_TRACK: usize = 3;
pub const DIST_CHECKPOINT: usize = 4;
pub const SPEED: usize = 5;
pub const ENEMY_DIST: usize = 6;
pub const ENEMY_ANGLE: usize = 7;
pub const ENEMY_DETECTED: usize = 8;
pub const CHECKPOINT: usize = 9;
pub const INCOMING_TRACK: usize = 10;
pub const BOMB_DIST: usize = 11;
pub const BOMB_ANGLE: usize = 12;
pub const BOMB_DETECTED: usize = 13;

/// Surface under the car, as reported by the on-track sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    OffTrack,
    Normal,
    Ice,
}

/// One tick's worth of sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorVector([f64; SENSOR_COUNT]);

impl SensorVector {
    pub fn new(readings: [f64; SENSOR_COUNT]) -> Self {
        Self(readings)
    }

    /// Build a sensor vector from a slice delivered by the simulator.
    pub fn from_slice(readings: &[f64]) -> Result<Self> {
        let array: [f64; SENSOR_COUNT] =
            readings.try_into().map_err(|_| Error::SensorLength {
                expected: SENSOR_COUNT,
                got: readings.len(),
            })?;
        Ok(Self(array))
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Copy of this vector with one reading replaced.
    pub fn with(mut self, index: usize, value: f64) -> Self {
        self.0[index] = value;
        self
    }

    pub fn surface(&self) -> Surface {
        match self.0[ON_TRACK] {
            v if v <= 0.0 => Surface::OffTrack,
            v if v >= 2.0 => Surface::Ice,
            _ => Surface::Normal,
        }
    }

    pub fn on_track(&self) -> bool {
        self.surface() != Surface::OffTrack
    }

    pub fn checkpoint_crossed(&self) -> bool {
        self.0[CHECKPOINT] >= 1.0
    }

    pub fn checkpoint_distance(&self) -> f64 {
        self.0[DIST_CHECKPOINT]
    }

    pub fn speed(&self) -> f64 {
        self.0[SPEED]
    }

    pub fn bomb_distance(&self) -> f64 {
        self.0[BOMB_DIST]
    }

    pub fn bomb_angle(&self) -> f64 {
        self.0[BOMB_ANGLE]
    }
}

impl Default for SensorVector {
    /// A car at rest in the middle of a straight, normal stretch of track.
    fn default() -> Self {
        let mut readings = [0.0; SENSOR_COUNT];
        readings[DIST_LEFT] = 50.0;
        readings[DIST_CENTER] = 100.0;
        readings[DIST_RIGHT] = 50.0;
        readings[ON_TRACK] = 1.0;
        readings[DIST_CHECKPOINT] = 100.0;
        readings[SPEED] = 10.0;
        readings[ENEMY_DIST] = -1.0;
        readings[INCOMING_TRACK] = 1.0;
        readings[BOMB_DIST] = -1.0;
        Self(readings)
    }
}

/// Discrete actions understood by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Right,
    Left,
    Accelerate,
    Brake,
    NoOp,
}

impl Action {
    pub const COUNT: usize = 5;
    pub const ALL: [Action; Self::COUNT] = [
        Action::Right,
        Action::Left,
        Action::Accelerate,
        Action::Brake,
        Action::NoOp,
    ];

    /// Table column for this action.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(Error::InvalidAction {
                action: index,
                num_actions: Self::COUNT,
            })
    }

    /// Code sent to the simulator (1-based).
    pub fn code(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1..=5 => Self::from_index(usize::from(code - 1)),
            _ => Err(Error::InvalidAction {
                action: usize::from(code),
                num_actions: Self::COUNT,
            }),
        }
    }

    pub fn is_steering(self) -> bool {
        matches!(self, Action::Left | Action::Right)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Right => "right",
            Action::Left => "left",
            Action::Accelerate => "accelerate",
            Action::Brake => "brake",
            Action::NoOp => "no-op",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = SensorVector::from_slice(&[0.0; 13]).unwrap_err();
        assert!(matches!(
            err,
            Error::SensorLength {
                expected: 14,
                got: 13
            }
        ));
        assert!(SensorVector::from_slice(&[0.0; 14]).is_ok());
    }

    #[test]
    fn test_surface_classification() {
        let sensors = SensorVector::default();
        assert_eq!(sensors.surface(), Surface::Normal);
        assert_eq!(sensors.with(ON_TRACK, 0.0).surface(), Surface::OffTrack);
        assert_eq!(sensors.with(ON_TRACK, 2.0).surface(), Surface::Ice);
        assert!(sensors.with(ON_TRACK, 2.0).on_track());
    }

    #[test]
    fn test_action_codes_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_code(action.code()).unwrap(), action);
            assert_eq!(Action::from_index(action.index()).unwrap(), action);
        }
        assert_eq!(Action::Right.code(), 1);
        assert_eq!(Action::NoOp.code(), 5);
        assert!(Action::from_code(0).is_err());
        assert!(Action::from_code(6).is_err());
        assert!(Action::from_index(5).is_err());
    }
}
