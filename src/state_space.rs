//! Discrete states and the enumerable space they live in
//!
//! A [`StateSpace`] is the Cartesian product of `0..levels[i]` for every
//! feature `i`. States are enumerated lexicographically (the first feature
//! varies slowest) and each state maps to a dense index through a mixed-radix
//! encoding that follows the same order, so `index_of(enumerate()[k]) == k`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Bucketed encoding of one tick's features.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscreteState(Vec<usize>);

impl DiscreteState {
    pub fn new(components: Vec<usize>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for DiscreteState {
    fn from(components: Vec<usize>) -> Self {
        Self(components)
    }
}

impl<const N: usize> From<[usize; N]> for DiscreteState {
    fn from(components: [usize; N]) -> Self {
        Self(components.to_vec())
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{component}")?;
        }
        f.write_str(")")
    }
}

/// Upper bound on enumerable states; anything larger is a configuration mistake.
pub const MAX_STATES: usize = 1 << 20;

/// Full product of discretization levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpace {
    levels: Vec<usize>,
}

impl StateSpace {
    /// Create a state space, rejecting empty, zero-width or oversized level vectors.
    pub fn new(levels: Vec<usize>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "state space needs at least one feature".to_string(),
            });
        }
        if let Some(position) = levels.iter().position(|&l| l == 0) {
            return Err(Error::InvalidConfiguration {
                message: format!("feature {position} has zero discretization levels"),
            });
        }
        if state_count(&levels).is_none_or(|count| count > MAX_STATES) {
            return Err(Error::InvalidConfiguration {
                message: format!("levels {levels:?} exceed {MAX_STATES} states"),
            });
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Number of states (product of levels).
    pub fn len(&self) -> usize {
        self.levels.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, state: &DiscreteState) -> bool {
        state.len() == self.levels.len()
            && state
                .components()
                .iter()
                .zip(&self.levels)
                .all(|(&c, &l)| c < l)
    }

    /// Dense index of `state` in enumeration order.
    pub fn index_of(&self, state: &DiscreteState) -> Result<usize> {
        if !self.contains(state) {
            return Err(Error::UnknownState {
                state: state.to_string(),
                levels: self.levels.clone(),
            });
        }
        Ok(state
            .components()
            .iter()
            .zip(&self.levels)
            .fold(0, |index, (&c, &l)| index * l + c))
    }

    /// Inverse of [`StateSpace::index_of`].
    pub fn state_at(&self, mut index: usize) -> Option<DiscreteState> {
        if index >= self.len() {
            return None;
        }
        let mut components = vec![0; self.levels.len()];
        for (slot, &level) in components.iter_mut().zip(&self.levels).rev() {
            *slot = index % level;
            index /= level;
        }
        Some(DiscreteState(components))
    }

    /// Lazily enumerate every state in lexicographic order.
    pub fn enumerate(&self) -> States<'_> {
        States {
            levels: &self.levels,
            next: Some(vec![0; self.levels.len()]),
        }
    }
}

/// Product of `levels`, or `None` on overflow.
pub fn state_count(levels: &[usize]) -> Option<usize> {
    levels
        .iter()
        .try_fold(1usize, |acc, &level| acc.checked_mul(level))
}

/// Odometer-style iterator over a [`StateSpace`].
#[derive(Debug, Clone)]
pub struct States<'a> {
    levels: &'a [usize],
    next: Option<Vec<usize>>,
}

impl Iterator for States<'_> {
    type Item = DiscreteState;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut successor = current.clone();
        // Increment the last feature first; carry leftwards.
        for position in (0..successor.len()).rev() {
            successor[position] += 1;
            if successor[position] < self.levels[position] {
                self.next = Some(successor);
                break;
            }
            successor[position] = 0;
        }
        Some(DiscreteState(current))
    }
}
