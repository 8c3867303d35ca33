//! Dense state-action value table
//!
//! Values live in one flat `Vec<f64>` with `num_actions` entries per state,
//! rows ordered by [`StateSpace`] enumeration. Every enumerated state has a
//! full row from construction onwards, so lookups of valid states never miss.

use std::path::Path;

use crate::{
    Error, Result,
    snapshot::TableSnapshot,
    state_space::{DiscreteState, StateSpace},
};

/// Exact mapping from (state, action) to a learned value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    space: StateSpace,
    num_actions: usize,
    initial_value: f64,
    values: Vec<f64>,
}

impl ValueTable {
    /// Create a table with every entry set to `initial_value`.
    pub fn new(space: StateSpace, num_actions: usize, initial_value: f64) -> Result<Self> {
        if num_actions == 0 {
            return Err(Error::InvalidConfiguration {
                message: "value table needs at least one action".to_string(),
            });
        }
        if !initial_value.is_finite() {
            return Err(Error::InvalidConfiguration {
                message: format!("initial value {initial_value} is not finite"),
            });
        }
        let values = vec![initial_value; space.len() * num_actions];
        Ok(Self {
            space,
            num_actions,
            initial_value,
            values,
        })
    }

    /// Rebuild a table from raw parts, validating the shape.
    pub(crate) fn from_parts(
        space: StateSpace,
        num_actions: usize,
        initial_value: f64,
        values: Vec<f64>,
    ) -> Result<Self> {
        let expected = space.len() * num_actions;
        if num_actions == 0 || values.len() != expected {
            return Err(Error::CorruptSnapshot {
                reason: format!(
                    "expected {expected} values for {} states x {num_actions} actions, found {}",
                    space.len(),
                    values.len()
                ),
            });
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::CorruptSnapshot {
                reason: format!("value at position {position} is not finite"),
            });
        }
        Ok(Self {
            space,
            num_actions,
            initial_value,
            values,
        })
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn levels(&self) -> &[usize] {
        self.space.levels()
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Flat value array in enumeration order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn slot(&self, state: &DiscreteState, action: usize) -> Result<usize> {
        if action >= self.num_actions {
            return Err(Error::InvalidAction {
                action,
                num_actions: self.num_actions,
            });
        }
        Ok(self.space.index_of(state)? * self.num_actions + action)
    }

    /// All action values at `state`.
    pub fn row(&self, state: &DiscreteState) -> Result<&[f64]> {
        let start = self.space.index_of(state)? * self.num_actions;
        Ok(&self.values[start..start + self.num_actions])
    }

    pub fn get(&self, state: &DiscreteState, action: usize) -> Result<f64> {
        Ok(self.values[self.slot(state, action)?])
    }

    /// Replace one entry. Non-finite values are rejected so the table never
    /// holds a value the policies cannot work with.
    pub fn set(&mut self, state: &DiscreteState, action: usize, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue {
                state: state.to_string(),
                action,
                value,
            });
        }
        let slot = self.slot(state, action)?;
        self.values[slot] = value;
        Ok(())
    }

    /// Highest-valued action at `state`; ties go to the lowest action index.
    pub fn best_action(&self, state: &DiscreteState) -> Result<(usize, f64)> {
        let row = self.row(state)?;
        let mut best = (0, row[0]);
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > best.1 {
                best = (action, value);
            }
        }
        Ok(best)
    }

    /// Number of states with at least one entry different from the initial value.
    pub fn visited_states(&self) -> usize {
        self.values
            .chunks(self.num_actions)
            .filter(|row| row.iter().any(|&v| v != self.initial_value))
            .count()
    }

    /// Iterate `(state, row)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (DiscreteState, &[f64])> + '_ {
        self.space
            .enumerate()
            .zip(self.values.chunks(self.num_actions))
    }

    /// Reset every entry to the initial value.
    pub fn reset(&mut self) {
        self.values.fill(self.initial_value);
    }

    pub fn to_snapshot(&self) -> TableSnapshot {
        TableSnapshot::from_table(self)
    }

    /// Persist the whole table to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_snapshot().save_to_file(path)
    }

    /// Load a table from `path`, trusting the level vector stored in the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        TableSnapshot::load_from_file(path)?.into_table()
    }

    /// Load a table and fail unless it was built for `levels`.
    pub fn load_matching<P: AsRef<Path>>(path: P, levels: &[usize]) -> Result<Self> {
        TableSnapshot::load_from_file(path)?.into_table_matching(levels)
    }
}
