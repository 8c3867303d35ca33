//! Exploration policies
//!
//! Both policies keep a parameter that moves once per newly observed episode
//! index and stays frozen within an episode:
//!
//! | Policy | Parameter | Per new episode | Bound |
//! |--------|-----------|-----------------|-------|
//! | [`EpsilonGreedy`] | ε, probability of exploiting | `ε / decay`, decay in (0, 1) | ceiling |
//! | [`Boltzmann`] | temperature T | `T * cooling` | floor |
//!
//! The episode index that a policy first sees keeps the initial parameter;
//! every later change of index applies exactly one step.
//!
//! Randomness always comes from the caller, so a seeded generator makes every
//! decision reproducible.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, state_space::DiscreteState, value_table::ValueTable};

/// Chooses an action for a state given the current value estimates.
pub trait ActionSelector {
    fn select_action<R: Rng>(
        &mut self,
        table: &ValueTable,
        state: &DiscreteState,
        episode: u64,
        rng: &mut R,
    ) -> Result<usize>;

    /// Current value of the decaying parameter.
    fn parameter(&self) -> f64;
}

/// Tracks which episode index the parameter was last advanced for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct EpisodeClock {
    last_seen: Option<u64>,
}

impl EpisodeClock {
    /// Record `episode`, returning true when the parameter should advance.
    fn advance(&mut self, episode: u64) -> bool {
        match self.last_seen.replace(episode) {
            Some(previous) => previous != episode,
            None => false,
        }
    }
}

/// Exploits the best known action with probability ε, explores uniformly
/// otherwise. ε grows towards `ceiling` as training progresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    epsilon: f64,
    decay: f64,
    ceiling: f64,
    clock: EpisodeClock,
}

impl EpsilonGreedy {
    pub fn new(initial: f64, decay: f64, ceiling: f64) -> Result<Self> {
        if !(decay > 0.0 && decay < 1.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("epsilon decay factor must be in (0, 1), got {decay}"),
            });
        }
        if !(ceiling > 0.0 && ceiling <= 1.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("epsilon ceiling must be in (0, 1], got {ceiling}"),
            });
        }
        if !(0.0..=ceiling).contains(&initial) {
            return Err(Error::InvalidConfiguration {
                message: format!("initial epsilon {initial} must be in [0, ceiling {ceiling}]"),
            });
        }
        Ok(Self {
            epsilon: initial,
            decay,
            ceiling,
            clock: EpisodeClock::default(),
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn observe_episode(&mut self, episode: u64) {
        if self.clock.advance(episode) {
            self.epsilon = (self.epsilon / self.decay).min(self.ceiling);
            debug!(episode, epsilon = self.epsilon, "epsilon updated");
        }
    }
}

impl ActionSelector for EpsilonGreedy {
    fn select_action<R: Rng>(
        &mut self,
        table: &ValueTable,
        state: &DiscreteState,
        episode: u64,
        rng: &mut R,
    ) -> Result<usize> {
        self.observe_episode(episode);

        // A draw in [0, 1) is always below ε = 1, so ε = 1 never explores.
        if rng.random::<f64>() < self.epsilon {
            let (action, _) = table.best_action(state)?;
            Ok(action)
        } else {
            Ok(rng.random_range(0..table.num_actions()))
        }
    }

    fn parameter(&self) -> f64 {
        self.epsilon
    }
}

/// Samples actions in proportion to `exp(Q(s, a) / T)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boltzmann {
    temperature: f64,
    cooling: f64,
    floor: f64,
    clock: EpisodeClock,
}

impl Boltzmann {
    pub fn new(initial_temperature: f64, cooling: f64, floor: f64) -> Result<Self> {
        if !(cooling > 0.0 && cooling < 1.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("cooling factor must be in (0, 1), got {cooling}"),
            });
        }
        if !(floor > 0.0 && floor.is_finite()) {
            return Err(Error::InvalidConfiguration {
                message: format!("temperature floor must be positive, got {floor}"),
            });
        }
        if !(initial_temperature >= floor && initial_temperature.is_finite()) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "initial temperature {initial_temperature} must be finite and >= floor {floor}"
                ),
            });
        }
        Ok(Self {
            temperature: initial_temperature,
            cooling,
            floor,
            clock: EpisodeClock::default(),
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    fn observe_episode(&mut self, episode: u64) {
        if self.clock.advance(episode) {
            self.temperature = (self.temperature * self.cooling).max(self.floor);
            debug!(episode, temperature = self.temperature, "temperature updated");
        }
    }

    /// Action probabilities for `values` at the current temperature.
    ///
    /// The maximum value is subtracted before exponentiating; softmax is
    /// shift-invariant, and every exponent is then <= 0, so no term can
    /// overflow and the normaliser is at least 1.
    pub fn distribution(&self, state: &DiscreteState, values: &[f64]) -> Result<Vec<f64>> {
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(Error::Numeric {
                state: state.to_string(),
                value: max,
                temperature: self.temperature,
            });
        }
        let mut weights = Vec::with_capacity(values.len());
        for &value in values {
            let weight = ((value - max) / self.temperature).exp();
            if !weight.is_finite() {
                return Err(Error::Numeric {
                    state: state.to_string(),
                    value,
                    temperature: self.temperature,
                });
            }
            weights.push(weight);
        }
        let total: f64 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= total);
        Ok(weights)
    }
}

impl ActionSelector for Boltzmann {
    fn select_action<R: Rng>(
        &mut self,
        table: &ValueTable,
        state: &DiscreteState,
        episode: u64,
        rng: &mut R,
    ) -> Result<usize> {
        self.observe_episode(episode);

        let probabilities = self.distribution(state, table.row(state)?)?;
        let ticket: f64 = rng.random();
        let mut cumulative = 0.0;
        for (action, probability) in probabilities.iter().enumerate() {
            cumulative += probability;
            if cumulative >= ticket {
                return Ok(action);
            }
        }
        // Rounding can leave the total a hair below the ticket.
        Ok(probabilities.len() - 1)
    }

    fn parameter(&self) -> f64 {
        self.temperature
    }
}

/// Serializable choice of exploration policy and its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    EpsilonGreedy {
        initial: f64,
        decay: f64,
        ceiling: f64,
    },
    Boltzmann {
        initial_temperature: f64,
        cooling: f64,
        floor: f64,
    },
}

impl PolicyConfig {
    /// Schedule of the tuned racing controller.
    pub fn epsilon_greedy() -> Self {
        PolicyConfig::EpsilonGreedy {
            initial: 0.1,
            decay: 0.99,
            ceiling: 0.98,
        }
    }

    pub fn boltzmann() -> Self {
        PolicyConfig::Boltzmann {
            initial_temperature: 100.0,
            cooling: 0.995,
            floor: 2.0,
        }
    }

    pub fn build(&self) -> Result<ExplorationPolicy> {
        match *self {
            PolicyConfig::EpsilonGreedy {
                initial,
                decay,
                ceiling,
            } => Ok(ExplorationPolicy::EpsilonGreedy(EpsilonGreedy::new(
                initial, decay, ceiling,
            )?)),
            PolicyConfig::Boltzmann {
                initial_temperature,
                cooling,
                floor,
            } => Ok(ExplorationPolicy::Boltzmann(Boltzmann::new(
                initial_temperature,
                cooling,
                floor,
            )?)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyConfig::EpsilonGreedy { .. } => "epsilon-greedy",
            PolicyConfig::Boltzmann { .. } => "boltzmann",
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::epsilon_greedy()
    }
}

/// Policy chosen at agent construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExplorationPolicy {
    EpsilonGreedy(EpsilonGreedy),
    Boltzmann(Boltzmann),
}

impl ActionSelector for ExplorationPolicy {
    fn select_action<R: Rng>(
        &mut self,
        table: &ValueTable,
        state: &DiscreteState,
        episode: u64,
        rng: &mut R,
    ) -> Result<usize> {
        match self {
            ExplorationPolicy::EpsilonGreedy(policy) => {
                policy.select_action(table, state, episode, rng)
            }
            ExplorationPolicy::Boltzmann(policy) => {
                policy.select_action(table, state, episode, rng)
            }
        }
    }

    fn parameter(&self) -> f64 {
        match self {
            ExplorationPolicy::EpsilonGreedy(policy) => policy.parameter(),
            ExplorationPolicy::Boltzmann(policy) => policy.parameter(),
        }
    }
}
