//! Tabular Q-learning racing agent
//!
//! The agent chains the discretizer, the dense value table and an
//! exploration policy, and learns online from the shaped reward of every
//! observed transition.

use std::path::Path;

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
    Error, Result,
    app::AgentConfig,
    discretizer::{Discretizer, RaceDiscretizer},
    policy::{ActionSelector, ExplorationPolicy},
    ports::{Controller, Tick, TickOutcome},
    reward::{RewardFunction, ShapedReward, Transition},
    sensors::{Action, SensorVector},
    state_space::DiscreteState,
    value_table::ValueTable,
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// What the agent remembers from the previous tick of the current episode.
#[derive(Debug, Clone)]
struct Memory {
    episode: u64,
    sensors: SensorVector,
    state: DiscreteState,
    action: Action,
}

/// Q-learning agent (off-policy TD control) for one car
///
/// Every agent owns its table, policy state and random source; two agents in
/// the same process share nothing.
#[derive(Debug, Clone)]
pub struct Agent<D = RaceDiscretizer, F = ShapedReward> {
    name: String,
    discretizer: D,
    reward: F,
    table: ValueTable,
    policy: ExplorationPolicy,
    rng: StdRng,
    learning_rate: f64,
    discount: f64,
    memory: Option<Memory>,
}

impl Agent {
    /// Create an agent with the racing discretizer and shaped reward.
    ///
    /// When `config.table_path` is set the table is loaded from it and must
    /// match the discretizer's levels; load failures are returned as-is.
    ///
    /// # Examples
    ///
    /// ```
    /// use qracer::{Agent, app::AgentConfig};
    ///
    /// let agent = Agent::new("car-1", &AgentConfig::default().with_seed(7))?;
    /// assert_eq!(agent.table().space().len(), 900);
    /// # Ok::<(), qracer::Error>(())
    /// ```
    pub fn new(name: impl Into<String>, config: &AgentConfig) -> Result<Self> {
        let discretizer = RaceDiscretizer::new(config.discretizer)?;
        let reward = ShapedReward::new(config.reward);
        let table = match &config.table_path {
            Some(path) => ValueTable::load_matching(path, &discretizer.discretization_levels())?,
            None => fresh_table(&discretizer, config)?,
        };
        Self::with_parts(name, config, discretizer, reward, table)
    }
}

/// A table with every entry at `config.initial_value`, shaped for `discretizer`.
pub fn fresh_table<D: Discretizer>(discretizer: &D, config: &AgentConfig) -> Result<ValueTable> {
    ValueTable::new(
        discretizer.state_space()?,
        config.num_actions,
        config.initial_value,
    )
}

impl<D: Discretizer, F: RewardFunction> Agent<D, F> {
    /// Assemble an agent from explicit parts.
    ///
    /// `table` must have been built for `discretizer` and `config.num_actions`.
    pub fn with_parts(
        name: impl Into<String>,
        config: &AgentConfig,
        discretizer: D,
        reward: F,
        table: ValueTable,
    ) -> Result<Self> {
        config.validate()?;

        let levels = discretizer.discretization_levels();
        if table.levels() != levels.as_slice() {
            return Err(Error::LevelMismatch {
                expected: levels,
                found: table.levels().to_vec(),
            });
        }
        if table.num_actions() != config.num_actions {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "table has {} actions but the agent is configured for {}",
                    table.num_actions(),
                    config.num_actions
                ),
            });
        }

        let name = name.into();
        info!(
            agent = %name,
            policy = config.policy.name(),
            states = table.space().len(),
            actions = table.num_actions(),
            "agent ready"
        );

        Ok(Self {
            name,
            discretizer,
            reward,
            table,
            policy: config.policy.build()?,
            rng: build_rng(config.seed),
            learning_rate: config.learning_rate,
            discount: config.discount,
            memory: None,
        })
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ValueTable {
        &mut self.table
    }

    pub fn policy(&self) -> &ExplorationPolicy {
        &self.policy
    }

    pub fn discretizer(&self) -> &D {
        &self.discretizer
    }

    pub fn reward_function(&self) -> &F {
        &self.reward
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Persist the value table to `path`.
    pub fn save_table<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.table.save(path)
    }
}

impl<D: Discretizer, F: RewardFunction> Controller for Agent<D, F> {
    fn discretize(
        &self,
        sensors: &SensorVector,
        previous: Option<&SensorVector>,
    ) -> DiscreteState {
        self.discretizer.current_state(sensors, previous)
    }

    fn take_action(&mut self, state: &DiscreteState, episode: u64) -> Result<Action> {
        let index = self
            .policy
            .select_action(&self.table, state, episode, &mut self.rng)?;
        Action::from_index(index)
    }

    /// Q(s,a) ← (1 - α)·Q(s,a) + α·(r + γ·max_a' Q(s',a'))
    fn update(
        &mut self,
        old_state: &DiscreteState,
        new_state: &DiscreteState,
        action: Action,
        reward: f64,
        end_of_episode: bool,
    ) -> Result<()> {
        let (_, best_next) = self.table.best_action(new_state)?;
        let current = self.table.get(old_state, action.index())?;
        let target = reward + self.discount * best_next;
        let updated = (1.0 - self.learning_rate) * current + self.learning_rate * target;

        debug!(
            agent = %self.name,
            state = %old_state,
            %action,
            reward,
            current,
            updated,
            end_of_episode,
            "value update"
        );
        self.table.set(old_state, action.index(), updated)
    }

    fn compute_reward(&self, transition: &Transition<'_>) -> f64 {
        self.reward.reward(transition)
    }

    fn observe(&mut self, tick: &Tick, learn: bool) -> Result<TickOutcome> {
        // A tick from another episode never continues the remembered trajectory.
        let memory = self.memory.take().filter(|m| m.episode == tick.episode);
        let state = self.discretize(&tick.sensors, memory.as_ref().map(|m| &m.sensors));

        let reward = match &memory {
            Some(memory) => {
                let transition = Transition {
                    previous: &memory.sensors,
                    current: &tick.sensors,
                    action: memory.action,
                    step: tick.step,
                    end_of_episode: tick.end_of_episode,
                };
                let reward = self.compute_reward(&transition);
                if learn {
                    self.update(
                        &memory.state,
                        &state,
                        memory.action,
                        reward,
                        tick.end_of_episode,
                    )?;
                }
                Some(reward)
            }
            None => None,
        };

        let action = self.take_action(&state, tick.episode)?;
        if !tick.end_of_episode {
            self.memory = Some(Memory {
                episode: tick.episode,
                sensors: tick.sensors,
                state: state.clone(),
                action,
            });
        }

        Ok(TickOutcome {
            action,
            state,
            reward,
        })
    }

    fn end_episode(&mut self) {
        self.memory = None;
    }

    fn name(&self) -> &str {
        &self.name
    }
}
