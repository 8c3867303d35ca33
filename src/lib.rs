//! Tabular Q-learning controller for racing cars
//!
//! This crate provides:
//! - Discretization of raw car sensors into a small enumerable state space
//! - A dense state-action value table with versioned binary snapshots
//! - Epsilon-greedy and Boltzmann exploration with per-episode schedules
//! - A shaped, bounded racing reward and the online Q-learning agent
//! - A training pipeline with a deterministic scripted track and a CLI

pub mod adapters;
pub mod agent;
pub mod app;
pub mod cli;
pub mod discretizer;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod reward;
pub mod sensors;
pub mod snapshot;
pub mod state_space;
pub mod value_table;

pub use agent::Agent;
pub use discretizer::{Discretizer, RaceDiscretizer};
pub use error::{Error, Result};
pub use policy::{ActionSelector, ExplorationPolicy, PolicyConfig};
pub use ports::{Controller, Tick, TickOutcome};
pub use reward::{RewardFunction, ShapedReward};
pub use sensors::{Action, SensorVector};
pub use state_space::{DiscreteState, StateSpace};
pub use value_table::ValueTable;
