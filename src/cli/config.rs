//! Shared configuration flags for CLI commands
//!
//! Flags override the values of a JSON config file, which in turn override
//! the library defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::{app::AgentConfig, pipeline::TrackConfig, policy::PolicyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    EpsilonGreedy,
    Boltzmann,
}

/// Agent parameters common to every command
#[derive(Args, Debug, Clone, Default)]
pub struct AgentArgs {
    /// JSON file with an agent configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Learning rate α in [0, 1]
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor γ in [0, 1]
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Exploration policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyKind>,

    /// Initial epsilon or temperature
    #[arg(long)]
    pub initial: Option<f64>,

    /// Epsilon decay or temperature cooling factor, in (0, 1)
    #[arg(long)]
    pub decay: Option<f64>,

    /// Epsilon ceiling or temperature floor
    #[arg(long)]
    pub limit: Option<f64>,

    /// Number of actions available to the agent (1-5)
    #[arg(long)]
    pub actions: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,
}

impl AgentArgs {
    /// Build the agent configuration from the config file and flags.
    pub fn resolve(&self) -> Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AgentConfig::default(),
        };

        if let Some(alpha) = self.alpha {
            config.learning_rate = alpha;
        }
        if let Some(gamma) = self.gamma {
            config.discount = gamma;
        }
        if let Some(actions) = self.actions {
            config.num_actions = actions;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.policy = self.policy_config(config.policy);

        config.validate().context("invalid agent configuration")?;
        Ok(config)
    }

    fn policy_config(&self, base: PolicyConfig) -> PolicyConfig {
        // Switching kinds starts from the defaults of the new kind.
        let base = match (self.policy, base) {
            (Some(PolicyKind::EpsilonGreedy), PolicyConfig::Boltzmann { .. }) => {
                PolicyConfig::epsilon_greedy()
            }
            (Some(PolicyKind::Boltzmann), PolicyConfig::EpsilonGreedy { .. }) => {
                PolicyConfig::boltzmann()
            }
            (_, base) => base,
        };

        match base {
            PolicyConfig::EpsilonGreedy {
                initial,
                decay,
                ceiling,
            } => PolicyConfig::EpsilonGreedy {
                initial: self.initial.unwrap_or(initial),
                decay: self.decay.unwrap_or(decay),
                ceiling: self.limit.unwrap_or(ceiling),
            },
            PolicyConfig::Boltzmann {
                initial_temperature,
                cooling,
                floor,
            } => PolicyConfig::Boltzmann {
                initial_temperature: self.initial.unwrap_or(initial_temperature),
                cooling: self.decay.unwrap_or(cooling),
                floor: self.limit.unwrap_or(floor),
            },
        }
    }
}

/// Parameters of the built-in scripted track
#[derive(Args, Debug, Clone, Default)]
pub struct TrackArgs {
    /// Ticks per episode
    #[arg(long)]
    pub episode_length: Option<u64>,

    /// Seed of the track layout
    #[arg(long)]
    pub track_seed: Option<u64>,
}

impl TrackArgs {
    pub fn resolve(&self) -> TrackConfig {
        let defaults = TrackConfig::default();
        TrackConfig {
            episode_length: self.episode_length.unwrap_or(defaults.episode_length),
            seed: self.track_seed.unwrap_or(defaults.seed),
            ..defaults
        }
    }
}
