//! Configuration types for agent creation.

use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result, discretizer::DiscretizerConfig, policy::PolicyConfig, reward::RewardWeights,
    sensors::Action,
};

/// Configuration for creating a racing agent.
///
/// Fixed at construction; nothing here changes while the agent runs.
///
/// # Examples
///
/// ```
/// use qracer::app::AgentConfig;
/// use qracer::policy::PolicyConfig;
///
/// let config = AgentConfig::default()
///     .with_learning_rate(0.3)
///     .with_policy(PolicyConfig::boltzmann())
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// α, weight of the new target in each update
    pub learning_rate: f64,
    /// γ, attenuation of future value
    pub discount: f64,
    /// Exploration policy and its schedule
    pub policy: PolicyConfig,
    /// Number of actions the agent may choose from (a prefix of [`Action::ALL`])
    pub num_actions: usize,
    /// Value of every entry in a fresh table
    pub initial_value: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Snapshot to start from; `None` starts from a fresh table
    pub table_path: Option<PathBuf>,
    pub discretizer: DiscretizerConfig,
    pub reward: RewardWeights,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            discount: 0.9,
            policy: PolicyConfig::default(),
            num_actions: Action::COUNT,
            initial_value: 0.0,
            seed: None,
            table_path: None,
            discretizer: DiscretizerConfig::default(),
            reward: RewardWeights::default(),
        }
    }
}

impl AgentConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open config {}", path.display()),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_num_actions(mut self, num_actions: usize) -> Self {
        self.num_actions = num_actions;
        self
    }

    pub fn with_initial_value(mut self, initial_value: f64) -> Self {
        self.initial_value = initial_value;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_table_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.table_path = Some(path.into());
        self
    }

    pub fn with_discretizer(mut self, discretizer: DiscretizerConfig) -> Self {
        self.discretizer = discretizer;
        self
    }

    pub fn with_reward(mut self, reward: RewardWeights) -> Self {
        self.reward = reward;
        self
    }

    /// Check every parameter, including the policy schedule.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        if !(0.0..=1.0).contains(&self.learning_rate) {
            return invalid(format!(
                "learning rate must be in [0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return invalid(format!("discount must be in [0, 1], got {}", self.discount));
        }
        if !(1..=Action::COUNT).contains(&self.num_actions) {
            return invalid(format!(
                "num_actions must be between 1 and {}, got {}",
                Action::COUNT,
                self.num_actions
            ));
        }
        if !self.initial_value.is_finite() {
            return invalid(format!(
                "initial value must be finite, got {}",
                self.initial_value
            ));
        }
        self.policy.build()?;
        self.discretizer.validate()?;
        self.reward.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_parameters_are_rejected() {
        let base = AgentConfig::default();
        assert!(base.clone().with_learning_rate(1.5).validate().is_err());
        assert!(base.clone().with_learning_rate(-0.1).validate().is_err());
        assert!(base.clone().with_discount(1.01).validate().is_err());
        assert!(base.clone().with_num_actions(0).validate().is_err());
        assert!(base.clone().with_num_actions(6).validate().is_err());
        assert!(base.clone().with_initial_value(f64::NAN).validate().is_err());
        assert!(
            base.with_policy(PolicyConfig::Boltzmann {
                initial_temperature: 1.0,
                cooling: 0.9,
                floor: 0.0,
            })
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_json_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "learning_rate": 0.25,
                "policy": {{ "kind": "boltzmann", "initial_temperature": 50.0, "cooling": 0.99, "floor": 1.0 }},
                "seed": 7
            }}"#
        )
        .unwrap();

        let config = AgentConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.learning_rate, 0.25);
        assert_eq!(config.discount, 0.9);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.policy.name(), "boltzmann");
        assert_eq!(config.table_path, None);
    }

    #[test]
    fn test_reward_weights_are_validated() {
        let base = AgentConfig::default();
        let negative = RewardWeights {
            max_progress: -1.0,
            ..RewardWeights::default()
        };
        assert!(matches!(
            base.clone().with_reward(negative).validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
        let nan = RewardWeights {
            max_speed: f64::NAN,
            ..RewardWeights::default()
        };
        assert!(base.with_reward(nan).validate().is_err());

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reward": {{ "max_progress": -1.0 }} }}"#).unwrap();
        assert!(matches!(
            AgentConfig::from_json_file(file.path()),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_json_config_is_validated() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "discount": 3.0 }}"#).unwrap();
        assert!(matches!(
            AgentConfig::from_json_file(file.path()),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
