//! Dependency injection container for racing agents.
//!
//! The container owns the table repository and hands out agents wired to it,
//! so persistence can be swapped for an in-memory store in tests.

use std::{path::Path, sync::Arc};

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::MsgPackRepository,
    agent::{Agent, fresh_table},
    discretizer::{Discretizer, RaceDiscretizer},
    ports::TableRepository,
    reward::ShapedReward,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use qracer::app::{App, AgentConfig};
///
/// let app = App::new();
/// let agent = app.create_agent("car-1", AgentConfig::default().with_seed(42))?;
/// # Ok::<(), qracer::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use qracer::app::App;
/// use qracer::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    table_repository: Arc<dyn TableRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app backed by [`MsgPackRepository`] and no default seed.
    pub fn new() -> Self {
        Self {
            table_repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn table_repository(&self) -> Arc<dyn TableRepository + Send + Sync> {
        Arc::clone(&self.table_repository)
    }

    /// Create a racing agent.
    ///
    /// The table comes from `config.table_path` through the repository when a
    /// path is set; otherwise the agent starts from a fresh table. A config
    /// seed takes precedence over the app default.
    pub fn create_agent(&self, name: &str, config: AgentConfig) -> Result<Agent> {
        let mut config = config;
        if config.seed.is_none() {
            config.seed = self.default_seed;
        }
        config.validate()?;

        let discretizer = RaceDiscretizer::new(config.discretizer)?;
        let table = match &config.table_path {
            Some(path) => self
                .table_repository
                .load_matching(path, &discretizer.discretization_levels())?,
            None => fresh_table(&discretizer, &config)?,
        };
        Agent::with_parts(
            name,
            &config,
            discretizer,
            ShapedReward::new(config.reward),
            table,
        )
    }

    /// Persist the agent's value table through the repository.
    pub fn save_agent(&self, agent: &Agent, path: &Path) -> Result<()> {
        self.table_repository.save(agent.table(), path)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
///
/// Primarily used for testing to inject in-memory repositories and control
/// randomness.
pub struct AppBuilder {
    table_repository: Option<Arc<dyn TableRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            table_repository: None,
            default_seed: None,
        }
    }

    pub fn with_repository<R: TableRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.table_repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for all agents created by this container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app; without an explicit repository, [`MsgPackRepository`] is used.
    pub fn build(self) -> App {
        App {
            table_repository: self
                .table_repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Error, adapters::InMemoryRepository, ports::Controller, state_space::DiscreteState,
    };

    #[test]
    fn test_app_creates_agent() {
        let app = App::new();
        let agent = app.create_agent("car", AgentConfig::default()).unwrap();
        assert_eq!(agent.table().space().len(), 900);
        assert_eq!(agent.name(), "car");
    }

    #[test]
    fn test_default_seed_makes_agents_reproducible() {
        let app = App::for_testing().with_default_seed(42).build();
        let state: DiscreteState = [0, 1, 0, 0, 0, 0].into();

        let mut first = app.create_agent("a", AgentConfig::default()).unwrap();
        let mut second = app.create_agent("b", AgentConfig::default()).unwrap();
        for episode in 0..100 {
            assert_eq!(
                first.take_action(&state, episode).unwrap(),
                second.take_action(&state, episode).unwrap()
            );
        }
    }

    #[test]
    fn test_roundtrip_through_repository() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing()
            .with_repository(repo.clone())
            .with_default_seed(1)
            .build();
        let path = Path::new("tables/car.qtable");

        let mut agent = app.create_agent("car", AgentConfig::default()).unwrap();
        agent
            .table_mut()
            .set(&[1, 1, 2, 0, 3, 4].into(), 2, 7.5)
            .unwrap();
        app.save_agent(&agent, path).unwrap();
        assert!(repo.contains(path));

        let restored = app
            .create_agent("car", AgentConfig::default().with_table_path(path))
            .unwrap();
        assert_eq!(restored.table(), agent.table());
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let app = App::for_testing()
            .with_repository(InMemoryRepository::new())
            .build();
        let result = app.create_agent(
            "car",
            AgentConfig::default().with_table_path("nowhere.qtable"),
        );
        assert!(matches!(result, Err(err) if err.is_persistence()));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let app = App::new();
        let result = app.create_agent("car", AgentConfig::default().with_discount(2.0));
        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }
}
