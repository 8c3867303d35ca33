//! Application layer with dependency injection container.
//!
//! The container owns infrastructure (the table repository) and builds
//! agents from an [`AgentConfig`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  App (DI container)                      │
//! │    owns ──▶ adapters                     │
//! │             MsgPackRepository            │
//! │             InMemoryRepository (tests)   │
//! │    implements ──▶ ports::TableRepository │
//! │    builds ──▶ Agent                      │
//! │               RaceDiscretizer            │
//! │               ValueTable                 │
//! │               ExplorationPolicy          │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use qracer::app::{App, AgentConfig};
//!
//! let app = App::new();
//! let config = AgentConfig::default().with_seed(42);
//! let agent = app.create_agent("car-1", config)?;
//! # Ok::<(), qracer::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::AgentConfig;
pub use container::{App, AppBuilder};
