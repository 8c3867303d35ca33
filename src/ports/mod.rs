//! Ports (trait boundaries) for external dependencies.
//!
//! The agent core owns these traits; the simulator loop, persistence and
//! training observers sit behind them.

pub mod controller;
pub mod environment;
pub mod observer;
pub mod repository;

pub use controller::{Controller, Tick, TickOutcome};
pub use environment::{EnvStep, RaceEnvironment};
pub use observer::TrainingObserver;
pub use repository::TableRepository;
