//! Command-line interface for training and inspecting racing agents

pub mod commands;
pub mod config;
pub mod output;
