//! CLI subcommands

pub mod compete;
pub mod evaluate;
pub mod inspect;
pub mod train;
