//! Event registration and race timing CLI library.
//!
//! This crate provides the CLI interface for the events server.

mod cli;
pub mod commands;
mod config;
pub mod render;
#[cfg(test)]
mod testing;

pub use cli::{
    Cli, Commands, ExportFormat, FormArgs, ParticipantsAction, RestrictionArgs, ResultsAction,
};
pub use config::Config;
