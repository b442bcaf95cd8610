//! CLI subcommand implementations.

pub mod events;
pub mod participants;
pub mod race;
pub mod register;
pub mod results;
pub mod util;
pub mod validate;
