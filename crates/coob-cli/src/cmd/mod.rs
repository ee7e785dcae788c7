//! Subcommand implementations

pub mod restore;
pub mod versions;
