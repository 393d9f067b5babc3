//! CLI subcommands.

pub mod access;
pub mod check;
pub mod config;
pub mod kill;
pub mod list;
