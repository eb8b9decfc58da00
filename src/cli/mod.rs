//! CLI module: argument parsing and one function per command.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
