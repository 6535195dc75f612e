//! Time tracker CLI library.
//!
//! Argument definitions, configuration and the subcommands that drive
//! [`mt_core::Tracker`].

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
