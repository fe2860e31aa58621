//! # clearance
//!
//! The command-line front end of the graduation clearance tracker.
//!
//! - `cli` - argument parsing and command implementations
//! - `config` - layered configuration (defaults, TOML, environment, flags)

pub mod cli;
pub mod config;
