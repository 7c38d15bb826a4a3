//! `mapproxy-ctl`: create and maintain a tile-cache proxy configuration.
//!
//! The binary is a thin clap wrapper; the subcommands live here so they can
//! be exercised from integration tests.

pub mod commands;
pub mod settings;

pub use commands::{CleanReport, ConfigReport};
pub use settings::Settings;
