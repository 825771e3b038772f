pub mod config;
pub mod schedule;
pub mod status;

use slidepace_core::{ConfigError, MonitorConfig};
use std::path::Path;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    match path {
        Some(path) => MonitorConfig::load_from(path),
        None => MonitorConfig::load(),
    }
}
