use clap::Subcommand;
use slidepace_core::MonitorConfig;
use std::path::Path;

use super::{load_config, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the whole configuration as TOML
    Show,
    /// Get a config value
    Get {
        /// Config key (e.g. "poll_interval_ms", "pace.warning_ratio")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction, config_path: Option<&Path>) -> CliResult {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = load_config(config_path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config(config_path)?;
            config.set(&key, &value)?;
            match config_path {
                Some(path) => config.save_to(path)?,
                None => config.save()?,
            }
            println!("ok");
        }
        ConfigAction::Path => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => MonitorConfig::path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
