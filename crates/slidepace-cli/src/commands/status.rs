use clap::Subcommand;
use std::path::{Path, PathBuf};

use super::{load_config, CliResult};

#[derive(Subcommand)]
pub enum StatusAction {
    /// Status of one slide from its planned and actual seconds
    Slide {
        /// Planned seconds; omit for a slide without a plan
        #[arg(long)]
        planned: Option<f64>,
        /// Seconds actually spent on the slide
        #[arg(long)]
        actual: f64,
    },
    /// Presentation-wide pace against a document's schedule
    Pace {
        document: PathBuf,
        /// Slide currently on screen
        #[arg(long)]
        slide: u32,
        /// Seconds since the presentation started
        #[arg(long)]
        elapsed: f64,
    },
    /// Planned-time statistics of a document's schedule
    Stats { document: PathBuf },
}

pub fn run(action: StatusAction, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    match action {
        StatusAction::Slide { planned, actual } => {
            if actual < 0.0 || planned.is_some_and(|p| p < 0.0) {
                return Err("times must be non-negative".into());
            }
            let status = config.pace.slide_status(planned, actual);
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        StatusAction::Pace {
            document,
            slide,
            elapsed,
        } => {
            let store = config.schedule_store();
            let schedule = store.read(&store.paths_for(&document).json)?;
            match config
                .pace
                .presentation_status(&schedule.planned_timings(), slide, elapsed)
            {
                Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                None => return Err("schedule has no planned timings".into()),
            }
        }
        StatusAction::Stats { document } => {
            let store = config.schedule_store();
            let schedule = store.read(&store.paths_for(&document).json)?;
            println!("{}", serde_json::to_string_pretty(&schedule.statistics())?);
        }
    }
    Ok(())
}
