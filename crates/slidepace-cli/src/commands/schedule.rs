use clap::Subcommand;
use slidepace_core::schedule::format_duration;
use slidepace_core::{Monitor, MonitorConfig, ScheduleOrigin, SimulatedControl};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{load_config, CliResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Create (or migrate) the schedule for a presentation document
    Init {
        /// Presentation document
        document: PathBuf,
        /// Number of slides in the document
        #[arg(long)]
        slides: u32,
    },
    /// Show the planned timings
    Show {
        document: PathBuf,
        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the planned seconds of one slide
    Set {
        document: PathBuf,
        slide: u32,
        seconds: f64,
    },
    /// Set several slides from a JSON object, e.g. '{"1": 30, "2": 45}'
    Batch {
        document: PathBuf,
        /// JSON object, or @path to read it from a file
        updates: String,
    },
    /// Convert a legacy `slide,seconds` text schedule
    Migrate {
        document: PathBuf,
        #[arg(long)]
        slides: u32,
    },
}

pub fn run(action: ScheduleAction, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let store = config.schedule_store();
    match action {
        ScheduleAction::Init { document, slides } => {
            let loaded = store.load(&document, Some(slides))?;
            let verb = match loaded.origin {
                ScheduleOrigin::Existing => "schedule already exists",
                ScheduleOrigin::Migrated => "schedule migrated",
                ScheduleOrigin::Created => "schedule created",
            };
            println!("{verb}: {}", loaded.path.display());
        }
        ScheduleAction::Show { document, json } => {
            let path = store.paths_for(&document).json;
            let schedule = store.read(&path)?;
            if json {
                println!("{}", std::fs::read_to_string(&path)?);
                return Ok(());
            }

            println!(
                "{} ({} slides)",
                schedule.presentation_name, schedule.total_slides
            );
            for (slide, timing) in &schedule.slides {
                let notes = if timing.notes.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", timing.notes)
                };
                println!(
                    "{slide:>4}  {:>8}  {:<6}  {}{notes}",
                    format_duration(timing.planned_time),
                    format!("{:?}", timing.importance).to_lowercase(),
                    timing.description,
                );
            }
            let meta = schedule.metadata();
            println!(
                "total {} ({:.1}s), {} custom, {:.1}s average",
                meta.estimated_duration,
                meta.total_planned_time,
                meta.slides_with_custom_timing,
                meta.average_time_per_slide
            );
        }
        ScheduleAction::Set {
            document,
            slide,
            seconds,
        } => {
            let monitor = open_monitor(config, &document)?;
            let change = monitor.update_slide_timing(slide, seconds)?;
            let total = monitor.total_planned_time()?.unwrap_or_default();
            println!(
                "slide {}: {}s -> {}s (total {})",
                change.slide_number,
                change.old_planned_time,
                change.new_planned_time,
                format_duration(total)
            );
        }
        ScheduleAction::Batch { document, updates } => {
            let raw = match updates.strip_prefix('@') {
                Some(file) => std::fs::read_to_string(file)?,
                None => updates,
            };
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let object = value
                .as_object()
                .ok_or("updates must be a JSON object of slide -> seconds")?;
            let monitor = open_monitor(config, &document)?;
            let outcome = monitor.update_slide_timings_json(object)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        ScheduleAction::Migrate { document, slides } => {
            let paths = store.paths_for(&document);
            if paths.json.exists() {
                return Err(format!("{} already exists", paths.json.display()).into());
            }
            if !paths.legacy.exists() {
                return Err(format!("no legacy schedule at {}", paths.legacy.display()).into());
            }
            let loaded = store.load(&document, Some(slides))?;
            println!(
                "migrated {} -> {} ({} custom slides, backup at {})",
                paths.legacy.display(),
                loaded.path.display(),
                loaded.schedule.metadata().slides_with_custom_timing,
                paths.backup().display()
            );
        }
    }
    Ok(())
}

/// A monitor with no presentation attached, holding the document's schedule.
fn open_monitor(
    config: MonitorConfig,
    document: &Path,
) -> Result<Monitor, Box<dyn std::error::Error>> {
    let monitor = Monitor::new(Arc::new(SimulatedControl::new()), config);
    if monitor.load_schedule(document)?.is_none() {
        return Err(format!(
            "no usable schedule for {}; run `slidepace schedule init` first",
            document.display()
        )
        .into());
    }
    Ok(monitor)
}
