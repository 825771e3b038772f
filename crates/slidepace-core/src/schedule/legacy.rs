//! Flat-text schedules from before the JSON format.
//!
//! One `slideNumber,seconds` pair per line. Blank lines and `#` comments are
//! ignored, and so is any line that does not parse.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::Schedule;

pub fn parse_legacy(text: &str) -> BTreeMap<u32, f64> {
    let mut timings = BTreeMap::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split(',');
        let slide = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
        let seconds = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
        match (slide, seconds) {
            (Some(slide), Some(seconds)) => {
                timings.insert(slide, seconds);
            }
            _ => debug!(line = line_no + 1, "skipping malformed legacy timing line"),
        }
    }
    timings
}

/// Build a full schedule from legacy entries. Slides the legacy file did not
/// mention get `default_slide_seconds`.
pub fn migrate_legacy(
    legacy: &BTreeMap<u32, f64>,
    presentation_name: &str,
    total_slides: u32,
    default_slide_seconds: f64,
    transition_seconds: f64,
    now: DateTime<Utc>,
) -> Schedule {
    let mut schedule = Schedule::with_defaults(
        presentation_name,
        total_slides,
        default_slide_seconds,
        transition_seconds,
        now,
    );
    for (&slide, &seconds) in legacy {
        if let Err(err) = schedule.set_planned(slide, seconds, now) {
            warn!(%err, "dropping legacy timing entry");
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_noise() {
        let text = "# planned timings\n1,30\n\n2, 45.5\nnot a line\n3\n4,abc\n 5 , 10 \n";
        let parsed = parse_legacy(text);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[&1], 30.0);
        assert_eq!(parsed[&2], 45.5);
        assert_eq!(parsed[&5], 10.0);
    }

    #[test]
    fn migration_fills_unseen_slides_with_default() {
        let parsed = parse_legacy("1,30\n2,60\n");
        let schedule = migrate_legacy(&parsed, "Deck", 3, 60.0, 2.0, Utc::now());
        assert_eq!(schedule.planned(1), Some(30.0));
        assert_eq!(schedule.planned(2), Some(60.0));
        assert_eq!(schedule.planned(3), Some(60.0));
        let meta = schedule.metadata();
        assert_eq!(meta.slides_with_custom_timing, 2);
        assert_eq!(meta.total_planned_time, 150.0);
    }

    #[test]
    fn migration_drops_out_of_range_and_negative_entries() {
        let parsed = parse_legacy("1,-5\n9,30\n2,20\n");
        let schedule = migrate_legacy(&parsed, "Deck", 3, 60.0, 2.0, Utc::now());
        assert_eq!(schedule.planned(1), Some(60.0));
        assert_eq!(schedule.planned(2), Some(20.0));
        assert!(schedule.planned(9).is_none());
        assert_eq!(schedule.slides.len(), 3);
    }
}
