//! Planned slide timings for one presentation document.
//!
//! A [`Schedule`] holds the author-declared seconds per slide plus the
//! per-slide notes shown to the presenter. Its [`ScheduleMetadata`] is never
//! stored independently: it is computed from the slide entries every time it
//! is asked for, so it cannot drift from the source values.

mod legacy;
mod store;

pub use legacy::{migrate_legacy, parse_legacy};
pub use store::{LoadedSchedule, ScheduleOrigin, SchedulePaths, ScheduleStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::pace::PlannedTimings;

pub const SCHEDULE_VERSION: &str = "1.0";
pub const FORMAT_TYPE: &str = "keynote-timing";
pub const DEFAULT_SLIDE_SECONDS: f64 = 60.0;
pub const DEFAULT_TRANSITION_SECONDS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

/// One slide's entry in the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideTiming {
    pub planned_time: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub importance: Importance,
    /// Set when the author declared this timing explicitly.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub custom_timing: bool,
}

impl SlideTiming {
    pub fn new(slide: u32, planned_time: f64) -> Self {
        Self {
            planned_time,
            notes: String::new(),
            description: format!("Slide {slide}"),
            importance: Importance::Normal,
            custom_timing: false,
        }
    }
}

/// Derived schedule statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetadata {
    pub total_planned_time: f64,
    pub estimated_duration: String,
    pub slides_with_custom_timing: usize,
    pub average_time_per_slide: f64,
}

/// Extended statistics for status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStatistics {
    pub total_slides_with_timing: usize,
    pub total_planned_time: f64,
    pub estimated_duration: String,
    pub slides_with_custom_timing: usize,
    pub average_time_per_slide: f64,
    pub shortest_slide: f64,
    pub longest_slide: f64,
}

/// Before/after values of one planned-time change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingChange {
    pub slide_number: u32,
    pub old_planned_time: f64,
    pub new_planned_time: f64,
    pub timing_change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub version: String,
    pub presentation_name: String,
    pub total_slides: u32,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub default_slide_seconds: f64,
    pub transition_seconds: f64,
    pub slides: BTreeMap<u32, SlideTiming>,
}

impl Schedule {
    /// A schedule with every slide set to `default_slide_seconds`.
    pub fn with_defaults(
        presentation_name: &str,
        total_slides: u32,
        default_slide_seconds: f64,
        transition_seconds: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let slides = (1..=total_slides)
            .map(|n| (n, SlideTiming::new(n, default_slide_seconds)))
            .collect();
        Self {
            version: SCHEDULE_VERSION.to_string(),
            presentation_name: presentation_name.to_string(),
            total_slides,
            created_at: now,
            last_modified: now,
            default_slide_seconds,
            transition_seconds,
            slides,
        }
    }

    pub fn planned(&self, slide: u32) -> Option<f64> {
        self.slides.get(&slide).map(|s| s.planned_time)
    }

    pub fn planned_timings(&self) -> PlannedTimings {
        self.slides
            .iter()
            .map(|(n, s)| (*n, s.planned_time))
            .collect()
    }

    pub fn total_planned_time(&self) -> f64 {
        self.slides.values().map(|s| s.planned_time).sum()
    }

    fn is_custom(&self, slide: &SlideTiming) -> bool {
        slide.custom_timing || slide.planned_time != self.default_slide_seconds
    }

    pub fn metadata(&self) -> ScheduleMetadata {
        let total = self.total_planned_time();
        let count = self.slides.len();
        ScheduleMetadata {
            total_planned_time: total,
            estimated_duration: format_duration(total),
            slides_with_custom_timing: self.slides.values().filter(|s| self.is_custom(s)).count(),
            average_time_per_slide: if count > 0 { total / count as f64 } else { 0.0 },
        }
    }

    pub fn statistics(&self) -> TimingStatistics {
        let metadata = self.metadata();
        let planned = self.slides.values().map(|s| s.planned_time);
        let shortest = planned.clone().reduce(f64::min).unwrap_or(0.0);
        let longest = planned.reduce(f64::max).unwrap_or(0.0);
        TimingStatistics {
            total_slides_with_timing: self.slides.len(),
            total_planned_time: metadata.total_planned_time,
            estimated_duration: metadata.estimated_duration,
            slides_with_custom_timing: metadata.slides_with_custom_timing,
            average_time_per_slide: metadata.average_time_per_slide,
            shortest_slide: shortest,
            longest_slide: longest,
        }
    }

    /// Set the planned time of one slide, creating its entry if needed.
    ///
    /// Nothing is modified when validation fails.
    pub fn set_planned(
        &mut self,
        slide: u32,
        seconds: f64,
        now: DateTime<Utc>,
    ) -> Result<TimingChange, ValidationError> {
        validate_planned(slide, seconds)?;
        if slide == 0 || slide > self.total_slides {
            return Err(ValidationError::SlideOutOfRange {
                slide,
                total: self.total_slides,
            });
        }

        let old = self.planned(slide).unwrap_or(self.default_slide_seconds);
        let entry = self
            .slides
            .entry(slide)
            .or_insert_with(|| SlideTiming::new(slide, seconds));
        entry.planned_time = seconds;
        entry.custom_timing = true;
        self.last_modified = now;

        Ok(TimingChange {
            slide_number: slide,
            old_planned_time: old,
            new_planned_time: seconds,
            timing_change: seconds - old,
        })
    }

    /// Apply several planned-time updates. Invalid entries are skipped and
    /// reported; valid ones are applied.
    pub fn apply_updates(
        &mut self,
        updates: &[(u32, f64)],
        now: DateTime<Utc>,
    ) -> (Vec<TimingChange>, Vec<ValidationError>) {
        let mut changes = Vec::new();
        let mut errors = Vec::new();
        for &(slide, seconds) in updates {
            match self.set_planned(slide, seconds, now) {
                Ok(change) => changes.push(change),
                Err(err) => errors.push(err),
            }
        }
        (changes, errors)
    }

    /// Grow the slide range when the presentation gained slides. New slides
    /// get the default planned time.
    pub fn extend_to(&mut self, total_slides: u32) {
        if total_slides <= self.total_slides {
            return;
        }
        let default = self.default_slide_seconds;
        for slide in self.total_slides + 1..=total_slides {
            self.slides
                .entry(slide)
                .or_insert_with(|| SlideTiming::new(slide, default));
        }
        self.total_slides = total_slides;
    }

    /// Check the invariants enforced before every write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (&slide, timing) in &self.slides {
            validate_planned(slide, timing.planned_time)?;
            if slide == 0 || slide > self.total_slides {
                return Err(ValidationError::SlideOutOfRange {
                    slide,
                    total: self.total_slides,
                });
            }
        }
        Ok(())
    }
}

fn validate_planned(slide: u32, seconds: f64) -> Result<(), ValidationError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ValidationError::InvalidPlannedTime {
            slide,
            value: seconds,
        });
    }
    Ok(())
}

/// Parse a transport-level batch (`{"<slide>": <seconds>}`) into typed
/// updates. Numeric strings are accepted as numbers.
pub fn parse_planned_updates(
    raw: &serde_json::Map<String, serde_json::Value>,
) -> (Vec<(u32, f64)>, Vec<ValidationError>) {
    let mut updates = Vec::new();
    let mut errors = Vec::new();
    for (key, value) in raw {
        let Ok(slide) = key.trim().parse::<u32>() else {
            errors.push(ValidationError::InvalidSlideKey(key.clone()));
            continue;
        };
        let seconds = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match seconds {
            Some(seconds) => updates.push((slide, seconds)),
            None => errors.push(ValidationError::InvalidPlannedTime {
                slide,
                value: f64::NAN,
            }),
        }
    }
    (updates, errors)
}

/// Render seconds as `"<m>m <s>s"`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}m {}s", total / 60, total % 60)
}
