//! Pace engine: schedule adherence for a single slide and for the whole
//! presentation.
//!
//! Everything here is a pure function of `(planned, actual)` inputs. The two
//! policies use different units on purpose: a slide is judged by the share of
//! its own budget it has consumed, the presentation by how many seconds it is
//! behind the cumulative plan. Neither is derived from the other.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Planned seconds per slide number.
pub type PlannedTimings = BTreeMap<u32, f64>;

/// Adherence of one slide to its planned time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideStatus {
    NoTiming,
    OnTime,
    Warning,
    OverTime,
}

/// Adherence of the whole presentation to its cumulative plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationStatus {
    OnTime,
    LosingProgress,
    OffTrack,
}

/// Per-slide timing status. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStatus {
    pub has_planned_time: bool,
    pub planned_time: Option<f64>,
    pub actual_time: f64,
    pub status: SlideStatus,
    /// `actual - planned`; positive means over budget.
    pub variance: Option<f64>,
    pub percentage_used: Option<f64>,
}

/// Presentation-wide timing status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationTimingStatus {
    pub total_planned_time: f64,
    pub remaining_planned_time: f64,
    pub projected_total_time: f64,
    pub expected_time_to_current_slide: f64,
    /// `expected - elapsed`; positive means ahead of schedule.
    pub variance: f64,
    pub status: PresentationStatus,
    pub current_slide: u32,
    pub elapsed_time: f64,
}

/// Thresholds for both status policies.
///
/// The presentation thresholds are fixed seconds, independent of the length
/// of the schedule. They are tunable through the `[pace]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacePolicy {
    /// Share of the planned time after which a slide turns to `warning`.
    #[serde(default = "default_warning_ratio")]
    pub warning_ratio: f64,
    /// Seconds behind plan after which the presentation is `losing_progress`.
    #[serde(default = "default_losing_progress_secs")]
    pub losing_progress_secs: f64,
    /// Seconds behind plan after which the presentation is `off_track`.
    #[serde(default = "default_off_track_secs")]
    pub off_track_secs: f64,
}

fn default_warning_ratio() -> f64 {
    0.9
}
fn default_losing_progress_secs() -> f64 {
    60.0
}
fn default_off_track_secs() -> f64 {
    120.0
}

impl Default for PacePolicy {
    fn default() -> Self {
        Self {
            warning_ratio: default_warning_ratio(),
            losing_progress_secs: default_losing_progress_secs(),
            off_track_secs: default_off_track_secs(),
        }
    }
}

impl PacePolicy {
    /// Status of a slide given its planned time (if any) and the actual
    /// seconds spent on it.
    pub fn slide_status(&self, planned: Option<f64>, actual: f64) -> TimingStatus {
        let Some(planned) = planned else {
            return TimingStatus {
                has_planned_time: false,
                planned_time: None,
                actual_time: actual,
                status: SlideStatus::NoTiming,
                variance: None,
                percentage_used: None,
            };
        };

        let status = if actual <= planned * self.warning_ratio {
            SlideStatus::OnTime
        } else if actual <= planned {
            SlideStatus::Warning
        } else {
            SlideStatus::OverTime
        };
        let percentage_used = if planned > 0.0 {
            actual / planned * 100.0
        } else {
            0.0
        };

        TimingStatus {
            has_planned_time: true,
            planned_time: Some(planned),
            actual_time: actual,
            status,
            variance: Some(actual - planned),
            percentage_used: Some(percentage_used),
        }
    }

    /// Status of the presentation when `elapsed` seconds have passed since it
    /// started and `current_slide` is on screen.
    ///
    /// Returns `None` when there is no plan to compare against.
    pub fn presentation_status(
        &self,
        planned: &PlannedTimings,
        current_slide: u32,
        elapsed: f64,
    ) -> Option<PresentationTimingStatus> {
        if planned.is_empty() {
            return None;
        }

        let expected: f64 = planned.range(..current_slide).map(|(_, s)| s).sum();
        let remaining: f64 = planned
            .range(current_slide.saturating_add(1)..)
            .map(|(_, s)| s)
            .sum();
        let variance = expected - elapsed;

        let status = if variance >= -self.losing_progress_secs {
            PresentationStatus::OnTime
        } else if variance >= -self.off_track_secs {
            PresentationStatus::LosingProgress
        } else {
            PresentationStatus::OffTrack
        };

        Some(PresentationTimingStatus {
            total_planned_time: total_planned(planned),
            remaining_planned_time: remaining,
            projected_total_time: elapsed + remaining,
            expected_time_to_current_slide: expected,
            variance,
            status,
            current_slide,
            elapsed_time: elapsed,
        })
    }
}

/// [`PacePolicy::slide_status`] with the default thresholds.
pub fn slide_status(planned: Option<f64>, actual: f64) -> TimingStatus {
    PacePolicy::default().slide_status(planned, actual)
}

/// [`PacePolicy::presentation_status`] with the default thresholds.
pub fn presentation_status(
    planned: &PlannedTimings,
    current_slide: u32,
    elapsed: f64,
) -> Option<PresentationTimingStatus> {
    PacePolicy::default().presentation_status(planned, current_slide, elapsed)
}

pub fn total_planned(planned: &PlannedTimings) -> f64 {
    planned.values().sum()
}
