use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pace::{PresentationTimingStatus, TimingStatus};
use crate::schedule::{ScheduleMetadata, TimingChange};

/// Every observable change in the monitor produces an Event.
/// The transport layer relays them to subscribed observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum MonitorEvent {
    MonitoringStatus {
        active: bool,
        timestamp: DateTime<Utc>,
    },
    /// The presentation document went away; all timing state was reset.
    PresentationClosed {
        message: String,
        timestamp: DateTime<Utc>,
    },
    PresentationStarted {
        current_slide: Option<u32>,
        slide_timer_reset: bool,
        timing_status: Option<TimingStatus>,
        total_planned_slides: usize,
        total_planned_time: Option<f64>,
        presentation_timing_status: Option<PresentationTimingStatus>,
        timestamp: DateTime<Utc>,
    },
    PresentationStopped {
        timestamp: DateTime<Utc>,
    },
    SlideChanged {
        slide_number: u32,
        total_slides: u32,
        previous_slide: Option<u32>,
        slide_timer_reset: bool,
        presentation_running: bool,
        timing_status: TimingStatus,
        presentation_timing_status: Option<PresentationTimingStatus>,
        timestamp: DateTime<Utc>,
    },
    /// Final timing of a slide visit that just ended.
    SlideTimingUpdate {
        slide_number: u32,
        timing_status: TimingStatus,
        timestamp: DateTime<Utc>,
    },
    /// Periodic update for the slide on screen while its clock runs.
    CurrentSlideTiming {
        slide_number: u32,
        timing_status: TimingStatus,
        presentation_timing_status: Option<PresentationTimingStatus>,
        timestamp: DateTime<Utc>,
    },
    SlideTimingUpdated {
        slide_number: u32,
        old_planned_time: f64,
        new_planned_time: f64,
        timing_change: f64,
        total_planned_time: f64,
        updated_metadata: ScheduleMetadata,
        is_current_slide: bool,
        current_slide_timing_status: Option<TimingStatus>,
        presentation_timing_status: Option<PresentationTimingStatus>,
        timestamp: DateTime<Utc>,
    },
    SlideTimingsBatchUpdated {
        updates: Vec<TimingChange>,
        total_planned_time: f64,
        updated_metadata: ScheduleMetadata,
        presentation_timing_status: Option<PresentationTimingStatus>,
        timestamp: DateTime<Utc>,
    },
}

impl MonitorEvent {
    /// Wire name of the event, as used in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::MonitoringStatus { .. } => "monitoring_status",
            MonitorEvent::PresentationClosed { .. } => "presentation_closed",
            MonitorEvent::PresentationStarted { .. } => "presentation_started",
            MonitorEvent::PresentationStopped { .. } => "presentation_stopped",
            MonitorEvent::SlideChanged { .. } => "slide_changed",
            MonitorEvent::SlideTimingUpdate { .. } => "slide_timing_update",
            MonitorEvent::CurrentSlideTiming { .. } => "current_slide_timing",
            MonitorEvent::SlideTimingUpdated { .. } => "slide_timing_updated",
            MonitorEvent::SlideTimingsBatchUpdated { .. } => "slide_timings_batch_updated",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MonitorEvent::MonitoringStatus { timestamp, .. }
            | MonitorEvent::PresentationClosed { timestamp, .. }
            | MonitorEvent::PresentationStarted { timestamp, .. }
            | MonitorEvent::PresentationStopped { timestamp }
            | MonitorEvent::SlideChanged { timestamp, .. }
            | MonitorEvent::SlideTimingUpdate { timestamp, .. }
            | MonitorEvent::CurrentSlideTiming { timestamp, .. }
            | MonitorEvent::SlideTimingUpdated { timestamp, .. }
            | MonitorEvent::SlideTimingsBatchUpdated { timestamp, .. } => *timestamp,
        }
    }
}
