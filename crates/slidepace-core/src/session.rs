//! The live monitor session and its slide-timer bookkeeping.
//!
//! Time spent on a slide only accumulates while the presentation is running.
//! Browsing slides in the editor moves `current_slide` but never starts a
//! slide clock.
//!
//! ## Invariants
//!
//! - `slide_timer_start` is `Some` only while `presentation_running`.
//! - `slide_actual_seconds` values never decrease until [`MonitorSession::reset`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::pace::PlannedTimings;
use crate::schedule::LoadedSchedule;

/// Time recorded for one visit to a slide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideVisit {
    pub slide_number: u32,
    pub seconds: f64,
}

/// Result of applying an observed slide change to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideChange {
    pub previous_slide: Option<u32>,
    pub current_slide: u32,
    pub total_slides: u32,
    /// The visit that ended with this change, if its timer was running.
    pub finished_visit: Option<SlideVisit>,
    pub timer_reset: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MonitorSession {
    pub(crate) monitoring_active: bool,
    pub(crate) current_slide: Option<u32>,
    pub(crate) total_slides: Option<u32>,
    pub(crate) presentation_running: bool,
    pub(crate) slide_timer_start: Option<DateTime<Utc>>,
    pub(crate) presentation_start_time: Option<DateTime<Utc>>,
    pub(crate) slide_actual_seconds: BTreeMap<u32, f64>,
    pub(crate) document_path: Option<PathBuf>,
    pub(crate) schedule: Option<LoadedSchedule>,
    pub(crate) last_check: Option<DateTime<Utc>>,
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
}

impl MonitorSession {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn monitoring_active(&self) -> bool {
        self.monitoring_active
    }

    pub fn current_slide(&self) -> Option<u32> {
        self.current_slide
    }

    pub fn total_slides(&self) -> Option<u32> {
        self.total_slides
    }

    pub fn presentation_running(&self) -> bool {
        self.presentation_running
    }

    pub fn slide_timer_start(&self) -> Option<DateTime<Utc>> {
        self.slide_timer_start
    }

    pub fn presentation_start_time(&self) -> Option<DateTime<Utc>> {
        self.presentation_start_time
    }

    pub fn slide_actual_seconds(&self) -> &BTreeMap<u32, f64> {
        &self.slide_actual_seconds
    }

    pub fn schedule(&self) -> Option<&LoadedSchedule> {
        self.schedule.as_ref()
    }

    /// Whether there is anything a "presentation closed" reset would clear.
    pub fn has_presentation(&self) -> bool {
        self.current_slide.is_some() || self.total_slides.is_some() || self.presentation_running
    }

    pub fn planned_timings(&self) -> PlannedTimings {
        self.schedule
            .as_ref()
            .map(|s| s.schedule.planned_timings())
            .unwrap_or_default()
    }

    pub fn planned(&self, slide: u32) -> Option<f64> {
        self.schedule.as_ref().and_then(|s| s.schedule.planned(slide))
    }

    /// Seconds of the running visit to the current slide, or the stored
    /// total for that slide when no clock is ticking.
    pub fn elapsed_for_current_slide(&self, now: DateTime<Utc>) -> f64 {
        match self.running_visit(now) {
            Some(visit) => visit.seconds,
            None => self
                .current_slide
                .and_then(|n| self.slide_actual_seconds.get(&n).copied())
                .unwrap_or(0.0),
        }
    }

    /// Accumulated seconds for `slide`, including the running visit when
    /// `slide` is on screen.
    pub fn actual_seconds(&self, slide: u32, now: DateTime<Utc>) -> f64 {
        let stored = self.slide_actual_seconds.get(&slide).copied().unwrap_or(0.0);
        match self.running_visit(now) {
            Some(visit) if visit.slide_number == slide => stored + visit.seconds,
            _ => stored,
        }
    }

    /// Seconds since the presentation was started, while it runs.
    pub fn presentation_elapsed(&self, now: DateTime<Utc>) -> Option<f64> {
        if !self.presentation_running {
            return None;
        }
        self.presentation_start_time
            .map(|start| seconds_between(start, now))
    }

    fn running_visit(&self, now: DateTime<Utc>) -> Option<SlideVisit> {
        if !self.presentation_running {
            return None;
        }
        let start = self.slide_timer_start?;
        let slide = self.current_slide?;
        Some(SlideVisit {
            slide_number: slide,
            seconds: seconds_between(start, now),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_presentation(&mut self, now: DateTime<Utc>) {
        if self.presentation_running {
            self.flush_timer(now);
        }
        self.presentation_running = true;
        self.slide_timer_start = Some(now);
        self.presentation_start_time = Some(now);
    }

    /// Stop timing. Returns the visit flushed into the accumulator, if a
    /// slide clock was running. Calling it again without a start is a no-op.
    pub fn stop_presentation(&mut self, now: DateTime<Utc>) -> Option<SlideVisit> {
        let flushed = self.flush_timer(now);
        self.presentation_running = false;
        self.slide_timer_start = None;
        self.presentation_start_time = None;
        flushed
    }

    /// Apply an observed slide change: close the running visit, move the
    /// cursor, and restart the clock only if the presentation is running.
    pub fn change_slide(&mut self, current: u32, total: u32, now: DateTime<Utc>) -> SlideChange {
        let previous_slide = self.current_slide;
        let finished_visit = self.flush_timer(now);

        self.current_slide = Some(current);
        self.total_slides = Some(total);
        self.last_check = Some(now);

        let timer_reset = self.presentation_running;
        self.slide_timer_start = timer_reset.then_some(now);

        SlideChange {
            previous_slide,
            current_slide: current,
            total_slides: total,
            finished_visit,
            timer_reset,
        }
    }

    /// Seed the cached slide position without touching any timer.
    pub fn seed(&mut self, current: Option<u32>, total: Option<u32>, now: DateTime<Utc>) {
        self.current_slide = current;
        self.total_slides = total;
        self.last_check = Some(now);
    }

    /// Clear everything tied to the open presentation. Monitoring itself
    /// stays active.
    pub fn reset(&mut self) {
        let monitoring_active = self.monitoring_active;
        *self = Self {
            monitoring_active,
            ..Self::default()
        };
    }

    fn flush_timer(&mut self, now: DateTime<Utc>) -> Option<SlideVisit> {
        let visit = self.running_visit(now);
        if let Some(visit) = visit {
            *self
                .slide_actual_seconds
                .entry(visit.slide_number)
                .or_insert(0.0) += visit.seconds;
        }
        self.slide_timer_start = None;
        visit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn on_slide(slide: u32) -> MonitorSession {
        let mut session = MonitorSession::default();
        session.seed(Some(slide), Some(10), at(0));
        session
    }

    #[test]
    fn start_sets_both_clocks() {
        let mut session = on_slide(1);
        session.start_presentation(at(5));
        assert!(session.presentation_running());
        assert_eq!(session.slide_timer_start(), Some(at(5)));
        assert_eq!(session.presentation_start_time(), Some(at(5)));
    }

    #[test]
    fn stop_flushes_exactly_once() {
        let mut session = on_slide(2);
        session.start_presentation(at(0));
        let visit = session.stop_presentation(at(42)).unwrap();
        assert_eq!(visit.slide_number, 2);
        assert_eq!(visit.seconds, 42.0);
        assert_eq!(session.slide_actual_seconds()[&2], 42.0);
        assert!(session.slide_timer_start().is_none());
        assert!(session.presentation_start_time().is_none());

        assert!(session.stop_presentation(at(100)).is_none());
        assert_eq!(session.slide_actual_seconds()[&2], 42.0);
    }

    #[test]
    fn change_while_not_running_never_starts_timer() {
        let mut session = on_slide(1);
        let change = session.change_slide(2, 10, at(3));
        assert!(!change.timer_reset);
        assert!(change.finished_visit.is_none());
        assert_eq!(change.previous_slide, Some(1));
        assert!(session.slide_timer_start().is_none());
        assert!(session.slide_actual_seconds().is_empty());
    }

    #[test]
    fn change_while_running_accumulates_previous_slide() {
        let mut session = on_slide(1);
        session.start_presentation(at(0));
        let change = session.change_slide(2, 10, at(30));
        assert_eq!(
            change.finished_visit,
            Some(SlideVisit { slide_number: 1, seconds: 30.0 })
        );
        assert!(change.timer_reset);
        assert_eq!(session.slide_timer_start(), Some(at(30)));

        // Revisit slide 1 and the time adds up.
        session.change_slide(1, 10, at(50));
        session.change_slide(2, 10, at(60));
        assert_eq!(session.slide_actual_seconds()[&1], 40.0);
        assert_eq!(session.slide_actual_seconds()[&2], 20.0);
    }

    #[test]
    fn elapsed_reads_running_visit_or_stored_total() {
        let mut session = on_slide(3);
        assert_eq!(session.elapsed_for_current_slide(at(10)), 0.0);

        session.start_presentation(at(0));
        assert_eq!(session.elapsed_for_current_slide(at(12)), 12.0);
        assert_eq!(session.actual_seconds(3, at(12)), 12.0);

        session.stop_presentation(at(20));
        assert_eq!(session.elapsed_for_current_slide(at(99)), 20.0);
        assert_eq!(session.actual_seconds(3, at(99)), 20.0);
    }

    #[test]
    fn clock_skew_never_subtracts_time() {
        let mut session = on_slide(1);
        session.start_presentation(at(10));
        let visit = session.stop_presentation(at(10) - Duration::seconds(5)).unwrap();
        assert_eq!(visit.seconds, 0.0);
    }

    #[test]
    fn reset_keeps_monitoring_flag() {
        let mut session = on_slide(4);
        session.monitoring_active = true;
        session.start_presentation(at(0));
        session.change_slide(5, 10, at(4));
        session.reset();
        assert!(session.monitoring_active());
        assert!(!session.has_presentation());
        assert!(session.slide_actual_seconds().is_empty());
        assert!(session.presentation_start_time().is_none());
        assert!(session.schedule().is_none());
    }

    #[test]
    fn presentation_elapsed_only_while_running() {
        let mut session = on_slide(1);
        assert!(session.presentation_elapsed(at(5)).is_none());
        session.start_presentation(at(0));
        assert_eq!(session.presentation_elapsed(at(90)), Some(90.0));
    }
}
