//! The monitor facade.
//!
//! [`Monitor`] owns the single [`MonitorSession`] behind one mutex and is the
//! only way in for transports: lifecycle commands, schedule edits, and status
//! queries. The background poller shares the same state through [`Shared`].
//!
//! Schedule edits run on a copy of the schedule; the copy replaces the live
//! one only after it was written to disk, so a failed write leaves memory
//! untouched and broadcasts nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::control::{call_blocking, PresentationControl, SlideSample};
use crate::error::{CoreError, MonitorError, Result, ValidationError};
use crate::events::MonitorEvent;
use crate::pace::{PlannedTimings, PresentationTimingStatus, TimingStatus};
use crate::poller::{self, pace_of};
use crate::schedule::{
    parse_planned_updates, LoadedSchedule, Schedule, ScheduleMetadata, ScheduleStore,
    TimingChange, TimingStatistics,
};
use crate::session::{MonitorSession, SlideVisit};
use crate::storage::MonitorConfig;

/// State shared between the facade and the poller task.
pub(crate) struct Shared {
    pub(crate) session: Mutex<MonitorSession>,
    pub(crate) control: Arc<dyn PresentationControl>,
    pub(crate) config: MonitorConfig,
    pub(crate) store: ScheduleStore,
    events: broadcast::Sender<MonitorEvent>,
}

impl Shared {
    pub(crate) fn emit(&self, event: MonitorEvent) {
        let name = event.name();
        if self.events.send(event).is_err() {
            trace!(event = name, "no subscribers");
        }
    }
}

/// Load the schedule of `document` on the blocking pool, degrading to no
/// schedule when the file cannot be used.
///
/// Not bounded by the control timeout: a create or migration that has
/// started always finishes under the store's file lock.
pub(crate) async fn load_for_document(
    store: &ScheduleStore,
    document: Option<&Path>,
    total_slides: Option<u32>,
) -> Result<Option<LoadedSchedule>> {
    let Some(document) = document else {
        debug!("no document open, schedule not loaded");
        return Ok(None);
    };
    let store = store.clone();
    let document = document.to_path_buf();
    tokio::task::spawn_blocking(move || load_degraded(&store, &document, total_slides))
        .await
        .map_err(|e| MonitorError::ScheduleTask(e.to_string()).into())
}

fn load_degraded(
    store: &ScheduleStore,
    document: &Path,
    total_slides: Option<u32>,
) -> Option<LoadedSchedule> {
    match store.load(document, total_slides) {
        Ok(loaded) => Some(loaded),
        Err(err) => {
            warn!(%err, document = %document.display(), "schedule unavailable, continuing without one");
            None
        }
    }
}

/// Consistent view of the session, taken under the lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub monitoring_active: bool,
    pub current_slide: Option<u32>,
    pub total_slides: Option<u32>,
    pub presentation_running: bool,
    pub slide_timer_start: Option<DateTime<Utc>>,
    pub presentation_start_time: Option<DateTime<Utc>>,
    pub current_slide_timing: Option<TimingStatus>,
    /// Seconds already flushed per slide, excluding the running visit.
    pub completed_slides: BTreeMap<u32, f64>,
    pub planned_timings: PlannedTimings,
    pub presentation_timing_status: Option<PresentationTimingStatus>,
    pub document_path: Option<PathBuf>,
    pub schedule_path: Option<PathBuf>,
    pub last_check: Option<DateTime<Utc>>,
    pub poll_interval_ms: u64,
}

/// Accumulated time for one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideTimingReport {
    pub slide_number: u32,
    pub actual_time: f64,
    pub is_current_slide: bool,
    pub timing_status: TimingStatus,
}

/// Result of a batch update: what was applied and what was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub updates: Vec<TimingChange>,
    pub errors: Vec<String>,
    pub total_planned_time: f64,
    pub updated_metadata: ScheduleMetadata,
}

struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Presentation timing monitor.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Monitor {
    shared: Arc<Shared>,
    /// Held across a whole start or stop, so the two never interleave.
    poller: tokio::sync::Mutex<Option<PollerHandle>>,
}

impl Monitor {
    pub fn new(control: Arc<dyn PresentationControl>, config: MonitorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let store = config.schedule_store();
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(MonitorSession::default()),
                control,
                config,
                store,
                events,
            }),
            poller: tokio::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_monitoring(&self) -> Result<bool> {
        Ok(self.shared.session.lock()?.monitoring_active())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Seed the session from a fresh sample, load the schedule, and start
    /// the poller. No slide clock starts here.
    pub async fn start_monitoring(&self) -> Result<MonitorStatus> {
        let mut poller = self.poller.lock().await;
        {
            let mut session = self.shared.session.lock()?;
            if session.monitoring_active() {
                return Err(MonitorError::AlreadyActive.into());
            }
            session.monitoring_active = true;
        }

        if let Err(err) = self.prime().await {
            if let Ok(mut session) = self.shared.session.lock() {
                session.monitoring_active = false;
            }
            return Err(err);
        }

        if let Some(stale) = poller.take() {
            stale.cancel.cancel();
        }
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poller::run(self.shared.clone(), cancel.clone()));
        *poller = Some(PollerHandle { cancel, task });
        drop(poller);

        info!("monitoring started");
        self.shared.emit(MonitorEvent::MonitoringStatus {
            active: true,
            timestamp: Utc::now(),
        });
        self.status()
    }

    async fn prime(&self) -> Result<()> {
        let (sample, document) = call_blocking(
            self.shared.control.clone(),
            self.shared.config.control_timeout(),
            |control| (SlideSample::take(control), control.document_path()),
        )
        .await?;
        let schedule =
            load_for_document(&self.shared.store, document.as_deref(), sample.total_slides)
                .await?;

        let mut session = self.shared.session.lock()?;
        session.seed(sample.current_slide, sample.total_slides, Utc::now());
        session.document_path = document;
        session.schedule = schedule;
        Ok(())
    }

    /// Stop the poller and wait for it to exit.
    pub async fn stop_monitoring(&self) -> Result<()> {
        let mut poller = self.poller.lock().await;
        {
            let mut session = self.shared.session.lock()?;
            if !session.monitoring_active() {
                return Err(MonitorError::NotActive.into());
            }
            session.monitoring_active = false;
        }

        if let Some(PollerHandle { cancel, task }) = poller.take() {
            cancel.cancel();
            if let Err(err) = task.await {
                warn!(%err, "poller task ended abnormally");
            }
        }
        drop(poller);

        info!("monitoring stopped");
        self.shared.emit(MonitorEvent::MonitoringStatus {
            active: false,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Start the slideshow and the slide clock. Monitoring is started first
    /// when it is not running yet.
    pub async fn start_presentation(&self) -> Result<MonitorEvent> {
        if !self.is_monitoring()? {
            match self.start_monitoring().await {
                Ok(_) | Err(CoreError::Monitor(MonitorError::AlreadyActive)) => {}
                Err(err) => return Err(err),
            }
        }

        let accepted = call_blocking(
            self.shared.control.clone(),
            self.shared.config.control_timeout(),
            |control| control.start(),
        )
        .await?;
        if !accepted {
            return Err(MonitorError::ControlRejected("start").into());
        }

        let now = Utc::now();
        let policy = &self.shared.config.pace;
        let (current, event) = {
            let mut session = self.shared.session.lock()?;
            session.start_presentation(now);
            let current = session.current_slide();
            let event = MonitorEvent::PresentationStarted {
                current_slide: current,
                slide_timer_reset: true,
                timing_status: current.map(|slide| policy.slide_status(session.planned(slide), 0.0)),
                total_planned_slides: session.planned_timings().len(),
                total_planned_time: session
                    .schedule()
                    .map(|loaded| loaded.schedule.total_planned_time()),
                presentation_timing_status: current
                    .and_then(|slide| pace_of(&session, slide, now, policy)),
                timestamp: now,
            };
            (current, event)
        };

        info!(slide = ?current, "presentation started");
        self.shared.emit(event.clone());
        Ok(event)
    }

    /// Stop the slide clock and flush the running visit. Calling it again
    /// without a start changes nothing.
    pub async fn stop_presentation(&self) -> Result<Option<SlideVisit>> {
        match call_blocking(
            self.shared.control.clone(),
            self.shared.config.control_timeout(),
            |control| control.stop(),
        )
        .await
        {
            Ok(true) => {}
            Ok(false) => warn!("presentation control did not stop the slideshow"),
            Err(err) => warn!(%err, "presentation control unavailable while stopping"),
        }

        let now = Utc::now();
        let (visit, events) = {
            let mut session = self.shared.session.lock()?;
            let was_running = session.presentation_running();
            let visit = session.stop_presentation(now);
            let mut events = Vec::new();
            if let Some(visit) = visit {
                events.push(MonitorEvent::SlideTimingUpdate {
                    slide_number: visit.slide_number,
                    timing_status: self
                        .shared
                        .config
                        .pace
                        .slide_status(session.planned(visit.slide_number), visit.seconds),
                    timestamp: now,
                });
            }
            if was_running {
                events.push(MonitorEvent::PresentationStopped { timestamp: now });
            }
            (visit, events)
        };

        if !events.is_empty() {
            info!(flushed = ?visit, "presentation stopped");
        }
        for event in events {
            self.shared.emit(event);
        }

        if self.shared.config.auto_stop_monitoring && self.is_monitoring()? {
            match self.stop_monitoring().await {
                Ok(()) | Err(CoreError::Monitor(MonitorError::NotActive)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(visit)
    }

    // ── Schedule ─────────────────────────────────────────────────────

    /// Load the schedule for `document`, replacing the current one.
    /// Returns `None` when the schedule file cannot be used.
    pub fn load_schedule(&self, document: &Path) -> Result<Option<LoadedSchedule>> {
        let mut session = self.shared.session.lock()?;
        let loaded = load_degraded(&self.shared.store, document, session.total_slides());
        session.document_path = Some(document.to_path_buf());
        session.schedule = loaded.clone();
        Ok(loaded)
    }

    /// Ask the presentation control which document is open and reload its
    /// schedule from disk.
    pub async fn reload_schedule(&self) -> Result<Option<LoadedSchedule>> {
        let (document, total) = call_blocking(
            self.shared.control.clone(),
            self.shared.config.control_timeout(),
            |control| (control.document_path(), control.total_slides()),
        )
        .await?;
        let document = document.ok_or(MonitorError::NoDocument)?;

        let mut session = self.shared.session.lock()?;
        let total = total.or(session.total_slides());
        let loaded = load_degraded(&self.shared.store, &document, total);
        info!(
            document = %document.display(),
            loaded = loaded.is_some(),
            "schedule reloaded"
        );
        session.document_path = Some(document);
        session.schedule = loaded.clone();
        Ok(loaded)
    }

    /// Set the planned seconds of one slide and persist the schedule.
    pub fn update_slide_timing(&self, slide: u32, seconds: f64) -> Result<TimingChange> {
        let now = Utc::now();
        let policy = &self.shared.config.pace;

        let (change, event) = {
            let mut session = self.shared.session.lock()?;
            let change = self.edit_schedule(&mut session, |schedule| {
                Ok(schedule.set_planned(slide, seconds, now)?)
            })?;
            let (total_planned_time, updated_metadata) = schedule_summary(&session);
            let is_current_slide = session.current_slide() == Some(slide);

            let event = MonitorEvent::SlideTimingUpdated {
                slide_number: slide,
                old_planned_time: change.old_planned_time,
                new_planned_time: change.new_planned_time,
                timing_change: change.timing_change,
                total_planned_time,
                updated_metadata,
                is_current_slide,
                current_slide_timing_status: is_current_slide.then(|| {
                    policy.slide_status(Some(seconds), session.elapsed_for_current_slide(now))
                }),
                presentation_timing_status: session
                    .current_slide()
                    .and_then(|current| pace_of(&session, current, now, policy)),
                timestamp: now,
            };
            (change, event)
        };

        info!(
            slide,
            old = change.old_planned_time,
            new = change.new_planned_time,
            "planned time updated"
        );
        self.shared.emit(event);
        Ok(change)
    }

    /// Apply several planned-time updates in one write. Invalid entries are
    /// skipped and reported; the call fails only when none are valid.
    pub fn update_slide_timings(&self, updates: &[(u32, f64)]) -> Result<BatchOutcome> {
        self.apply_batch(updates, Vec::new())
    }

    /// [`Monitor::update_slide_timings`] for a JSON object of
    /// `"<slide>": seconds` pairs, as sent by transports.
    pub fn update_slide_timings_json(
        &self,
        updates: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<BatchOutcome> {
        let (parsed, rejected) = parse_planned_updates(updates);
        self.apply_batch(&parsed, rejected)
    }

    fn apply_batch(
        &self,
        updates: &[(u32, f64)],
        rejected: Vec<ValidationError>,
    ) -> Result<BatchOutcome> {
        if updates.is_empty() && rejected.is_empty() {
            return Err(ValidationError::EmptyCollection("slide timing updates".into()).into());
        }

        let now = Utc::now();
        let policy = &self.shared.config.pace;

        let (outcome, pace) = {
            let mut session = self.shared.session.lock()?;
            let (changes, errors) = self.edit_schedule(&mut session, |schedule| {
                let (changes, skipped) = schedule.apply_updates(updates, now);
                let mut errors = rejected;
                errors.extend(skipped);
                if changes.is_empty() {
                    return Err(MonitorError::NothingApplied(
                        errors.iter().map(ToString::to_string).collect(),
                    )
                    .into());
                }
                Ok((changes, errors))
            })?;

            let (total_planned_time, updated_metadata) = schedule_summary(&session);
            let pace = session
                .current_slide()
                .and_then(|current| pace_of(&session, current, now, policy));
            let outcome = BatchOutcome {
                updates: changes,
                errors: errors.iter().map(ToString::to_string).collect(),
                total_planned_time,
                updated_metadata,
            };
            (outcome, pace)
        };

        for skipped in &outcome.errors {
            warn!(error = %skipped, "skipped planned time update");
        }
        info!(
            applied = outcome.updates.len(),
            skipped = outcome.errors.len(),
            "planned times updated"
        );
        self.shared.emit(MonitorEvent::SlideTimingsBatchUpdated {
            updates: outcome.updates.clone(),
            total_planned_time: outcome.total_planned_time,
            updated_metadata: outcome.updated_metadata.clone(),
            presentation_timing_status: pace,
            timestamp: now,
        });
        Ok(outcome)
    }

    /// Run `edit` on a copy of the loaded schedule, write it, then swap it in.
    fn edit_schedule<T>(
        &self,
        session: &mut MonitorSession,
        edit: impl FnOnce(&mut Schedule) -> Result<T>,
    ) -> Result<T> {
        let mut draft = session
            .schedule()
            .cloned()
            .ok_or(MonitorError::NoSchedule)?;
        if let Some(total) = session.total_slides() {
            draft.schedule.extend_to(total);
        }

        let out = edit(&mut draft.schedule)?;
        self.shared.store.save(&draft.path, &mut draft.schedule)?;
        session.schedule = Some(draft);
        Ok(out)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> Result<MonitorStatus> {
        let now = Utc::now();
        let policy = &self.shared.config.pace;
        let session = self.shared.session.lock()?;
        let current = session.current_slide();

        Ok(MonitorStatus {
            monitoring_active: session.monitoring_active(),
            current_slide: current,
            total_slides: session.total_slides(),
            presentation_running: session.presentation_running(),
            slide_timer_start: session.slide_timer_start(),
            presentation_start_time: session.presentation_start_time(),
            current_slide_timing: current.map(|slide| {
                policy.slide_status(session.planned(slide), session.elapsed_for_current_slide(now))
            }),
            completed_slides: session.slide_actual_seconds().clone(),
            planned_timings: session.planned_timings(),
            presentation_timing_status: current
                .and_then(|slide| pace_of(&session, slide, now, policy)),
            document_path: session.document_path.clone(),
            schedule_path: session.schedule().map(|loaded| loaded.path.clone()),
            last_check: session.last_check,
            poll_interval_ms: self.shared.config.poll_interval_ms,
        })
    }

    /// Time spent on `slide` so far, including the running visit.
    pub fn slide_timing(&self, slide: u32) -> Result<SlideTimingReport> {
        let now = Utc::now();
        let session = self.shared.session.lock()?;
        let total = session.total_slides().unwrap_or(u32::MAX);
        if slide == 0 || slide > total {
            return Err(ValidationError::SlideOutOfRange { slide, total }.into());
        }

        let actual_time = session.actual_seconds(slide, now);
        Ok(SlideTimingReport {
            slide_number: slide,
            actual_time,
            is_current_slide: session.current_slide() == Some(slide),
            timing_status: self
                .shared
                .config
                .pace
                .slide_status(session.planned(slide), actual_time),
        })
    }

    pub fn total_planned_time(&self) -> Result<Option<f64>> {
        let session = self.shared.session.lock()?;
        Ok(session
            .schedule()
            .map(|loaded| loaded.schedule.total_planned_time()))
    }

    pub fn timing_statistics(&self) -> Result<TimingStatistics> {
        let session = self.shared.session.lock()?;
        let loaded = session.schedule().ok_or(MonitorError::NoSchedule)?;
        Ok(loaded.schedule.statistics())
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Ask the presentation control to show `slide`.
    pub async fn goto_slide(&self, slide: u32) -> Result<()> {
        let total = self
            .shared
            .session
            .lock()?
            .total_slides()
            .ok_or(MonitorError::NoDocument)?;
        if slide == 0 || slide > total {
            return Err(ValidationError::SlideOutOfRange { slide, total }.into());
        }

        let accepted = call_blocking(
            self.shared.control.clone(),
            self.shared.config.control_timeout(),
            move |control| control.navigate(slide),
        )
        .await?;
        if !accepted {
            return Err(MonitorError::ControlRejected("navigate").into());
        }
        debug!(slide, "navigated");
        Ok(())
    }

    pub async fn next_slide(&self) -> Result<()> {
        let current = self.current_slide()?;
        self.goto_slide(current.saturating_add(1)).await
    }

    pub async fn previous_slide(&self) -> Result<()> {
        let current = self.current_slide()?;
        self.goto_slide(current.saturating_sub(1)).await
    }

    fn current_slide(&self) -> Result<u32> {
        Ok(self
            .shared
            .session
            .lock()?
            .current_slide()
            .ok_or(MonitorError::NoDocument)?)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.cancel.cancel();
        }
    }
}

fn schedule_summary(session: &MonitorSession) -> (f64, ScheduleMetadata) {
    session
        .schedule()
        .map(|loaded| (loaded.schedule.total_planned_time(), loaded.schedule.metadata()))
        .unwrap_or_else(|| (0.0, ScheduleMetadata::default()))
}
