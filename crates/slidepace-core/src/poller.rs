//! Background presentation-state poller.
//!
//! Each tick samples the presentation control, classifies the reading
//! against the cached session with [`detect`], and applies it with [`tick`],
//! which returns the events to broadcast. Both are synchronous and free of
//! I/O; [`run`] is the only part that touches the control or the clock.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::control::{call_blocking, SlideSample};
use crate::error::CoreError;
use crate::events::MonitorEvent;
use crate::monitor::{load_for_document, Shared};
use crate::pace::PacePolicy;
use crate::session::MonitorSession;

pub const CLOSED_MESSAGE: &str = "Presentation closed; timing data cleared";

/// What a sample means relative to the cached session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The document went away while the session still tracked one.
    Closed,
    /// Slide number or slide count differs from the cached values.
    SlideChanged { current: u32, total: u32 },
    /// Same slide and a slide clock is running.
    Steady { current: u32 },
    /// Nothing to do.
    Idle,
}

pub fn detect(session: &MonitorSession, sample: SlideSample) -> Transition {
    match (sample.current_slide, sample.total_slides) {
        (None, None) if session.has_presentation() => Transition::Closed,
        (Some(current), Some(total)) => {
            if session.current_slide() != Some(current) || session.total_slides() != Some(total) {
                Transition::SlideChanged { current, total }
            } else if session.slide_timer_start().is_some() {
                Transition::Steady { current }
            } else {
                Transition::Idle
            }
        }
        // Half a reading (e.g. the app is mid-launch) carries no transition.
        _ => Transition::Idle,
    }
}

/// Apply one sample to the session and return the events it produced.
pub fn tick(
    session: &mut MonitorSession,
    sample: SlideSample,
    now: DateTime<Utc>,
    policy: &PacePolicy,
) -> Vec<MonitorEvent> {
    let transition = detect(session, sample);
    session.last_check = Some(now);

    match transition {
        Transition::Closed => {
            info!("presentation closed, resetting session");
            session.reset();
            vec![MonitorEvent::PresentationClosed {
                message: CLOSED_MESSAGE.to_string(),
                timestamp: now,
            }]
        }
        Transition::SlideChanged { current, total } => {
            let mut events = Vec::with_capacity(2);
            let change = session.change_slide(current, total, now);

            if let Some(visit) = change.finished_visit {
                debug!(
                    slide = visit.slide_number,
                    seconds = visit.seconds,
                    "slide visit finished"
                );
                events.push(MonitorEvent::SlideTimingUpdate {
                    slide_number: visit.slide_number,
                    timing_status: policy
                        .slide_status(session.planned(visit.slide_number), visit.seconds),
                    timestamp: now,
                });
            }

            info!(
                previous = ?change.previous_slide,
                current,
                total,
                timer_reset = change.timer_reset,
                "slide changed"
            );
            events.push(MonitorEvent::SlideChanged {
                slide_number: current,
                total_slides: total,
                previous_slide: change.previous_slide,
                slide_timer_reset: change.timer_reset,
                presentation_running: session.presentation_running(),
                timing_status: policy.slide_status(session.planned(current), 0.0),
                presentation_timing_status: pace_of(session, current, now, policy),
                timestamp: now,
            });
            events
        }
        Transition::Steady { current } => match session.planned(current) {
            Some(planned) => vec![MonitorEvent::CurrentSlideTiming {
                slide_number: current,
                timing_status: policy
                    .slide_status(Some(planned), session.elapsed_for_current_slide(now)),
                presentation_timing_status: pace_of(session, current, now, policy),
                timestamp: now,
            }],
            None => Vec::new(),
        },
        Transition::Idle => Vec::new(),
    }
}

/// Presentation-wide status, only while the presentation runs.
pub(crate) fn pace_of(
    session: &MonitorSession,
    current: u32,
    now: DateTime<Utc>,
    policy: &PacePolicy,
) -> Option<crate::pace::PresentationTimingStatus> {
    let elapsed = session.presentation_elapsed(now)?;
    policy.presentation_status(&session.planned_timings(), current, elapsed)
}

/// Poll until `cancel` fires. Failing ticks are logged and the next tick
/// runs on schedule.
pub(crate) async fn run(shared: Arc<Shared>, cancel: CancellationToken) {
    let interval = shared.config.poll_interval();
    info!(interval_ms = shared.config.poll_interval_ms, "poller started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = poll_once(&shared) => {
                if let Err(err) = result {
                    warn!(%err, "poll tick failed");
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("poller stopped");
}

async fn poll_once(shared: &Shared) -> Result<(), CoreError> {
    let timeout = shared.config.control_timeout();
    let sample = call_blocking(shared.control.clone(), timeout, SlideSample::take).await?;

    // A presentation appearing after a close (or after monitoring started
    // with nothing open) needs its schedule before the first slide event.
    let needs_schedule = {
        let session = shared.session.lock()?;
        session.monitoring_active()
            && session.schedule().is_none()
            && session.current_slide().is_none()
            && matches!(detect(&session, sample), Transition::SlideChanged { .. })
    };
    let loaded = if needs_schedule {
        let document = call_blocking(shared.control.clone(), timeout, |control| {
            control.document_path()
        })
        .await?;
        let schedule =
            load_for_document(&shared.store, document.as_deref(), sample.total_slides).await?;
        Some((document, schedule))
    } else {
        None
    };

    let events = {
        let mut session = shared.session.lock()?;
        if !session.monitoring_active() {
            return Ok(());
        }
        // A facade call may have loaded the schedule meanwhile; keep it.
        if let Some((document, schedule)) = loaded {
            if session.schedule().is_none() {
                session.document_path = document;
                session.schedule = schedule;
            }
        }
        tick(&mut session, sample, Utc::now(), &shared.config.pace)
    };

    for event in events {
        shared.emit(event);
    }
    Ok(())
}
