//! # Slidepace Core Library
//!
//! This library provides the core logic for Slidepace, a live presentation
//! timing monitor. It compares the time actually spent on each slide with a
//! planned schedule and streams the comparison to observers while the talk
//! runs. Everything is available through the standalone `slidepace` CLI as
//! well as to any transport that embeds the [`Monitor`].
//!
//! ## Architecture
//!
//! - **Schedule Store**: JSON schedule files per presentation document, with
//!   migration from the legacy `slide,seconds` text format
//! - **Pace Engine**: Pure per-slide and presentation-wide status functions
//! - **Session**: Per-slide elapsed-time accumulator
//! - **Poller**: Background task sampling the presentation application and
//!   turning state transitions into events
//! - **Monitor**: The facade owning the session behind a single lock
//!
//! ## Key Components
//!
//! - [`Monitor`]: Lifecycle, schedule edits and status queries
//! - [`PresentationControl`]: Boundary to the presentation application
//! - [`ScheduleStore`]: Schedule persistence and migration
//! - [`MonitorConfig`]: Application configuration management

pub mod control;
pub mod error;
pub mod events;
pub mod monitor;
pub mod pace;
pub mod poller;
pub mod schedule;
pub mod session;
pub mod storage;

pub use control::{PresentationControl, SimulatedControl, SlideSample};
pub use error::{ConfigError, CoreError, MonitorError, ScheduleError, ValidationError};
pub use events::MonitorEvent;
pub use monitor::{BatchOutcome, Monitor, MonitorStatus, SlideTimingReport};
pub use pace::{
    PacePolicy, PlannedTimings, PresentationStatus, PresentationTimingStatus, SlideStatus,
    TimingStatus,
};
pub use schedule::{
    Importance, LoadedSchedule, Schedule, ScheduleMetadata, ScheduleOrigin, ScheduleStore,
    SlideTiming, TimingChange, TimingStatistics,
};
pub use session::{MonitorSession, SlideVisit};
pub use storage::MonitorConfig;
