//! Boundary to the presentation application.
//!
//! The monitor never talks to a presentation program directly. It samples a
//! [`PresentationControl`] implementation, which must report "app not running"
//! or "no document open" as `None` instead of failing, so the poller can
//! treat a closed presentation as an ordinary state.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::MonitorError;

/// Every presentation backend implements this trait.
/// Calls may block (e.g. scripting a desktop app); the poller runs them off
/// the async executor.
pub trait PresentationControl: Send + Sync {
    /// 1-based slide number on screen, if a document is open.
    fn current_slide(&self) -> Option<u32>;

    /// Slide count of the open document.
    fn total_slides(&self) -> Option<u32>;

    /// Filesystem path of the open document.
    fn document_path(&self) -> Option<PathBuf>;

    /// Whether the slideshow is playing, where the backend can tell.
    fn is_playing(&self) -> Option<bool> {
        None
    }

    /// Start the slideshow. Returns whether the backend accepted it.
    fn start(&self) -> bool;

    /// Stop the slideshow. Returns whether the backend accepted it.
    fn stop(&self) -> bool;

    /// Jump to `slide`. Returns whether the backend accepted it.
    fn navigate(&self, slide: u32) -> bool;
}

/// One reading of the presentation application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlideSample {
    pub current_slide: Option<u32>,
    pub total_slides: Option<u32>,
}

impl SlideSample {
    pub fn take(control: &dyn PresentationControl) -> Self {
        Self {
            current_slide: control.current_slide(),
            total_slides: control.total_slides(),
        }
    }

    pub fn closed() -> Self {
        Self::default()
    }

    pub fn open(current: u32, total: u32) -> Self {
        Self {
            current_slide: Some(current),
            total_slides: Some(total),
        }
    }
}

/// Run a control call on the blocking pool, bounded by `timeout` when set.
pub(crate) async fn call_blocking<T, F>(
    control: Arc<dyn PresentationControl>,
    timeout: Option<Duration>,
    f: F,
) -> Result<T, MonitorError>
where
    T: Send + 'static,
    F: FnOnce(&dyn PresentationControl) -> T + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || f(control.as_ref()));
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| MonitorError::ControlTimeout(limit))?,
        None => task.await,
    };
    joined.map_err(|e| MonitorError::ControlTask(e.to_string()))
}

#[derive(Debug, Clone, Default)]
struct SimulatedDeck {
    document: Option<PathBuf>,
    current: u32,
    total: u32,
    playing: bool,
}

/// In-memory presentation application.
///
/// Used for rehearsals without a real presentation program and to drive the
/// monitor in tests.
#[derive(Debug, Default)]
pub struct SimulatedControl {
    deck: Mutex<SimulatedDeck>,
}

impl SimulatedControl {
    /// A closed application with no document.
    pub fn new() -> Self {
        Self::default()
    }

    /// An application with `document` open on slide 1.
    pub fn with_document(document: impl Into<PathBuf>, total_slides: u32) -> Self {
        let control = Self::new();
        control.open(document, total_slides);
        control
    }

    pub fn open(&self, document: impl Into<PathBuf>, total_slides: u32) {
        if let Ok(mut deck) = self.deck.lock() {
            *deck = SimulatedDeck {
                document: Some(document.into()),
                current: 1.min(total_slides),
                total: total_slides,
                playing: false,
            };
        }
    }

    pub fn close(&self) {
        if let Ok(mut deck) = self.deck.lock() {
            *deck = SimulatedDeck::default();
        }
    }

    /// Add or remove slides; the cursor stays within range.
    pub fn set_total_slides(&self, total: u32) {
        if let Ok(mut deck) = self.deck.lock() {
            if deck.document.is_some() {
                deck.total = total;
                deck.current = deck.current.min(total);
            }
        }
    }

    fn read<T>(&self, f: impl FnOnce(&SimulatedDeck) -> Option<T>) -> Option<T> {
        self.deck.lock().ok().and_then(|deck| {
            if deck.document.is_none() {
                None
            } else {
                f(&*deck)
            }
        })
    }

    fn write(&self, f: impl FnOnce(&mut SimulatedDeck) -> bool) -> bool {
        match self.deck.lock() {
            Ok(mut deck) if deck.document.is_some() => f(&mut *deck),
            _ => false,
        }
    }
}

impl PresentationControl for SimulatedControl {
    fn current_slide(&self) -> Option<u32> {
        self.read(|deck| Some(deck.current))
    }

    fn total_slides(&self) -> Option<u32> {
        self.read(|deck| Some(deck.total))
    }

    fn document_path(&self) -> Option<PathBuf> {
        self.read(|deck| deck.document.clone())
    }

    fn is_playing(&self) -> Option<bool> {
        self.read(|deck| Some(deck.playing))
    }

    fn start(&self) -> bool {
        self.write(|deck| {
            deck.playing = true;
            true
        })
    }

    fn stop(&self) -> bool {
        self.write(|deck| {
            deck.playing = false;
            true
        })
    }

    fn navigate(&self, slide: u32) -> bool {
        self.write(|deck| {
            if slide == 0 || slide > deck.total {
                return false;
            }
            deck.current = slide;
            true
        })
    }
}
