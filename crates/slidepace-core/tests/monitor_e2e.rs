//! End-to-end tests: the monitor polling a simulated presentation app.

use slidepace_core::{
    CoreError, Monitor, MonitorConfig, MonitorError, MonitorEvent, PresentationControl,
    ScheduleOrigin, ScheduleStore, SimulatedControl,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast::{error::RecvError, Receiver};

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        poll_interval_ms: 20,
        ..MonitorConfig::default()
    }
}

async fn wait_for(rx: &mut Receiver<MonitorEvent>, name: &str) -> MonitorEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if event.name() == name => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

#[tokio::test]
async fn test_rehearsal_flow() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("talk.key");
    std::fs::write(dir.path().join("talk.txt"), "1,30\n2,60\n").unwrap();

    let control = Arc::new(SimulatedControl::with_document(&document, 3));
    let monitor = Monitor::new(control.clone(), fast_config());
    let mut rx = monitor.subscribe();

    let status = monitor.start_monitoring().await.unwrap();
    assert!(status.monitoring_active);
    assert_eq!(status.current_slide, Some(1));
    assert!(!status.presentation_running);
    assert_eq!(
        status.planned_timings.into_iter().collect::<Vec<_>>(),
        vec![(1, 30.0), (2, 60.0), (3, 60.0)]
    );
    assert!(dir.path().join("talk.txt.backup").exists());
    assert_eq!(monitor.timing_statistics().unwrap().slides_with_custom_timing, 2);

    match wait_for(&mut rx, "monitoring_status").await {
        MonitorEvent::MonitoringStatus { active, .. } => assert!(active),
        other => panic!("unexpected {other:?}"),
    }

    match monitor.start_presentation().await.unwrap() {
        MonitorEvent::PresentationStarted {
            current_slide,
            timing_status,
            total_planned_slides,
            total_planned_time,
            ..
        } => {
            assert_eq!(current_slide, Some(1));
            assert_eq!(timing_status.unwrap().planned_time, Some(30.0));
            assert_eq!(total_planned_slides, 3);
            assert_eq!(total_planned_time, Some(150.0));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(control.is_playing(), Some(true));

    monitor.next_slide().await.unwrap();
    match wait_for(&mut rx, "slide_timing_update").await {
        MonitorEvent::SlideTimingUpdate { slide_number, .. } => assert_eq!(slide_number, 1),
        other => panic!("unexpected {other:?}"),
    }
    match wait_for(&mut rx, "slide_changed").await {
        MonitorEvent::SlideChanged {
            slide_number,
            previous_slide,
            slide_timer_reset,
            presentation_running,
            presentation_timing_status,
            ..
        } => {
            assert_eq!(slide_number, 2);
            assert_eq!(previous_slide, Some(1));
            assert!(slide_timer_reset);
            assert!(presentation_running);
            assert_eq!(
                presentation_timing_status.unwrap().expected_time_to_current_slide,
                30.0
            );
        }
        other => panic!("unexpected {other:?}"),
    }
    wait_for(&mut rx, "current_slide_timing").await;

    let visit = monitor.stop_presentation().await.unwrap().unwrap();
    assert_eq!(visit.slide_number, 2);
    wait_for(&mut rx, "presentation_stopped").await;

    let status = monitor.status().unwrap();
    assert!(!status.monitoring_active, "stopping the talk stops monitoring");
    assert!(status.slide_timer_start.is_none());
    assert!(status.completed_slides.contains_key(&1));
    assert!(status.completed_slides.contains_key(&2));

    // Second stop: nothing more to flush.
    assert!(monitor.stop_presentation().await.unwrap().is_none());
    assert_eq!(monitor.status().unwrap().completed_slides, status.completed_slides);
}

#[tokio::test]
async fn test_close_and_reopen() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("deck.key");
    let control = Arc::new(SimulatedControl::with_document(&document, 5));
    let monitor = Monitor::new(control.clone(), fast_config());
    let mut rx = monitor.subscribe();

    monitor.start_monitoring().await.unwrap();
    assert_eq!(monitor.total_planned_time().unwrap(), Some(300.0));

    control.close();
    match wait_for(&mut rx, "presentation_closed").await {
        MonitorEvent::PresentationClosed { message, .. } => assert!(!message.is_empty()),
        other => panic!("unexpected {other:?}"),
    }
    let status = monitor.status().unwrap();
    assert!(status.monitoring_active);
    assert!(status.current_slide.is_none());
    assert!(status.total_slides.is_none());
    assert!(status.planned_timings.is_empty());

    control.open(&document, 5);
    wait_for(&mut rx, "slide_changed").await;
    let status = monitor.status().unwrap();
    assert_eq!(status.current_slide, Some(1));
    assert_eq!(status.planned_timings.len(), 5, "schedule reloaded on reopen");

    monitor.stop_monitoring().await.unwrap();
    assert!(matches!(
        monitor.stop_monitoring().await,
        Err(CoreError::Monitor(MonitorError::NotActive))
    ));
}

#[tokio::test]
async fn test_updates_are_persisted_and_broadcast() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("talk.key");
    let control = Arc::new(SimulatedControl::with_document(&document, 3));
    let monitor = Monitor::new(control.clone(), fast_config());
    monitor.start_monitoring().await.unwrap();
    let mut rx = monitor.subscribe();

    let change = monitor.update_slide_timing(1, 45.0).unwrap();
    assert_eq!(change.old_planned_time, 60.0);
    assert_eq!(change.timing_change, -15.0);
    match wait_for(&mut rx, "slide_timing_updated").await {
        MonitorEvent::SlideTimingUpdated {
            is_current_slide,
            total_planned_time,
            updated_metadata,
            current_slide_timing_status,
            ..
        } => {
            assert!(is_current_slide);
            assert_eq!(total_planned_time, 165.0);
            assert_eq!(updated_metadata.total_planned_time, 165.0);
            assert_eq!(updated_metadata.slides_with_custom_timing, 1);
            assert_eq!(current_slide_timing_status.unwrap().planned_time, Some(45.0));
        }
        other => panic!("unexpected {other:?}"),
    }

    // The deck grew; slide 4 is accepted once it has been observed.
    control.set_total_slides(4);
    wait_for(&mut rx, "slide_changed").await;
    let updates = serde_json::json!({"2": 20, "4": "75", "x": 1});
    let outcome = monitor
        .update_slide_timings_json(updates.as_object().unwrap())
        .unwrap();
    assert_eq!(outcome.updates.len(), 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.total_planned_time, 45.0 + 20.0 + 60.0 + 75.0);
    wait_for(&mut rx, "slide_timings_batch_updated").await;

    let loaded = monitor.reload_schedule().await.unwrap().unwrap();
    assert_eq!(loaded.origin, ScheduleOrigin::Existing);
    assert_eq!(loaded.schedule.total_slides, 4);
    assert_eq!(loaded.schedule.planned(4), Some(75.0));

    let report = monitor.slide_timing(1).unwrap();
    assert!(report.is_current_slide);
    assert_eq!(report.timing_status.planned_time, Some(45.0));
    assert!(monitor.slide_timing(9).is_err());

    assert!(monitor.goto_slide(9).await.is_err());
    monitor.goto_slide(4).await.unwrap();
    wait_for(&mut rx, "slide_changed").await;
    assert!(monitor.next_slide().await.is_err());
    monitor.previous_slide().await.unwrap();

    monitor.stop_monitoring().await.unwrap();
}

#[tokio::test]
async fn test_malformed_schedule_keeps_monitoring() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("talk.key");
    std::fs::write(dir.path().join("talk.json"), "{ not json").unwrap();

    let control = Arc::new(SimulatedControl::with_document(&document, 3));
    let monitor = Monitor::new(control.clone(), fast_config());
    let mut rx = monitor.subscribe();

    let status = monitor.start_monitoring().await.unwrap();
    assert!(status.monitoring_active);
    assert!(status.planned_timings.is_empty());
    assert!(status.schedule_path.is_none());
    assert_eq!(status.document_path.as_deref(), Some(document.as_path()));
    assert!(matches!(
        monitor.update_slide_timing(1, 30.0),
        Err(CoreError::Monitor(MonitorError::NoSchedule))
    ));

    monitor.start_presentation().await.unwrap();
    monitor.next_slide().await.unwrap();
    match wait_for(&mut rx, "slide_changed").await {
        MonitorEvent::SlideChanged {
            slide_number,
            presentation_timing_status,
            ..
        } => {
            assert_eq!(slide_number, 2);
            assert!(presentation_timing_status.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        std::fs::read_to_string(dir.path().join("talk.json")).unwrap(),
        "{ not json"
    );

    monitor.stop_presentation().await.unwrap();
}

/// Simulated app whose next slide query hangs once when armed.
#[derive(Default)]
struct StallingControl {
    inner: SimulatedControl,
    stall_next: AtomicBool,
    stalls: AtomicUsize,
}

impl PresentationControl for StallingControl {
    fn current_slide(&self) -> Option<u32> {
        if self.stall_next.swap(false, Ordering::SeqCst) {
            self.stalls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
        }
        self.inner.current_slide()
    }
    fn total_slides(&self) -> Option<u32> {
        self.inner.total_slides()
    }
    fn document_path(&self) -> Option<PathBuf> {
        self.inner.document_path()
    }
    fn start(&self) -> bool {
        self.inner.start()
    }
    fn stop(&self) -> bool {
        self.inner.stop()
    }
    fn navigate(&self, slide: u32) -> bool {
        self.inner.navigate(slide)
    }
}

#[tokio::test]
async fn test_timed_out_tick_is_followed_by_the_next() {
    let dir = TempDir::new().unwrap();
    let control = Arc::new(StallingControl::default());
    control.inner.open(dir.path().join("talk.key"), 3);
    let config = MonitorConfig {
        control_timeout_ms: Some(50),
        ..fast_config()
    };
    let monitor = Monitor::new(control.clone(), config);
    monitor.start_monitoring().await.unwrap();
    let mut rx = monitor.subscribe();

    control.stall_next.store(true, Ordering::SeqCst);
    assert!(control.inner.navigate(2));

    match wait_for(&mut rx, "slide_changed").await {
        MonitorEvent::SlideChanged { slide_number, .. } => assert_eq!(slide_number, 2),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(control.stalls.load(Ordering::SeqCst), 1);
    assert!(monitor.is_monitoring().unwrap());

    monitor.stop_monitoring().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reload_races_poller_on_reopen() {
    for _ in 0..20 {
        let dir = TempDir::new().unwrap();
        let document = dir.path().join("talk.key");
        std::fs::write(dir.path().join("talk.txt"), "1,30\n").unwrap();

        let control = Arc::new(SimulatedControl::new());
        let monitor = Monitor::new(
            control.clone(),
            MonitorConfig {
                poll_interval_ms: 1,
                ..MonitorConfig::default()
            },
        );
        let mut rx = monitor.subscribe();
        monitor.start_monitoring().await.unwrap();

        control.open(&document, 3);
        let loaded = monitor.reload_schedule().await.unwrap();
        assert!(loaded.is_some(), "reload lost the schedule");
        wait_for(&mut rx, "slide_changed").await;

        let status = monitor.status().unwrap();
        assert_eq!(
            status.planned_timings.into_iter().collect::<Vec<_>>(),
            vec![(1, 30.0), (2, 60.0), (3, 60.0)]
        );
        assert!(dir.path().join("talk.txt.backup").exists());
        monitor.stop_monitoring().await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edits_while_polling() {
    let dir = TempDir::new().unwrap();
    let document = dir.path().join("talk.key");
    let control = Arc::new(SimulatedControl::with_document(&document, 4));
    let monitor = Arc::new(Monitor::new(control.clone(), fast_config()));
    monitor.start_presentation().await.unwrap();

    let mut tasks = Vec::new();
    for slide in 1..=4u32 {
        let monitor = monitor.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..10u32 {
                monitor
                    .update_slide_timing(slide, f64::from(slide * 10 + i))
                    .unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    tasks.push(tokio::spawn({
        let monitor = monitor.clone();
        async move {
            for slide in [2, 3, 4, 1] {
                monitor.goto_slide(slide).await.unwrap();
                monitor.status().unwrap();
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        }
    }));
    for task in tasks {
        task.await.unwrap();
    }

    let status = monitor.status().unwrap();
    for slide in 1..=4u32 {
        assert_eq!(status.planned_timings[&slide], f64::from(slide * 10 + 9));
    }
    let on_disk = ScheduleStore::default()
        .read(&status.schedule_path.unwrap())
        .unwrap();
    assert_eq!(on_disk.planned_timings(), status.planned_timings);

    monitor.stop_presentation().await.unwrap();
}
