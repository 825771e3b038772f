//! Schedule persistence.
//!
//! A document `talk.key` has its schedule at `talk.json`, next to it or in
//! the configured schedule directory. A legacy `talk.txt` is migrated once
//! and then kept as `talk.txt.backup`.
//!
//! Every load-or-create and every save holds an exclusive lock on
//! `.talk.json.lock`, so two writers (threads or processes) never interleave
//! on the same schedule.

use chrono::{DateTime, TimeZone, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::legacy::{migrate_legacy, parse_legacy};
use super::{
    Schedule, ScheduleMetadata, SlideTiming, DEFAULT_SLIDE_SECONDS, DEFAULT_TRANSITION_SECONDS,
    FORMAT_TYPE, SCHEDULE_VERSION,
};
use crate::error::ScheduleError;

/// Where a schedule came from on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleOrigin {
    Existing,
    Migrated,
    Created,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePaths {
    pub json: PathBuf,
    pub legacy: PathBuf,
    pub presentation_name: String,
}

impl SchedulePaths {
    pub fn backup(&self) -> PathBuf {
        let mut name = self.legacy.clone().into_os_string();
        name.push(".backup");
        PathBuf::from(name)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedSchedule {
    pub path: PathBuf,
    pub schedule: Schedule,
    pub origin: ScheduleOrigin,
}

/// Loads, migrates and saves schedule files.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    schedule_dir: Option<PathBuf>,
    default_slide_seconds: f64,
    transition_seconds: f64,
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self {
            schedule_dir: None,
            default_slide_seconds: DEFAULT_SLIDE_SECONDS,
            transition_seconds: DEFAULT_TRANSITION_SECONDS,
        }
    }
}

impl ScheduleStore {
    pub fn new(
        schedule_dir: Option<PathBuf>,
        default_slide_seconds: f64,
        transition_seconds: f64,
    ) -> Self {
        Self {
            schedule_dir,
            default_slide_seconds,
            transition_seconds,
        }
    }

    pub fn paths_for(&self, document: &Path) -> SchedulePaths {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "presentation".to_string());
        let base = match &self.schedule_dir {
            Some(dir) => dir.join(&stem),
            None => document.with_extension(""),
        };
        SchedulePaths {
            json: base.with_extension("json"),
            legacy: base.with_extension("txt"),
            presentation_name: stem,
        }
    }

    /// Load the schedule for `document`, migrating a legacy file or creating
    /// a default one when no structured schedule exists yet.
    ///
    /// `total_slides` is only needed when a schedule has to be built.
    pub fn load(
        &self,
        document: &Path,
        total_slides: Option<u32>,
    ) -> Result<LoadedSchedule, ScheduleError> {
        let paths = self.paths_for(document);
        let _lock = ScheduleLock::acquire(&paths.json)?;

        if paths.json.exists() {
            let schedule = self.read(&paths.json)?;
            info!(
                path = %paths.json.display(),
                slides = schedule.slides.len(),
                total_planned = schedule.total_planned_time(),
                "loaded schedule"
            );
            return Ok(LoadedSchedule {
                path: paths.json,
                schedule,
                origin: ScheduleOrigin::Existing,
            });
        }

        let total_slides = total_slides
            .filter(|n| *n > 0)
            .ok_or(ScheduleError::UnknownSlideCount)?;

        if paths.legacy.exists() {
            let schedule = self.migrate(&paths, total_slides)?;
            return Ok(LoadedSchedule {
                path: paths.json,
                schedule,
                origin: ScheduleOrigin::Migrated,
            });
        }

        let mut schedule = Schedule::with_defaults(
            &paths.presentation_name,
            total_slides,
            self.default_slide_seconds,
            self.transition_seconds,
            Utc::now(),
        );
        write_schedule(&paths.json, &mut schedule)?;
        info!(
            path = %paths.json.display(),
            total_slides,
            "created default schedule"
        );
        Ok(LoadedSchedule {
            path: paths.json,
            schedule,
            origin: ScheduleOrigin::Created,
        })
    }

    fn migrate(&self, paths: &SchedulePaths, total_slides: u32) -> Result<Schedule, ScheduleError> {
        info!(path = %paths.legacy.display(), "migrating legacy schedule");
        let text = fs::read_to_string(&paths.legacy).map_err(|e| ScheduleError::Migration {
            path: paths.legacy.clone(),
            message: e.to_string(),
        })?;
        let legacy = parse_legacy(&text);
        let mut schedule = migrate_legacy(
            &legacy,
            &paths.presentation_name,
            total_slides,
            self.default_slide_seconds,
            self.transition_seconds,
            Utc::now(),
        );
        write_schedule(&paths.json, &mut schedule)?;

        let backup = paths.backup();
        fs::rename(&paths.legacy, &backup).map_err(|e| ScheduleError::Migration {
            path: paths.legacy.clone(),
            message: format!("schedule written but backup failed: {e}"),
        })?;
        info!(
            json = %paths.json.display(),
            backup = %backup.display(),
            migrated = legacy.len(),
            "legacy schedule migrated"
        );
        Ok(schedule)
    }

    /// Read and validate a structured schedule file. Individual invalid
    /// slide entries are skipped; a file that is not a schedule document at
    /// all is an error.
    pub fn read(&self, path: &Path) -> Result<Schedule, ScheduleError> {
        let content = fs::read_to_string(path).map_err(|source| ScheduleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: DocumentIn =
            serde_json::from_str(&content).map_err(|e| ScheduleError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(self.from_document(doc, path))
    }

    fn from_document(&self, doc: DocumentIn, path: &Path) -> Schedule {
        let info = doc.presentation_info.unwrap_or_default();
        let defaults = doc.default_timings.unwrap_or_default();
        let now = Utc::now();

        let mut slides = BTreeMap::new();
        for (key, value) in doc.slide_timings {
            let slide = match key.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(path = %path.display(), key = %key, "skipping slide entry with invalid number");
                    continue;
                }
            };
            match serde_json::from_value::<SlideTiming>(value) {
                Ok(timing) if timing.planned_time.is_finite() && timing.planned_time >= 0.0 => {
                    slides.insert(slide, timing);
                }
                Ok(timing) => warn!(
                    path = %path.display(),
                    slide,
                    planned = timing.planned_time,
                    "skipping negative planned time"
                ),
                Err(err) => warn!(path = %path.display(), slide, %err, "skipping invalid slide entry"),
            }
        }

        let max_slide = slides.keys().next_back().copied().unwrap_or(0);
        let name = info.name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Schedule {
            version: doc.version,
            presentation_name: name,
            total_slides: info.total_slides.unwrap_or(0).max(max_slide),
            created_at: info.created_at.as_ref().and_then(parse_timestamp).unwrap_or(now),
            last_modified: info
                .last_modified
                .as_ref()
                .and_then(parse_timestamp)
                .unwrap_or(now),
            default_slide_seconds: defaults
                .default_slide_time
                .unwrap_or(self.default_slide_seconds),
            transition_seconds: defaults.transition_time.unwrap_or(self.transition_seconds),
            slides,
        }
    }

    /// Validate and write `schedule` to `path`, stamping `last_modified`.
    ///
    /// The file is written to a uniquely named sibling temp file and renamed
    /// into place, so readers see either the old or the new document.
    pub fn save(&self, path: &Path, schedule: &mut Schedule) -> Result<(), ScheduleError> {
        let _lock = ScheduleLock::acquire(path)?;
        write_schedule(path, schedule)
    }
}

/// Exclusive advisory lock on a schedule file, released on drop.
///
/// The lock file is left in place: unlinking it would let a waiter holding
/// the old inode and a newcomer creating a fresh one both "own" the lock.
struct ScheduleLock {
    _file: File,
}

impl ScheduleLock {
    fn acquire(schedule_path: &Path) -> Result<Self, ScheduleError> {
        let lock_path = sibling(schedule_path, "lock");
        let lock_err = |source| ScheduleError::Lock {
            path: lock_path.clone(),
            source,
        };
        if let Some(parent) = parent_dir(&lock_path) {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        Ok(Self { _file: file })
    }
}

/// Validate, stamp and write; the caller holds the [`ScheduleLock`].
fn write_schedule(path: &Path, schedule: &mut Schedule) -> Result<(), ScheduleError> {
    schedule.validate()?;
    schedule.last_modified = Utc::now();

    let doc = DocumentOut::from(&*schedule);
    let mut json = serde_json::to_vec_pretty(&doc).map_err(|e| ScheduleError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    json.push(b'\n');

    write_atomic(path, &json).map_err(|source| ScheduleError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = parent_dir(path).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule.json".to_string());

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// `talk.json` -> `.talk.json.<suffix>` in the same directory.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule.json".to_string());
    path.with_file_name(format!(".{file_name}.{suffix}"))
}

/// Accepts RFC 3339 strings (with or without offset) and epoch seconds.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        serde_json::Value::Number(n) => {
            let secs = n.as_f64()?;
            Utc.timestamp_millis_opt((secs * 1000.0) as i64).single()
        }
        _ => None,
    }
}

// ── Wire format ─────────────────────────────────────────────────────

fn default_version() -> String {
    SCHEDULE_VERSION.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentIn {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    presentation_info: Option<InfoIn>,
    #[serde(default)]
    default_timings: Option<DefaultsIn>,
    slide_timings: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoIn {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    total_slides: Option<u32>,
    #[serde(default)]
    created_at: Option<serde_json::Value>,
    #[serde(default)]
    last_modified: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsIn {
    #[serde(default)]
    default_slide_time: Option<f64>,
    #[serde(default)]
    transition_time: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentOut<'a> {
    version: &'a str,
    format_type: &'static str,
    presentation_info: InfoOut<'a>,
    default_timings: DefaultsOut,
    slide_timings: BTreeMap<String, &'a SlideTiming>,
    metadata: ScheduleMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoOut<'a> {
    name: &'a str,
    total_slides: u32,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsOut {
    default_slide_time: f64,
    transition_time: f64,
}

impl<'a> From<&'a Schedule> for DocumentOut<'a> {
    fn from(schedule: &'a Schedule) -> Self {
        Self {
            version: &schedule.version,
            format_type: FORMAT_TYPE,
            presentation_info: InfoOut {
                name: &schedule.presentation_name,
                total_slides: schedule.total_slides,
                created_at: schedule.created_at,
                last_modified: schedule.last_modified,
            },
            default_timings: DefaultsOut {
                default_slide_time: schedule.default_slide_seconds,
                transition_time: schedule.transition_seconds,
            },
            slide_timings: schedule
                .slides
                .iter()
                .map(|(n, timing)| (n.to_string(), timing))
                .collect(),
            metadata: schedule.metadata(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use tempfile::TempDir;

    fn document(dir: &TempDir) -> PathBuf {
        dir.path().join("talk.key")
    }

    #[test]
    fn paths_sit_next_to_document() {
        let store = ScheduleStore::default();
        let paths = store.paths_for(Path::new("/decks/talk.key"));
        assert_eq!(paths.json, PathBuf::from("/decks/talk.json"));
        assert_eq!(paths.legacy, PathBuf::from("/decks/talk.txt"));
        assert_eq!(paths.backup(), PathBuf::from("/decks/talk.txt.backup"));
        assert_eq!(paths.presentation_name, "talk");
    }

    #[test]
    fn paths_honor_schedule_dir() {
        let store = ScheduleStore::new(Some(PathBuf::from("/schedules")), 60.0, 2.0);
        let paths = store.paths_for(Path::new("/decks/talk.key"));
        assert_eq!(paths.json, PathBuf::from("/schedules/talk.json"));
    }

    #[test]
    fn creates_default_schedule_when_nothing_exists() {
        let dir = TempDir::new().unwrap();
        let store = ScheduleStore::default();
        let loaded = store.load(&document(&dir), Some(4)).unwrap();
        assert_eq!(loaded.origin, ScheduleOrigin::Created);
        assert!(loaded.path.exists());
        assert_eq!(loaded.schedule.total_planned_time(), 240.0);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&loaded.path).unwrap()).unwrap();
        assert_eq!(raw["formatType"], "keynote-timing");
        assert_eq!(raw["presentationInfo"]["totalSlides"], 4);
        assert_eq!(raw["slideTimings"]["2"]["plannedTime"], 60.0);
        assert_eq!(raw["slideTimings"]["2"]["importance"], "normal");
        assert_eq!(raw["metadata"]["totalPlannedTime"], 240.0);
        assert_eq!(raw["metadata"]["estimatedDuration"], "4m 0s");
    }

    #[test]
    fn building_requires_slide_count() {
        let dir = TempDir::new().unwrap();
        let err = ScheduleStore::default().load(&document(&dir), None).unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownSlideCount));
    }

    #[test]
    fn migrates_legacy_file_and_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let store = ScheduleStore::default();
        fs::write(dir.path().join("talk.txt"), "1,30\n2,60\n").unwrap();

        let loaded = store.load(&document(&dir), Some(3)).unwrap();
        assert_eq!(loaded.origin, ScheduleOrigin::Migrated);
        assert_eq!(loaded.schedule.planned_timings().into_iter().collect::<Vec<_>>(),
            vec![(1, 30.0), (2, 60.0), (3, 60.0)]);
        assert_eq!(loaded.schedule.metadata().slides_with_custom_timing, 2);
        assert!(!dir.path().join("talk.txt").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("talk.txt.backup")).unwrap(),
            "1,30\n2,60\n"
        );

        // The migrated file is now the structured schedule.
        let again = store.load(&document(&dir), Some(3)).unwrap();
        assert_eq!(again.origin, ScheduleOrigin::Existing);
        assert_eq!(again.schedule.metadata().slides_with_custom_timing, 2);
    }

    #[test]
    fn structured_file_wins_over_legacy() {
        let dir = TempDir::new().unwrap();
        let store = ScheduleStore::default();
        store.load(&document(&dir), Some(2)).unwrap();
        fs::write(dir.path().join("talk.txt"), "1,5\n").unwrap();

        let loaded = store.load(&document(&dir), Some(2)).unwrap();
        assert_eq!(loaded.origin, ScheduleOrigin::Existing);
        assert_eq!(loaded.schedule.planned(1), Some(60.0));
        assert!(dir.path().join("talk.txt").exists());
    }

    #[test]
    fn save_roundtrip_keeps_slide_details() {
        let dir = TempDir::new().unwrap();
        let store = ScheduleStore::default();
        let mut loaded = store.load(&document(&dir), Some(2)).unwrap();
        let slide = loaded.schedule.slides.get_mut(&1).unwrap();
        slide.notes = "open with the demo".into();
        slide.importance = super::super::Importance::High;
        loaded.schedule.set_planned(2, 75.0, Utc::now()).unwrap();
        store.save(&loaded.path, &mut loaded.schedule).unwrap();

        let read = store.read(&loaded.path).unwrap();
        assert_eq!(read.slides[&1].notes, "open with the demo");
        assert_eq!(read.slides[&1].importance, super::super::Importance::High);
        assert_eq!(read.planned(2), Some(75.0));
        assert!(read.slides[&2].custom_timing);
        assert_eq!(read.metadata(), loaded.schedule.metadata());
        let stray: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(stray.is_empty(), "temp files left behind: {stray:?}");
    }

    /// Run `load` on the same fresh document from two threads at once.
    fn load_twice_concurrently(dir: &Path, total: u32) -> Vec<Result<LoadedSchedule, ScheduleError>> {
        let document = dir.join("talk.key");
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let barrier = barrier.clone();
                let document = document.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    ScheduleStore::default().load(&document, Some(total))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn concurrent_loads_create_once() {
        for _ in 0..50 {
            let dir = TempDir::new().unwrap();
            let results = load_twice_concurrently(dir.path(), 40);
            let mut origins: Vec<_> = results
                .into_iter()
                .map(|r| r.expect("concurrent load failed").origin)
                .collect();
            origins.sort_by_key(|o| *o as u8);
            assert_eq!(origins, vec![ScheduleOrigin::Existing, ScheduleOrigin::Created]);
        }
    }

    #[test]
    fn concurrent_loads_migrate_once() {
        for _ in 0..50 {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("talk.txt"), "1,30\n2,45\n").unwrap();
            let results = load_twice_concurrently(dir.path(), 5);
            let mut origins = Vec::new();
            for result in results {
                let loaded = result.expect("concurrent load failed");
                assert_eq!(loaded.schedule.planned(2), Some(45.0));
                origins.push(loaded.origin);
            }
            origins.sort_by_key(|o| *o as u8);
            assert_eq!(origins, vec![ScheduleOrigin::Existing, ScheduleOrigin::Migrated]);
            assert!(dir.path().join("talk.txt.backup").exists());
        }
    }

    #[test]
    fn concurrent_saves_leave_a_valid_file() {
        let dir = TempDir::new().unwrap();
        let store = ScheduleStore::default();
        let loaded = store.load(&document(&dir), Some(3)).unwrap();

        let handles: Vec<_> = (1..=8u32)
            .map(|n| {
                let store = store.clone();
                let mut loaded = loaded.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        loaded.schedule.set_planned(1, f64::from(n), Utc::now()).unwrap();
                        store.save(&loaded.path, &mut loaded.schedule).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let read = store.read(&loaded.path).unwrap();
        assert!((1.0..=8.0).contains(&read.planned(1).unwrap()));
        assert_eq!(read.total_slides, 3);
    }

    #[test]
    fn save_rejects_invalid_schedule() {
        let dir = TempDir::new().unwrap();
        let store = ScheduleStore::default();
        let mut loaded = store.load(&document(&dir), Some(2)).unwrap();
        let before = fs::read_to_string(&loaded.path).unwrap();
        loaded.schedule.slides.get_mut(&1).unwrap().planned_time = -3.0;
        assert!(matches!(
            store.save(&loaded.path, &mut loaded.schedule),
            Err(ScheduleError::Invalid(_))
        ));
        assert_eq!(fs::read_to_string(&loaded.path).unwrap(), before);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("talk.json"), "{ not json").unwrap();
        let err = ScheduleStore::default().load(&document(&dir), Some(3)).unwrap_err();
        assert!(matches!(err, ScheduleError::Malformed { .. }));

        fs::write(dir.path().join("talk.json"), r#"{"version": "1.0"}"#).unwrap();
        let err = ScheduleStore::default().load(&document(&dir), Some(3)).unwrap_err();
        assert!(matches!(err, ScheduleError::Malformed { .. }));
    }

    #[test]
    fn invalid_entries_are_skipped_on_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("talk.json");
        fs::write(
            &path,
            r#"{
                "presentationInfo": {"name": "talk", "totalSlides": 4, "lastModified": 1700000000.5},
                "slideTimings": {
                    "1": {"plannedTime": 30},
                    "2": {"plannedTime": -4},
                    "x": {"plannedTime": 10},
                    "3": {"notes": "no time"},
                    "4": {"plannedTime": 90, "importance": "high"}
                }
            }"#,
        )
        .unwrap();
        let schedule = ScheduleStore::default().read(&path).unwrap();
        assert_eq!(schedule.planned_timings().into_iter().collect::<Vec<_>>(),
            vec![(1, 30.0), (4, 90.0)]);
        assert_eq!(schedule.total_slides, 4);
        assert_eq!(schedule.last_modified.timestamp(), 1_700_000_000);
        assert_eq!(schedule.default_slide_seconds, 60.0);
    }

    #[test]
    fn reads_naive_iso_timestamps() {
        let ts = parse_timestamp(&serde_json::json!("2024-03-01T10:15:30.123456")).unwrap();
        assert_eq!(ts.timestamp(), 1_709_288_130);
        assert!(parse_timestamp(&serde_json::json!("2024-03-01T10:15:30Z")).is_some());
        assert!(parse_timestamp(&serde_json::json!(true)).is_none());
    }
}
