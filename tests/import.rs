use std::path::PathBuf;

use tracknorm::config::Config;
use tracknorm::error::{ImportError, ParseError};
use tracknorm::import::Importer;
use tracknorm::storage::{Activity, ActivityStore};
use tracknorm::types::point::Segment;
use tracknorm::types::record::Set;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracknorm=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Minimal in-memory stand-in for the persistence collaborator. Identity
/// matching is by (name, start time), which is what a real backend keys
/// duplicate checks on.
#[derive(Default)]
struct MemoryStore {
    keys: Vec<(Option<String>, Option<i64>)>,
    inserted: usize,
    next_id: i64,
}

impl MemoryStore {
    fn insert(&mut self, activity: &Activity) -> Option<i64> {
        self.keys
            .push((activity.name.clone(), activity.start_time_ms));
        self.inserted += 1;
        self.next_id += 1;
        Some(self.next_id)
    }
}

impl ActivityStore for MemoryStore {
    fn activity_exists(&self, candidate: &Activity) -> bool {
        self.keys
            .contains(&(candidate.name.clone(), candidate.start_time_ms))
    }

    fn insert_track_activity(&mut self, activity: &Activity, _: &[Segment]) -> Option<i64> {
        self.insert(activity)
    }

    fn insert_set_activity(&mut self, activity: &Activity, _: &[Set]) -> Option<i64> {
        self.insert(activity)
    }

    fn insert_multi_activity(&mut self, activity: &Activity) -> Option<i64> {
        self.insert(activity)
    }
}

fn good_gpx(name: &str) -> String {
    let points: String = (0..5)
        .map(|i| {
            format!(
                "<trkpt lat=\"{}\" lon=\"8.0\"><time>2026-05-01T09:00:{:02}Z</time><speed>3.0</speed></trkpt>",
                47.0 + i as f64 * 0.001,
                i
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?>\n<gpx version=\"1.1\" creator=\"test\"><trk><name>{name}</name><trkseg>{points}</trkseg></trk></gpx>"
    )
}

fn temp_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tracknorm-{}-{}", test, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("clean stale test dir");
    }
    std::fs::create_dir_all(&dir).expect("create test dir");
    dir
}

#[test]
fn single_file_import_yields_one_snapshot() {
    init_tracing();
    let dir = temp_dir("single");
    let file = dir.join("ride.gpx");
    std::fs::write(&file, good_gpx("Ride")).unwrap();

    let mut store = MemoryStore::default();
    let importer = Importer::make(&file, Config::default()).unwrap();
    assert_eq!(importer.files_to_import(), 1);

    let snapshots: Vec<_> = importer.run(&mut store).collect();
    assert_eq!(snapshots.len(), 1);
    let last = snapshots.last().unwrap();
    assert_eq!(last.total, 1);
    assert_eq!(last.imported, 1);
    assert!(last.is_done());
    assert!(last.is_ok());
    assert_eq!(store.inserted, 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn folder_import_recovers_per_file_failures() {
    init_tracing();
    let dir = temp_dir("folder");
    std::fs::write(dir.join("a.gpx"), good_gpx("A")).unwrap();
    std::fs::write(dir.join("b.gpx"), "<gpx><trk><trkseg></trk></gpx>").unwrap();
    std::fs::write(dir.join("c.gpx"), good_gpx("C")).unwrap();
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let mut store = MemoryStore::default();
    let importer = Importer::make(&dir, Config::default()).unwrap();
    assert_eq!(importer.files_to_import(), 3);

    let snapshots: Vec<_> = importer.run(&mut store).collect();
    assert_eq!(snapshots.len(), 3);
    // Progress grows monotonically across snapshots of the same run.
    for pair in snapshots.windows(2) {
        assert!(pair[1].total_imported() >= pair[0].total_imported());
    }

    let last = snapshots.last().unwrap();
    assert_eq!(last.total, 3);
    assert_eq!(last.imported, 2);
    assert_eq!(last.errors.len(), 1);
    assert!(last.errors[0].contains("b.gpx"));
    assert!(last.is_done());
    assert!(!last.is_ok());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn second_import_of_same_file_reports_duplicate() {
    init_tracing();
    let dir = temp_dir("dup");
    let file = dir.join("ride.gpx");
    std::fs::write(&file, good_gpx("Ride")).unwrap();

    let mut store = MemoryStore::default();
    let first = Importer::make(&file, Config::default())
        .unwrap()
        .run(&mut store)
        .last()
        .unwrap();
    assert!(first.is_ok());

    let second = Importer::make(&file, Config::default())
        .unwrap()
        .run(&mut store)
        .last()
        .unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.errors.len(), 1);
    assert!(second.errors[0].contains("ride.gpx"));
    assert!(second.errors[0].contains("already exists"));
    assert_eq!(store.inserted, 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn snapshots_serialize_for_progress_transport() {
    let dir = temp_dir("json");
    let file = dir.join("ride.gpx");
    std::fs::write(&file, good_gpx("Ride")).unwrap();

    let mut store = MemoryStore::default();
    let snapshot = Importer::make(&file, Config::default())
        .unwrap()
        .run(&mut store)
        .next()
        .unwrap();

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["imported"], 1);
    assert!(json["errors"].as_array().unwrap().is_empty());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unknown_extension_is_fatal_at_construction() {
    let dir = temp_dir("ext");
    let file = dir.join("route.kml");
    std::fs::write(&file, "<kml/>").unwrap();

    let err = Importer::make(&file, Config::default()).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Parse(ParseError::UnknownExtension(name)) if name == "route.kml"
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn stopping_early_leaves_partial_result_valid() {
    let dir = temp_dir("cancel");
    std::fs::write(dir.join("a.gpx"), good_gpx("A")).unwrap();
    std::fs::write(dir.join("b.gpx"), good_gpx("B")).unwrap();
    std::fs::write(dir.join("c.gpx"), good_gpx("C")).unwrap();

    let mut store = MemoryStore::default();
    let importer = Importer::make(&dir, Config::default()).unwrap();
    let mut run = importer.run(&mut store);

    let snapshot = run.next().unwrap();
    drop(run); // caller stops pulling; remaining files stay unprocessed
    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.imported, 1);
    assert!(!snapshot.is_done());
    assert_eq!(store.inserted, 1);

    std::fs::remove_dir_all(&dir).ok();
}
