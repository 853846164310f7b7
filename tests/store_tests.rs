//! Log Store Integration Tests
//!
//! Tests for the complete store flow including:
//! - Concurrent ingestion and drain-on-close
//! - Redaction before persistence
//! - Compression and transparent decompression on read
//! - Retention and size-based rotation
//! - Filtering, sorting and lookup through the public API

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use memlog::store::{compress_segment, discover, SegmentFile, SegmentManager};
use memlog::types::{REDACTED_COMMAND, REDACTED_OUTPUT};
use memlog::{CommandRecord, Filter, LogEntry, LogStore, SortKey, StoreConfig};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_data_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    PathBuf::from(format!(
        "target/test_memlog_{}_{}",
        std::process::id(),
        id
    ))
}

fn cleanup_dir(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

fn open_store(root: &Path) -> LogStore {
    let config = StoreConfig::new(root).with_sync_writes(false);
    LogStore::open(config).expect("Failed to open store")
}

fn record(user: &str, command: &str, exit_code: i32, duration_ms: i64) -> CommandRecord {
    CommandRecord::new(command)
        .with_user(user)
        .with_host("buildbox")
        .with_cwd("/srv/app")
        .with_exit_code(exit_code)
        .with_duration_ms(duration_ms)
}

/// IDs as they appear on disk, segment by segment, line by line
fn ids_on_disk(logs_dir: &Path) -> Vec<i64> {
    discover(logs_dir)
        .expect("Failed to list segments")
        .iter()
        .flat_map(|s| memlog::store::read_segment(s))
        .map(|e| e.id)
        .collect()
}

fn set_age(path: &Path, days: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(days * 86_400))
        .unwrap();
}

#[test]
fn test_concurrent_submits_are_all_persisted_in_id_order() {
    let data_dir = test_data_dir();
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("counter"), "41").unwrap();

    let config = StoreConfig::new(&data_dir)
        .with_sync_writes(false)
        .with_queue_capacity(8);
    let store = Arc::new(LogStore::open(config).expect("Failed to open store"));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store
                        .submit(record("ci", &format!("job-{}-{}", t, i), 0, 1))
                        .expect("Failed to submit");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    store.close();

    let ids = ids_on_disk(&data_dir.join("logs"));
    assert_eq!(ids, (42..=141).collect::<Vec<_>>());
    assert_eq!(store.ingest_stats().written(), 100);
    assert_eq!(fs::read_to_string(data_dir.join("counter")).unwrap(), "141");

    cleanup_dir(&data_dir);
}

#[test]
fn test_sequential_submits_keep_submission_order() {
    let data_dir = test_data_dir();
    let store = open_store(&data_dir);

    let commands = ["make", "make test", "make install", "ls", "true"];
    for command in commands {
        store.submit(record("alice", command, 0, 1)).unwrap();
    }
    store.close();

    let logged: Vec<String> = discover(&data_dir.join("logs"))
        .unwrap()
        .iter()
        .flat_map(|s| memlog::store::read_segment(s))
        .map(|e| e.command)
        .collect();
    assert_eq!(logged, commands);

    cleanup_dir(&data_dir);
}

#[test]
fn test_redaction_for_every_keyword() {
    let data_dir = test_data_dir();
    let store = open_store(&data_dir);

    let sensitive = [
        "psql --password hunter2",
        "echo SECRET=1",
        "gh auth login --with-token",
        "export API_KEY=k",
        "curl -d apiKey=k",
    ];
    for command in sensitive {
        store
            .submit(record("alice", command, 0, 1).with_output("hunter2", "hunter2"))
            .unwrap();
    }
    store.submit(record("alice", "ls", 0, 1)).unwrap();
    store.close();

    let entries = store.read_logs(&Filter::new()).unwrap();
    assert_eq!(entries.len(), 6);

    let redacted: Vec<&LogEntry> = entries
        .iter()
        .filter(|e| e.command == REDACTED_COMMAND)
        .collect();
    assert_eq!(redacted.len(), 5);
    for entry in redacted {
        assert_eq!(entry.stdout, REDACTED_OUTPUT);
        assert_eq!(entry.stderr, REDACTED_OUTPUT);
    }

    cleanup_dir(&data_dir);
}

#[test]
fn test_compressed_segment_reads_identically() {
    let data_dir = test_data_dir();
    let store = open_store(&data_dir);

    for i in 0..10 {
        store
            .submit(record("alice", &format!("step {}", i), i % 3, i as i64 * 7))
            .unwrap();
    }
    store.close();

    let before = store.read_logs(&Filter::new()).unwrap();

    let logs_dir = data_dir.join("logs");
    for segment in discover(&logs_dir).unwrap() {
        compress_segment(&segment).expect("Failed to compress");
    }

    let segments = discover(&logs_dir).unwrap();
    assert!(segments.iter().all(|s| s.compressed));

    let after = store.read_logs(&Filter::new()).unwrap();
    assert_eq!(before, after);
    assert_eq!(store.get_by_id(5).unwrap(), before.iter().find(|e| e.id == 5).unwrap().clone());

    cleanup_dir(&data_dir);
}

#[test]
fn test_clean_old_logs_twice_is_stable() {
    let data_dir = test_data_dir();
    let logs_dir = data_dir.join("logs");
    fs::create_dir_all(&logs_dir).unwrap();

    for (name, age) in [
        ("store-2026-07-01.gz", 100),
        ("store-2026-09-01.gz", 40),
        ("store-2026-10-10", 5),
        ("store-2026-10-17", 0),
    ] {
        fs::write(logs_dir.join(name), "{}\n").unwrap();
        set_age(&logs_dir.join(name), age);
    }

    let manager = SegmentManager::new(&logs_dir);
    let list = |m: &SegmentManager| -> Vec<String> {
        m.list_segments()
            .unwrap()
            .iter()
            .map(|s| s.segment.file_name().to_string())
            .collect()
    };

    let first = manager.clean_old_logs(30).unwrap();
    assert_eq!(first.processed.len(), 2);
    let remaining = list(&manager);

    let second = manager.clean_old_logs(30).unwrap();
    assert!(second.processed.is_empty());
    assert_eq!(list(&manager), remaining);
    assert_eq!(remaining, vec!["store-2026-10-10", "store-2026-10-17"]);

    cleanup_dir(&data_dir);
}

#[test]
fn test_rotation_threshold() {
    let data_dir = test_data_dir();
    let logs_dir = data_dir.join("logs");
    fs::create_dir_all(&logs_dir).unwrap();

    let line = format!(
        "{}\n",
        LogEntry {
            id: 1,
            command: "x".repeat(1000),
            ..Default::default()
        }
        .to_json_line()
        .unwrap()
    );
    let big = line.repeat(2 * 1024 * 1024 / line.len() + 1);
    let small = line.repeat(500 * 1024 / line.len());
    fs::write(logs_dir.join("store-2026-10-16"), &big).unwrap();
    fs::write(logs_dir.join("store-2026-10-17"), &small).unwrap();

    let manager = SegmentManager::new(&logs_dir);
    let report = manager.rotate_if_needed(1).unwrap();

    assert!(report.is_clean());
    assert!(logs_dir.join("store-2026-10-16.gz").exists());
    assert!(!logs_dir.join("store-2026-10-16").exists());
    assert!(logs_dir.join("store-2026-10-17").exists());
    assert!(!logs_dir.join("store-2026-10-17.gz").exists());

    cleanup_dir(&data_dir);
}

#[test]
fn test_same_day_rotation_folds_into_one_compressed_segment() {
    let data_dir = test_data_dir();
    let logs_dir = data_dir.join("logs");
    let bulky = "x".repeat(600 * 1024);

    let first = open_store(&data_dir);
    for _ in 0..4 {
        first.submit(record("alice", &bulky, 0, 1)).unwrap();
    }
    first.close();
    assert!(first.rotate_if_needed(1).unwrap().is_clean());

    let second = open_store(&data_dir);
    for _ in 0..4 {
        second.submit(record("alice", &bulky, 0, 1)).unwrap();
    }
    second.close();

    let report = second.rotate_if_needed(1).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.processed.len(), 1);

    let segments = discover(&logs_dir).unwrap();
    assert_eq!(segments.len(), 1);
    assert!(segments[0].compressed);
    assert_eq!(ids_on_disk(&logs_dir), (1..=8).collect::<Vec<_>>());

    // Nothing left to rotate
    assert!(second.rotate_if_needed(1).unwrap().processed.is_empty());
    assert!(second.compress_old_logs().unwrap().is_clean());

    cleanup_dir(&data_dir);
}

#[test]
fn test_filters_through_store() {
    let data_dir = test_data_dir();
    let store = open_store(&data_dir);

    store.submit(record("alice", "cargo build", 0, 50)).unwrap();
    store.submit(record("alice", "cargo test", 101, 200)).unwrap();
    store.submit(record("bob", "cargo test", 1, 10)).unwrap();
    store.close();

    let alice_failed = store
        .read_logs(&Filter::new().user("alice").failed_only())
        .unwrap();
    assert_eq!(alice_failed.len(), 1);
    assert!(alice_failed
        .iter()
        .all(|e| e.user == "alice" && e.exit_code != 0));

    let by_duration = store
        .read_logs(&Filter::new().sort_by(SortKey::Duration))
        .unwrap();
    let durations: Vec<i64> = by_duration.iter().map(|e| e.duration_ms).collect();
    assert_eq!(durations, vec![200, 50, 10]);

    let today = store.read_logs(&Filter::new().today().limit(2)).unwrap();
    assert_eq!(today.len(), 2);

    assert!(store.get_by_id(42).unwrap_err().is_not_found());

    cleanup_dir(&data_dir);
}

#[test]
fn test_corrupt_tail_yields_valid_prefix() {
    let data_dir = test_data_dir();
    let logs_dir = data_dir.join("logs");
    fs::create_dir_all(&logs_dir).unwrap();

    let valid = LogEntry {
        id: 7,
        timestamp: "2026-10-16T08:30:00Z".to_string(),
        user: "alice".to_string(),
        command: "uptime".to_string(),
        ..Default::default()
    };
    fs::write(
        logs_dir.join("store-2026-10-16"),
        format!("{}\n{{\"id\":8,\"comm", valid.to_json_line().unwrap()),
    )
    .unwrap();

    let store = open_store(&data_dir);
    let entries = store.read_logs(&Filter::new()).unwrap();
    assert_eq!(entries, vec![valid]);

    cleanup_dir(&data_dir);
}

#[test]
fn test_segment_file_names() {
    let data_dir = test_data_dir();
    let store = open_store(&data_dir);
    store.submit(record("alice", "date", 0, 1)).unwrap();
    store.close();

    let segments = discover(&data_dir.join("logs")).unwrap();
    assert_eq!(segments.len(), 1);
    let expected = SegmentFile::from_path(&segments[0].path).unwrap();
    assert!(!expected.compressed);
    assert_eq!(expected.date, chrono::Utc::now().date_naive());

    cleanup_dir(&data_dir);
}
