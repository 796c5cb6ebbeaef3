use std::fs;
use std::sync::{Arc, Mutex};

use supply_chain_ingest::ingestion::{FileObserver, LoadContext, LoadObserver, LoadSeverity, LoadStats};
use supply_chain_ingest::pipeline::{DatasetEntry, DatasetLoader};
use supply_chain_ingest::store::SqliteStore;
use supply_chain_ingest::LoadError;

#[derive(Default)]
struct RecordingObserver {
    started: Mutex<Vec<String>>,
    loaded: Mutex<Vec<(String, usize)>>,
    failures: Mutex<Vec<LoadSeverity>>,
    alerts: Mutex<Vec<LoadSeverity>>,
}

impl LoadObserver for RecordingObserver {
    fn on_start(&self, ctx: &LoadContext) {
        self.started.lock().unwrap().push(ctx.table.clone());
    }

    fn on_success(&self, _ctx: &LoadContext, stats: &LoadStats) {
        self.loaded.lock().unwrap().push((stats.table.clone(), stats.rows));
    }

    fn on_failure(&self, _ctx: &LoadContext, severity: LoadSeverity, _error: &LoadError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &LoadContext, severity: LoadSeverity, _error: &LoadError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn observer_receives_failure_and_alert_on_missing_source() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = DatasetLoader::default().with_observer(obs.clone());
    let mut store = SqliteStore::open_in_memory().unwrap();

    let _ = loader
        .load(&DatasetEntry::new("tests/fixtures/does_not_exist.csv", "sellers"), &mut store)
        .unwrap_err();

    assert_eq!(*obs.started.lock().unwrap(), vec!["sellers".to_string()]);
    assert_eq!(*obs.failures.lock().unwrap(), vec![LoadSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![LoadSeverity::Critical]);
    assert!(obs.loaded.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_without_alert_for_bad_data() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = DatasetLoader::default().with_observer(obs.clone());
    let mut store = SqliteStore::open_in_memory().unwrap();

    let _ = loader
        .load(&DatasetEntry::new("tests/fixtures/malformed.csv", "orders"), &mut store)
        .unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![LoadSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn lowered_threshold_alerts_on_bad_data() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = DatasetLoader::default()
        .with_observer(obs.clone())
        .with_alert_threshold(LoadSeverity::Error);
    let mut store = SqliteStore::open_in_memory().unwrap();

    let _ = loader
        .load(&DatasetEntry::new("tests/fixtures/malformed.csv", "orders"), &mut store)
        .unwrap_err();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![LoadSeverity::Error]);
}

#[test]
fn observer_receives_stats_on_success() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = DatasetLoader::default().with_observer(obs.clone());
    let mut store = SqliteStore::open_in_memory().unwrap();

    loader
        .load(&DatasetEntry::new("tests/fixtures/orders.csv", "orders"), &mut store)
        .unwrap();

    assert_eq!(*obs.loaded.lock().unwrap(), vec![("orders".to_string(), 4)]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn file_observer_appends_one_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("narration.log");
    let loader = DatasetLoader::default().with_observer(Arc::new(FileObserver::new(&log)));
    let mut store = SqliteStore::open_in_memory().unwrap();

    loader
        .load(&DatasetEntry::new("tests/fixtures/orders.csv", "orders"), &mut store)
        .unwrap();
    let _ = loader
        .load(&DatasetEntry::new("tests/fixtures/does_not_exist.csv", "sellers"), &mut store)
        .unwrap_err();

    let text = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("start table=orders"));
    assert!(lines[1].contains("ok table=orders"));
    assert!(lines[1].contains("rows=4"));
    assert!(lines[2].contains("start table=sellers"));
    assert!(lines[3].contains("fail severity=Critical table=sellers"));
    assert!(lines[4].contains("ALERT severity=Critical table=sellers"));
}
