// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! End-to-end runs of the sync engine.
//!
//! Each test builds a FitNotes-shaped SQLite snapshot in a temp dir and syncs it
//! into an in-memory remote store, optionally wrapped in [`FlakyRemoteStore`]
//! for precise failure injection.
//!
//! Run with: `cargo test --test engine`

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;
use tokio::sync::watch;

use fitnotes_sync::record::DEDUP_PROPERTY;
use fitnotes_sync::{
    AcquisitionError, Collections, EngineState, EntityKind, IndexError, InMemoryRemoteStore, LocalBackup,
    MappingError, PropertySet, PropertyValue, QueryPage, RemoteError, RemoteRecord, RemoteStore,
    SourceFile, SourceProvider, SyncConfig, SyncEngine, SyncError,
};

const BW: &str = "db-bodyweight";
const EX: &str = "db-exercise";
const WO: &str = "db-workout";

// =============================================================================
// Snapshot fixture
// =============================================================================

#[derive(Default)]
struct Rows {
    bodyweight: Vec<(i64, &'static str, f64)>,
    exercises: Vec<(i64, &'static str)>,
    workouts: Vec<(i64, &'static str, i64, f64, i64)>,
}

struct Snapshot {
    _dir: TempDir,
    path: PathBuf,
}

async fn snapshot(rows: Rows) -> Snapshot {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("FitNotes_Backup_2024_01_05.fitnotes");
    write_snapshot(&path, &rows).await;
    Snapshot { _dir: dir, path }
}

async fn write_snapshot(path: &Path, rows: &Rows) {
    let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    for ddl in [
        "CREATE TABLE MeasurementRecord (_id INTEGER PRIMARY KEY, measurement_id INTEGER, date TEXT, time TEXT, value REAL, comment TEXT)",
        "CREATE TABLE exercise (_id INTEGER PRIMARY KEY, name TEXT, category_id INTEGER)",
        "CREATE TABLE training_log (_id INTEGER PRIMARY KEY, exercise_id INTEGER, date TEXT, metric_weight REAL, reps INTEGER, unit INTEGER)",
    ] {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }

    for &(id, date, value) in &rows.bodyweight {
        sqlx::query("INSERT INTO MeasurementRecord (_id, measurement_id, date, value) VALUES (?, 1, ?, ?)")
            .bind(id)
            .bind(date)
            .bind(value)
            .execute(&pool)
            .await
            .unwrap();
    }
    // Other measurements (body fat etc.) are never synced.
    sqlx::query("INSERT INTO MeasurementRecord (_id, measurement_id, date, value) VALUES (9000, 2, '2024-01-01', 18.5)")
        .execute(&pool)
        .await
        .unwrap();

    for &(id, name) in &rows.exercises {
        sqlx::query("INSERT INTO exercise (_id, name, category_id) VALUES (?, ?, 1)")
            .bind(id)
            .bind(name)
            .execute(&pool)
            .await
            .unwrap();
    }
    for &(id, date, exercise_id, weight, reps) in &rows.workouts {
        sqlx::query("INSERT INTO training_log (_id, date, exercise_id, metric_weight, reps, unit) VALUES (?, ?, ?, ?, ?, 0)")
            .bind(id)
            .bind(date)
            .bind(exercise_id)
            .bind(weight)
            .bind(reps)
            .execute(&pool)
            .await
            .unwrap();
    }

    pool.close().await;
}

fn config() -> SyncConfig {
    SyncConfig::new(
        "test-token",
        Collections {
            bodyweight: BW.into(),
            exercise: EX.into(),
            workout: WO.into(),
        },
    )
}

fn remote_record(id: &str, sql_id: Value) -> RemoteRecord {
    let mut props = Map::new();
    props.insert(DEDUP_PROPERTY.to_string(), json!({ "number": sql_id }));
    RemoteRecord::new(id, props)
}

fn origin_ids(store: &InMemoryRemoteStore, collection: &str) -> Vec<i64> {
    let mut ids: Vec<i64> = store.records(collection).iter().filter_map(RemoteRecord::origin_id).collect();
    ids.sort_unstable();
    ids
}

fn find(store: &InMemoryRemoteStore, collection: &str, origin_id: i64) -> RemoteRecord {
    store
        .records(collection)
        .into_iter()
        .find(|r| r.origin_id() == Some(origin_id))
        .unwrap_or_else(|| panic!("no remote record for {} in {}", origin_id, collection))
}

// =============================================================================
// Failure injection
// =============================================================================

/// Wraps the in-memory store with injectable failures.
struct FlakyRemoteStore {
    inner: InMemoryRemoteStore,
    query_calls: AtomicU64,
    /// Fail this query call (1-indexed, across all collections)
    fail_query_on: Option<u64>,
    /// Reject creates for these origin ids
    fail_create_for: Mutex<HashSet<i64>>,
    /// Hide records created through this wrapper from queries
    hide_created: bool,
    created: Mutex<HashSet<String>>,
}

impl FlakyRemoteStore {
    fn new(inner: InMemoryRemoteStore) -> Self {
        Self {
            inner,
            query_calls: AtomicU64::new(0),
            fail_query_on: None,
            fail_create_for: Mutex::new(HashSet::new()),
            hide_created: false,
            created: Mutex::new(HashSet::new()),
        }
    }

    fn failing_creates(inner: InMemoryRemoteStore, origin_ids: &[i64]) -> Self {
        let store = Self::new(inner);
        store.fail_create_for.lock().unwrap().extend(origin_ids);
        store
    }

    fn heal(&self) {
        self.fail_create_for.lock().unwrap().clear();
    }
}

#[async_trait]
impl RemoteStore for FlakyRemoteStore {
    async fn query(
        &self,
        collection_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<QueryPage, RemoteError> {
        let call = self.query_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_query_on == Some(call) {
            return Err(RemoteError::Transport("connection reset by peer".into()));
        }

        let mut page = self.inner.query(collection_id, page_size, cursor).await?;
        if self.hide_created {
            let created = self.created.lock().unwrap();
            page.results.retain(|r| !created.contains(&r.id));
        }
        Ok(page)
    }

    async fn create(&self, collection_id: &str, properties: &PropertySet) -> Result<String, RemoteError> {
        let origin_id = match properties.get(DEDUP_PROPERTY) {
            Some(PropertyValue::Number(n)) => n.as_i64(),
            _ => None,
        };
        if origin_id.is_some_and(|id| self.fail_create_for.lock().unwrap().contains(&id)) {
            return Err(RemoteError::Api {
                status: 400,
                code: Some("validation_error".into()),
                message: "body failed validation".into(),
            });
        }

        let id = self.inner.create(collection_id, properties).await?;
        self.created.lock().unwrap().insert(id.clone());
        Ok(id)
    }
}

/// Records the engine state observed at every remote call.
struct StateRecordingStore {
    inner: InMemoryRemoteStore,
    state: Mutex<Option<watch::Receiver<EngineState>>>,
    seen: Mutex<Vec<EngineState>>,
}

impl StateRecordingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryRemoteStore::new(),
            state: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn watch(&self, engine: &SyncEngine) {
        *self.state.lock().unwrap() = Some(engine.state_receiver());
        self.seen.lock().unwrap().clear();
    }

    fn record(&self) {
        let Some(state) = self.state.lock().unwrap().as_ref().map(|rx| *rx.borrow()) else {
            return;
        };
        let mut seen = self.seen.lock().unwrap();
        if seen.last() != Some(&state) {
            seen.push(state);
        }
    }

    fn seen(&self) -> Vec<EngineState> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for StateRecordingStore {
    async fn query(
        &self,
        collection_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<QueryPage, RemoteError> {
        self.record();
        self.inner.query(collection_id, page_size, cursor).await
    }

    async fn create(&self, collection_id: &str, properties: &PropertySet) -> Result<String, RemoteError> {
        self.record();
        self.inner.create(collection_id, properties).await
    }
}

/// Copies a snapshot into its own temp dir, as a download would.
struct DownloadedBackup {
    from: PathBuf,
    handed_out: Mutex<Option<PathBuf>>,
}

#[async_trait]
impl SourceProvider for DownloadedBackup {
    async fn get_local_file(&self) -> Result<SourceFile, AcquisitionError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("db.sqlite");
        tokio::fs::copy(&self.from, &path).await?;
        *self.handed_out.lock().unwrap() = Some(path.clone());
        Ok(SourceFile::temporary(path, dir))
    }
}

fn engine(store: Arc<dyn RemoteStore>, path: &Path) -> SyncEngine {
    SyncEngine::new(config(), store, Arc::new(LocalBackup::new(path)))
}

// =============================================================================
// Tests
// =============================================================================

fn sample_rows() -> Rows {
    Rows {
        bodyweight: vec![(1, "2024-01-01", 80.0), (2, "2024-01-03", 79.4), (3, "2024-01-02", 79.9)],
        exercises: vec![(1, "Squat"), (2, "Bench")],
        workouts: vec![(10, "2024-01-01", 2, 100.0, 5), (11, "2024-01-02", 1, 60.0, 8)],
    }
}

#[tokio::test]
async fn test_first_run_creates_everything() {
    let snap = snapshot(sample_rows()).await;
    let store = Arc::new(InMemoryRemoteStore::new());
    let engine = engine(store.clone(), &snap.path);

    let report = engine.run().await.unwrap();

    assert_eq!(engine.state(), EngineState::Complete);
    assert!(report.is_success());
    assert_eq!(report.created(), 7);
    assert_eq!(
        report.kinds.iter().map(|k| k.kind).collect::<Vec<_>>(),
        EntityKind::ALL.to_vec()
    );
    assert_eq!(origin_ids(&store, BW), vec![1, 2, 3]);
    assert_eq!(origin_ids(&store, EX), vec![1, 2]);
    assert_eq!(origin_ids(&store, WO), vec![10, 11]);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let snap = snapshot(sample_rows()).await;
    let store = Arc::new(InMemoryRemoteStore::new());

    engine(store.clone(), &snap.path).run().await.unwrap();
    let creates_after_first = store.create_calls();

    let report = engine(store.clone(), &snap.path).run().await.unwrap();

    assert_eq!(report.created(), 0);
    assert_eq!(store.create_calls(), creates_after_first);
    for kind in &report.kinds {
        assert_eq!(kind.unsynced, 0, "{} should be fully synced", kind.kind);
        assert_eq!(kind.remote_records, kind.local_rows);
    }
}

#[tokio::test]
async fn test_workout_links_to_exercise_remote_id() {
    let snap = snapshot(Rows {
        exercises: vec![(1, "Squat"), (2, "Bench")],
        workouts: vec![(10, "2024-01-01", 2, 100.0, 5)],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());

    engine(store.clone(), &snap.path).run().await.unwrap();

    let bench = find(&store, EX, 2);
    let workout = find(&store, WO, 10);
    assert_eq!(workout.properties["Exercise"]["relation"][0]["id"], json!(bench.id));
    assert_eq!(workout.properties["Weight"]["number"], json!(220.5));
    assert_eq!(workout.properties["Reps"]["number"], json!(5));
    assert_eq!(workout.properties["Date"]["date"]["start"], json!("2024-01-01"));
}

#[tokio::test]
async fn test_exercises_created_in_name_order() {
    let snap = snapshot(Rows {
        exercises: vec![(1, "Squat"), (2, "Bench"), (3, "Deadlift")],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());

    engine(store.clone(), &snap.path).run().await.unwrap();

    let names: Vec<_> = store
        .records(EX)
        .iter()
        .map(|r| r.properties["Name"]["title"][0]["text"]["content"].clone())
        .collect();
    assert_eq!(names, vec![json!("Bench"), json!("Deadlift"), json!("Squat")]);
}

#[tokio::test]
async fn test_partial_failure_is_isolated_and_retried_next_run() {
    let snap = snapshot(Rows {
        bodyweight: vec![(1, "2024-01-01", 80.0), (2, "2024-01-02", 80.2), (3, "2024-01-03", 80.4)],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(FlakyRemoteStore::failing_creates(InMemoryRemoteStore::new(), &[2]));

    let report = engine(store.clone(), &snap.path).run().await.unwrap();

    let bodyweight = report.kind(EntityKind::Bodyweight).unwrap();
    assert_eq!(bodyweight.created, 2);
    assert_eq!(bodyweight.failures.len(), 1);
    assert_eq!(bodyweight.failures[0].origin_id, 2);
    assert!(matches!(bodyweight.failures[0].error, RemoteError::Api { status: 400, .. }));
    assert_eq!(origin_ids(&store.inner, BW), vec![1, 3]);

    store.heal();
    let report = engine(store.clone(), &snap.path).run().await.unwrap();

    assert_eq!(report.kind(EntityKind::Bodyweight).unwrap().created, 1);
    assert_eq!(origin_ids(&store.inner, BW), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_only_unknown_rows_are_created() {
    let snap = snapshot(Rows {
        bodyweight: vec![
            (1, "2024-01-01", 80.0),
            (2, "2024-01-02", 80.1),
            (3, "2024-01-03", 80.2),
            (4, "2024-01-04", 80.3),
        ],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());
    store.seed(BW, [remote_record("old-1", json!(1)), remote_record("old-3", json!(3))]);

    let report = engine(store.clone(), &snap.path).run().await.unwrap();

    let bodyweight = report.kind(EntityKind::Bodyweight).unwrap();
    assert_eq!(bodyweight.remote_records, 2);
    assert_eq!(bodyweight.unsynced, 2);
    assert_eq!(store.create_calls(), 2);
    assert_eq!(origin_ids(&store, BW), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_untracked_remote_records_do_not_block_sync() {
    let snap = snapshot(Rows {
        bodyweight: vec![(3, "2024-01-03", 80.0)],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());
    // A string id never matches an integer origin id.
    store.seed(BW, [remote_record("manual", json!("3")), RemoteRecord::new("empty", Map::new())]);

    let report = engine(store.clone(), &snap.path).run().await.unwrap();

    let bodyweight = report.kind(EntityKind::Bodyweight).unwrap();
    assert_eq!(bodyweight.untracked, 2);
    assert_eq!(bodyweight.created, 1);
}

#[tokio::test]
async fn test_multi_page_index_is_complete() {
    let snap = snapshot(Rows {
        bodyweight: (1..=7).map(|id| (id, "2024-01-01", 80.0)).collect(),
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());
    store.seed(BW, (1..=6).map(|id| remote_record(&format!("r{}", id), json!(id))));

    let mut config = config();
    config.page_size = 2;
    let engine = SyncEngine::new(config, store.clone(), Arc::new(LocalBackup::new(&snap.path)));

    let report = engine.run().await.unwrap();

    assert_eq!(report.kind(EntityKind::Bodyweight).unwrap().remote_records, 6);
    assert_eq!(store.create_calls(), 1);
    assert_eq!(origin_ids(&store, BW), (1..=7).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_page_failure_aborts_run_without_creates() {
    let snap = snapshot(Rows {
        bodyweight: (1..=6).map(|id| (id, "2024-01-01", 80.0)).collect(),
        ..Rows::default()
    })
    .await;
    let inner = InMemoryRemoteStore::new();
    inner.seed(BW, (1..=5).map(|id| remote_record(&format!("r{}", id), json!(id))));
    let store = Arc::new(FlakyRemoteStore {
        fail_query_on: Some(2),
        ..FlakyRemoteStore::new(inner)
    });

    let mut config = config();
    config.page_size = 2;
    let engine = SyncEngine::new(config, store.clone(), Arc::new(LocalBackup::new(&snap.path)));

    let err = engine.run().await.unwrap_err();

    match err {
        SyncError::Index(IndexError::Page { kind, page, source }) => {
            assert_eq!(kind, EntityKind::Bodyweight);
            assert_eq!(page, 2);
            assert!(matches!(source, RemoteError::Transport(_)));
        }
        other => panic!("expected page error, got {:?}", other),
    }
    assert_eq!(engine.state(), EngineState::Failed);
    assert_eq!(store.inner.create_calls(), 0);
}

#[tokio::test]
async fn test_unresolved_exercise_aborts_run() {
    let snap = snapshot(Rows {
        exercises: vec![(1, "Squat")],
        workouts: vec![(10, "2024-01-01", 99, 50.0, 5)],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());

    let err = engine(store.clone(), &snap.path).run().await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Mapping(MappingError::UnresolvedReference {
            kind: EntityKind::Workout,
            origin_id: 10,
            reference_kind: EntityKind::Exercise,
            reference_id: 99,
        })
    ));
    assert_eq!(store.len(WO), 0);
    // Kinds before the failure stay synced.
    assert_eq!(origin_ids(&store, EX), vec![1]);
}

#[tokio::test]
async fn test_exercises_from_earlier_runs_resolve() {
    let snap = snapshot(Rows {
        exercises: vec![(1, "Squat")],
        workouts: vec![(10, "2024-01-01", 1, 20.0, 3)],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());
    store.seed(EX, [remote_record("squat-page", json!(1))]);

    let report = engine(store.clone(), &snap.path).run_kinds(&[EntityKind::Workout]).await.unwrap();

    assert_eq!(report.kinds.len(), 1);
    assert_eq!(store.create_calls(), 1);
    let workout = find(&store, WO, 10);
    assert_eq!(workout.properties["Exercise"]["relation"][0]["id"], json!("squat-page"));
}

#[tokio::test]
async fn test_exercises_created_this_run_resolve_when_query_lags() {
    let snap = snapshot(Rows {
        exercises: vec![(2, "Bench")],
        workouts: vec![(10, "2024-01-01", 2, 100.0, 5)],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(FlakyRemoteStore {
        hide_created: true,
        ..FlakyRemoteStore::new(InMemoryRemoteStore::new())
    });

    let report = engine(store.clone(), &snap.path).run().await.unwrap();

    assert!(report.is_success());
    let bench = find(&store.inner, EX, 2);
    let workout = find(&store.inner, WO, 10);
    assert_eq!(workout.properties["Exercise"]["relation"][0]["id"], json!(bench.id));
}

#[tokio::test]
async fn test_missing_backup_fails_before_remote_calls() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemoryRemoteStore::new());

    let err = engine(store.clone(), &dir.path().join("nope.fitnotes")).run().await.unwrap_err();

    assert!(matches!(err, SyncError::Acquisition(AcquisitionError::NotFound(_))));
    assert_eq!(store.query_calls(), 0);
}

#[tokio::test]
async fn test_invalid_config_fails_before_any_io() {
    let snap = snapshot(sample_rows()).await;
    let store = Arc::new(InMemoryRemoteStore::new());
    let mut config = config();
    config.page_size = 0;

    let engine = SyncEngine::new(config, store.clone(), Arc::new(LocalBackup::new(&snap.path)));
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, SyncError::Config(_)));
    assert_eq!(store.query_calls(), 0);
}

#[tokio::test]
async fn test_downloaded_snapshot_removed_after_run() {
    let snap = snapshot(sample_rows()).await;
    let source = Arc::new(DownloadedBackup {
        from: snap.path.clone(),
        handed_out: Mutex::new(None),
    });
    let store = Arc::new(InMemoryRemoteStore::new());
    let engine = SyncEngine::new(config(), store, source.clone());

    engine.run().await.unwrap();

    let path = source.handed_out.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
    assert!(snap.path.exists(), "caller-owned snapshots are left alone");
}

#[tokio::test]
async fn test_state_transitions_are_observable() {
    let snap = snapshot(Rows {
        bodyweight: vec![(1, "2024-01-01", 80.0)],
        ..Rows::default()
    })
    .await;
    let store = Arc::new(InMemoryRemoteStore::new());
    let engine = engine(store, &snap.path);
    let rx = engine.state_receiver();

    assert_eq!(*rx.borrow(), EngineState::NotStarted);
    engine.run().await.unwrap();
    assert_eq!(*rx.borrow(), EngineState::Complete);
}

#[tokio::test]
async fn test_remote_calls_happen_in_their_phase() {
    use EngineState::{Creating, Diffing, Indexing};
    use EntityKind::{Bodyweight, Exercise, Workout};

    let snap = snapshot(sample_rows()).await;
    let store = Arc::new(StateRecordingStore::new());
    let engine = engine(store.clone(), &snap.path);
    store.watch(&engine);

    engine.run().await.unwrap();

    // Workout re-reads the exercise collection while diffing.
    assert_eq!(
        store.seen(),
        vec![
            Indexing(Bodyweight),
            Creating(Bodyweight),
            Indexing(Exercise),
            Creating(Exercise),
            Indexing(Workout),
            Diffing(Workout),
            Creating(Workout),
        ]
    );
    assert_eq!(engine.state(), EngineState::Complete);
}

#[tokio::test]
async fn test_synced_run_skips_reference_lookup() {
    use EngineState::Indexing;
    use EntityKind::{Bodyweight, Exercise, Workout};

    let snap = snapshot(sample_rows()).await;
    let store = Arc::new(StateRecordingStore::new());
    engine(store.clone(), &snap.path).run().await.unwrap();

    let engine = engine(store.clone(), &snap.path);
    store.watch(&engine);
    let report = engine.run().await.unwrap();

    assert_eq!(report.created(), 0);
    assert_eq!(store.seen(), vec![Indexing(Bodyweight), Indexing(Exercise), Indexing(Workout)]);
    assert_eq!(engine.state(), EngineState::Complete);
}

#[tokio::test]
async fn test_every_phase_is_published_in_order() {
    use EngineState::{AcquiringSource, Complete, Creating, Diffing, Indexing, NotStarted};
    use EntityKind::{Bodyweight, Exercise, Workout};

    let snap = snapshot(sample_rows()).await;
    let store = Arc::new(InMemoryRemoteStore::new());
    let engine = engine(store, &snap.path);
    let mut rx = engine.state_receiver();

    let published = Arc::new(Mutex::new(vec![*rx.borrow_and_update()]));
    let recorder = tokio::spawn({
        let published = published.clone();
        async move {
            while rx.changed().await.is_ok() {
                published.lock().unwrap().push(*rx.borrow_and_update());
            }
        }
    });

    engine.run().await.unwrap();
    drop(engine);
    recorder.await.unwrap();

    // The channel keeps only the latest value, so states may coalesce; the
    // ones that are seen must follow the phase order.
    let expected = [
        NotStarted,
        AcquiringSource,
        Indexing(Bodyweight),
        Diffing(Bodyweight),
        Creating(Bodyweight),
        Indexing(Exercise),
        Diffing(Exercise),
        Creating(Exercise),
        Indexing(Workout),
        Diffing(Workout),
        Creating(Workout),
        Complete,
    ];
    let published = published.lock().unwrap().clone();
    let mut cursor = expected.iter();
    for state in &published {
        assert!(
            cursor.any(|s| s == state),
            "{:?} out of order in {:?}",
            state,
            published
        );
    }
    assert_eq!(published.first(), Some(&NotStarted));
    assert_eq!(published.last(), Some(&Complete));
}
