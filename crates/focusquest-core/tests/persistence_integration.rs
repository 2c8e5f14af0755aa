//! Snapshot persistence through the SQLite key-value store.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use focusquest_core::storage::DEFAULT_STATE_KEY;
use focusquest_core::{
    apply_with, AppState, BrainDumpEntry, Command, Commit, Database, FixedClock, KvStore,
    Priority, Project, SessionType, SettingsPatch, SharedStore, SnapshotStore, Subtask, Task,
    TaskPatch, TaskStatus, Theme, TimerState,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 7, 15, 30).unwrap() + Duration::milliseconds(250)
}

/// A state that touches every record type and temporal field.
fn busy_state() -> AppState {
    let clock = FixedClock(t0());
    let commands = vec![
        Command::AddProject {
            project: Project::new("p1", "Thesis", t0()),
        },
        Command::AddTask {
            task: Task::new("t1", "Outline", t0())
                .with_priority(Priority::High)
                .with_project("p1")
                .with_subtasks(vec![Subtask::new("s1", "intro", t0())]),
        },
        Command::AddTask {
            task: Task::new("t2", "Draft", t0()),
        },
        Command::UpdateTask {
            id: "t1".into(),
            patch: TaskPatch::status(TaskStatus::Completed),
        },
        Command::AddBrainDump {
            entry: BrainDumpEntry::capture("b1", "Ask about #funding", t0()),
        },
        Command::UpdateSettings {
            patch: SettingsPatch {
                theme: Some(Theme::Dark),
                focus_minutes: Some(50),
                ..SettingsPatch::default()
            },
        },
        Command::UpdateStreak {
            streak_days: 3,
            last_active_date: NaiveDate::from_ymd_opt(2026, 6, 1),
        },
        Command::StartTimer {
            session_type: SessionType::Focus,
            duration_minutes: 1,
            task_id: Some("t2".into()),
        },
    ];
    let mut state = AppState::default();
    for command in commands {
        state = apply_with(state, command, &clock).state;
    }
    for _ in 0..20 {
        state = apply_with(state, Command::Tick, &clock).state;
    }
    state
}

#[test]
fn save_then_load_round_trips() {
    let db = Arc::new(Database::open_memory().unwrap());
    let store = SnapshotStore::new(db, DEFAULT_STATE_KEY);
    let state = busy_state();

    store.save(&state).unwrap();
    let loaded = store.load().expect("snapshot present");
    assert_eq!(loaded, state);

    let task = loaded.task("t1").unwrap();
    assert_eq!(task.completed_at, Some(t0()));
    assert_eq!(
        loaded.progress.achievement("first-task").unwrap().earned_at,
        Some(t0())
    );
    assert_eq!(loaded.progress.last_active_date(), NaiveDate::from_ymd_opt(2026, 6, 1));
    assert_eq!(loaded.timer.time_left(), 40);
    assert!(loaded.timer.is_running());
}

#[test]
fn timestamps_are_stored_as_rfc3339_text() {
    let db = Arc::new(Database::open_memory().unwrap());
    let store = SnapshotStore::new(db.clone(), "k");
    store.save(&busy_state()).unwrap();

    let raw = db.get("k").unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let created = json["tasks"][0]["created_at"].as_str().unwrap();
    assert_eq!(created.parse::<DateTime<Utc>>().unwrap(), t0());
    assert_eq!(json["progress"]["last_active_date"], "2026-06-01");
}

#[test]
fn snapshot_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusquest.db");
    let state = busy_state();
    {
        let db = Arc::new(Database::open(&path).unwrap());
        SnapshotStore::new(db, DEFAULT_STATE_KEY).save(&state).unwrap();
    }
    let db = Arc::new(Database::open(&path).unwrap());
    let loaded = SnapshotStore::new(db, DEFAULT_STATE_KEY).load_or_default();
    assert_eq!(loaded, state);
}

#[test]
fn corrupt_snapshot_falls_back_to_default() {
    let db = Arc::new(Database::open_memory().unwrap());
    db.set(DEFAULT_STATE_KEY, r#"{"tasks": 12}"#).unwrap();
    let store = SnapshotStore::new(db, DEFAULT_STATE_KEY);
    assert_eq!(store.load_or_default(), AppState::default());
}

#[test]
fn loading_a_snapshot_replaces_state_without_awards() {
    let saved = busy_state();
    let clock = FixedClock(t0() + Duration::hours(1));
    let applied = apply_with(
        AppState::default(),
        Command::Load {
            state: Box::new(saved.clone()),
        },
        &clock,
    );
    assert_eq!(applied.state, saved);
    assert_eq!(
        applied.state.progress.total_points(),
        saved.progress.total_points()
    );
}

#[test]
fn second_connection_cannot_clobber_a_followed_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusquest.db");
    let follower_side = SharedStore::new(Arc::new(Database::open(&path).unwrap()), "state");
    let other_side = SharedStore::new(Arc::new(Database::open(&path).unwrap()), "state");

    let lease = follower_side.acquire("follower", t0()).unwrap().unwrap();
    let mut followed = follower_side.load().state;
    followed = apply_with(
        followed,
        Command::StartTimer {
            session_type: SessionType::Focus,
            duration_minutes: 25,
            task_id: None,
        },
        &FixedClock(t0()),
    )
    .state;
    follower_side.snapshots().save(&followed).unwrap();

    let loaded = other_side.load();
    let command = Command::AddTask {
        task: Task::new("late", "Added elsewhere", t0()),
    };
    let local = apply_with(loaded.state, command.clone(), &FixedClock(t0())).state;
    let outcome = other_side
        .commit(&local, loaded.revision, &[command, Command::StopTimer], t0())
        .unwrap();
    assert_eq!(outcome, Commit::Forwarded);
    assert!(follower_side.load().state.timer.is_running());

    for queued in lease.take_inbox().unwrap() {
        followed = apply_with(followed, queued, &FixedClock(t0())).state;
    }
    assert!(lease.release(&followed).unwrap().is_empty());

    let after = other_side.load().state;
    assert!(after.task("late").is_some());
    assert_eq!(after.timer.state(), TimerState::Idle);
}
