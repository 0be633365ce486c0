//! Plan Store durability: state survives a process restart via WAL
//! replay, and survives one after an explicit checkpoint via the zstd
//! snapshot.

use loom_core::{PlanId, PlanStatus};
use loom_storage::{Store, StoreEvent};

fn register_event(file: &str, now_ms: u64) -> StoreEvent {
    let plan = loom_core::Plan::new(PlanId::new(file), "a plan".to_string(), "feature/x".to_string(), now_ms);
    StoreEvent::PlanRegistered { plan }
}

#[test]
fn state_survives_reopen_via_wal_replay() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut store = Store::open(dir.path()).unwrap();
        store.append(register_event("auth", 1_000)).unwrap();
        store
            .append(StoreEvent::PlanStatusSet {
                plan_file: PlanId::new("auth"),
                status: PlanStatus::Planning,
                updated_at_ms: 1_001,
            })
            .unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    let plan = store.state().plan("auth").expect("plan survived reopen");
    assert_eq!(plan.status, PlanStatus::Planning);
}

#[test]
fn checkpoint_truncates_wal_but_preserves_state_on_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut store = Store::open(dir.path()).unwrap();
        store.append(register_event("auth", 1_000)).unwrap();
        store.checkpoint().unwrap();

        let wal_path = dir.path().join("wal.jsonl");
        let wal_len_after_checkpoint = std::fs::metadata(&wal_path).map(|m| m.len()).unwrap_or(0);

        store
            .append(StoreEvent::PlanStatusSet {
                plan_file: PlanId::new("auth"),
                status: PlanStatus::Planning,
                updated_at_ms: 1_001,
            })
            .unwrap();

        // only the post-checkpoint event is in the WAL now, not the whole history
        let wal_len_after_second_append = std::fs::metadata(&wal_path).unwrap().len();
        assert!(wal_len_after_second_append > wal_len_after_checkpoint);
    }

    let store = Store::open(dir.path()).unwrap();
    let plan = store.state().plan("auth").expect("plan survived reopen");
    assert_eq!(plan.status, PlanStatus::Planning);
    assert!(store.snapshot_path().exists());

    // the on-disk snapshot is zstd-compressed, not plain JSON
    let raw = std::fs::read(store.snapshot_path()).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_err());
    let decompressed = zstd::decode_all(raw.as_slice()).expect("snapshot decompresses as zstd");
    let value: serde_json::Value = serde_json::from_slice(&decompressed).expect("decompressed snapshot is json");
    assert_eq!(value["seq"], 1);
}

#[test]
fn permission_cache_default_path_lives_under_the_config_dir() {
    let config_dir = dirs::config_dir().unwrap_or_else(std::env::temp_dir).join("loom");
    let path = loom_storage::default_permission_cache_path(&config_dir);
    assert_eq!(path, config_dir.join("permissions.json"));
}
