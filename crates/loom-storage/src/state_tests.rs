use super::*;
use loom_core::{AuditKind, Plan, PlanId, PlanStatus};

fn plan(file: &str, status: PlanStatus) -> Plan {
    let mut p = Plan::new(PlanId::new(file), "desc".into(), "plan/x".into(), 1_000);
    p.status = status;
    p
}

#[test]
fn register_inserts_plan() {
    let mut state = MaterializedState::new();
    state.apply_event(&StoreEvent::PlanRegistered {
        plan: plan("2026-01-01-x", PlanStatus::Ready),
    });
    assert_eq!(state.plan("2026-01-01-x").unwrap().status, PlanStatus::Ready);
}

#[test]
fn register_is_idempotent() {
    let mut state = MaterializedState::new();
    let event = StoreEvent::PlanRegistered {
        plan: plan("2026-01-01-x", PlanStatus::Ready),
    };
    state.apply_event(&event);
    state.apply_event(&StoreEvent::PlanStatusSet {
        plan_file: PlanId::new("2026-01-01-x"),
        status: PlanStatus::Planning,
        updated_at_ms: 2_000,
    });
    // Replaying the original registration must not clobber later state.
    state.apply_event(&event);
    assert_eq!(
        state.plan("2026-01-01-x").unwrap().status,
        PlanStatus::Planning
    );
}

#[test]
fn status_set_updates_existing_plan_only() {
    let mut state = MaterializedState::new();
    state.apply_event(&StoreEvent::PlanStatusSet {
        plan_file: PlanId::new("missing"),
        status: PlanStatus::Planning,
        updated_at_ms: 2_000,
    });
    assert!(state.plan("missing").is_none());
}

#[test]
fn rename_moves_the_entry_and_keeps_status() {
    let mut state = MaterializedState::new();
    state.apply_event(&StoreEvent::PlanRegistered {
        plan: plan("2026-01-01-old", PlanStatus::Implementing),
    });
    state.apply_event(&StoreEvent::PlanRenamed {
        old_file: PlanId::new("2026-01-01-old"),
        new_file: PlanId::new("2026-01-02-new"),
        updated_at_ms: 3_000,
    });
    assert!(state.plan("2026-01-01-old").is_none());
    let renamed = state.plan("2026-01-02-new").unwrap();
    assert_eq!(renamed.status, PlanStatus::Implementing);
    assert_eq!(renamed.id.as_str(), "2026-01-02-new");
}

#[test]
fn audit_events_accumulate_in_order() {
    let mut state = MaterializedState::new();
    for i in 0..3 {
        state.apply_event(&StoreEvent::AuditAppended {
            event: loom_core::AuditEvent::info(
                AuditKind::PlanCreated,
                "proj",
                format!("event {i}"),
                i,
            ),
        });
    }
    assert_eq!(state.audit.len(), 3);
    assert_eq!(state.audit[2].message, "event 2");
}

#[test]
fn permission_remembered_is_deduplicated() {
    let mut state = MaterializedState::new();
    let key = loom_core::CacheKey::new("/opt/*", "allow writes under /opt");
    state.apply_event(&StoreEvent::PermissionRemembered { key: key.clone() });
    state.apply_event(&StoreEvent::PermissionRemembered { key: key.clone() });
    assert_eq!(state.permission_cache.len(), 1);
}
