// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::instance_supervisor::InstanceSupervisor;
use crate::signal_channel::SignalChannel;
use loom_adapters::{FakeSessionAdapter, FakeWorktreeAdapter};
use loom_core::{AgentType, AuditEvent, FakeClock, InstanceId, InstanceOpts, PermissionChoice, PlanId};
use loom_storage::{AuditLog, PlanStore, Store};
use parking_lot::Mutex as SyncMutex;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn audit_log() -> (AuditLog, PlanStore, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(SyncMutex::new(Store::open(dir.path()).expect("open store")));
    (AuditLog::new(store.clone()), PlanStore::new(store), dir)
}

fn coder_opts(id: &str, plan: &str) -> InstanceOpts {
    InstanceOpts {
        id: InstanceId::new(id),
        working_path: PathBuf::from("/repo"),
        program: "claude".to_string(),
        branch: "plan/auth".to_string(),
        plan_file: Some(PlanId::new(plan)),
        agent_type: AgentType::Coder,
        solo_agent: false,
        skip_permissions: false,
        queued_prompt: None,
    }
}

fn executor() -> (
    Executor<FakeSessionAdapter, FakeWorktreeAdapter, FakeClock>,
    InstanceId,
    TempDir,
) {
    let mut sup = InstanceSupervisor::new(
        FakeSessionAdapter::new(),
        FakeWorktreeAdapter::new(),
        FakeClock::new(),
        "/repo",
    );
    let id = sup.register(coder_opts("coder-1", "auth"));
    let (audit, plan_store, dir) = audit_log();
    let signals = Arc::new(SignalChannel::new(dir.path()));
    let executor = Executor::new(Arc::new(Mutex::new(sup)), audit, signals, plan_store);
    (executor, id, dir)
}

#[tokio::test]
async fn start_instance_reports_instance_started() {
    let (executor, id, _dir) = executor();
    let event = executor.execute(Effect::StartInstance { instance_id: id.clone() }).await;
    match event {
        Some(Event::InstanceStarted { instance_id, error }) => {
            assert_eq!(instance_id, id);
            assert!(error.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn pause_instance_has_no_completion_event() {
    let (executor, id, _dir) = executor();
    executor.execute(Effect::StartInstance { instance_id: id.clone() }).await;
    let event = executor.execute(Effect::PauseInstance { instance_id: id }).await;
    assert!(event.is_none());
}

#[tokio::test]
async fn send_permission_response_reports_completion() {
    let (executor, id, _dir) = executor();
    executor.execute(Effect::StartInstance { instance_id: id.clone() }).await;
    let event = executor
        .execute(Effect::SendPermissionResponse {
            instance_id: id.clone(),
            choice: PermissionChoice::AllowOnce,
        })
        .await;
    match event {
        Some(Event::PermissionResponseSent { instance_id, error }) => {
            assert_eq!(instance_id, id);
            assert!(error.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn push_changes_resolves_plan_file_from_instance_binding() {
    let (executor, id, _dir) = executor();
    executor.execute(Effect::StartInstance { instance_id: id.clone() }).await;
    let event = executor
        .execute(Effect::PushChanges {
            instance_id: id,
            message: "wave 1 done".to_string(),
            force: false,
        })
        .await;
    match event {
        Some(Event::PushCompleted { plan_file, error, .. }) => {
            assert_eq!(plan_file, PlanId::new("auth"));
            assert!(error.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn push_changes_for_unknown_instance_reports_error() {
    let (executor, _id, _dir) = executor();
    let event = executor
        .execute(Effect::PushChanges {
            instance_id: InstanceId::new("ghost"),
            message: "go".to_string(),
            force: false,
        })
        .await;
    match event {
        Some(Event::PushCompleted { error: Some(_), .. }) => {}
        other => panic!("expected an error completion, got {other:?}"),
    }
}

#[tokio::test]
async fn create_pr_reports_url_from_adapter() {
    let (executor, _id, _dir) = executor();
    let event = executor
        .execute(Effect::CreatePr {
            plan_file: PlanId::new("auth"),
            branch: "plan/auth".to_string(),
            title: "Add OAuth login".to_string(),
            body: "wave summary".to_string(),
            commit_message: "implement oauth".to_string(),
        })
        .await;
    match event {
        Some(Event::PrCreated { url: Some(_), error: None, .. }) => {}
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn reset_plan_branch_reports_completion() {
    let (executor, _id, _dir) = executor();
    let event = executor
        .execute(Effect::ResetPlanBranch {
            plan_file: PlanId::new("auth"),
            branch: "plan/auth".to_string(),
        })
        .await;
    match event {
        Some(Event::PlanBranchReset { error, .. }) => assert!(error.is_none()),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn emit_audit_has_no_completion_event() {
    let (executor, _id, _dir) = executor();
    let event = executor
        .execute(Effect::EmitAudit {
            event: AuditEvent::info(loom_core::AuditKind::AgentSpawned, "demo project", "spawned a coder", 1_000),
        })
        .await;
    assert!(event.is_none());
}

#[tokio::test]
async fn run_metadata_tick_polls_started_instances_and_snapshots_plans() {
    let (executor, id, _dir) = executor();
    executor.execute(Effect::StartInstance { instance_id: id.clone() }).await;
    executor.plan_store.register(PlanId::new("auth"), "add oauth".into(), "plan/auth".into(), 1_000).unwrap();

    let event = executor.execute(Effect::RunMetadataTick).await;
    match event {
        Some(Event::MetadataTickCompleted { result }) => {
            assert_eq!(result.per_instance.len(), 1);
            assert_eq!(result.per_instance[0].instance_id, id);
            assert_eq!(result.plan_snapshot.len(), 1);
            assert!(result.signals.is_empty());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
