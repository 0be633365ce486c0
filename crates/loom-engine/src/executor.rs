// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatches `Effect`s produced by the router to the `InstanceSupervisor`
//! and `WorktreeAdapter`, reporting results back as `Event`s. The router
//! is the only thread that mutates plan/wave state, so every effect here
//! either has no corresponding `Event` (the router re-observes the result
//! on the next metadata tick) or reports success/failure through the
//! `error` field of its completion event rather than an `Err` that would
//! have to be threaded back out.

use crate::instance_supervisor::InstanceSupervisor;
use crate::signal_channel::SignalChannel;
use loom_adapters::{SessionAdapter, WorktreeAdapter};
use loom_core::{Clock, Effect, Event, MetadataResult, PlanId};
use loom_storage::{AuditLog, PlanStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Runs `Effect`s against a shared `InstanceSupervisor`. Cheap to clone;
/// the router hands one to each spawned background task.
#[derive(Clone)]
pub struct Executor<S: SessionAdapter, W: WorktreeAdapter, C: Clock> {
    supervisor: Arc<Mutex<InstanceSupervisor<S, W, C>>>,
    audit: AuditLog,
    signals: Arc<SignalChannel>,
    plan_store: PlanStore,
}

impl<S: SessionAdapter, W: WorktreeAdapter, C: Clock> Executor<S, W, C> {
    pub fn new(
        supervisor: Arc<Mutex<InstanceSupervisor<S, W, C>>>,
        audit: AuditLog,
        signals: Arc<SignalChannel>,
        plan_store: PlanStore,
    ) -> Self {
        Self {
            supervisor,
            audit,
            signals,
            plan_store,
        }
    }

    pub fn supervisor(&self) -> &Arc<Mutex<InstanceSupervisor<S, W, C>>> {
        &self.supervisor
    }

    /// Execute one effect, returning the `Event` the router should fold
    /// back in (`None` for fire-and-forget effects with no completion
    /// event — `PauseInstance`, `SendKey`, etc. — whose outcome is
    /// re-observed on the next metadata tick).
    pub async fn execute(&self, effect: Effect) -> Option<Event> {
        let name = effect.name();
        let span = tracing::info_span!("effect", effect = name);
        let _guard = span.enter();
        match effect {
            Effect::StartInstance { instance_id } => {
                let result = self.supervisor.lock().await.start(&instance_id).await;
                let error = result.err().map(|e| e.to_string());
                if let Some(err) = &error {
                    warn!(instance = %instance_id, error = %err, "start_instance failed");
                }
                Some(Event::InstanceStarted { instance_id, error })
            }
            Effect::PauseInstance { instance_id } => {
                let result = self.supervisor.lock().await.pause(&instance_id).await;
                self.log_fire_and_forget(name, result);
                None
            }
            Effect::ResumeInstance { instance_id } => {
                let result = self.supervisor.lock().await.resume(&instance_id).await;
                self.log_fire_and_forget(name, result);
                None
            }
            Effect::KillInstance { instance_id } => {
                let result = self.supervisor.lock().await.kill(&instance_id).await;
                self.log_fire_and_forget(name, result);
                None
            }
            Effect::AbortInstance { instance_id } => {
                let result = self.supervisor.lock().await.abort(&instance_id).await;
                self.log_fire_and_forget(name, result);
                None
            }
            Effect::SendPrompt { instance_id, text } => {
                let result = self.supervisor.lock().await.send_prompt(&instance_id, &text).await;
                self.log_fire_and_forget(name, result);
                None
            }
            Effect::SendKey { instance_id, bytes } => {
                let result = self.supervisor.lock().await.send_key(&instance_id, &bytes).await;
                self.log_fire_and_forget(name, result);
                None
            }
            Effect::SendPermissionResponse { instance_id, choice } => {
                let result = self
                    .supervisor
                    .lock()
                    .await
                    .send_permission_response(&instance_id, choice)
                    .await;
                let error = result.err().map(|e| e.to_string());
                Some(Event::PermissionResponseSent { instance_id, error })
            }
            Effect::PushChanges { instance_id, message, force } => {
                let sup = self.supervisor.lock().await;
                let instance = sup.get(&instance_id).cloned();
                let Some(instance) = instance else {
                    drop(sup);
                    return Some(Event::PushCompleted {
                        instance_id,
                        plan_file: PlanId::new(String::new()),
                        error: Some("instance not found".to_string()),
                    });
                };
                let plan_file = instance.plan_file.clone().unwrap_or_else(|| PlanId::new(String::new()));
                let result = sup.push_changes(&instance.working_path, &message, force).await;
                drop(sup);
                let error = result.err().map(|e| e.to_string());
                if let Some(err) = &error {
                    warn!(instance = %instance_id, error = %err, "push_changes failed");
                }
                Some(Event::PushCompleted { instance_id, plan_file, error })
            }
            Effect::CreatePr {
                plan_file,
                branch,
                title,
                body,
                commit_message,
            } => {
                let sup = self.supervisor.lock().await;
                let worktree_path = sup.worktree_path(&branch);
                let result = sup.create_pr(&worktree_path, &title, &body, &commit_message).await;
                drop(sup);
                match result {
                    Ok(handle) => Some(Event::PrCreated {
                        plan_file,
                        url: Some(handle.url),
                        error: None,
                    }),
                    Err(err) => Some(Event::PrCreated {
                        plan_file,
                        url: None,
                        error: Some(err.to_string()),
                    }),
                }
            }
            Effect::ResetPlanBranch { plan_file, branch } => {
                let sup = self.supervisor.lock().await;
                let result = sup.reset_plan_branch(&branch).await;
                drop(sup);
                let error = result.err().map(|e| e.to_string());
                Some(Event::PlanBranchReset { plan_file, error })
            }
            Effect::EmitAudit { event } => {
                self.audit.emit(event);
                None
            }
            Effect::SetTimer { duration, .. } => {
                tokio::time::sleep(duration).await;
                Some(Event::Tick)
            }
            Effect::RunMetadataTick => Some(Event::MetadataTickCompleted {
                result: self.run_metadata_tick().await,
            }),
        }
    }

    /// The metadata tick worker: captures every live instance's pane,
    /// drains pending sentinels, and snapshots the Plan Store, returning
    /// one aggregated result for the router to fold.
    async fn run_metadata_tick(&self) -> MetadataResult {
        let sup = self.supervisor.lock().await;
        let mut per_instance = Vec::new();
        for id in sup.instance_ids() {
            if let Some(result) = sup.tick_instance(&id).await {
                per_instance.push(result);
            }
        }
        drop(sup);

        // Fold the pane observations into the stored instance records
        // before the router sees them (CachedContent/TmuxAlive/
        // PromptDetected bookkeeping).
        let mut sup = self.supervisor.lock().await;
        for result in &per_instance {
            sup.apply_tick_result(result);
        }
        drop(sup);

        let signals = match self.signals.drain().await {
            Ok(drain) => {
                for rejected in &drain.rejected {
                    warn!(file = %rejected.original_name, reason = %rejected.reason, "sentinel rejected");
                }
                drain.signals
            }
            Err(err) => {
                warn!(error = %err, "failed to drain signal channel");
                Vec::new()
            }
        };

        let plan_snapshot = self.plan_store.all();
        MetadataResult {
            per_instance,
            signals,
            plan_snapshot,
        }
    }

    fn log_fire_and_forget(&self, effect_name: &str, result: Result<(), crate::error::RuntimeError>) {
        if let Err(err) = result {
            warn!(effect = effect_name, error = %err, "effect failed; next tick will re-observe instance state");
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
