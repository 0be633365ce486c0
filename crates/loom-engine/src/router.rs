// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Router / update loop. Single-threaded, the sole mutator of model
//! state: it owns the per-plan bookkeeping maps (`wave_orchestrators`,
//! `planner_prompted`, `pending_review_feedback`, `permission_handled`)
//! and the single active confirmation overlay.
//!
//! `Router::handle_event` is a pure-ish `Event -> Vec<Effect>`
//! transformer: aside from briefly locking the shared
//! `InstanceSupervisor` for cheap, non-I/O bookkeeping (registering a
//! freshly constructed `Instance`, reading one's fields), every
//! operation that touches tmux, git, or the filesystem is represented as
//! an `Effect` for `crate::executor::Executor` to carry out on a
//! background task and report back as an `Event` — the router itself
//! never awaits a subprocess or network call, so the loop never blocks
//! on I/O.
//!
//! TUI rendering (the overlay's `Render`/`HandleKey` capability set) is
//! out of scope for this core; `PendingConfirm` only carries the data a
//! host UI would need, not behavior.

use crate::config::{plan_markdown_path, Config};
use crate::instance_supervisor::InstanceSupervisor;
use crate::prompt_builders::{build_coder_prompt, build_planner_prompt, build_resume_prompt, build_reviewer_prompt};
use crate::spawn::{spawn_ad_hoc_opts, spawn_chat_about_plan_opts, spawn_plan_agent_opts, SpawnStage};
use crate::wave_orchestrator::WaveOrchestrator;
use loom_adapters::{SessionAdapter, WorktreeAdapter};
use loom_core::{
    transition, AgentType, AuditEvent, AuditKind, CacheKey, Clock, Effect, Event, IllegalTransition, InstanceId,
    MetadataResult, Plan, PlanEvent, PlanId, PlanStatus, PermissionChoice, SentinelSignal, SignalEvent, Task, Wave,
    WaveOrchestratorState,
};
use loom_storage::{AuditLog, PermissionCache, PlanStore};
use parking_lot::Mutex as SyncMutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How long, after a user dismisses a wave-advance dialog with Esc
/// (rather than answering it), the router waits before presenting it
/// again for the same plan.
const WAVE_CONFIRM_COOLDOWN_MS: u64 = 10_000;

/// Scans an `ImplementFinished` sentinel body for a `failed:` line (e.g.
/// `failed: 2, 4`) and returns the task numbers on it. Absent or
/// unrecognized bodies mean no failures, matching a solo/ad-hoc coder
/// that never reports per-task outcomes.
fn parse_failed_task_numbers(body: Option<&str>) -> Vec<u32> {
    let Some(body) = body else { return Vec::new() };
    for line in body.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("failed:") {
            let offset = trimmed.len() - rest.len();
            return trimmed[offset..]
                .split(|c: char| !c.is_ascii_digit())
                .filter_map(|s| s.parse::<u32>().ok())
                .collect();
        }
    }
    Vec::new()
}

/// `WaveCompleted`/`WaveFailed` bookkeeping row for a wave that just
/// settled (every task `Complete` or `Failed`), independent of whether a
/// dialog is presented for it. A free function, not a `Router` method, so
/// it can be called while a `WaveOrchestrator` borrowed out of
/// `self.wave_orchestrators` is still live.
fn wave_settled_audit(project: String, plan_file: PlanId, wave_number: u32, has_failures: bool, now_ms: u64) -> Effect {
    let (kind, message) = if has_failures {
        (AuditKind::WaveFailed, format!("wave {wave_number} of {plan_file} finished with failed tasks"))
    } else {
        (AuditKind::WaveCompleted, format!("wave {wave_number} of {plan_file} completed"))
    };
    Effect::EmitAudit {
        event: AuditEvent::info(kind, project, message, now_ms)
            .with_plan(plan_file)
            .with_wave(wave_number),
    }
}

/// The single active (or queued) confirmation dialog. Data only — the
/// host UI owns rendering and key handling; out of scope here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    /// "push changes from '<instance>'?"
    PushChangesFromCoder { instance_id: InstanceId, plan_file: PlanId },
    /// "plan ready — start implementation?"
    PlannerReady { plan_file: PlanId, planner_instance: InstanceId },
    /// Wave-advance dialog: three-way (retry/next/abort) if the
    /// completed wave had failures, binary (advance/cancel) otherwise.
    WaveAdvance { plan_file: PlanId, has_failures: bool },
    /// An uncached permission prompt, shown until answered.
    Permission {
        instance_id: InstanceId,
        pattern: String,
        description: String,
    },
    /// "proceed anyway?" — another plan in the same topic is already
    /// implementing.
    ConcurrencyGate {
        plan_file: PlanId,
        topic: String,
        conflict_plan: PlanId,
    },
}

/// The user's answer to a wave-advance dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveAdvanceChoice {
    /// Three-way dialog only: reset failed tasks and respawn the wave.
    Retry,
    /// Three-way dialog only: abandon the plan, same as `StartOver`.
    Abort,
    /// Either dialog: move on (to the next wave, or to review if this
    /// was the last one).
    Advance,
    /// Either dialog: dismiss without acting; starts the cooldown.
    Cancel,
}

pub struct Router<S: SessionAdapter, W: WorktreeAdapter, C: Clock> {
    project: String,
    config: Config,
    clock: C,
    plan_store: PlanStore,
    audit: AuditLog,
    permission_cache: Arc<SyncMutex<PermissionCache>>,
    supervisor: Arc<Mutex<InstanceSupervisor<S, W, C>>>,

    wave_orchestrators: HashMap<PlanId, WaveOrchestrator>,
    planner_prompted: HashMap<PlanId, bool>,
    pending_review_feedback: HashMap<PlanId, String>,
    /// Idempotency guard for auto-approved permission prompts: the key
    /// last auto-answered for an instance, while the prompt is still
    /// showing.
    permission_handled: HashMap<InstanceId, CacheKey>,
    /// Guards the coder-exit push prompt so a repeated tick observing the
    /// same dead instance doesn't re-enqueue the confirmation.
    prompted_coder_exit: HashSet<InstanceId>,
    wave_confirm_dismissed_at: HashMap<PlanId, u64>,

    pending_confirm: Option<PendingConfirm>,
    confirm_queue: VecDeque<PendingConfirm>,
}

impl<S: SessionAdapter, W: WorktreeAdapter, C: Clock> Router<S, W, C> {
    pub fn new(
        project: impl Into<String>,
        config: Config,
        clock: C,
        plan_store: PlanStore,
        audit: AuditLog,
        permission_cache: Arc<SyncMutex<PermissionCache>>,
        supervisor: Arc<Mutex<InstanceSupervisor<S, W, C>>>,
    ) -> Self {
        Self {
            project: project.into(),
            config,
            clock,
            plan_store,
            audit,
            permission_cache,
            supervisor,
            wave_orchestrators: HashMap::new(),
            planner_prompted: HashMap::new(),
            pending_review_feedback: HashMap::new(),
            permission_handled: HashMap::new(),
            prompted_coder_exit: HashSet::new(),
            wave_confirm_dismissed_at: HashMap::new(),
            pending_confirm: None,
            confirm_queue: VecDeque::new(),
        }
    }

    pub fn plan_store(&self) -> &PlanStore {
        &self.plan_store
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn pending_confirm(&self) -> Option<&PendingConfirm> {
        self.pending_confirm.as_ref()
    }

    pub fn wave_orchestrator(&self, plan_file: &PlanId) -> Option<&WaveOrchestrator> {
        self.wave_orchestrators.get(plan_file)
    }

    pub fn pending_review_feedback(&self, plan_file: &PlanId) -> Option<&str> {
        self.pending_review_feedback.get(plan_file).map(String::as_str)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- the one entry point for polled/async-reported events --------

    /// Apply one `Event` and return the `Effect`s the caller must
    /// dispatch (typically to `crate::executor::Executor`).
    pub async fn handle_event(&mut self, event: Event) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        match event {
            Event::Tick => vec![Effect::RunMetadataTick],
            Event::MetadataTickCompleted { result } => self.handle_metadata_result(result, now_ms).await,
            Event::InstanceStarted { instance_id, error } => {
                if let Some(err) = error {
                    vec![Effect::EmitAudit {
                        event: AuditEvent::error(
                            AuditKind::Error,
                            self.project.clone(),
                            format!("instance {instance_id} failed to start: {err}"),
                            now_ms,
                        ),
                    }]
                } else {
                    vec![]
                }
            }
            Event::PushCompleted { instance_id, plan_file, error } => {
                self.handle_push_completed(instance_id, plan_file, error, now_ms).await
            }
            Event::PrCreated { plan_file, url, error } => {
                let message = match (&url, &error) {
                    (Some(url), _) => format!("opened PR for {plan_file}: {url}"),
                    (None, Some(err)) => format!("PR creation for {plan_file} failed: {err}"),
                    (None, None) => format!("PR creation for {plan_file} completed"),
                };
                vec![Effect::EmitAudit {
                    event: AuditEvent::info(AuditKind::PrCreated, self.project.clone(), message, now_ms)
                        .with_plan(plan_file),
                }]
            }
            Event::PermissionResponseSent { instance_id, error } => {
                if error.is_some() {
                    // Sending the response failed: clear the guard so the
                    // prompt may re-present.
                    self.permission_handled.remove(&instance_id);
                }
                vec![]
            }
            Event::PlanBranchReset { plan_file, error } => {
                let level_kind = if error.is_some() { AuditKind::Error } else { AuditKind::PlanTransition };
                let message = match error {
                    Some(err) => format!("branch reset for {plan_file} failed: {err}"),
                    None => format!("branch reset for {plan_file}"),
                };
                vec![Effect::EmitAudit {
                    event: AuditEvent::info(level_kind, self.project.clone(), message, now_ms).with_plan(plan_file),
                }]
            }
            Event::Shutdown => vec![],
        }
    }

    async fn handle_push_completed(
        &mut self,
        instance_id: InstanceId,
        plan_file: PlanId,
        error: Option<String>,
        now_ms: u64,
    ) -> Vec<Effect> {
        if let Some(err) = error {
            return vec![Effect::EmitAudit {
                event: AuditEvent::error(
                    AuditKind::Error,
                    self.project.clone(),
                    format!("push for {plan_file} ({instance_id}) failed: {err}"),
                    now_ms,
                )
                .with_plan(plan_file),
            }];
        }
        let mut effects = vec![Effect::EmitAudit {
            event: AuditEvent::info(AuditKind::GitPush, self.project.clone(), format!("pushed {instance_id}"), now_ms)
                .with_plan(plan_file.clone()),
        }];
        effects.extend(self.on_coder_finished_wave(&plan_file, false, &[], now_ms).await);
        effects
    }

    // ---- the fixed fold order of one metadata tick --------------------

    async fn handle_metadata_result(&mut self, result: MetadataResult, now_ms: u64) -> Vec<Effect> {
        let mut effects = Vec::new();

        // Step 1: fold per-instance results, deliver any queued prompt
        // now that the agent is idle. CachedContent/TmuxAlive/PromptDetected
        // were already folded into the Instance record by the executor
        // (it owns the supervisor during the poll); this step only adds
        // the prompt-delivery side effect the router is responsible for.
        {
            let mut sup = self.supervisor.lock().await;
            for r in &result.per_instance {
                if r.idle_prompt_detected {
                    if let Some(text) = sup.take_queued_prompt(&r.instance_id) {
                        effects.push(Effect::SendPrompt { instance_id: r.instance_id.clone(), text });
                    }
                }
            }
        }

        // Step 2: permission prompt detection.
        for r in &result.per_instance {
            match &r.permission_prompt {
                Some(pm) => {
                    let key = CacheKey::new(pm.pattern.clone(), &pm.description);
                    let cached = self.permission_cache.lock().is_allowed_always(&key);
                    if cached {
                        if self.permission_handled.get(&r.instance_id) != Some(&key) {
                            effects.push(Effect::SendPermissionResponse {
                                instance_id: r.instance_id.clone(),
                                choice: PermissionChoice::AllowOnce,
                            });
                            self.permission_handled.insert(r.instance_id.clone(), key);
                        }
                    } else {
                        self.try_present_permission(r.instance_id.clone(), pm.pattern.clone(), pm.description.clone());
                    }
                }
                None => {
                    self.permission_handled.remove(&r.instance_id);
                }
            }
        }

        // Step 3: process signals. FSM transitions apply even while a
        // dialog is already showing; only presenting a *new* dialog is
        // deferred (queued) in that case.
        for signal in result.signals {
            effects.extend(self.apply_signal(signal, now_ms).await);
        }

        // Step 4 (freshness): every read below goes through
        // `self.plan_store`, never `result.plan_snapshot`, so a plan
        // transitioned earlier in this very fold is never seen stale.

        // Step 5: coder exit detection.
        for r in &result.per_instance {
            if r.tmux_alive {
                continue;
            }
            let instance = {
                let sup = self.supervisor.lock().await;
                sup.get(&r.instance_id).cloned()
            };
            let Some(instance) = instance else { continue };
            if instance.agent_type != AgentType::Coder || instance.solo_agent {
                continue;
            }
            let Some(plan_file) = instance.plan_file.clone() else { continue };
            let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { continue };
            if plan.status.normalized() != PlanStatus::Implementing {
                continue;
            }
            if !self.prompted_coder_exit.insert(r.instance_id.clone()) {
                continue;
            }
            self.try_present(PendingConfirm::PushChangesFromCoder { instance_id: r.instance_id.clone(), plan_file });
        }

        // Step 6: wave completion.
        let plan_files: Vec<PlanId> = self.wave_orchestrators.keys().cloned().collect();
        for plan_file in plan_files {
            let needs = self.wave_orchestrators.get(&plan_file).map(|o| o.needs_confirm()).unwrap_or(false);
            if !needs {
                continue;
            }
            if let Some(orchestrator) = self.wave_orchestrators.get_mut(&plan_file) {
                orchestrator.reset_confirm();
            }
            let cooling_down = self
                .wave_confirm_dismissed_at
                .get(&plan_file)
                .map(|t| now_ms.saturating_sub(*t) < WAVE_CONFIRM_COOLDOWN_MS)
                .unwrap_or(false);
            if cooling_down {
                continue;
            }
            let has_failures = self.wave_orchestrators.get(&plan_file).map(|o| o.failed_task_count() > 0).unwrap_or(false);
            self.try_present(PendingConfirm::WaveAdvance { plan_file, has_failures });
        }

        effects
    }

    // ---- signal reactions ----------------------------------------------

    async fn apply_signal(&mut self, signal: SentinelSignal, now_ms: u64) -> Vec<Effect> {
        let Some(plan) = self.plan_store.entry(signal.plan_file.as_str()) else {
            return vec![Effect::EmitAudit {
                event: AuditEvent::error(
                    AuditKind::Error,
                    self.project.clone(),
                    format!("signal for unknown plan {}", signal.plan_file),
                    now_ms,
                ),
            }];
        };
        let plan_event: PlanEvent = signal.event.into();
        let new_status = match transition(plan.status, plan_event) {
            Ok(status) => status,
            Err(err) => return vec![self.audit_illegal(&err, now_ms)],
        };

        match signal.event {
            SignalEvent::PlannerFinished => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                let mut effects = vec![self.audit_transition(&plan, plan.status, new_status, now_ms)];
                let planner_instance = {
                    let sup = self.supervisor.lock().await;
                    sup.for_plan(&plan.id).find(|i| i.agent_type == AgentType::Planner).map(|i| i.id.clone())
                };
                if let Some(planner_instance) = planner_instance {
                    self.try_present(PendingConfirm::PlannerReady { plan_file: plan.id.clone(), planner_instance });
                }
                effects
            }
            SignalEvent::ImplementFinished => {
                let solo = {
                    let sup = self.supervisor.lock().await;
                    sup.for_plan(&plan.id).any(|i| i.agent_type == AgentType::Coder && i.solo_agent)
                };
                let failed_tasks = parse_failed_task_numbers(signal.body.as_deref());
                self.on_coder_finished_wave(&plan.id, solo, &failed_tasks, now_ms).await
            }
            SignalEvent::ReviewApproved => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                vec![self.audit_transition(&plan, plan.status, new_status, now_ms)]
            }
            SignalEvent::ReviewChangesRequested => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                let mut effects = vec![self.audit_transition(&plan, plan.status, new_status, now_ms)];
                effects.extend(
                    self.respawn_coder_with_feedback(&plan, signal.body.as_deref().unwrap_or(""), now_ms).await,
                );
                effects
            }
            SignalEvent::StartOver => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                let mut effects = vec![self.audit_transition(&plan, plan.status, new_status, now_ms)];
                effects.extend(self.cleanup_plan_instances(&plan).await);
                effects
            }
            SignalEvent::Cancel => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                vec![Effect::EmitAudit {
                    event: AuditEvent::info(
                        AuditKind::PlanCancelled,
                        self.project.clone(),
                        format!("plan {} cancelled", plan.id),
                        now_ms,
                    )
                    .with_plan(plan.id.clone()),
                }]
            }
            SignalEvent::Reopen => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                vec![self.audit_transition(&plan, plan.status, new_status, now_ms)]
            }
        }
    }

    /// Shared by a solo agent's `ImplementFinished` sentinel and a
    /// non-solo coder's confirmed push. Marks the current wave's tasks
    /// complete or, for any task number named in `failed_tasks`, failed.
    /// A solo agent is not wave-gated (its completion is user-driven) so
    /// it fast-forwards straight through to `reviewing`, while a
    /// non-solo coder's remaining waves go through the normal
    /// wave-advance confirmation on the next tick.
    async fn on_coder_finished_wave(
        &mut self,
        plan_file: &PlanId,
        solo: bool,
        failed_tasks: &[u32],
        now_ms: u64,
    ) -> Vec<Effect> {
        let Some(orchestrator) = self.wave_orchestrators.get_mut(plan_file) else {
            // No parsed plan body (e.g. an ad-hoc/solo run with no waves):
            // treat as a single-wave plan that just finished.
            let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
            return self.finish_implementation(&plan, now_ms).await;
        };
        let wave_number = orchestrator.current_wave_number();
        let wave_tasks = orchestrator.current_wave_tasks();
        let wave_failed = wave_tasks.iter().any(|t| failed_tasks.contains(&t.number));
        for task in &wave_tasks {
            if failed_tasks.contains(&task.number) {
                orchestrator.mark_task_failed(task.number);
            } else {
                orchestrator.mark_task_complete(task.number);
            }
        }
        let mut effects = vec![wave_settled_audit(self.project.clone(), plan_file.clone(), wave_number, wave_failed, now_ms)];
        if solo {
            while orchestrator.state() != WaveOrchestratorState::AllComplete {
                if orchestrator.start_next_wave().is_none() {
                    break;
                }
                let next_wave_number = orchestrator.current_wave_number();
                for task in orchestrator.current_wave_tasks() {
                    orchestrator.mark_task_complete(task.number);
                }
                effects.push(wave_settled_audit(self.project.clone(), plan_file.clone(), next_wave_number, false, now_ms));
            }
            orchestrator.reset_confirm();
            let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return effects };
            effects.extend(self.finish_implementation(&plan, now_ms).await);
            return effects;
        }
        effects
    }


    // ---- user-issued actions (no sentinel form) ------------------------

    /// `PlanStart`: ready -> planning, spawns a planner instance.
    pub async fn request_plan_start(&mut self, plan_file: &PlanId) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
        match transition(plan.status, PlanEvent::PlanStart) {
            Ok(new_status) => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                let mut effects = vec![self.audit_transition(&plan, plan.status, new_status, now_ms)];
                effects.extend(self.spawn_planner(&plan, now_ms).await);
                effects
            }
            Err(err) => vec![self.audit_illegal(&err, now_ms)],
        }
    }

    /// `ImplementStart`: ready -> implementing, gated by the one
    /// cross-plan concurrency invariant.
    pub async fn request_implement_start(&mut self, plan_file: &PlanId) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
        if let Some(topic) = plan.topic.clone() {
            let (running, conflict) = self.plan_store.has_running_coder_in_topic(&topic, &plan.id);
            if running {
                self.try_present(PendingConfirm::ConcurrencyGate {
                    plan_file: plan.id.clone(),
                    topic,
                    conflict_plan: conflict.unwrap_or_else(|| PlanId::new("")),
                });
                return vec![];
            }
        }
        self.do_implement_start(&plan, now_ms).await
    }

    /// `Cancel`: any status -> cancelled.
    pub fn request_cancel(&mut self, plan_file: &PlanId) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
        match transition(plan.status, PlanEvent::Cancel) {
            Ok(new_status) => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                vec![Effect::EmitAudit {
                    event: AuditEvent::info(
                        AuditKind::PlanCancelled,
                        self.project.clone(),
                        format!("plan {} cancelled", plan.id),
                        now_ms,
                    )
                    .with_plan(plan.id.clone()),
                }]
            }
            Err(err) => vec![self.audit_illegal(&err, now_ms)],
        }
    }

    /// `Reopen`: cancelled -> ready.
    pub fn request_reopen(&mut self, plan_file: &PlanId) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
        match transition(plan.status, PlanEvent::Reopen) {
            Ok(new_status) => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                vec![self.audit_transition(&plan, plan.status, new_status, now_ms)]
            }
            Err(err) => vec![self.audit_illegal(&err, now_ms)],
        }
    }

    /// `Rename(oldFile, newName)`: generates a new filename from today's
    /// date and the slugified `new_name`, moves the plan's markdown file
    /// on disk, and rebinds every live instance's `plan_file` (and this
    /// router's own per-plan bookkeeping maps) to the new key. Fails with
    /// an audited error and no mutation if the target name already
    /// names a different plan.
    pub async fn request_rename(&mut self, old_file: &PlanId, new_name: &str) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let new_file = match self.plan_store.rename(old_file, new_name, now_ms) {
            Ok(new_file) => new_file,
            Err(err) => {
                return vec![Effect::EmitAudit {
                    event: AuditEvent::error(
                        AuditKind::Error,
                        self.project.clone(),
                        format!("rename of {old_file} failed: {err}"),
                        now_ms,
                    )
                    .with_plan(old_file.clone()),
                }];
            }
        };
        if new_file == *old_file {
            return vec![];
        }

        let repo_root = self.supervisor.lock().await.repo_root().to_path_buf();
        let old_path = plan_markdown_path(&repo_root, &self.config.plans_dir, old_file.as_str());
        let new_path = plan_markdown_path(&repo_root, &self.config.plans_dir, new_file.as_str());
        let mut effects = Vec::new();
        if old_path.exists() {
            if let Err(err) = std::fs::rename(&old_path, &new_path) {
                effects.push(Effect::EmitAudit {
                    event: AuditEvent::error(
                        AuditKind::Error,
                        self.project.clone(),
                        format!(
                            "renamed plan {old_file} -> {new_file} in the store, but moving {} failed: {err}",
                            old_path.display()
                        ),
                        now_ms,
                    )
                    .with_plan(new_file.clone()),
                });
            }
        }

        self.supervisor.lock().await.rebind_plan_file(old_file, &new_file);
        if let Some(feedback) = self.pending_review_feedback.remove(old_file) {
            self.pending_review_feedback.insert(new_file.clone(), feedback);
        }
        if let Some(orchestrator) = self.wave_orchestrators.remove(old_file) {
            self.wave_orchestrators.insert(new_file.clone(), orchestrator);
        }
        if let Some(prompted) = self.planner_prompted.remove(old_file) {
            self.planner_prompted.insert(new_file.clone(), prompted);
        }
        if let Some(dismissed) = self.wave_confirm_dismissed_at.remove(old_file) {
            self.wave_confirm_dismissed_at.insert(new_file.clone(), dismissed);
        }

        effects.push(Effect::EmitAudit {
            event: AuditEvent::info(
                AuditKind::PlanTransition,
                self.project.clone(),
                format!("renamed plan {old_file} -> {new_file}"),
                now_ms,
            )
            .with_plan(new_file),
        });
        effects
    }

    /// `SpawnAdHocAgent(name, branch, workPath)`: an unbound coder, not
    /// associated with any plan's PFSM. The caller is responsible for
    /// having the worktree at `work_path` already checked out on
    /// `branch`.
    pub async fn request_spawn_ad_hoc(&mut self, name: &str, branch: String, work_path: PathBuf) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let id = InstanceId::new(name);
        let opts = spawn_ad_hoc_opts(id.clone(), branch, work_path, self.config.program.clone());
        self.supervisor.lock().await.register(opts);
        vec![
            Effect::StartInstance { instance_id: id },
            Effect::EmitAudit {
                event: AuditEvent::info(
                    AuditKind::AgentSpawned,
                    self.project.clone(),
                    format!("spawned ad-hoc agent {name}"),
                    now_ms,
                ),
            },
        ]
    }

    /// `SpawnChatAboutPlan(planFile, question)`: an ephemeral
    /// planner-style instance scoped to `plan_file` for context, never
    /// driving that plan's PFSM transitions.
    pub async fn request_spawn_chat_about_plan(&mut self, plan_file: &PlanId, question: String) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
        let repo_root = self.supervisor.lock().await.repo_root().to_path_buf();
        let id = InstanceId::new(format!("{}-chat-{now_ms}", plan.id.as_str()));
        let opts = spawn_chat_about_plan_opts(id.clone(), &plan, question, repo_root, self.config.program.clone());
        self.supervisor.lock().await.register(opts);
        vec![
            Effect::StartInstance { instance_id: id },
            Effect::EmitAudit {
                event: AuditEvent::info(
                    AuditKind::AgentSpawned,
                    self.project.clone(),
                    format!("spawned chat agent for {}", plan.id),
                    now_ms,
                )
                .with_plan(plan.id.clone()),
            },
        ]
    }

    /// `StartOver`, issued directly by the user rather than a sentinel.
    pub async fn request_start_over(&mut self, plan_file: &PlanId) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
        match transition(plan.status, PlanEvent::StartOver) {
            Ok(new_status) => {
                let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
                let mut effects = vec![self.audit_transition(&plan, plan.status, new_status, now_ms)];
                effects.extend(self.cleanup_plan_instances(&plan).await);
                effects
            }
            Err(err) => vec![self.audit_illegal(&err, now_ms)],
        }
    }

    // ---- resolving the active dialog ---------------------------------

    /// Resolve a binary confirm/cancel dialog (push-changes, planner-ready,
    /// or the concurrency gate).
    pub async fn resolve_confirm(&mut self, accepted: bool) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        let Some(confirm) = self.pending_confirm.take() else {
            return vec![];
        };
        let effects = match confirm {
            PendingConfirm::PushChangesFromCoder { instance_id, plan_file } => {
                self.prompted_coder_exit.remove(&instance_id);
                if accepted {
                    vec![Effect::PushChanges {
                        instance_id,
                        message: format!("{plan_file}: automated push from orchestrator"),
                        force: false,
                    }]
                } else {
                    vec![]
                }
            }
            PendingConfirm::PlannerReady { plan_file, planner_instance } => {
                self.planner_prompted.insert(plan_file.clone(), true);
                let mut effects = vec![Effect::AbortInstance { instance_id: planner_instance }];
                if accepted {
                    effects.extend(self.request_implement_start(&plan_file).await);
                }
                effects
            }
            PendingConfirm::ConcurrencyGate { plan_file, .. } => {
                if accepted {
                    if let Some(plan) = self.plan_store.entry(plan_file.as_str()) {
                        self.do_implement_start(&plan, now_ms).await
                    } else {
                        vec![]
                    }
                } else {
                    vec![]
                }
            }
            // These two resolve through their own dedicated methods; if
            // one somehow ends up here, just drop it rather than misfire.
            PendingConfirm::WaveAdvance { .. } | PendingConfirm::Permission { .. } => vec![],
        };
        self.pop_confirm_queue();
        effects
    }

    /// Resolve the wave-advance dialog (a three-way or binary choice
    /// depending on whether the completed wave had failures).
    pub async fn resolve_wave_advance(&mut self, plan_file: &PlanId, choice: WaveAdvanceChoice) -> Vec<Effect> {
        let now_ms = self.clock.epoch_ms();
        if matches!(&self.pending_confirm, Some(PendingConfirm::WaveAdvance { plan_file: p, .. }) if p == plan_file) {
            self.pending_confirm = None;
            self.pop_confirm_queue();
        }

        let Some(plan) = self.plan_store.entry(plan_file.as_str()) else { return vec![] };
        let program = self.config.program.clone();

        match choice {
            WaveAdvanceChoice::Abort => self.request_start_over(plan_file).await,
            WaveAdvanceChoice::Retry => {
                let Some(orchestrator) = self.wave_orchestrators.get_mut(plan_file) else { return vec![] };
                let retried = orchestrator.retry_failed_tasks();
                if retried.is_empty() {
                    return vec![];
                }
                let wave_number = orchestrator.current_wave_number();
                let tasks = orchestrator.current_wave_tasks();
                self.respawn_wave_coder(&plan, wave_number, tasks, &program, now_ms).await
            }
            WaveAdvanceChoice::Advance => {
                let state = self.wave_orchestrators.get(plan_file).map(|o| o.state());
                match state {
                    Some(WaveOrchestratorState::AllComplete) => self.finish_implementation(&plan, now_ms).await,
                    _ => {
                        let Some(orchestrator) = self.wave_orchestrators.get_mut(plan_file) else { return vec![] };
                        match orchestrator.start_next_wave() {
                            Some(tasks) => {
                                let wave_number = orchestrator.current_wave_number();
                                self.respawn_wave_coder(&plan, wave_number, tasks, &program, now_ms).await
                            }
                            None => self.finish_implementation(&plan, now_ms).await,
                        }
                    }
                }
            }
            WaveAdvanceChoice::Cancel => {
                self.wave_confirm_dismissed_at.insert(plan_file.clone(), now_ms);
                vec![]
            }
        }
    }

    /// Esc-dismiss (not an explicit "No"): starts the re-presentation
    /// cooldown without recording a choice.
    pub fn dismiss_wave_confirm(&mut self, plan_file: &PlanId) {
        let now_ms = self.clock.epoch_ms();
        self.wave_confirm_dismissed_at.insert(plan_file.clone(), now_ms);
        if matches!(&self.pending_confirm, Some(PendingConfirm::WaveAdvance { plan_file: p, .. }) if p == plan_file) {
            self.pending_confirm = None;
            self.pop_confirm_queue();
        }
    }

    /// Resolve an uncached permission prompt.
    pub fn resolve_permission(
        &mut self,
        instance_id: InstanceId,
        pattern: String,
        description: String,
        choice: PermissionChoice,
    ) -> Vec<Effect> {
        if matches!(&self.pending_confirm, Some(PendingConfirm::Permission { instance_id: id, .. }) if *id == instance_id)
        {
            self.pending_confirm = None;
        }
        self.pop_confirm_queue();

        let now_ms = self.clock.epoch_ms();
        let mut effects = vec![Effect::SendPermissionResponse { instance_id: instance_id.clone(), choice }];
        if choice == PermissionChoice::AllowAlways {
            let key = CacheKey::new(pattern, &description);
            let _ = self.permission_cache.lock().remember(key.clone());
            self.permission_handled.insert(instance_id.clone(), key);
        }
        effects.push(Effect::EmitAudit {
            event: AuditEvent::info(
                AuditKind::PermissionAnswered,
                self.project.clone(),
                format!("{instance_id}: {description}"),
                now_ms,
            ),
        });
        effects
    }

    // ---- internals ----------------------------------------------------

    fn try_present(&mut self, confirm: PendingConfirm) {
        if self.pending_confirm.is_none() {
            self.pending_confirm = Some(confirm);
        } else {
            self.confirm_queue.push_back(confirm);
        }
    }

    /// Permission overlays never queue across instances: an uncached
    /// prompt opens the overlay unless one is already open for another
    /// instance — i.e. skip, don't queue, and let a later tick retry
    /// once the current one clears.
    fn try_present_permission(&mut self, instance_id: InstanceId, pattern: String, description: String) {
        match &self.pending_confirm {
            Some(PendingConfirm::Permission { instance_id: current, .. }) if *current == instance_id => {}
            Some(PendingConfirm::Permission { .. }) => {}
            Some(_) => self.confirm_queue.push_back(PendingConfirm::Permission { instance_id, pattern, description }),
            None => self.pending_confirm = Some(PendingConfirm::Permission { instance_id, pattern, description }),
        }
    }

    fn pop_confirm_queue(&mut self) {
        if self.pending_confirm.is_none() {
            self.pending_confirm = self.confirm_queue.pop_front();
        }
    }

    fn audit_transition(&self, plan: &Plan, from: PlanStatus, to: PlanStatus, now_ms: u64) -> Effect {
        Effect::EmitAudit {
            event: AuditEvent::info(AuditKind::PlanTransition, self.project.clone(), format!("{from} -> {to}"), now_ms)
                .with_plan(plan.id.clone()),
        }
    }

    fn audit_illegal(&self, err: &IllegalTransition, now_ms: u64) -> Effect {
        Effect::EmitAudit {
            event: AuditEvent::error(AuditKind::FsmError, self.project.clone(), format!("{err}"), now_ms),
        }
    }

    async fn spawn_planner(&mut self, plan: &Plan, now_ms: u64) -> Vec<Effect> {
        let mut sup = self.supervisor.lock().await;
        if sup.has_active_binding(&plan.id, AgentType::Planner) {
            return vec![];
        }
        let id = InstanceId::new(format!("{}-planner", plan.id.as_str()));
        let prompt = build_planner_prompt(plan);
        let working_path = sup.repo_root().to_path_buf();
        let opts = spawn_plan_agent_opts(id.clone(), plan, SpawnStage::Plan, prompt, working_path, self.config.program.clone());
        sup.register(opts);
        drop(sup);
        vec![
            Effect::StartInstance { instance_id: id.clone() },
            Effect::EmitAudit {
                event: AuditEvent::info(
                    AuditKind::AgentSpawned,
                    self.project.clone(),
                    format!("spawned planner for {}", plan.id),
                    now_ms,
                )
                .with_plan(plan.id.clone()),
            },
        ]
    }

    /// Parse the plan's markdown body and spawn wave 1's coder. A hard
    /// parse error (no `## Wave` headers) reverts the plan to `planning`
    /// rather than failing the request outright.
    async fn do_implement_start(&mut self, plan: &Plan, now_ms: u64) -> Vec<Effect> {
        let repo_root = self.supervisor.lock().await.repo_root().to_path_buf();
        let path = plan_markdown_path(&repo_root, &self.config.plans_dir, plan.id.as_str());
        let body = match std::fs::read_to_string(&path) {
            Ok(body) => body,
            Err(err) => {
                let _ = self.plan_store.set_status(&plan.id, PlanStatus::Planning, now_ms);
                return vec![Effect::EmitAudit {
                    event: AuditEvent::error(
                        AuditKind::Error,
                        self.project.clone(),
                        format!("plan {} has no readable body ({err}); reverted to planning", plan.id),
                        now_ms,
                    )
                    .with_plan(plan.id.clone()),
                }];
            }
        };
        let waves = match loom_planfile::parse(&body) {
            Ok(waves) => waves,
            Err(err) => {
                let _ = self.plan_store.set_status(&plan.id, PlanStatus::Planning, now_ms);
                return vec![Effect::EmitAudit {
                    event: AuditEvent::error(
                        AuditKind::Error,
                        self.project.clone(),
                        format!("plan {} failed to parse ({err}); reverted to planning", plan.id),
                        now_ms,
                    )
                    .with_plan(plan.id.clone()),
                }];
            }
        };

        let new_status = match transition(plan.status, PlanEvent::ImplementStart) {
            Ok(status) => status,
            Err(err) => return vec![self.audit_illegal(&err, now_ms)],
        };
        let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
        let mut effects = vec![self.audit_transition(plan, plan.status, new_status, now_ms)];

        let mut orchestrator = WaveOrchestrator::new(waves);
        let Some(tasks) = orchestrator.start_next_wave() else {
            self.wave_orchestrators.insert(plan.id.clone(), orchestrator);
            return effects;
        };
        let wave_number = orchestrator.current_wave_number();
        self.wave_orchestrators.insert(plan.id.clone(), orchestrator);

        effects.push(Effect::EmitAudit {
            event: AuditEvent::info(AuditKind::WaveStarted, self.project.clone(), format!("wave {wave_number} started"), now_ms)
                .with_plan(plan.id.clone()),
        });
        effects.extend(self.spawn_wave_coder(plan, wave_number, tasks, &self.config.program.clone(), now_ms).await);
        effects
    }

    async fn spawn_wave_coder(&mut self, plan: &Plan, wave_number: u32, tasks: Vec<Task>, program: &str, now_ms: u64) -> Vec<Effect> {
        let mut sup = self.supervisor.lock().await;
        let id = InstanceId::new(format!("{}-coder", plan.id.as_str()));
        let wave = Wave { number: wave_number, tasks: tasks.clone() };
        let prompt = build_coder_prompt(plan, &wave, &tasks);
        let working_path = sup.worktree_path(&plan.branch);
        let opts = spawn_plan_agent_opts(id.clone(), plan, SpawnStage::Implement, prompt, working_path, program.to_string());
        sup.register(opts);
        drop(sup);
        vec![
            Effect::StartInstance { instance_id: id.clone() },
            Effect::EmitAudit {
                event: AuditEvent::info(
                    AuditKind::AgentSpawned,
                    self.project.clone(),
                    format!("spawned coder for {} wave {wave_number}", plan.id),
                    now_ms,
                )
                .with_plan(plan.id.clone()),
            },
        ]
    }

    /// Abort the previous wave's coder and spawn a fresh one scoped to
    /// `tasks` (used by both retry and wave-advance).
    async fn respawn_wave_coder(&mut self, plan: &Plan, wave_number: u32, tasks: Vec<Task>, program: &str, now_ms: u64) -> Vec<Effect> {
        let old_id = InstanceId::new(format!("{}-coder", plan.id.as_str()));
        let mut effects = vec![Effect::AbortInstance { instance_id: old_id }];
        effects.extend(self.spawn_wave_coder(plan, wave_number, tasks, program, now_ms).await);
        effects
    }

    async fn finish_implementation(&mut self, plan: &Plan, now_ms: u64) -> Vec<Effect> {
        let new_status = match transition(plan.status, PlanEvent::ImplementFinished) {
            Ok(status) => status,
            Err(err) => return vec![self.audit_illegal(&err, now_ms)],
        };
        let _ = self.plan_store.set_status(&plan.id, new_status, now_ms);
        let mut effects = vec![self.audit_transition(plan, plan.status, new_status, now_ms)];
        effects.extend(self.spawn_reviewer(plan, now_ms).await);
        effects
    }

    async fn spawn_reviewer(&mut self, plan: &Plan, now_ms: u64) -> Vec<Effect> {
        let mut sup = self.supervisor.lock().await;
        if sup.has_active_binding(&plan.id, AgentType::Reviewer) {
            return vec![];
        }
        let id = InstanceId::new(format!("{}-reviewer", plan.id.as_str()));
        let prompt = build_reviewer_prompt(plan);
        let working_path = sup.worktree_path(&plan.branch);
        let opts = spawn_plan_agent_opts(id.clone(), plan, SpawnStage::Review, prompt, working_path, self.config.program.clone());
        sup.register(opts);
        drop(sup);
        vec![
            Effect::StartInstance { instance_id: id.clone() },
            Effect::EmitAudit {
                event: AuditEvent::info(
                    AuditKind::AgentSpawned,
                    self.project.clone(),
                    format!("spawned reviewer for {}", plan.id),
                    now_ms,
                )
                .with_plan(plan.id.clone()),
            },
        ]
    }

    async fn respawn_coder_with_feedback(&mut self, plan: &Plan, feedback: &str, now_ms: u64) -> Vec<Effect> {
        self.pending_review_feedback.insert(plan.id.clone(), feedback.to_string());
        let mut sup = self.supervisor.lock().await;
        let reviewer = sup.for_plan(&plan.id).find(|i| i.agent_type == AgentType::Reviewer).map(|i| i.id.clone());
        let new_id = InstanceId::new(format!("{}-coder-{now_ms}", plan.id.as_str()));
        let prompt = build_resume_prompt(plan, feedback);
        let working_path = sup.worktree_path(&plan.branch);
        let opts = spawn_plan_agent_opts(new_id.clone(), plan, SpawnStage::Implement, prompt, working_path, self.config.program.clone());
        sup.register(opts);
        drop(sup);

        let mut effects = Vec::new();
        if let Some(reviewer_id) = reviewer {
            effects.push(Effect::AbortInstance { instance_id: reviewer_id });
        }
        effects.push(Effect::StartInstance { instance_id: new_id });
        effects.push(Effect::EmitAudit {
            event: AuditEvent::info(
                AuditKind::AgentSpawned,
                self.project.clone(),
                format!("respawned coder for {} with reviewer feedback", plan.id),
                now_ms,
            )
            .with_plan(plan.id.clone()),
        });
        effects
    }

    async fn cleanup_plan_instances(&mut self, plan: &Plan) -> Vec<Effect> {
        let ids: Vec<InstanceId> = {
            let sup = self.supervisor.lock().await;
            sup.for_plan(&plan.id).map(|i| i.id.clone()).collect()
        };
        let mut effects: Vec<Effect> = ids.into_iter().map(|instance_id| Effect::AbortInstance { instance_id }).collect();
        effects.push(Effect::ResetPlanBranch { plan_file: plan.id.clone(), branch: plan.branch.clone() });
        self.wave_orchestrators.remove(&plan.id);
        self.planner_prompted.remove(&plan.id);
        self.pending_review_feedback.remove(&plan.id);
        effects
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
