// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle management. Owns the master list of instances for
//! the active repo; the router drives it and never talks to
//! `SessionAdapter`/`WorktreeAdapter` directly.

use crate::error::RuntimeError;
use crate::permission_match::{detect_idle_prompt, detect_permission_prompt};
use loom_adapters::{PrHandle, SessionAdapter, WorktreeAdapter};
use loom_core::{
    AgentType, Clock, Instance, InstanceId, InstanceOpts, InstanceStatus, InstanceTickResult, PermissionChoice,
    PlanId,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Pane lines captured per poll; generous enough to catch a permission
/// prompt scrolled a few lines above the cursor.
const CAPTURE_LINES: u32 = 200;

/// Scripted keystroke sequence answering a detected permission prompt,
/// per program. All agents this orchestrator drives currently share one
/// numbered-choice menu; a program-specific override can be added here
/// without touching call sites.
fn permission_keystrokes(_program: &str, choice: PermissionChoice) -> &'static str {
    match choice {
        PermissionChoice::AllowOnce => "1",
        PermissionChoice::AllowAlways => "2",
        PermissionChoice::Reject => "3",
    }
}

pub struct InstanceSupervisor<S: SessionAdapter, W: WorktreeAdapter, C: Clock> {
    instances: HashMap<InstanceId, Instance>,
    sessions: S,
    worktrees: W,
    clock: C,
    repo_root: PathBuf,
}

impl<S: SessionAdapter, W: WorktreeAdapter, C: Clock> InstanceSupervisor<S, W, C> {
    pub fn new(sessions: S, worktrees: W, clock: C, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            instances: HashMap::new(),
            sessions,
            worktrees,
            clock,
            repo_root: repo_root.into(),
        }
    }

    pub fn worktree_path(&self, branch: &str) -> PathBuf {
        self.worktrees.worktree_path(&self.repo_root, branch)
    }

    pub fn get(&self, id: &InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn for_plan<'a>(&'a self, plan_file: &'a PlanId) -> impl Iterator<Item = &'a Instance> {
        self.instances
            .values()
            .filter(move |i| i.plan_file.as_ref() == Some(plan_file))
    }

    /// The one-instance-per-(plan, agent type) invariant: true if a
    /// non-paused instance of `agent_type` is already bound to
    /// `plan_file`.
    pub fn has_active_binding(&self, plan_file: &PlanId, agent_type: AgentType) -> bool {
        self.instances.values().any(|i| {
            i.plan_file.as_ref() == Some(plan_file)
                && i.agent_type == agent_type
                && i.status != InstanceStatus::Paused
        })
    }

    /// Pure insert (`NewInstance`): no side effects.
    pub fn register(&mut self, opts: InstanceOpts) -> InstanceId {
        let id = opts.id.clone();
        let instance = Instance::new(opts, self.clock.epoch_ms());
        self.instances.insert(id.clone(), instance);
        id
    }

    /// Register and immediately `start` a new instance.
    pub async fn register_and_start(&mut self, opts: InstanceOpts) -> Result<InstanceId, RuntimeError> {
        let id = self.register(opts);
        self.start(&id).await?;
        Ok(id)
    }

    /// Allocate a worktree (coder/reviewer only), create the tmux
    /// session, launch the program, and seed `queued_prompt`.
    pub async fn start(&mut self, id: &InstanceId) -> Result<(), RuntimeError> {
        let instance = self
            .instances
            .get(id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(id.as_str().to_string()))?
            .clone();

        let working_path = if instance.has_worktree() {
            self.worktrees
                .ensure_worktree(&self.repo_root, &instance.branch)
                .await?
        } else {
            instance.working_path.clone()
        };

        self.sessions
            .spawn(id.as_str(), &working_path, &instance.program, &[])
            .await?;

        if let Some(prompt) = instance.queued_prompt.clone() {
            self.sessions.send(id.as_str(), &prompt).await?;
            self.sessions.send_enter(id.as_str()).await?;
        }

        if let Some(record) = self.instances.get_mut(id) {
            record.working_path = working_path;
            record.status = InstanceStatus::Running;
            record.tmux_alive = true;
            record.last_tick_ms = self.clock.epoch_ms();
        }
        Ok(())
    }

    /// Stop tmux without removing the worktree.
    pub async fn pause(&mut self, id: &InstanceId) -> Result<(), RuntimeError> {
        self.sessions.kill(id.as_str()).await?;
        if let Some(record) = self.instances.get_mut(id) {
            record.status = InstanceStatus::Paused;
            record.tmux_alive = false;
        }
        Ok(())
    }

    /// Restart tmux for a paused instance.
    pub async fn resume(&mut self, id: &InstanceId) -> Result<(), RuntimeError> {
        let instance = self
            .instances
            .get(id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(id.as_str().to_string()))?
            .clone();
        self.sessions
            .spawn(id.as_str(), &instance.working_path, &instance.program, &[])
            .await?;
        if let Some(record) = self.instances.get_mut(id) {
            record.status = InstanceStatus::Running;
            record.tmux_alive = true;
        }
        Ok(())
    }

    /// Soft kill: stop tmux, keep the record.
    pub async fn kill(&mut self, id: &InstanceId) -> Result<(), RuntimeError> {
        self.sessions.kill(id.as_str()).await?;
        if let Some(record) = self.instances.get_mut(id) {
            record.status = InstanceStatus::Paused;
            record.tmux_alive = false;
        }
        Ok(())
    }

    /// Kill plus remove the worktree and drop the record.
    pub async fn abort(&mut self, id: &InstanceId) -> Result<(), RuntimeError> {
        let instance = self
            .instances
            .get(id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(id.as_str().to_string()))?
            .clone();
        let _ = self.sessions.kill(id.as_str()).await;
        if instance.has_worktree() {
            self.worktrees
                .remove_worktree(&self.repo_root, &instance.branch)
                .await?;
        }
        self.instances.remove(id);
        Ok(())
    }

    /// Append text to the tmux pane plus a carriage return.
    pub async fn send_prompt(&mut self, id: &InstanceId, text: &str) -> Result<(), RuntimeError> {
        self.sessions.send(id.as_str(), text).await?;
        self.sessions.send_enter(id.as_str()).await?;
        Ok(())
    }

    /// Raw keystroke forward, used by focus mode.
    pub async fn send_key(&mut self, id: &InstanceId, bytes: &[u8]) -> Result<(), RuntimeError> {
        let text = String::from_utf8_lossy(bytes);
        self.sessions.send_literal(id.as_str(), &text).await?;
        Ok(())
    }

    /// Scripted keystroke sequence answering a detected permission prompt.
    pub async fn send_permission_response(
        &mut self,
        id: &InstanceId,
        choice: PermissionChoice,
    ) -> Result<(), RuntimeError> {
        let program = self
            .instances
            .get(id)
            .map(|i| i.program.clone())
            .ok_or_else(|| RuntimeError::InstanceNotFound(id.as_str().to_string()))?;
        let keys = permission_keystrokes(&program, choice);
        self.sessions.send_literal(id.as_str(), keys).await?;
        self.sessions.send_enter(id.as_str()).await?;
        Ok(())
    }

    /// Ids of every currently tracked instance, snapshotted for the
    /// metadata tick to poll without holding the lock across each pane
    /// capture.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.instances.keys().cloned().collect()
    }

    /// Capture one instance's pane and detect a permission or idle
    /// prompt. `None` if the instance is no longer tracked.
    pub async fn tick_instance(&self, id: &InstanceId) -> Option<InstanceTickResult> {
        self.instances.get(id)?;
        let pane_content = self
            .sessions
            .capture_output(id.as_str(), CAPTURE_LINES)
            .await
            .unwrap_or_default();
        let tmux_alive = self.sessions.is_alive(id.as_str()).await.unwrap_or(false);
        let permission_prompt = detect_permission_prompt(&pane_content);
        let idle_prompt_detected = detect_idle_prompt(&pane_content);
        Some(InstanceTickResult {
            instance_id: id.clone(),
            pane_content,
            tmux_alive,
            permission_prompt,
            idle_prompt_detected,
        })
    }

    /// Fold a tick's observation into the stored record.
    pub fn apply_tick_result(&mut self, result: &InstanceTickResult) {
        if let Some(instance) = self.instances.get_mut(&result.instance_id) {
            instance.cached_content = Some(result.pane_content.clone());
            instance.tmux_alive = result.tmux_alive;
            instance.prompt_detected = result.idle_prompt_detected;
            instance.last_tick_ms = self.clock.epoch_ms();
        }
    }

    pub fn tmux_alive(&self, id: &InstanceId) -> bool {
        self.instances.get(id).map(|i| i.tmux_alive).unwrap_or(false)
    }

    /// Queue `text` for delivery the next time the instance is observed
    /// idle at a prompt. No I/O; the router delivers it via
    /// `Effect::SendPrompt` once the metadata tick reports idleness.
    pub fn queue_prompt(&mut self, id: &InstanceId, text: String) {
        if let Some(instance) = self.instances.get_mut(id) {
            instance.queued_prompt = Some(text);
            instance.awaiting_work = true;
        }
    }

    /// Take and clear a pending queued prompt, if any, marking the
    /// instance as no longer awaiting work.
    pub fn take_queued_prompt(&mut self, id: &InstanceId) -> Option<String> {
        let instance = self.instances.get_mut(id)?;
        instance.awaiting_work = false;
        instance.queued_prompt.take()
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Rebind every live instance's `plan_file` from `old` to `new`
    /// (used by `Rename`, which never touches a branch, worktree, or
    /// tmux session id).
    pub fn rebind_plan_file(&mut self, old: &PlanId, new: &PlanId) {
        for instance in self.instances.values_mut() {
            if instance.plan_file.as_ref() == Some(old) {
                instance.plan_file = Some(new.clone());
            }
        }
    }

    /// Push a worktree's committed changes upstream.
    pub async fn push_changes(&self, worktree_path: &Path, message: &str, force: bool) -> Result<(), RuntimeError> {
        self.worktrees
            .push_changes(worktree_path, message, force)
            .await
            .map_err(Into::into)
    }

    /// Open a pull request for a worktree's branch.
    pub async fn create_pr(
        &self,
        worktree_path: &Path,
        title: &str,
        body: &str,
        commit_message: &str,
    ) -> Result<PrHandle, RuntimeError> {
        self.worktrees
            .create_pr(worktree_path, title, body, commit_message)
            .await
            .map_err(Into::into)
    }

    /// Hard-reset a plan's branch back to its base.
    pub async fn reset_plan_branch(&self, branch: &str) -> Result<(), RuntimeError> {
        self.worktrees
            .reset_plan_branch(&self.repo_root, branch)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
#[path = "instance_supervisor_tests.rs"]
mod tests;
