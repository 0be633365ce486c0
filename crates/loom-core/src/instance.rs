// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session identity and state as tracked by the Instance Supervisor.

use crate::plan::PlanId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Unique title of an instance within the process. Doubles as the tmux
    /// session name (prefixed, see `loom-adapters::session::tmux`).
    pub struct InstanceId;
}

/// What kind of agent a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Planner,
    Coder,
    Reviewer,
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentType::Planner => "planner",
            AgentType::Coder => "coder",
            AgentType::Reviewer => "reviewer",
        };
        write!(f, "{}", s)
    }
}

/// Point-in-time lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Loading,
    Ready,
    Running,
    Paused,
}

/// Construction-time options for a new instance. Mirrors the fields
/// `NewInstance` needs; it is a pure constructor with no side effects.
#[derive(Debug, Clone)]
pub struct InstanceOpts {
    pub id: InstanceId,
    pub working_path: PathBuf,
    pub program: String,
    pub branch: String,
    pub plan_file: Option<PlanId>,
    pub agent_type: AgentType,
    pub solo_agent: bool,
    pub skip_permissions: bool,
    pub queued_prompt: Option<String>,
}

/// A running (or about-to-run) agent session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub working_path: PathBuf,
    pub program: String,
    /// Assigned worktree branch; empty for planner/solo instances.
    pub branch: String,
    /// Binding to a plan; empty for ad-hoc instances.
    pub plan_file: Option<PlanId>,
    pub agent_type: AgentType,
    pub is_reviewer: bool,
    pub solo_agent: bool,
    pub skip_permissions: bool,
    pub status: InstanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,
    #[serde(default)]
    pub tmux_alive: bool,
    #[serde(default)]
    pub prompt_detected: bool,
    #[serde(default)]
    pub notified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_prompt: Option<String>,
    /// True while the instance is idle and ready to receive `queued_prompt`.
    #[serde(default)]
    pub awaiting_work: bool,
    #[serde(default)]
    pub implementation_complete: bool,
    pub created_at_ms: u64,
    #[serde(default)]
    pub last_tick_ms: u64,
}

impl Instance {
    /// Pure constructor. No tmux session or worktree is created here; that
    /// is the async `Start` operation's job (see `loom-engine::instance_supervisor`).
    pub fn new(opts: InstanceOpts, epoch_ms: u64) -> Self {
        Self {
            id: opts.id,
            working_path: opts.working_path,
            program: opts.program,
            branch: opts.branch,
            plan_file: opts.plan_file,
            agent_type: opts.agent_type,
            is_reviewer: opts.agent_type == AgentType::Reviewer,
            solo_agent: opts.solo_agent,
            skip_permissions: opts.skip_permissions,
            status: InstanceStatus::Loading,
            cached_content: None,
            tmux_alive: false,
            prompt_detected: false,
            notified: false,
            queued_prompt: opts.queued_prompt,
            awaiting_work: false,
            implementation_complete: false,
            created_at_ms: epoch_ms,
            last_tick_ms: epoch_ms,
        }
    }

    /// A planner never allocates a worktree and always runs on the default
    /// branch: `branch` is empty iff no worktree exists.
    pub fn has_worktree(&self) -> bool {
        !self.branch.is_empty()
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
