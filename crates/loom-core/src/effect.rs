// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects the router dispatches to background workers. Every operation
//! that may touch disk, tmux, or the network is represented as one of
//! these rather than called inline, so the update loop never blocks.

use crate::audit::AuditEvent;
use crate::instance::InstanceId;
use crate::plan::PlanId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A side effect the router wants performed asynchronously. The worker
/// that executes it reports back as a typed `Event` (see `event.rs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Effect {
    /// Start a freshly constructed instance: allocate worktree (coder and
    /// reviewer only), create the tmux session, launch the program.
    StartInstance { instance_id: InstanceId },
    /// Stop tmux without removing the worktree.
    PauseInstance { instance_id: InstanceId },
    /// Restart tmux for a paused instance.
    ResumeInstance { instance_id: InstanceId },
    /// Stop tmux, keep the instance record (soft kill).
    KillInstance { instance_id: InstanceId },
    /// Kill plus remove the worktree and drop the record.
    AbortInstance { instance_id: InstanceId },
    /// Append text to the pane plus a carriage return.
    SendPrompt { instance_id: InstanceId, text: String },
    /// Raw keystroke forward for focus mode.
    SendKey { instance_id: InstanceId, bytes: Vec<u8> },
    /// Scripted keystroke sequence answering a detected permission prompt.
    SendPermissionResponse {
        instance_id: InstanceId,
        choice: PermissionChoice,
    },
    /// Push the worktree's committed changes upstream.
    PushChanges {
        instance_id: InstanceId,
        message: String,
        force: bool,
    },
    /// Open a pull request for the plan's branch.
    CreatePr {
        plan_file: PlanId,
        branch: String,
        title: String,
        body: String,
        commit_message: String,
    },
    /// Hard-reset a plan's branch back to its base (used by `StartOver`).
    ResetPlanBranch { plan_file: PlanId, branch: String },
    /// Record an audit row. Best-effort; failures never propagate.
    EmitAudit { event: AuditEvent },
    /// Arm the periodic metadata tick.
    SetTimer {
        id: &'static str,
        #[serde(with = "duration_ms")]
        duration: Duration,
    },
    /// Poll every live instance (pane capture, tmux-alive, prompt
    /// detection), drain pending sentinels, and snapshot the Plan Store.
    /// Reported back as `Event::MetadataTickCompleted`.
    RunMetadataTick,
}

/// Choice sent in response to a detected permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionChoice {
    AllowOnce,
    AllowAlways,
    Reject,
}

impl Effect {
    /// Effect name for structured log spans.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::StartInstance { .. } => "start_instance",
            Effect::PauseInstance { .. } => "pause_instance",
            Effect::ResumeInstance { .. } => "resume_instance",
            Effect::KillInstance { .. } => "kill_instance",
            Effect::AbortInstance { .. } => "abort_instance",
            Effect::SendPrompt { .. } => "send_prompt",
            Effect::SendKey { .. } => "send_key",
            Effect::SendPermissionResponse { .. } => "send_permission_response",
            Effect::PushChanges { .. } => "push_changes",
            Effect::CreatePr { .. } => "create_pr",
            Effect::ResetPlanBranch { .. } => "reset_plan_branch",
            Effect::EmitAudit { .. } => "emit_audit",
            Effect::SetTimer { .. } => "set_timer",
            Effect::RunMetadataTick => "run_metadata_tick",
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        duration.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
