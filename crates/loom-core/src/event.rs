// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages the router receives: timer ticks and the results of
//! previously dispatched effects. The router is the only consumer; every
//! background worker reports back through one of these variants rather
//! than mutating shared state directly.

use crate::instance::InstanceId;
use crate::plan::{Plan, PlanId};
use crate::sentinel::SentinelSignal;
use serde::{Deserialize, Serialize};

/// A detected permission prompt: `{ pattern, description }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPromptMatch {
    pub pattern: String,
    pub description: String,
}

/// Per-instance result of one metadata-tick poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceTickResult {
    pub instance_id: InstanceId,
    pub pane_content: String,
    pub tmux_alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_prompt: Option<PermissionPromptMatch>,
    /// True when the agent is idle at a user-input prompt.
    #[serde(default)]
    pub idle_prompt_detected: bool,
}

/// Aggregated result of one metadata-tick worker run, handed to the
/// router atomically for a fixed fold order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResult {
    pub per_instance: Vec<InstanceTickResult>,
    pub signals: Vec<SentinelSignal>,
    /// Plan Store snapshot taken concurrently with the poll. The router
    /// must not trust this for a plan it just transitioned; it exists
    /// only to refresh plans nothing else touched this tick.
    pub plan_snapshot: Vec<Plan>,
}

/// Messages flowing into the single-threaded update loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The ~500ms timer fired; the router should spawn a metadata-tick
    /// worker unless one is already in flight.
    #[serde(rename = "tick")]
    Tick,

    #[serde(rename = "metadata_tick_completed")]
    MetadataTickCompleted { result: MetadataResult },

    #[serde(rename = "instance_started")]
    InstanceStarted {
        instance_id: InstanceId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "push_completed")]
    PushCompleted {
        instance_id: InstanceId,
        plan_file: PlanId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "pr_created")]
    PrCreated {
        plan_file: PlanId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "permission_response_sent")]
    PermissionResponseSent {
        instance_id: InstanceId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "plan_branch_reset")]
    PlanBranchReset {
        plan_file: PlanId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "system:shutdown")]
    Shutdown,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Tick => "tick",
            Event::MetadataTickCompleted { .. } => "metadata_tick_completed",
            Event::InstanceStarted { .. } => "instance_started",
            Event::PushCompleted { .. } => "push_completed",
            Event::PrCreated { .. } => "pr_created",
            Event::PermissionResponseSent { .. } => "permission_response_sent",
            Event::PlanBranchReset { .. } => "plan_branch_reset",
            Event::Shutdown => "system:shutdown",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
