// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan identifier and lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Filename stem of a plan markdown file, e.g. `2026-02-21-auth`.
    ///
    /// Unique within a project. Never changes after registration except via
    /// an explicit [`crate::plan::Plan`] rename, which relocates any bound
    /// sessions too.
    pub struct PlanId;
}

/// Lifecycle status of a plan.
///
/// Three terminal-adjacent values (`Done`, `Completed`, and the legacy
/// `"finished"` serde alias) coexist on purpose: they come from distinct
/// code paths (PFSM transition vs. administrative override vs. an older
/// on-disk record) and are preserved rather than collapsed. See
/// [`Plan::is_finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Ready,
    Planning,
    Implementing,
    Reviewing,
    /// Reached via the PFSM's `ReviewApproved` transition.
    Done,
    /// Reached only via `ForceSetStatus`, an administrative override.
    Completed,
    Cancelled,
    /// Legacy alias; deserializes to `Done` and is never produced fresh.
    #[serde(rename = "finished")]
    LegacyFinished,
}

impl PlanStatus {
    /// Normalises the legacy `finished` alias to `Done`.
    pub fn normalized(self) -> Self {
        match self {
            PlanStatus::LegacyFinished => PlanStatus::Done,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Ready => "ready",
            PlanStatus::Planning => "planning",
            PlanStatus::Implementing => "implementing",
            PlanStatus::Reviewing => "reviewing",
            PlanStatus::Done => "done",
            PlanStatus::Completed => "completed",
            PlanStatus::Cancelled => "cancelled",
            PlanStatus::LegacyFinished => "finished",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns true for the exact set of statuses that `isLocked("finished", _)`
/// unlocks against in the source system: `Done` and `Completed`, never
/// `Cancelled`. This is the one and only place that predicate is evaluated.
pub fn is_locked(lock: &str, status: PlanStatus) -> bool {
    match lock {
        "finished" => matches!(
            status.normalized(),
            PlanStatus::Done | PlanStatus::Completed
        ),
        _ => false,
    }
}

/// A plan entry as held by the Plan Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub description: String,
    /// Git ref, typically `plan/<slug>`. Non-empty once registered.
    pub branch: String,
    /// Optional group label used by the sidebar and the concurrency gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub status: PlanStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Plan {
    pub fn new(id: PlanId, description: String, branch: String, epoch_ms: u64) -> Self {
        Self {
            id,
            description,
            branch,
            topic: None,
            status: PlanStatus::Ready,
            created_at_ms: epoch_ms,
            updated_at_ms: epoch_ms,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// True once a plan has reached `Done` or `Completed`. Matches the
    /// `is_locked("finished", status)` predicate exactly; `Cancelled` plans
    /// are not finished.
    pub fn is_finished(&self) -> bool {
        is_locked("finished", self.status)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == PlanStatus::Cancelled
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
