// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sentinel signal: the filesystem-borne event an agent writes to notify
//! the orchestrator of a lifecycle event. See `loom-engine::sentinel_channel`
//! for the read/parse/delete protocol that produces these.

use crate::pfsm::PlanEvent;
use crate::plan::PlanId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The subset of [`PlanEvent`] that can arrive as a sentinel. `PlanStart`
/// and `ImplementStart` are user-issued only and have no sentinel form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalEvent {
    PlannerFinished,
    ImplementFinished,
    ReviewApproved,
    ReviewChangesRequested,
    StartOver,
    Cancel,
    Reopen,
}

impl SignalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalEvent::PlannerFinished => "PlannerFinished",
            SignalEvent::ImplementFinished => "ImplementFinished",
            SignalEvent::ReviewApproved => "ReviewApproved",
            SignalEvent::ReviewChangesRequested => "ReviewChangesRequested",
            SignalEvent::StartOver => "StartOver",
            SignalEvent::Cancel => "Cancel",
            SignalEvent::Reopen => "Reopen",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PlannerFinished" => Some(SignalEvent::PlannerFinished),
            "ImplementFinished" => Some(SignalEvent::ImplementFinished),
            "ReviewApproved" => Some(SignalEvent::ReviewApproved),
            "ReviewChangesRequested" => Some(SignalEvent::ReviewChangesRequested),
            "StartOver" => Some(SignalEvent::StartOver),
            "Cancel" => Some(SignalEvent::Cancel),
            "Reopen" => Some(SignalEvent::Reopen),
            _ => None,
        }
    }
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<SignalEvent> for PlanEvent {
    fn from(s: SignalEvent) -> Self {
        match s {
            SignalEvent::PlannerFinished => PlanEvent::PlannerFinished,
            SignalEvent::ImplementFinished => PlanEvent::ImplementFinished,
            SignalEvent::ReviewApproved => PlanEvent::ReviewApproved,
            SignalEvent::ReviewChangesRequested => PlanEvent::ReviewChangesRequested,
            SignalEvent::StartOver => PlanEvent::StartOver,
            SignalEvent::Cancel => PlanEvent::Cancel,
            SignalEvent::Reopen => PlanEvent::Reopen,
        }
    }
}

/// One decoded sentinel file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelSignal {
    pub plan_file: PlanId,
    pub event: SignalEvent,
    /// Free-form text; for `ReviewChangesRequested` this carries reviewer
    /// feedback that becomes the respawned coder's queued prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub timestamp_ms: u64,
}

#[cfg(test)]
#[path = "sentinel_tests.rs"]
mod tests;
