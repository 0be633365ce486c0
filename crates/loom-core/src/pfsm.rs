// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure plan state machine transition table.
//!
//! This module never touches the Plan Store and never spawns sessions; it
//! is a pure function from `(status, event)` to the next status, or a
//! rejection. Composing it with the store (loading, applying, persisting,
//! auditing) is the engine crate's job.

use crate::plan::PlanStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that drive the plan state machine. These correspond 1:1 to the
/// sentinel signal kinds plus the two user-issued events (`PlanStart`,
/// `ImplementStart`) that have no sentinel counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEvent {
    PlanStart,
    PlannerFinished,
    ImplementStart,
    ImplementFinished,
    ReviewApproved,
    ReviewChangesRequested,
    StartOver,
    Cancel,
    Reopen,
}

impl fmt::Display for PlanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanEvent::PlanStart => "PlanStart",
            PlanEvent::PlannerFinished => "PlannerFinished",
            PlanEvent::ImplementStart => "ImplementStart",
            PlanEvent::ImplementFinished => "ImplementFinished",
            PlanEvent::ReviewApproved => "ReviewApproved",
            PlanEvent::ReviewChangesRequested => "ReviewChangesRequested",
            PlanEvent::StartOver => "StartOver",
            PlanEvent::Cancel => "Cancel",
            PlanEvent::Reopen => "Reopen",
        };
        write!(f, "{}", s)
    }
}

/// An event was applied to a status for which no transition is defined.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid transition: {event} from {from}")]
pub struct IllegalTransition {
    pub from: PlanStatus,
    pub event: PlanEvent,
}

/// Active, non-terminal statuses eligible for the `StartOver` wildcard.
fn is_active(status: PlanStatus) -> bool {
    matches!(
        status.normalized(),
        PlanStatus::Ready | PlanStatus::Planning | PlanStatus::Implementing | PlanStatus::Reviewing
    )
}

/// Apply `event` to `from` and return the resulting status, or the illegal
/// transition error. Never mutates anything; callers own persistence.
pub fn transition(from: PlanStatus, event: PlanEvent) -> Result<PlanStatus, IllegalTransition> {
    use PlanEvent::*;
    use PlanStatus::*;

    let from_norm = from.normalized();

    let to = match (from_norm, event) {
        (Ready, PlanStart) => Planning,
        (Planning, PlannerFinished) => Ready,
        (Ready, ImplementStart) => Implementing,
        (Implementing, ImplementFinished) => Reviewing,
        (Reviewing, ReviewApproved) => Done,
        (Reviewing, ReviewChangesRequested) => Implementing,
        (_, StartOver) if is_active(from_norm) => Planning,
        (_, Cancel) => Cancelled,
        (Cancelled, Reopen) => Ready,
        _ => {
            return Err(IllegalTransition { from, event });
        }
    };

    Ok(to)
}

#[cfg(test)]
#[path = "pfsm_tests.rs"]
mod tests;
