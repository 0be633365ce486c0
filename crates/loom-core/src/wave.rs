// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wave/task data types parsed from a plan's implementation body.
//!
//! These are plain data; the scheduling behaviour (`StartNextWave`,
//! `MarkTaskComplete`, the one-shot confirm latch, …) lives in
//! `loom-engine::wave_orchestrator`, which owns a `Vec<Wave>` and mutates
//! `TaskStatus` in place.

use serde::{Deserialize, Serialize};

/// Status of a single task within a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

/// One `### Task M: <title>` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// 1-indexed, unique within the plan (not just within the wave).
    pub number: u32,
    pub title: String,
    /// Markdown body between this task heading and the next heading.
    pub body: String,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(number: u32, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: body.into(),
            status: TaskStatus::Pending,
        }
    }
}

/// One `## Wave N` block: an ordered list of tasks spawned in parallel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wave {
    /// 1-indexed.
    pub number: u32,
    pub tasks: Vec<Task>,
}

impl Wave {
    pub fn all_settled(&self) -> bool {
        self.tasks
            .iter()
            .all(|t| matches!(t.status, TaskStatus::Complete | TaskStatus::Failed))
    }

    pub fn failed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Complete)
            .count()
    }
}

/// Overall orchestrator state for a single plan's wave sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveOrchestratorState {
    Idle,
    Running,
    WaveComplete,
    AllComplete,
}

#[cfg(test)]
#[path = "wave_tests.rs"]
mod tests;
