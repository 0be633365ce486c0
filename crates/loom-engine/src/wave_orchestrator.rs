// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-plan wave/task scheduler. Pure in-memory state machine; the router
//! drives it and turns its output into spawn/confirm effects. No I/O
//! lives here.

use loom_core::{Task, TaskStatus, Wave, WaveOrchestratorState};

/// Built at `ImplementStart` from a plan's parsed implementation body and
/// owned by the router for the plan's lifetime in `implementing`.
#[derive(Debug, Clone)]
pub struct WaveOrchestrator {
    waves: Vec<Wave>,
    state: WaveOrchestratorState,
    /// 0 while `Idle`; 1-indexed once a wave has started.
    current_wave: u32,
    /// One-shot latch: true at most once per transition into
    /// `WaveComplete`/`AllComplete`, until `reset_confirm` is called.
    needs_confirm: bool,
}

impl WaveOrchestrator {
    pub fn new(waves: Vec<Wave>) -> Self {
        Self {
            waves,
            state: WaveOrchestratorState::Idle,
            current_wave: 0,
            needs_confirm: false,
        }
    }

    pub fn state(&self) -> WaveOrchestratorState {
        self.state
    }

    pub fn current_wave_number(&self) -> u32 {
        self.current_wave
    }

    pub fn total_waves(&self) -> u32 {
        self.waves.len() as u32
    }

    pub fn total_tasks(&self) -> usize {
        self.waves.iter().map(|w| w.tasks.len()).sum()
    }

    pub fn completed_task_count(&self) -> usize {
        self.all_tasks()
            .filter(|t| t.status == TaskStatus::Complete)
            .count()
    }

    pub fn failed_task_count(&self) -> usize {
        self.all_tasks()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }

    fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.waves.iter().flat_map(|w| w.tasks.iter())
    }

    fn current_wave_mut(&mut self) -> Option<&mut Wave> {
        if self.current_wave == 0 {
            return None;
        }
        self.waves.get_mut((self.current_wave - 1) as usize)
    }

    fn current_wave_ref(&self) -> Option<&Wave> {
        if self.current_wave == 0 {
            return None;
        }
        self.waves.get((self.current_wave - 1) as usize)
    }

    /// Tasks of the current wave, for the router to hand to spawn helpers.
    pub fn current_wave_tasks(&self) -> Vec<Task> {
        self.current_wave_ref()
            .map(|w| w.tasks.clone())
            .unwrap_or_default()
    }

    /// Advance from `Idle` to wave 1, or from `WaveComplete` to the next
    /// wave: marks every task in that wave `Running` and returns them.
    /// Returns `None` at `AllComplete` or if called out of turn.
    pub fn start_next_wave(&mut self) -> Option<Vec<Task>> {
        match self.state {
            WaveOrchestratorState::Idle => {
                self.current_wave = 1;
            }
            WaveOrchestratorState::WaveComplete => {
                self.current_wave += 1;
            }
            WaveOrchestratorState::Running | WaveOrchestratorState::AllComplete => return None,
        }
        if self.current_wave as usize > self.waves.len() {
            self.state = WaveOrchestratorState::AllComplete;
            return None;
        }
        self.state = WaveOrchestratorState::Running;
        if let Some(wave) = self.current_wave_mut() {
            for task in wave.tasks.iter_mut() {
                task.status = TaskStatus::Running;
            }
        }
        Some(self.current_wave_tasks())
    }

    /// Idempotent: only effective when the task is currently `Running`.
    pub fn mark_task_complete(&mut self, number: u32) {
        self.mark_task(number, TaskStatus::Complete);
    }

    /// Idempotent: only effective when the task is currently `Running`. A
    /// failed task never aborts its wave siblings.
    pub fn mark_task_failed(&mut self, number: u32) {
        self.mark_task(number, TaskStatus::Failed);
    }

    fn mark_task(&mut self, number: u32, status: TaskStatus) {
        if let Some(wave) = self.current_wave_mut() {
            if let Some(task) = wave.tasks.iter_mut().find(|t| t.number == number) {
                if task.status == TaskStatus::Running {
                    task.status = status;
                }
            }
        }
        self.check_wave_complete();
    }

    fn check_wave_complete(&mut self) {
        let Some(wave) = self.current_wave_ref() else {
            return;
        };
        if self.state == WaveOrchestratorState::Running && wave.all_settled() {
            self.state = if self.current_wave as usize == self.waves.len() {
                WaveOrchestratorState::AllComplete
            } else {
                WaveOrchestratorState::WaveComplete
            };
            self.needs_confirm = true;
        }
    }

    /// Reset every failed task in the current wave back to `Running` and
    /// return them. Moves the orchestrator state back to `Running`.
    pub fn retry_failed_tasks(&mut self) -> Vec<Task> {
        let mut retried = Vec::new();
        if let Some(wave) = self.current_wave_mut() {
            for task in wave.tasks.iter_mut() {
                if task.status == TaskStatus::Failed {
                    task.status = TaskStatus::Running;
                    retried.push(task.clone());
                }
            }
        }
        if !retried.is_empty() {
            self.state = WaveOrchestratorState::Running;
        }
        retried
    }

    /// One-shot: true at most once per completed wave, until
    /// `reset_confirm` is called.
    pub fn needs_confirm(&self) -> bool {
        self.needs_confirm
    }

    pub fn reset_confirm(&mut self) {
        self.needs_confirm = false;
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }
}

#[cfg(test)]
#[path = "wave_orchestrator_tests.rs"]
mod tests;
