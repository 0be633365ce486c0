// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use loom_core::{Task, TaskStatus, Wave, WaveOrchestratorState};

fn task(number: u32) -> Task {
    Task {
        number,
        title: format!("task {number}"),
        body: String::new(),
        status: TaskStatus::Pending,
    }
}

fn waves() -> Vec<Wave> {
    vec![
        Wave {
            number: 1,
            tasks: vec![task(1), task(2)],
        },
        Wave {
            number: 2,
            tasks: vec![task(3)],
        },
    ]
}

#[test]
fn starts_idle_and_advances_to_first_wave() {
    let mut orch = WaveOrchestrator::new(waves());
    assert_eq!(orch.state(), WaveOrchestratorState::Idle);
    let started = orch.start_next_wave().unwrap();
    assert_eq!(started.len(), 2);
    assert_eq!(orch.state(), WaveOrchestratorState::Running);
    assert_eq!(orch.current_wave_number(), 1);
    assert!(started.iter().all(|t| t.status == TaskStatus::Running));
}

#[test]
fn wave_completes_once_all_tasks_settle() {
    let mut orch = WaveOrchestrator::new(waves());
    orch.start_next_wave();
    orch.mark_task_complete(1);
    assert_eq!(orch.state(), WaveOrchestratorState::Running);
    assert!(!orch.needs_confirm());
    orch.mark_task_complete(2);
    assert_eq!(orch.state(), WaveOrchestratorState::WaveComplete);
    assert!(orch.needs_confirm());
}

#[test]
fn needs_confirm_is_one_shot() {
    let mut orch = WaveOrchestrator::new(waves());
    orch.start_next_wave();
    orch.mark_task_complete(1);
    orch.mark_task_complete(2);
    assert!(orch.needs_confirm());
    orch.reset_confirm();
    assert!(!orch.needs_confirm());
}

#[test]
fn marking_task_is_idempotent_once_settled() {
    let mut orch = WaveOrchestrator::new(waves());
    orch.start_next_wave();
    orch.mark_task_complete(1);
    orch.mark_task_failed(1);
    let wave = &orch.waves()[0];
    let task1 = wave.tasks.iter().find(|t| t.number == 1).unwrap();
    assert_eq!(task1.status, TaskStatus::Complete);
}

#[test]
fn partial_failure_does_not_block_wave_completion() {
    let mut orch = WaveOrchestrator::new(waves());
    orch.start_next_wave();
    orch.mark_task_complete(1);
    orch.mark_task_failed(2);
    assert_eq!(orch.state(), WaveOrchestratorState::WaveComplete);
    assert_eq!(orch.completed_task_count(), 1);
    assert_eq!(orch.failed_task_count(), 1);
}

#[test]
fn retry_failed_tasks_resumes_running_state() {
    let mut orch = WaveOrchestrator::new(waves());
    orch.start_next_wave();
    orch.mark_task_complete(1);
    orch.mark_task_failed(2);
    let retried = orch.retry_failed_tasks();
    assert_eq!(retried.len(), 1);
    assert_eq!(retried[0].number, 2);
    assert_eq!(orch.state(), WaveOrchestratorState::Running);
    orch.mark_task_complete(2);
    assert_eq!(orch.state(), WaveOrchestratorState::WaveComplete);
}

#[test]
fn second_wave_starts_after_first_completes() {
    let mut orch = WaveOrchestrator::new(waves());
    orch.start_next_wave();
    orch.mark_task_complete(1);
    orch.mark_task_complete(2);
    orch.reset_confirm();
    let second = orch.start_next_wave().unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(orch.current_wave_number(), 2);
    orch.mark_task_complete(3);
    assert_eq!(orch.state(), WaveOrchestratorState::AllComplete);
}

#[test]
fn start_next_wave_returns_none_once_all_complete() {
    let mut orch = WaveOrchestrator::new(waves());
    orch.start_next_wave();
    orch.mark_task_complete(1);
    orch.mark_task_complete(2);
    orch.start_next_wave();
    orch.mark_task_complete(3);
    assert_eq!(orch.state(), WaveOrchestratorState::AllComplete);
    assert!(orch.start_next_wave().is_none());
}

#[test]
fn counters_reflect_totals() {
    let orch = WaveOrchestrator::new(waves());
    assert_eq!(orch.total_waves(), 2);
    assert_eq!(orch.total_tasks(), 3);
}
