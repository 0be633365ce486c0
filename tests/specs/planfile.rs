//! Parsing a plan's implementation body and driving it through the wave
//! orchestrator to completion.

use loom_core::{TaskStatus, WaveOrchestratorState};
use loom_engine::WaveOrchestrator;

const BODY: &str = "\
A short plan description, ignored by the parser.

## Wave 1
### Task 1: scaffold the migration
write the schema change
### Task 2: add a feature flag
gate the new path

## Wave 2
### Task 3: wire the endpoint
finish the thing
";

#[test]
fn parsed_waves_drive_the_orchestrator_to_all_complete() {
    let waves = loom_planfile::parse(BODY).unwrap();
    assert_eq!(waves.len(), 2);
    assert_eq!(waves[0].tasks.len(), 2);
    assert_eq!(waves[1].tasks.len(), 1);

    let mut orchestrator = WaveOrchestrator::new(waves);
    assert_eq!(orchestrator.state(), WaveOrchestratorState::Idle);

    let wave1 = orchestrator.start_next_wave().expect("wave 1 starts");
    assert_eq!(wave1.len(), 2);
    assert_eq!(orchestrator.current_wave_number(), 1);

    orchestrator.mark_task_complete(1);
    assert_eq!(orchestrator.state(), WaveOrchestratorState::Running);
    orchestrator.mark_task_failed(2);
    assert_eq!(orchestrator.state(), WaveOrchestratorState::WaveComplete);
    assert!(orchestrator.needs_confirm());
    assert_eq!(orchestrator.failed_task_count(), 1);

    let retried = orchestrator.retry_failed_tasks();
    assert_eq!(retried.len(), 1);
    assert_eq!(orchestrator.state(), WaveOrchestratorState::Running);
    orchestrator.mark_task_complete(2);
    orchestrator.reset_confirm();
    assert_eq!(orchestrator.state(), WaveOrchestratorState::WaveComplete);

    let wave2 = orchestrator.start_next_wave().expect("wave 2 starts");
    assert_eq!(wave2.len(), 1);
    orchestrator.mark_task_complete(3);

    assert_eq!(orchestrator.state(), WaveOrchestratorState::AllComplete);
    assert_eq!(orchestrator.completed_task_count(), 3);
    assert!(orchestrator.start_next_wave().is_none());
}

#[test]
fn missing_wave_headers_is_a_hard_parse_error() {
    let err = loom_planfile::parse("no headers here, just prose").unwrap_err();
    assert!(matches!(err, loom_planfile::ParseError::NoWaves));
}

#[test]
fn non_sequential_wave_numbers_are_rejected() {
    let body = "## Wave 1\n### Task 1: a\nbody\n## Wave 3\n### Task 2: b\nbody\n";
    let err = loom_planfile::parse(body).unwrap_err();
    assert!(matches!(
        err,
        loom_planfile::ParseError::NonSequentialWaveNumbers { previous: 1, found: 3 }
    ));
}

#[test]
fn all_settled_task_statuses_are_pending_before_any_wave_starts() {
    let waves = loom_planfile::parse(BODY).unwrap();
    for wave in &waves {
        for task in &wave.tasks {
            assert_eq!(task.status, TaskStatus::Pending);
        }
    }
}
