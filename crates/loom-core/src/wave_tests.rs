use super::*;

fn wave_with(statuses: &[TaskStatus]) -> Wave {
    Wave {
        number: 1,
        tasks: statuses
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut t = Task::new(i as u32 + 1, format!("task {i}"), "body");
                t.status = *s;
                t
            })
            .collect(),
    }
}

#[test]
fn all_settled_requires_every_task_complete_or_failed() {
    let running = wave_with(&[TaskStatus::Complete, TaskStatus::Running]);
    assert!(!running.all_settled());

    let settled = wave_with(&[TaskStatus::Complete, TaskStatus::Failed]);
    assert!(settled.all_settled());
}

#[test]
fn counts_reflect_task_statuses() {
    let wave = wave_with(&[
        TaskStatus::Complete,
        TaskStatus::Complete,
        TaskStatus::Failed,
        TaskStatus::Pending,
    ]);
    assert_eq!(wave.completed_count(), 2);
    assert_eq!(wave.failed_count(), 1);
}
