use super::*;

#[test]
fn new_plan_starts_ready() {
    let plan = Plan::new(PlanId::new("2026-02-21-auth"), "Auth rework".into(), "plan/auth".into(), 1000);
    assert_eq!(plan.status, PlanStatus::Ready);
    assert!(!plan.is_finished());
    assert!(!plan.is_cancelled());
}

#[test]
fn done_and_completed_are_both_finished_but_cancelled_is_not() {
    let mut plan = Plan::new(PlanId::new("p"), "d".into(), "plan/p".into(), 0);

    plan.status = PlanStatus::Done;
    assert!(plan.is_finished());

    plan.status = PlanStatus::Completed;
    assert!(plan.is_finished());

    plan.status = PlanStatus::Cancelled;
    assert!(!plan.is_finished());
}

#[test]
fn legacy_finished_alias_deserializes_to_done() {
    let status: PlanStatus = serde_json::from_str("\"finished\"").unwrap();
    assert_eq!(status, PlanStatus::LegacyFinished);
    assert_eq!(status.normalized(), PlanStatus::Done);
    assert!(is_locked("finished", status.normalized()));
}

#[test]
fn is_locked_only_recognizes_the_finished_key() {
    assert!(!is_locked("archived", PlanStatus::Done));
    assert!(is_locked("finished", PlanStatus::Done));
    assert!(!is_locked("finished", PlanStatus::Ready));
}

#[test]
fn status_round_trips_through_serde() {
    for status in [
        PlanStatus::Ready,
        PlanStatus::Planning,
        PlanStatus::Implementing,
        PlanStatus::Reviewing,
        PlanStatus::Done,
        PlanStatus::Completed,
        PlanStatus::Cancelled,
    ] {
        let json = serde_json::to_string(&status).unwrap();
        let back: PlanStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
