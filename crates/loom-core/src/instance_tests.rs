use super::*;

fn opts(agent_type: AgentType, branch: &str) -> InstanceOpts {
    InstanceOpts {
        id: InstanceId::new("auth-coder"),
        working_path: PathBuf::from("/tmp/wt/auth"),
        program: "claude".into(),
        branch: branch.into(),
        plan_file: Some(PlanId::new("2026-02-21-auth")),
        agent_type,
        solo_agent: false,
        skip_permissions: false,
        queued_prompt: None,
    }
}

#[test]
fn new_instance_starts_loading_with_no_side_effects() {
    let instance = Instance::new(opts(AgentType::Coder, "plan/auth"), 1000);
    assert_eq!(instance.status, InstanceStatus::Loading);
    assert!(!instance.tmux_alive);
    assert!(instance.has_worktree());
}

#[test]
fn planner_instances_have_no_worktree_by_convention() {
    let instance = Instance::new(opts(AgentType::Planner, ""), 1000);
    assert!(!instance.has_worktree());
}

#[test]
fn reviewer_flag_is_derived_from_agent_type() {
    let instance = Instance::new(opts(AgentType::Reviewer, "plan/auth"), 1000);
    assert!(instance.is_reviewer);

    let coder = Instance::new(opts(AgentType::Coder, "plan/auth"), 1000);
    assert!(!coder.is_reviewer);
}
