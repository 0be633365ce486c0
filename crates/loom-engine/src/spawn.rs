// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn helpers: pure `InstanceOpts` builders. All stateful sequencing
//! (aborting an old instance, registering the new one, emitting an
//! audit row) stays in the router as `Effect`s for `crate::executor` to
//! carry out; nothing here touches `InstanceSupervisor`.

use loom_core::{AgentType, InstanceId, InstanceOpts, Plan};
use std::path::PathBuf;

/// Which lifecycle stage a plan-bound agent is spawned for. Chooses the
/// `AgentType` and whether the instance is solo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnStage {
    Plan,
    Implement,
    Review,
    Solo,
}

impl SpawnStage {
    fn agent_type(self) -> AgentType {
        match self {
            SpawnStage::Plan => AgentType::Planner,
            SpawnStage::Implement | SpawnStage::Solo => AgentType::Coder,
            SpawnStage::Review => AgentType::Reviewer,
        }
    }

    fn is_solo(self) -> bool {
        matches!(self, SpawnStage::Solo)
    }
}

/// Build the opts for a plan-bound agent. Planner instances allocate no
/// worktree and run on the default branch; coder/reviewer instances are
/// bound to the plan's branch.
pub fn spawn_plan_agent_opts(
    id: InstanceId,
    plan: &Plan,
    stage: SpawnStage,
    prompt: String,
    working_path: PathBuf,
    program: String,
) -> InstanceOpts {
    let agent_type = stage.agent_type();
    let branch = if agent_type == AgentType::Planner {
        String::new()
    } else {
        plan.branch.clone()
    };
    InstanceOpts {
        id,
        working_path,
        program,
        branch,
        plan_file: Some(plan.id.clone()),
        agent_type,
        solo_agent: stage.is_solo(),
        skip_permissions: false,
        queued_prompt: Some(prompt),
    }
}

/// An unbound coder instance, audited as `AgentSpawned` by the caller.
pub fn spawn_ad_hoc_opts(id: InstanceId, branch: String, working_path: PathBuf, program: String) -> InstanceOpts {
    InstanceOpts {
        id,
        working_path,
        program,
        branch,
        plan_file: None,
        agent_type: AgentType::Coder,
        solo_agent: false,
        skip_permissions: false,
        queued_prompt: None,
    }
}

/// An ephemeral planner-style instance scoped to a plan for context, but
/// never driving that plan's PFSM transitions.
pub fn spawn_chat_about_plan_opts(
    id: InstanceId,
    plan: &Plan,
    question: String,
    working_path: PathBuf,
    program: String,
) -> InstanceOpts {
    InstanceOpts {
        id,
        working_path,
        program,
        branch: String::new(),
        plan_file: Some(plan.id.clone()),
        agent_type: AgentType::Planner,
        solo_agent: false,
        skip_permissions: false,
        queued_prompt: Some(question),
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
