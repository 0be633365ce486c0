// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure functions that materialise the markdown text sent to a freshly
//! spawned agent from plan/wave/task context. No I/O.

use loom_core::{Plan, Task, Wave};

pub fn build_planner_prompt(plan: &Plan) -> String {
    format!(
        "You are planning the following change:\n\n{}\n\n\
         Write an implementation plan as a sequence of `## Wave N` headings, \
         each containing one or more `### Task M: <title>` blocks that can be \
         carried out in parallel within the wave. When the plan is ready, \
         signal `PlannerFinished`.",
        plan.description
    )
}

pub fn build_coder_prompt(plan: &Plan, wave: &Wave, tasks: &[Task]) -> String {
    let mut prompt = format!(
        "You are implementing wave {} of the plan \"{}\" on branch `{}`.\n\n",
        wave.number, plan.description, plan.branch
    );
    for task in tasks {
        prompt.push_str(&format!("### Task {}: {}\n\n{}\n\n", task.number, task.title, task.body));
    }
    prompt.push_str(
        "Complete every task above and commit your work, then signal \
         `ImplementFinished`. A fresh instance picks up the next wave if \
         more remain, so do not wait around for one. If any task above \
         could not be completed, add a `failed: <task number>[, <task \
         number>...]` line to the signal body listing only those task \
         numbers.",
    );
    prompt
}

pub fn build_reviewer_prompt(plan: &Plan) -> String {
    format!(
        "You are reviewing the implementation of \"{}\" on branch `{}`.\n\n\
         Check the diff against the plan description. Signal `ReviewApproved` \
         if it is correct and complete, or `ReviewChangesRequested` with a \
         `body` describing what must change.",
        plan.description, plan.branch
    )
}

pub fn build_resume_prompt(plan: &Plan, feedback: &str) -> String {
    format!(
        "The reviewer requested changes to \"{}\" on branch `{}`:\n\n{}\n\n\
         Address the feedback above, commit, and signal `ImplementFinished` \
         when done.",
        plan.description, plan.branch, feedback
    )
}

#[cfg(test)]
#[path = "prompt_builders_tests.rs"]
mod tests;
