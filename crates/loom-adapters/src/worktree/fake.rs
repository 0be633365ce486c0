// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake worktree adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PrHandle, WorktreeAdapter, WorktreeError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded worktree call
#[derive(Debug, Clone)]
pub enum WorktreeCall {
    EnsureWorktree { branch: String },
    RemoveWorktree { branch: String },
    PushChanges { path: PathBuf, force: bool },
    CreatePr { path: PathBuf, title: String },
    ResetPlanBranch { branch: String },
}

struct FakeWorktreeState {
    allocated: HashSet<String>,
    calls: Vec<WorktreeCall>,
    branch_in_use: HashSet<String>,
    push_should_fail: bool,
}

/// Fake worktree adapter for testing
#[derive(Clone)]
pub struct FakeWorktreeAdapter {
    inner: Arc<Mutex<FakeWorktreeState>>,
}

impl Default for FakeWorktreeAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeWorktreeState {
                allocated: HashSet::new(),
                calls: Vec::new(),
                branch_in_use: HashSet::new(),
                push_should_fail: false,
            })),
        }
    }
}

impl FakeWorktreeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<WorktreeCall> {
        self.inner.lock().calls.clone()
    }

    pub fn mark_branch_in_use(&self, branch: &str) {
        self.inner.lock().branch_in_use.insert(branch.to_string());
    }

    pub fn fail_next_push(&self) {
        self.inner.lock().push_should_fail = true;
    }
}

#[async_trait]
impl WorktreeAdapter for FakeWorktreeAdapter {
    fn worktree_path(&self, repo_root: &Path, branch: &str) -> PathBuf {
        repo_root.join(".worktrees").join(branch)
    }

    async fn is_branch_checked_out(
        &self,
        _repo_root: &Path,
        branch: &str,
    ) -> Result<bool, WorktreeError> {
        Ok(self.inner.lock().branch_in_use.contains(branch))
    }

    async fn ensure_worktree(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorktreeCall::EnsureWorktree {
            branch: branch.to_string(),
        });
        if inner.branch_in_use.contains(branch) && !inner.allocated.contains(branch) {
            return Err(WorktreeError::BranchInUse(branch.to_string()));
        }
        inner.allocated.insert(branch.to_string());
        drop(inner);
        Ok(self.worktree_path(repo_root, branch))
    }

    async fn remove_worktree(&self, _repo_root: &Path, branch: &str) -> Result<(), WorktreeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorktreeCall::RemoveWorktree {
            branch: branch.to_string(),
        });
        inner.allocated.remove(branch);
        Ok(())
    }

    async fn push_changes(
        &self,
        worktree_path: &Path,
        _message: &str,
        force: bool,
    ) -> Result<(), WorktreeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorktreeCall::PushChanges {
            path: worktree_path.to_path_buf(),
            force,
        });
        if inner.push_should_fail {
            inner.push_should_fail = false;
            return Err(WorktreeError::CommandFailed("fake push failure".to_string()));
        }
        Ok(())
    }

    async fn create_pr(
        &self,
        worktree_path: &Path,
        title: &str,
        _body: &str,
        _commit_msg: &str,
    ) -> Result<PrHandle, WorktreeError> {
        self.inner.lock().calls.push(WorktreeCall::CreatePr {
            path: worktree_path.to_path_buf(),
            title: title.to_string(),
        });
        Ok(PrHandle {
            url: format!("https://example.invalid/pr/{}", title.len()),
        })
    }

    async fn reset_plan_branch(&self, _repo_root: &Path, branch: &str) -> Result<(), WorktreeError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorktreeCall::ResetPlanBranch {
            branch: branch.to_string(),
        });
        inner.allocated.remove(branch);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
