// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `WorktreeAdapter`: shells out to `git` and `gh`.

use super::{PrHandle, WorktreeAdapter, WorktreeError};
use crate::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

#[derive(Clone, Default)]
pub struct GitWorktreeAdapter;

impl GitWorktreeAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn run_git(&self, repo_root: &Path, args: &[&str]) -> Result<String, WorktreeError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(repo_root).args(args);
        let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, "git worktree operation")
            .await
            .map_err(WorktreeError::CommandFailed)?;
        if !output.status.success() {
            return Err(WorktreeError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl WorktreeAdapter for GitWorktreeAdapter {
    fn worktree_path(&self, repo_root: &Path, branch: &str) -> PathBuf {
        let sanitized: String = branch
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '-' })
            .collect();
        let repo_name = repo_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        repo_root
            .parent()
            .unwrap_or(repo_root)
            .join(format!("{repo_name}.worktrees"))
            .join(sanitized)
    }

    async fn is_branch_checked_out(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<bool, WorktreeError> {
        let list = self
            .run_git(repo_root, &["worktree", "list", "--porcelain"])
            .await?;
        let needle = format!("refs/heads/{branch}");
        Ok(list
            .lines()
            .any(|line| line.trim_start_matches("branch ") == needle))
    }

    async fn ensure_worktree(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        let path = self.worktree_path(repo_root, branch);
        if path.exists() {
            return Ok(path);
        }
        if self.is_branch_checked_out(repo_root, branch).await? {
            return Err(WorktreeError::BranchInUse(branch.to_string()));
        }
        let path_str = path.to_string_lossy().to_string();
        let branch_exists = self
            .run_git(repo_root, &["rev-parse", "--verify", branch])
            .await
            .is_ok();
        if branch_exists {
            self.run_git(repo_root, &["worktree", "add", &path_str, branch])
                .await?;
        } else {
            self.run_git(repo_root, &["worktree", "add", "-b", branch, &path_str])
                .await?;
        }
        Ok(path)
    }

    async fn remove_worktree(&self, repo_root: &Path, branch: &str) -> Result<(), WorktreeError> {
        let path = self.worktree_path(repo_root, branch);
        let path_str = path.to_string_lossy().to_string();
        // Already-gone worktrees are fine; Abort is best-effort cleanup.
        let _ = self
            .run_git(repo_root, &["worktree", "remove", "--force", &path_str])
            .await;
        Ok(())
    }

    async fn push_changes(
        &self,
        worktree_path: &Path,
        message: &str,
        force: bool,
    ) -> Result<(), WorktreeError> {
        let mut add = Command::new("git");
        add.current_dir(worktree_path).args(["add", "-A"]);
        run_with_timeout(add, GIT_WORKTREE_TIMEOUT, "git add")
            .await
            .map_err(WorktreeError::CommandFailed)?;

        let mut commit = Command::new("git");
        commit
            .current_dir(worktree_path)
            .args(["commit", "-m", message]);
        // Empty diffs are not an error: the agent may have already committed itself.
        let _ = run_with_timeout(commit, GIT_WORKTREE_TIMEOUT, "git commit").await;

        let mut push = Command::new("git");
        push.current_dir(worktree_path).arg("push");
        if force {
            push.arg("--force");
        }
        let output = run_with_timeout(push, GIT_WORKTREE_TIMEOUT, "git push")
            .await
            .map_err(WorktreeError::CommandFailed)?;
        if !output.status.success() {
            return Err(WorktreeError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(())
    }

    async fn create_pr(
        &self,
        worktree_path: &Path,
        title: &str,
        body: &str,
        commit_msg: &str,
    ) -> Result<PrHandle, WorktreeError> {
        self.push_changes(worktree_path, commit_msg, false).await?;

        let mut cmd = Command::new("gh");
        cmd.current_dir(worktree_path)
            .args(["pr", "create", "--title", title, "--body", body]);
        let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, "gh pr create")
            .await
            .map_err(WorktreeError::PrFailed)?;
        if !output.status.success() {
            return Err(WorktreeError::PrFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(PrHandle { url })
    }

    async fn reset_plan_branch(&self, repo_root: &Path, branch: &str) -> Result<(), WorktreeError> {
        let path = self.worktree_path(repo_root, branch);
        if path.exists() {
            let path_str = path.to_string_lossy().to_string();
            self.run_git(repo_root, &["worktree", "remove", "--force", &path_str])
                .await
                .ok();
        }
        self.run_git(repo_root, &["branch", "-D", branch]).await.ok();
        Ok(())
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
