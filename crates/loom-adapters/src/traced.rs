// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::session::{SessionAdapter, SessionError};
use crate::worktree::{PrHandle, WorktreeAdapter, WorktreeError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Wrapper that adds tracing to any SessionAdapter
#[derive(Clone)]
pub struct TracedSession<S> {
    inner: S,
}

impl<S> TracedSession<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SessionAdapter> SessionAdapter for TracedSession<S> {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, SessionError> {
        async {
            tracing::info!(cmd, env_count = env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(name, cwd, cmd, env).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(id) => tracing::info!(session_id = id.as_str(), elapsed_ms, "session created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!("session.spawn", name, cwd = %cwd.display()))
        .await
    }

    async fn send(&self, id: &str, input: &str) -> Result<(), SessionError> {
        tracing::info_span!("session.send", id)
            .in_scope(|| tracing::debug!(input_len = input.len(), "sending"));
        let result = self.inner.send(id, input).await;
        if let Err(ref e) = result {
            tracing::error!(error = %e, "send failed");
        }
        result
    }

    async fn send_literal(&self, id: &str, text: &str) -> Result<(), SessionError> {
        let result = self.inner.send_literal(id, text).await;
        if let Err(ref e) = result {
            tracing::error!(id, error = %e, "send_literal failed");
        }
        result
    }

    async fn send_enter(&self, id: &str) -> Result<(), SessionError> {
        let result = self.inner.send_enter(id).await;
        if let Err(ref e) = result {
            tracing::error!(id, error = %e, "send_enter failed");
        }
        result
    }

    async fn kill(&self, id: &str) -> Result<(), SessionError> {
        let result = self.inner.kill(id).await;
        tracing::info_span!("session.kill", id).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
        });
        result
    }

    async fn is_alive(&self, id: &str) -> Result<bool, SessionError> {
        let result = self.inner.is_alive(id).await;
        tracing::trace!(id, alive = ?result.as_ref().ok(), "checked");
        result
    }

    async fn capture_output(&self, id: &str, lines: u32) -> Result<String, SessionError> {
        let result = self.inner.capture_output(id, lines).await;
        tracing::info_span!("session.capture", id, lines).in_scope(|| {
            tracing::debug!(
                captured_len = result.as_ref().map(|s| s.len()).ok(),
                "captured"
            )
        });
        result
    }

    async fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, SessionError> {
        self.inner.is_process_running(id, pattern).await
    }

    async fn get_exit_code(&self, id: &str) -> Result<Option<i32>, SessionError> {
        self.inner.get_exit_code(id).await
    }
}

/// Wrapper that adds tracing to any WorktreeAdapter
#[derive(Clone)]
pub struct TracedWorktree<W> {
    inner: W,
}

impl<W> TracedWorktree<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: WorktreeAdapter> WorktreeAdapter for TracedWorktree<W> {
    fn worktree_path(&self, repo_root: &Path, branch: &str) -> PathBuf {
        self.inner.worktree_path(repo_root, branch)
    }

    async fn is_branch_checked_out(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<bool, WorktreeError> {
        self.inner.is_branch_checked_out(repo_root, branch).await
    }

    async fn ensure_worktree(
        &self,
        repo_root: &Path,
        branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        let span = tracing::info_span!("worktree.ensure", branch, repo = %repo_root.display());
        async {
            let result = self.inner.ensure_worktree(repo_root, branch).await;
            match &result {
                Ok(path) => tracing::info!(path = %path.display(), "worktree ready"),
                Err(e) => tracing::error!(error = %e, "worktree allocation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn remove_worktree(&self, repo_root: &Path, branch: &str) -> Result<(), WorktreeError> {
        let result = self.inner.remove_worktree(repo_root, branch).await;
        tracing::info_span!("worktree.remove", branch).in_scope(|| match &result {
            Ok(()) => tracing::info!("worktree removed"),
            Err(e) => tracing::warn!(error = %e, "worktree remove failed (may be expected)"),
        });
        result
    }

    async fn push_changes(
        &self,
        worktree_path: &Path,
        message: &str,
        force: bool,
    ) -> Result<(), WorktreeError> {
        let span = tracing::info_span!("worktree.push", path = %worktree_path.display(), force);
        async {
            let result = self.inner.push_changes(worktree_path, message, force).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "push failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_pr(
        &self,
        worktree_path: &Path,
        title: &str,
        body: &str,
        commit_msg: &str,
    ) -> Result<PrHandle, WorktreeError> {
        let span = tracing::info_span!("worktree.create_pr", path = %worktree_path.display());
        async {
            let result = self
                .inner
                .create_pr(worktree_path, title, body, commit_msg)
                .await;
            match &result {
                Ok(pr) => tracing::info!(url = %pr.url, "pr created"),
                Err(e) => tracing::error!(error = %e, "pr creation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn reset_plan_branch(&self, repo_root: &Path, branch: &str) -> Result<(), WorktreeError> {
        let result = self.inner.reset_plan_branch(repo_root, branch).await;
        tracing::info_span!("worktree.reset_branch", branch).in_scope(|| {
            if let Err(ref e) = result {
                tracing::error!(error = %e, "branch reset failed");
            }
        });
        result
    }

    fn generate_pr_body(&self, plan_description: &str, wave_summaries: &[String]) -> String {
        self.inner
            .generate_pr_body(plan_description, wave_summaries)
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
