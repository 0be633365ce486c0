// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime.

use loom_adapters::{SessionError, WorktreeError};
use loom_storage::{PlanStoreError, PermissionCacheError, StoreError};
use thiserror::Error;

/// Errors that can occur in the runtime. None of them panics across a
/// component boundary — background workers convert internal failures
/// into one of these, and the router's default handler audits, toasts,
/// and continues.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("plan store error: {0}")]
    PlanStore(#[from] PlanStoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("permission cache error: {0}")]
    PermissionCache(#[from] PermissionCacheError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("worktree error: {0}")]
    Worktree(#[from] WorktreeError),
    #[error("instance not found: {0}")]
    InstanceNotFound(String),
    #[error("plan not found: {0}")]
    PlanNotFound(String),
    #[error("illegal transition: {0}")]
    IllegalTransition(#[from] loom_core::IllegalTransition),
    #[error("plan body failed to parse: {0}")]
    PlanParse(#[from] loom_planfile::ParseError),
    #[error("a {agent_type} instance is already bound to plan {plan_file}")]
    DuplicateBinding { plan_file: String, agent_type: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
