// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit event shape. Persistence (append-only WAL + query) lives in
//! `loom-storage::audit_log`; this module only defines the data.

use crate::instance::AgentType;
use crate::plan::PlanId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum set of emitted audit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    PlanCreated,
    PlanTransition,
    PlanCancelled,
    PlanMerged,
    WaveStarted,
    WaveCompleted,
    WaveFailed,
    AgentSpawned,
    AgentKilled,
    AgentPaused,
    AgentResumed,
    PromptSent,
    GitPush,
    PrCreated,
    PermissionDetected,
    PermissionAnswered,
    Error,
    FsmError,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Severity of an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    Info,
    Error,
}

/// One append-only audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditKind,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<PlanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<AgentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_number: Option<u32>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub level: AuditLevel,
    pub timestamp_ms: u64,
}

impl AuditEvent {
    /// Builder for the common case: a plain info-level row for `project`.
    pub fn info(kind: AuditKind, project: impl Into<String>, message: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            kind,
            project: project.into(),
            plan_file: None,
            instance_title: None,
            agent_type: None,
            wave_number: None,
            task_number: None,
            message: message.into(),
            detail: None,
            level: AuditLevel::Info,
            timestamp_ms,
        }
    }

    pub fn error(kind: AuditKind, project: impl Into<String>, message: impl Into<String>, timestamp_ms: u64) -> Self {
        let mut event = Self::info(kind, project, message, timestamp_ms);
        event.level = AuditLevel::Error;
        event
    }

    pub fn with_plan(mut self, plan_file: PlanId) -> Self {
        self.plan_file = Some(plan_file);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_wave(mut self, wave_number: u32) -> Self {
        self.wave_number = Some(wave_number);
        self
    }
}

/// Query filter for the Audit Log. Ordering is always newest-first.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub project: Option<String>,
    pub kinds: Vec<AuditKind>,
    pub since_ms: Option<u64>,
    pub until_ms: Option<u64>,
    pub limit: Option<usize>,
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
