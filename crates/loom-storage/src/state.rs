// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay: the Plan Store, the Audit
//! Log, and the Permission Cache, all rebuilt from the same append-only
//! event stream on startup.

use loom_core::{AuditEvent, CacheKey, Plan, PlanId, PlanStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A durable fact the storage layer replays to rebuild `MaterializedState`.
///
/// This is deliberately a *different* type from `loom_core::Event` (the
/// router's transient message type): the WAL records state changes, not
/// in-flight command results. Every variant here corresponds to a durable
/// Plan Store or Audit Log operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    #[serde(rename = "plan_registered")]
    PlanRegistered { plan: Plan },

    #[serde(rename = "plan_status_set")]
    PlanStatusSet {
        plan_file: PlanId,
        status: PlanStatus,
        updated_at_ms: u64,
    },

    #[serde(rename = "plan_force_status_set")]
    PlanForceStatusSet {
        plan_file: PlanId,
        status: PlanStatus,
        updated_at_ms: u64,
    },

    #[serde(rename = "plan_renamed")]
    PlanRenamed {
        old_file: PlanId,
        new_file: PlanId,
        updated_at_ms: u64,
    },

    #[serde(rename = "plan_topic_set")]
    PlanTopicSet {
        plan_file: PlanId,
        topic: Option<String>,
        updated_at_ms: u64,
    },

    #[serde(rename = "audit_appended")]
    AuditAppended { event: AuditEvent },

    #[serde(rename = "permission_remembered")]
    PermissionRemembered { key: CacheKey },
}

/// Materialized state rebuilt from the WAL on startup, the same
/// event-sourced `MaterializedState` idiom used throughout this durability
/// substrate.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub plans: HashMap<String, Plan>,
    #[serde(default)]
    pub audit: Vec<AuditEvent>,
    #[serde(default)]
    pub permission_cache: Vec<CacheKey>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self, file: &str) -> Option<&Plan> {
        self.plans.get(file)
    }

    /// Apply a single durable event to derive the next state.
    ///
    /// All handlers are idempotent: replaying the same event twice must
    /// produce the same state as replaying it once (matching the WAL's
    /// at-least-once replay contract).
    pub fn apply_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::PlanRegistered { plan } => {
                self.plans
                    .entry(plan.id.as_str().to_string())
                    .or_insert_with(|| plan.clone());
            }
            StoreEvent::PlanStatusSet {
                plan_file,
                status,
                updated_at_ms,
            } => {
                if let Some(plan) = self.plans.get_mut(plan_file.as_str()) {
                    plan.status = *status;
                    plan.updated_at_ms = *updated_at_ms;
                }
            }
            StoreEvent::PlanForceStatusSet {
                plan_file,
                status,
                updated_at_ms,
            } => {
                if let Some(plan) = self.plans.get_mut(plan_file.as_str()) {
                    plan.status = *status;
                    plan.updated_at_ms = *updated_at_ms;
                }
            }
            StoreEvent::PlanRenamed {
                old_file,
                new_file,
                updated_at_ms,
            } => {
                if let Some(mut plan) = self.plans.remove(old_file.as_str()) {
                    plan.id = new_file.clone();
                    plan.updated_at_ms = *updated_at_ms;
                    self.plans.insert(new_file.as_str().to_string(), plan);
                }
            }
            StoreEvent::PlanTopicSet {
                plan_file,
                topic,
                updated_at_ms,
            } => {
                if let Some(plan) = self.plans.get_mut(plan_file.as_str()) {
                    plan.topic = topic.clone();
                    plan.updated_at_ms = *updated_at_ms;
                }
            }
            StoreEvent::AuditAppended { event } => {
                self.audit.push(event.clone());
            }
            StoreEvent::PermissionRemembered { key } => {
                if !self.permission_cache.contains(key) {
                    self.permission_cache.push(key.clone());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
