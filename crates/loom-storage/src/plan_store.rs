// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan Store: durable mapping of plan file to entry, with atomic writes
//! via the shared WAL-backed [`crate::store::Store`].

use crate::state::StoreEvent;
use crate::store::{Store, StoreError};
use chrono::{TimeZone, Utc};
use loom_core::{Plan, PlanId, PlanStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanStoreError {
    #[error("plan {0} is already registered under a different branch")]
    Duplicate(PlanId),
    #[error("a plan named {0} already exists")]
    NameClash(PlanId),
    #[error("plan {0} not found")]
    NotFound(PlanId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD over plan entries. Exclusively owns the Plan Store's slice of the
/// shared durable state; the PFSM borrows this type rather than the raw
/// `MaterializedState`.
#[derive(Clone)]
pub struct PlanStore {
    store: Arc<Mutex<Store>>,
}

impl PlanStore {
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    /// Idempotent create: re-registering the same file with the same
    /// branch returns the existing entry; a different branch is a
    /// `Duplicate` error.
    pub fn register(
        &self,
        file: PlanId,
        description: String,
        branch: String,
        now_ms: u64,
    ) -> Result<Plan, PlanStoreError> {
        let mut store = self.store.lock();
        if let Some(existing) = store.state().plan(file.as_str()) {
            return if existing.branch == branch {
                Ok(existing.clone())
            } else {
                Err(PlanStoreError::Duplicate(file))
            };
        }
        let plan = Plan::new(file, description, branch, now_ms);
        store.append(StoreEvent::PlanRegistered { plan: plan.clone() })?;
        Ok(plan)
    }

    /// Pure read. Returns `None` rather than an error when absent.
    pub fn entry(&self, file: &str) -> Option<Plan> {
        self.store.lock().state().plan(file).cloned()
    }

    /// Unconditional write used only by the PFSM after it has checked
    /// legality. Durable before returning.
    pub fn set_status(&self, file: &PlanId, status: PlanStatus, now_ms: u64) -> Result<(), PlanStoreError> {
        self.write_status(file, status, now_ms, false)
    }

    /// Administrative override ("set status" command), audited separately
    /// by the caller.
    pub fn force_set_status(
        &self,
        file: &PlanId,
        status: PlanStatus,
        now_ms: u64,
    ) -> Result<(), PlanStoreError> {
        self.write_status(file, status, now_ms, true)
    }

    fn write_status(
        &self,
        file: &PlanId,
        status: PlanStatus,
        now_ms: u64,
        forced: bool,
    ) -> Result<(), PlanStoreError> {
        let mut store = self.store.lock();
        if store.state().plan(file.as_str()).is_none() {
            return Err(PlanStoreError::NotFound(file.clone()));
        }
        let event = if forced {
            StoreEvent::PlanForceStatusSet {
                plan_file: file.clone(),
                status,
                updated_at_ms: now_ms,
            }
        } else {
            StoreEvent::PlanStatusSet {
                plan_file: file.clone(),
                status,
                updated_at_ms: now_ms,
            }
        };
        store.append(event)?;
        Ok(())
    }

    /// Generate a new filename from today's date and the slugified
    /// `new_name`, move the plan's key, and fail with `NameClash` if the
    /// target already exists. The caller (engine) is responsible for
    /// moving the underlying markdown file and updating any in-memory
    /// instance bindings.
    pub fn rename(&self, old_file: &PlanId, new_name: &str, now_ms: u64) -> Result<PlanId, PlanStoreError> {
        let date = Utc
            .timestamp_millis_opt(now_ms as i64)
            .single()
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d")
            .to_string();
        let new_file = PlanId::new(loom_planfile::slug::plan_file_stem(&date, new_name));

        let mut store = self.store.lock();
        if store.state().plan(old_file.as_str()).is_none() {
            return Err(PlanStoreError::NotFound(old_file.clone()));
        }
        if new_file != *old_file && store.state().plan(new_file.as_str()).is_some() {
            return Err(PlanStoreError::NameClash(new_file));
        }
        store.append(StoreEvent::PlanRenamed {
            old_file: old_file.clone(),
            new_file: new_file.clone(),
            updated_at_ms: now_ms,
        })?;
        Ok(new_file)
    }

    /// Assign (or clear, with `None`) a plan's topic group label.
    pub fn set_topic(&self, file: &PlanId, topic: Option<String>, now_ms: u64) -> Result<(), PlanStoreError> {
        let mut store = self.store.lock();
        if store.state().plan(file.as_str()).is_none() {
            return Err(PlanStoreError::NotFound(file.clone()));
        }
        store.append(StoreEvent::PlanTopicSet {
            plan_file: file.clone(),
            topic,
            updated_at_ms: now_ms,
        })?;
        Ok(())
    }

    /// Every registered plan, in no particular order. Used by the
    /// metadata tick to snapshot plan state alongside instance polling.
    pub fn all(&self) -> Vec<Plan> {
        self.store.lock().state().plans.values().cloned().collect()
    }

    /// Distinct, non-empty topic labels in registration order of first
    /// appearance.
    pub fn topics(&self) -> Vec<String> {
        let store = self.store.lock();
        let mut seen = Vec::new();
        for plan in store.state().plans.values() {
            if let Some(topic) = &plan.topic {
                if !seen.contains(topic) {
                    seen.push(topic.clone());
                }
            }
        }
        seen
    }

    pub fn plans_by_topic(&self, topic: &str) -> Vec<Plan> {
        self.store
            .lock()
            .state()
            .plans
            .values()
            .filter(|p| p.topic.as_deref() == Some(topic))
            .cloned()
            .collect()
    }

    pub fn ungrouped_plans(&self) -> Vec<Plan> {
        self.store
            .lock()
            .state()
            .plans
            .values()
            .filter(|p| p.topic.is_none())
            .cloned()
            .collect()
    }

    /// Plans with status `done` or `completed` (the legacy `finished` alias
    /// normalises to `done`); never `cancelled`.
    pub fn finished(&self) -> Vec<Plan> {
        self.store
            .lock()
            .state()
            .plans
            .values()
            .filter(|p| p.is_finished())
            .cloned()
            .collect()
    }

    pub fn cancelled(&self) -> Vec<Plan> {
        self.store
            .lock()
            .state()
            .plans
            .values()
            .filter(|p| p.is_cancelled())
            .cloned()
            .collect()
    }

    /// The one and only cross-plan invariant: is there another plan in
    /// `topic`, other than `exclude_plan`, currently `implementing`?
    pub fn has_running_coder_in_topic(&self, topic: &str, exclude_plan: &PlanId) -> (bool, Option<PlanId>) {
        let store = self.store.lock();
        for plan in store.state().plans.values() {
            if plan.id != *exclude_plan
                && plan.topic.as_deref() == Some(topic)
                && plan.status == PlanStatus::Implementing
            {
                return (true, Some(plan.id.clone()));
            }
        }
        (false, None)
    }
}

#[cfg(test)]
#[path = "plan_store_tests.rs"]
mod tests;
