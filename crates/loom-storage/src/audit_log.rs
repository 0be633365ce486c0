// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit Log: append-only, best-effort `emit`, queryable `query` over the
//! shared WAL-backed store.

use crate::state::StoreEvent;
use crate::store::Store;
use loom_core::{AuditEvent, AuditFilter};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// Non-blocking, best-effort append-only event store.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<Mutex<Store>>,
}

impl AuditLog {
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    /// Record `event`. Never propagates a failure to the caller: a WAL
    /// write error is logged and swallowed rather than surfaced.
    pub fn emit(&self, event: AuditEvent) {
        let mut store = self.store.lock();
        if let Err(err) = store.append(StoreEvent::AuditAppended { event }) {
            warn!(error = %err, "failed to append audit event");
        }
    }

    /// Equality on project/kind, a time range, and a limit; newest-first.
    pub fn query(&self, filter: &AuditFilter) -> Vec<AuditEvent> {
        let store = self.store.lock();
        let mut rows: Vec<AuditEvent> = store
            .state()
            .audit
            .iter()
            .filter(|e| filter.project.as_ref().map_or(true, |p| p == &e.project))
            .filter(|e| filter.kinds.is_empty() || filter.kinds.contains(&e.kind))
            .filter(|e| filter.since_ms.map_or(true, |since| e.timestamp_ms >= since))
            .filter(|e| filter.until_ms.map_or(true, |until| e.timestamp_ms <= until))
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }
        rows
    }
}

#[cfg(test)]
#[path = "audit_log_tests.rs"]
mod tests;
