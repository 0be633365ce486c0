// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for the Loom agent orchestrator: an append-only WAL of
//! `StoreEvent`s, periodic zstd-compressed snapshots for compaction, and
//! the `MaterializedState` (Plan Store + Audit Log + Permission Cache)
//! rebuilt by replaying both on startup.

mod audit_log;
pub mod checkpoint;
mod migration;
mod permission_cache;
mod plan_store;
mod snapshot;
mod state;
mod store;
mod wal;

/// Current schema version written into every `Snapshot` and expected by
/// `MigrationRegistry`. Bump alongside a new migration when
/// `MaterializedState`'s shape changes.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub use audit_log::AuditLog;
pub use checkpoint::{
    CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter, Checkpointer,
    FsCheckpointWriter,
};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use permission_cache::{default_path as default_permission_cache_path, PermissionCache, PermissionCacheError};
pub use plan_store::{PlanStore, PlanStoreError};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::{MaterializedState, StoreEvent};
pub use store::{Store, StoreError};
pub use wal::{Wal, WalEntry, WalError};
