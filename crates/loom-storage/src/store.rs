// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glue between the WAL and `MaterializedState`: open (load snapshot, replay
//! unprocessed WAL entries), append (write-ahead then apply), and periodic
//! checkpointing so the WAL doesn't grow unbounded. `PlanStore`, `AuditLog`
//! and the project-scoped half of `PermissionCache` are all thin facades
//! over one shared `Store`.

use crate::checkpoint::{self, CheckpointError, Checkpointer};
use crate::snapshot::SnapshotError;
use crate::state::{MaterializedState, StoreEvent};
use crate::wal::{Wal, WalError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Checkpoint (and WAL-truncate) after this many appended events.
const CHECKPOINT_INTERVAL: u64 = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Durable `MaterializedState`, rebuilt on `open` by loading the latest
/// snapshot and replaying every WAL entry written since.
pub struct Store {
    wal: Wal,
    checkpointer: Checkpointer,
    snapshot_path: PathBuf,
    state: MaterializedState,
    ops_since_checkpoint: u64,
}

impl Store {
    /// Open (or create) a store rooted at `dir`: `dir/snapshot.zst` and
    /// `dir/wal.jsonl`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let snapshot_path = dir.join("snapshot.zst");
        let wal_path = dir.join("wal.jsonl");

        let (mut state, processed_seq) = match checkpoint::load_snapshot(&snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::new(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        Ok(Self {
            wal,
            checkpointer: Checkpointer::new(snapshot_path.clone()),
            snapshot_path,
            state,
            ops_since_checkpoint: 0,
        })
    }

    pub fn state(&self) -> &MaterializedState {
        &self.state
    }

    /// Write `event` to the WAL, fsync it, then fold it into the in-memory
    /// state. Durable before returning, matching every Plan Store/Audit Log
    /// mutating call's contract.
    pub fn append(&mut self, event: StoreEvent) -> Result<(), StoreError> {
        let seq = self.wal.append(&event)?;
        self.wal.flush()?;
        self.state.apply_event(&event);
        self.wal.mark_processed(seq);
        self.ops_since_checkpoint += 1;
        if self.ops_since_checkpoint >= CHECKPOINT_INTERVAL {
            self.checkpoint()?;
        }
        Ok(())
    }

    /// Force a synchronous checkpoint and reclaim WAL space. Idempotent.
    pub fn checkpoint(&mut self) -> Result<(), StoreError> {
        let seq = self.wal.processed_seq();
        self.checkpointer.checkpoint_sync(seq, &self.state)?;
        self.wal.truncate_before(seq)?;
        self.ops_since_checkpoint = 0;
        Ok(())
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
