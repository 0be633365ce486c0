// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `loom <path>` — launch the orchestrator loop against a working
//! directory. Headless: the TUI rendering layer that would normally
//! drive `Router`'s confirm/resolve surface between ticks is out of
//! scope for this core, so this command simply
//! keeps the event loop running — and any `Instance`/`Plan` state
//! already persisted in `.loom/store` ticking forward — until the
//! operator interrupts it.

use anyhow::{Context, Result};
use loom_adapters::{GitWorktreeAdapter, TmuxAdapter};
use loom_core::{Event, SystemClock};
use loom_engine::{Config, Executor, InstanceSupervisor, Router, Runtime, SignalChannel};
use loom_storage::{AuditLog, PermissionCache, PlanStore, Store};
use parking_lot::Mutex as SyncMutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::commands::init::loom_dir;

pub async fn run(path: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&path).with_context(|| format!("cannot create {}", path.display()))?;
    let root = std::fs::canonicalize(&path)
        .with_context(|| format!("cannot resolve {}", path.display()))?;

    let loom_dir = loom_dir(&root);
    if !loom_dir.join("store").exists() {
        anyhow::bail!(
            "no loom project at {} — run `loom init` first",
            root.display()
        );
    }

    let config = Config::load(&root).context("failed to load loom.toml")?;
    let project = project_name(&root);

    let store = Store::open(&loom_dir.join("store"))
        .with_context(|| format!("failed to open store at {}", loom_dir.display()))?;
    let store = Arc::new(SyncMutex::new(store));
    let plan_store = PlanStore::new(Arc::clone(&store));
    let audit = AuditLog::new(Arc::clone(&store));

    let cache_path = loom_storage::default_permission_cache_path(
        &dirs::config_dir()
            .map(|dir| dir.join("loom"))
            .unwrap_or_else(|| loom_dir.join("config")),
    );
    let permission_cache = Arc::new(SyncMutex::new(
        PermissionCache::load(cache_path).context("failed to load permission cache")?,
    ));

    let supervisor = Arc::new(Mutex::new(InstanceSupervisor::new(
        TmuxAdapter::new(),
        GitWorktreeAdapter::new(),
        SystemClock,
        root.clone(),
    )));

    let signals = Arc::new(SignalChannel::new(&loom_dir));

    let router = Router::new(
        project,
        config.clone(),
        SystemClock,
        plan_store.clone(),
        audit.clone(),
        permission_cache,
        Arc::clone(&supervisor),
    );
    let executor = Executor::new(supervisor, audit, signals, plan_store);
    let runtime = Runtime::new(router, executor, &config);

    let event_tx = runtime.event_sender();
    let shutdown = runtime.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received interrupt, shutting down");
            let _ = event_tx.send(Event::Shutdown);
            shutdown.notify_one();
        }
    });

    info!(project = %root.display(), tick_ms = config.metadata_tick_ms, "loom orchestrator started");
    runtime.run().await;
    Ok(())
}

/// Derive a stable project label from the repo root's directory name,
/// falling back to the full path when it has none (e.g. `/`).
fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
