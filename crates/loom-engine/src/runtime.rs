// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires [`Router`] and [`Executor`] into the actual tokio event loop: a
//! metadata-tick timer plus a channel of effect completions, folded back
//! into the router until a shutdown is
//! requested. User-issued actions (`PlanStart`, `resolve_confirm`, ...)
//! are not `Event`s — the host UI calls `Router`'s request/resolve
//! methods directly against the shared handle [`Runtime::router`]
//! returns, between ticks.

use crate::config::Config;
use crate::executor::Executor;
use crate::router::Router;
use loom_adapters::{SessionAdapter, WorktreeAdapter};
use loom_core::{Clock, Effect, Event};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{error, info};

/// Owns the router/executor pair and the channel that carries effect
/// completions back to the router. Cheap to clone the handles a host UI
/// needs (`router()`, `event_sender()`, `shutdown_handle()`); `run()`
/// consumes `self` and drives the loop until shutdown.
pub struct Runtime<S: SessionAdapter, W: WorktreeAdapter, C: Clock> {
    router: Arc<Mutex<Router<S, W, C>>>,
    executor: Executor<S, W, C>,
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
}

impl<S, W, C> Runtime<S, W, C>
where
    S: SessionAdapter,
    W: WorktreeAdapter,
    C: Clock,
{
    pub fn new(router: Router<S, W, C>, executor: Executor<S, W, C>, config: &Config) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            router: Arc::new(Mutex::new(router)),
            executor,
            event_tx,
            event_rx,
            tick_interval: Duration::from_millis(config.metadata_tick_ms),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// The shared router a host UI drives directly: `request_plan_start`,
    /// `resolve_confirm`, and friends are called against this lock, never
    /// sent through the event channel — the overlay is UI-owned.
    pub fn router(&self) -> Arc<Mutex<Router<S, W, C>>> {
        Arc::clone(&self.router)
    }

    /// A sender a host UI, or a background task outside of `Executor`,
    /// can use to inject an `Event` into the loop.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.event_tx.clone()
    }

    /// Call `.notify_one()` on the returned handle to request a graceful
    /// stop; `run()` finishes dispatching whatever it is mid-iteration on
    /// and returns without processing further ticks.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Drives the loop until shutdown. Every effect the router returns is
    /// dispatched on its own background task so a slow push/PR/tmux-spawn
    /// never blocks the timer or the next tick's fold — the loop never
    /// blocks on I/O.
    pub async fn run(mut self) {
        let mut tick = tokio::time::interval(self.tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so metadata polling
        // starts on the configured cadence rather than at startup.
        tick.tick().await;

        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    let shutting_down = matches!(event, Event::Shutdown);
                    let effects = self.router.lock().await.handle_event(event).await;
                    self.dispatch(effects);
                    if shutting_down {
                        break;
                    }
                }
                _ = tick.tick() => {
                    self.dispatch(vec![Effect::RunMetadataTick]);
                }
                _ = self.shutdown.notified() => {
                    info!("loom runtime shutdown requested");
                    break;
                }
            }
        }
    }

    /// Spawn one background task per effect, each reporting its
    /// completion (if any) back into `event_tx` for the next loop
    /// iteration to fold. Public so a host UI can dispatch the `Vec<Effect>`
    /// returned by a direct `Router` call (`request_plan_start`,
    /// `resolve_confirm`, ...) the same way the loop dispatches its own.
    pub fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            let executor = self.executor.clone();
            let event_tx = self.event_tx.clone();
            tokio::spawn(async move {
                if let Some(event) = executor.execute(effect).await {
                    if event_tx.send(event).is_err() {
                        error!("runtime event channel closed; dropping effect completion");
                    }
                }
            });
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
