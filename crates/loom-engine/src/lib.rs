// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loom-engine: the concurrent lifecycle engine.
//!
//! Composes `loom-core`'s pure data model and `loom-storage`'s durable
//! state into the running system: the Instance Supervisor
//! ([`instance_supervisor`]), the Wave Orchestrator
//! ([`wave_orchestrator`]), the sentinel Signal Channel
//! ([`signal_channel`]), the spawn helpers ([`spawn`]), prompt builders
//! ([`prompt_builders`]), and the Event Router / update loop
//! ([`router`]) that composes all of the above and is the sole mutator
//! of model state.
//!
//! [`router::Router`] is a pure `Event -> Vec<Effect>` transformer aside
//! from cheap, non-I/O locking of the shared `InstanceSupervisor`; every
//! operation that touches tmux, git, or the filesystem is represented as
//! an `Effect` and carried out by [`executor::Executor`], which reports
//! completion back as an `Event`. [`runtime`] wires the two together
//! into the actual tokio event loop.

pub mod config;
pub mod error;
pub mod executor;
pub mod instance_supervisor;
pub mod permission_match;
pub mod prompt_builders;
pub mod router;
pub mod runtime;
pub mod signal_channel;
pub mod spawn;
pub mod wave_orchestrator;

pub use config::{plan_markdown_path, Config, ConfigError};
pub use error::RuntimeError;
pub use executor::Executor;
pub use instance_supervisor::InstanceSupervisor;
pub use router::{PendingConfirm, Router, WaveAdvanceChoice};
pub use runtime::Runtime;
pub use signal_channel::{DrainResult, RejectedSignal, SignalChannel, SignalChannelError};
pub use spawn::SpawnStage;
pub use wave_orchestrator::WaveOrchestrator;
