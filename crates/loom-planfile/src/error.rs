// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised while parsing a plan's implementation-stage markdown body.

use thiserror::Error;

/// Failure to parse the `## Wave N` / `### Task M: <title>` structure out of
/// a plan's markdown body.
///
/// Per the plan lifecycle, a parse failure is a hard error: the caller is
/// expected to revert the plan to `planning` and surface `message()` to the
/// planner rather than attempt a partial implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no `## Wave N` headers found in plan body")]
    NoWaves,

    #[error("wave header on line {line} is malformed: {text:?} (expected `## Wave <N>`)")]
    MalformedWaveHeader { line: usize, text: String },

    #[error("wave {wave} on line {line} has no tasks (expected `### Task M: <title>` blocks)")]
    WaveHasNoTasks { wave: u32, line: usize },

    #[error(
        "task header on line {line} is malformed: {text:?} (expected `### Task <M>: <title>`)"
    )]
    MalformedTaskHeader { line: usize, text: String },

    #[error("waves are not numbered sequentially starting at 1: found {found} after {previous}")]
    NonSequentialWaveNumbers { previous: u32, found: u32 },

    #[error(
        "tasks are not numbered sequentially across the plan: found {found} after {previous}"
    )]
    NonSequentialTaskNumbers { previous: u32, found: u32 },

    #[error("duplicate wave number {wave} (first seen on line {first_line}, again on line {line})")]
    DuplicateWaveNumber {
        wave: u32,
        first_line: usize,
        line: usize,
    },
}

impl ParseError {
    /// A short, planner-facing explanation. Deliberately distinct from
    /// `Display` so a caller can fold it into a sentinel/audit message
    /// without the line-number noise `Display` includes.
    pub fn message(&self) -> String {
        match self {
            ParseError::NoWaves => {
                "the plan has no `## Wave N` sections; add at least one wave with tasks".into()
            }
            ParseError::MalformedWaveHeader { text, .. } => {
                format!("malformed wave header: {text:?}")
            }
            ParseError::WaveHasNoTasks { wave, .. } => {
                format!("wave {wave} has no `### Task M: <title>` entries")
            }
            ParseError::MalformedTaskHeader { text, .. } => {
                format!("malformed task header: {text:?}")
            }
            ParseError::NonSequentialWaveNumbers { previous, found } => {
                format!("waves must be numbered sequentially: expected {}, found {found}", previous + 1)
            }
            ParseError::NonSequentialTaskNumbers { previous, found } => format!(
                "tasks must be numbered sequentially across the plan: expected {}, found {found}",
                previous + 1
            ),
            ParseError::DuplicateWaveNumber { wave, .. } => {
                format!("wave {wave} is declared more than once")
            }
        }
    }
}
