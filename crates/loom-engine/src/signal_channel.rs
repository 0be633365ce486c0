// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-borne sentinel protocol: one file per event under
//! `<planStateDir>/.signals/`, consumed read-then-delete. Malformed
//! files are moved to `.signals/rejected/` rather than dropped, so a
//! misbehaving agent leaves a paper trail instead of silently vanishing.

use loom_core::{IdGen, PlanId, SentinelSignal, SignalEvent};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One signal file that failed to parse, moved aside rather than deleted.
#[derive(Debug, Clone)]
pub struct RejectedSignal {
    pub original_name: String,
    pub reason: String,
}

/// Result of one drain pass: accepted signals in filename (timestamp)
/// order, plus any files that were rejected and moved aside.
#[derive(Debug, Clone, Default)]
pub struct DrainResult {
    pub signals: Vec<SentinelSignal>,
    pub rejected: Vec<RejectedSignal>,
}

pub struct SignalChannel {
    dir: PathBuf,
}

impl SignalChannel {
    /// `plan_state_dir` is the project's state directory; signals live in
    /// its `.signals` subdirectory.
    pub fn new(plan_state_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: plan_state_dir.as_ref().join(".signals"),
        }
    }

    fn rejected_dir(&self) -> PathBuf {
        self.dir.join("rejected")
    }

    /// Write a new sentinel file for `event`. Used by the CLI-facing agent
    /// surface (`loom signal emit`), never by the router itself.
    pub async fn emit<I: IdGen>(
        &self,
        id_gen: &I,
        plan_file: &PlanId,
        event: SignalEvent,
        body: Option<&str>,
        now_ms: u64,
    ) -> Result<PathBuf, SignalChannelError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let nonce = id_gen.next();
        let nonce: String = nonce.chars().take(8).collect();
        let path = self.dir.join(format!("{now_ms}-{nonce}.signal"));

        let mut contents = format!("event: {}\nplan:  {}\n", event.as_str(), plan_file.as_str());
        if let Some(body) = body {
            contents.push('\n');
            contents.push_str(body);
            contents.push('\n');
        }
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Consume every pending signal file: read, parse, delete. Malformed
    /// files are moved to `.signals/rejected/` instead of deleted.
    pub async fn drain(&self) -> Result<DrainResult, SignalChannelError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::create_dir_all(self.rejected_dir()).await?;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".signal") {
                names.push(name);
            }
        }
        names.sort();

        let mut result = DrainResult::default();
        for name in names {
            let path = self.dir.join(&name);
            let contents = tokio::fs::read_to_string(&path).await?;
            match parse_signal_file(&name, &contents) {
                Ok(signal) => {
                    tokio::fs::remove_file(&path).await?;
                    result.signals.push(signal);
                }
                Err(reason) => {
                    let dest = self.rejected_dir().join(&name);
                    tokio::fs::rename(&path, &dest).await?;
                    result.rejected.push(RejectedSignal {
                        original_name: name,
                        reason,
                    });
                }
            }
        }
        Ok(result)
    }
}

/// Parse one signal file's name (for its timestamp) and body (for its
/// event/plan/body fields).
fn parse_signal_file(name: &str, contents: &str) -> Result<SentinelSignal, String> {
    let timestamp_ms = name
        .split('-')
        .next()
        .and_then(|prefix| prefix.parse::<u64>().ok())
        .ok_or_else(|| format!("filename has no timestamp prefix: {name}"))?;

    let mut event: Option<SignalEvent> = None;
    let mut plan_file: Option<PlanId> = None;
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in contents.lines() {
        if in_body {
            body_lines.push(line);
            continue;
        }
        if line.trim().is_empty() {
            in_body = true;
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| format!("malformed header line: {line:?}"))?;
        match key.trim() {
            "event" => {
                event = Some(
                    SignalEvent::parse(value.trim())
                        .ok_or_else(|| format!("unknown event: {}", value.trim()))?,
                );
            }
            "plan" => plan_file = Some(PlanId::new(value.trim().to_string())),
            "body" => {
                let inline = value.trim();
                if !inline.is_empty() {
                    body_lines.push(inline);
                }
                in_body = true;
            }
            other => return Err(format!("unknown header key: {other}")),
        }
    }

    let event = event.ok_or_else(|| "missing event field".to_string())?;
    let plan_file = plan_file.ok_or_else(|| "missing plan field".to_string())?;
    let body = body_lines.join("\n");
    let body = body.trim();

    Ok(SentinelSignal {
        plan_file,
        event,
        body: if body.is_empty() { None } else { Some(body.to_string()) },
        timestamp_ms,
    })
}

#[cfg(test)]
#[path = "signal_channel_tests.rs"]
mod tests;
