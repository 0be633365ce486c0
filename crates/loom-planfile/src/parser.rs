// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses a plan's implementation-stage markdown body into `## Wave N` /
//! `### Task M: <title>` structure.
//!
//! Required headers for the `implement` stage: a `## Wave N` sequence
//! (N = 1,2,…) each followed by `### Task M: <title>` blocks; missing wave
//! headers are a hard error. This module only recognises that structure;
//! reverting the plan to `planning` on error is the caller's (loom-engine's)
//! job.

use crate::error::ParseError;
use loom_core::{Task, Wave};

/// Parse a plan's markdown body into an ordered list of waves.
///
/// Text before the first `## Wave` heading (e.g. a plan description) is
/// ignored. A wave's body runs until the next `## Wave` heading or EOF;
/// within it, `### Task M: <title>` headings delimit tasks the same way.
pub fn parse(body: &str) -> Result<Vec<Wave>, ParseError> {
    let lines: Vec<&str> = body.lines().collect();

    let wave_starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim_start().starts_with("## "))
        .map(|(i, _)| i)
        .collect();

    if wave_starts.is_empty() {
        return Err(ParseError::NoWaves);
    }

    let mut waves = Vec::with_capacity(wave_starts.len());
    let mut prev_wave_number: Option<u32> = None;
    let mut prev_task_number: Option<u32> = None;
    let mut seen_wave_numbers: Vec<(u32, usize)> = Vec::new();

    for (idx, &start) in wave_starts.iter().enumerate() {
        let end = wave_starts.get(idx + 1).copied().unwrap_or(lines.len());
        let header = lines[start].trim_start().trim_start_matches("## ").trim();
        let wave_number = parse_wave_header(header).ok_or_else(|| ParseError::MalformedWaveHeader {
            line: start + 1,
            text: lines[start].to_string(),
        })?;

        if let Some((_, first_line)) = seen_wave_numbers.iter().find(|(n, _)| *n == wave_number) {
            return Err(ParseError::DuplicateWaveNumber {
                wave: wave_number,
                first_line: first_line + 1,
                line: start + 1,
            });
        }
        seen_wave_numbers.push((wave_number, start));

        let expected = prev_wave_number.map(|n| n + 1).unwrap_or(1);
        if wave_number != expected {
            return Err(ParseError::NonSequentialWaveNumbers {
                previous: prev_wave_number.unwrap_or(0),
                found: wave_number,
            });
        }
        prev_wave_number = Some(wave_number);

        let (tasks, last_task_number) = parse_tasks(&lines, start + 1, end, prev_task_number)?;
        if tasks.is_empty() {
            return Err(ParseError::WaveHasNoTasks {
                wave: wave_number,
                line: start + 1,
            });
        }
        prev_task_number = Some(last_task_number);

        waves.push(Wave {
            number: wave_number,
            tasks,
        });
    }

    Ok(waves)
}

fn parse_wave_header(header: &str) -> Option<u32> {
    let rest = header.strip_prefix("Wave ")?;
    rest.trim().parse::<u32>().ok()
}

fn parse_tasks(
    lines: &[&str],
    start: usize,
    end: usize,
    prev_task_number: Option<u32>,
) -> Result<(Vec<Task>, u32), ParseError> {
    let task_starts: Vec<usize> = (start..end)
        .filter(|&i| lines[i].trim_start().starts_with("### "))
        .collect();

    let mut tasks = Vec::with_capacity(task_starts.len());
    let mut prev = prev_task_number;

    for (idx, &task_start) in task_starts.iter().enumerate() {
        let task_end = task_starts.get(idx + 1).copied().unwrap_or(end);
        let header = lines[task_start]
            .trim_start()
            .trim_start_matches("### ")
            .trim();

        let (number, title) =
            parse_task_header(header).ok_or_else(|| ParseError::MalformedTaskHeader {
                line: task_start + 1,
                text: lines[task_start].to_string(),
            })?;

        let expected = prev.map(|n| n + 1).unwrap_or(1);
        if number != expected {
            return Err(ParseError::NonSequentialTaskNumbers {
                previous: prev.unwrap_or(0),
                found: number,
            });
        }
        prev = Some(number);

        let body = lines[(task_start + 1)..task_end].join("\n");
        tasks.push(Task::new(number, title, body.trim().to_string()));
    }

    Ok((tasks, prev.unwrap_or(0)))
}

fn parse_task_header(header: &str) -> Option<(u32, String)> {
    let rest = header.strip_prefix("Task ")?;
    let (num_str, title) = rest.split_once(':')?;
    let number = num_str.trim().parse::<u32>().ok()?;
    Some((number, title.trim().to_string()))
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
