// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slugify strings for plan filenames and renames.

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "must", "can",
    "could", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
    "during", "before", "after", "above", "below", "between", "out", "off", "over", "under",
    "again", "further", "then", "once", "that", "this", "these", "those", "and", "but", "or",
    "nor", "not", "so", "yet", "both", "each", "every", "all", "any", "few", "more", "most",
    "other", "some", "such", "no", "only", "own", "same", "than", "too", "very", "just", "about",
    "also", "its", "it", "we", "our", "when", "which", "what",
];

/// Slugify a string for use as a plan filename component.
///
/// Lowercases, replaces non-alphanumeric with hyphens, removes stop words,
/// collapses hyphens, and truncates to `max_len` characters (trimming
/// trailing hyphens).
pub fn slugify(input: &str, max_len: usize) -> String {
    let lower = input.to_lowercase();

    let mut slug = String::with_capacity(lower.len());
    let mut last_was_hyphen = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    let filtered: Vec<&str> = slug
        .split('-')
        .filter(|word| !word.is_empty() && !STOP_WORDS.contains(word))
        .collect();
    let mut result = filtered.join("-");

    let trimmed = result.trim_matches('-');
    if trimmed.len() != result.len() {
        result = trimmed.to_string();
    }

    if result.len() > max_len {
        result.truncate(max_len);
    }

    let trimmed = result.trim_end_matches('-');
    if trimmed.len() != result.len() {
        result = trimmed.to_string();
    }

    result
}

/// Build a plan filename stem `YYYY-MM-DD-<slug>` from a description and
/// the date the rename happened (as epoch-day-formatted `YYYY-MM-DD`).
pub fn plan_file_stem(date: &str, description: &str) -> String {
    let slug = slugify(description, 40);
    if slug.is_empty() {
        date.to_string()
    } else {
        format!("{}-{}", date, slug)
    }
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
