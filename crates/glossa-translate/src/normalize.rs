// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input clean-up and output-token sizing.

use std::sync::LazyLock;

use glossa_config::model::TranslationConfig;
use regex::Regex;

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\u{2028}\u{2029}]+").expect("valid line break pattern"));

/// HTML space entities and escaped `\n` / `\t` sequences pasted from rich text.
static SPACE_ESCAPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&(?:nbsp|ensp|emsp|thinsp|#160|#x0*a0);|\\[nt]")
        .expect("valid space escape pattern")
});

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static LEADING_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]\s+").expect("valid bullet pattern"));

/// Flattens a block into a single clean line.
///
/// Line breaks and space escapes become spaces, whitespace runs collapse to
/// one space, and one leading `+` / `-` bullet is dropped. A sign glued to a
/// number (`-5`) is kept.
pub fn normalize_input(text: &str) -> String {
    let text = LINE_BREAKS.replace_all(text, " ");
    let text = SPACE_ESCAPES.replace_all(&text, " ");
    let text = WHITESPACE_RUNS.replace_all(&text, " ");
    let text = text.trim();
    LEADING_BULLET.replace(text, "").trim().to_string()
}

/// Completion token ceiling for an input of `input_chars` characters.
pub fn max_output_tokens(input_chars: usize, config: &TranslationConfig) -> u32 {
    let estimate = (input_chars as f64 * config.output_tokens_per_char).ceil();
    let estimate = if estimate >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        estimate as u32
    };
    let floor = config.min_output_tokens;
    estimate.clamp(floor, config.max_output_tokens.max(floor))
}
