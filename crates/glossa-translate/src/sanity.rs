// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plausibility checks on model output.
//!
//! Two failure modes are caught: the model rambles (output far longer than
//! the input) and prompt scaffolding leaks into the answer (the `↔` used to
//! render examples shows up in the translation).

use std::fmt;

use glossa_config::model::SanityConfig;

/// Why an output was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Suspicion {
    TooLong { chars: usize, threshold: f64 },
    LeakedMarker(String),
}

impl fmt::Display for Suspicion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { chars, threshold } => {
                write!(f, "output of {chars} chars exceeds {threshold:.0}")
            }
            Self::LeakedMarker(marker) => write!(f, "output contains marker `{marker}`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSanityChecker {
    length_ratio: f64,
    min_suspicious_chars: usize,
    max_retranslations: u32,
    review_marker: String,
    sentinel_markers: Vec<String>,
}

impl OutputSanityChecker {
    pub fn new(config: &SanityConfig) -> Self {
        Self {
            length_ratio: config.length_ratio,
            min_suspicious_chars: config.min_suspicious_chars,
            max_retranslations: config.max_retranslations,
            review_marker: config.review_marker.clone(),
            sentinel_markers: config
                .sentinel_markers
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Extra attempts allowed after the first suspicious output.
    pub fn max_retranslations(&self) -> u32 {
        self.max_retranslations
    }

    /// Longest acceptable output for `original`, in characters.
    pub fn length_threshold(&self, original: &str) -> f64 {
        let scaled = original.chars().count() as f64 * self.length_ratio;
        scaled.max(self.min_suspicious_chars as f64)
    }

    /// Returns the first reason `text` should not be trusted, if any.
    pub fn inspect(&self, text: &str, original: &str) -> Option<Suspicion> {
        let chars = text.chars().count();
        let threshold = self.length_threshold(original);
        if chars as f64 > threshold {
            return Some(Suspicion::TooLong { chars, threshold });
        }
        self.sentinel_markers
            .iter()
            .find(|marker| text.contains(marker.as_str()) && !original.contains(marker.as_str()))
            .map(|marker| Suspicion::LeakedMarker(marker.clone()))
    }

    pub fn is_suspicious(&self, text: &str, original: &str) -> bool {
        self.inspect(text, original).is_some()
    }

    /// Last-resort repair: strip markers and flag the text for human review.
    pub fn repair(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for marker in &self.sentinel_markers {
            cleaned = cleaned.replace(marker.as_str(), " ");
        }
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("{} {}", self.review_marker, cleaned)
    }
}
