// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! source spans, valid key listings, and "did you mean?" suggestions using
//! Jaro-Winkler string similarity.

#![allow(unused_assignments)] // raised by the miette derive on labelled fields

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a fix.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The file sets a key the schema does not know.
    #[error("`{key}` is not a glossa setting")]
    #[diagnostic(
        code(glossa::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("unknown key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value could not be deserialized into the expected type.
    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(glossa::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A key without a default was not set anywhere.
    #[error("`{key}` must be set")]
    #[diagnostic(
        code(glossa::config::missing_key),
        help("add `{key} = <value>` to your glossa.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but violates a semantic constraint.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(glossa::config::validation))]
    Validation { message: String },

    #[error("could not load configuration: {0}")]
    #[diagnostic(code(glossa::config::other))]
    Other(String),
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("perhaps `{s}`? known keys here: {valid_keys}"),
        None => format!("known keys here: {valid_keys}"),
    }
}

/// Converts every error carried by a `figment::Error` into a diagnostic.
///
/// `toml_sources` holds `(path, content)` pairs used to point at the
/// offending key.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| to_config_error(&error, toml_sources))
        .collect()
}

fn to_config_error(
    error: &figment::error::Error,
    toml_sources: &[(String, String)],
) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = find_source_span(error, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: dotted_key(error, Some(field.as_ref())),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: dotted_key(error, None),
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.to_string(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// `queue.interval_cap` style path of the failing value.
fn dotted_key(error: &figment::error::Error, leaf: Option<&str>) -> String {
    error
        .path
        .iter()
        .map(String::as_str)
        .chain(leaf)
        .collect::<Vec<_>>()
        .join(".")
}

fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline sources have no file metadata; fall back to the single source if there is one.
    let source = match source_path {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    if let Some((path, content)) = source {
        let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
        if let Some(offset) = find_key_offset(content, &section, field) {
            let span = SourceSpan::new(offset.into(), field.len());
            return (Some(span), Some(NamedSource::new(path, content.clone())));
        }
    }

    (None, None)
}

/// Byte offset of the line that sets `field`, looked up in the `[section]`
/// named by `path[0]`, or among top-level keys when `path` is empty.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let wanted = path.first().map(String::as_str);
    let mut table: Option<&str> = None;
    let mut line_start = 0;

    for line in content.split_inclusive('\n') {
        let start = line_start;
        line_start += line.len();

        let body = line.trim();
        if let Some(header) = body.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            table = Some(header.trim());
            continue;
        }
        if table != wanted {
            continue;
        }
        if let Some((key, _)) = body.split_once('=')
            && key.trim_end() == field
        {
            return Some(start + line.len() - line.trim_start().len());
        }
    }

    None
}

/// Closest valid key by Jaro-Winkler similarity, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Prints each error to stderr, graphically when the terminal allows it.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("glossa: {error}"),
        }
    }
}
