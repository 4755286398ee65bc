// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Glossa translation service.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use glossa_config::load_and_validate;
//!
//! match load_and_validate() {
//!     Ok(config) => println!("queue interval cap: {}", config.queue.interval_cap),
//!     Err(errors) => glossa_config::render_errors(&errors),
//! }
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::GlossaConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<GlossaConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<GlossaConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<GlossaConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validates a loaded config, or turns the figment error into diagnostics.
///
/// Sources are only read on failure, so spans can point at the offending key.
fn finish(
    loaded: Result<GlossaConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<GlossaConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    tracing::debug!(
        provider = %config.provider.kind,
        interval_cap = config.queue.interval_cap,
        "configuration loaded"
    );
    Ok(config)
}

/// Reads whichever config files exist, for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join("glossa.toml"))
        .unwrap_or_else(|_| "glossa.toml".into());
    let user = dirs::config_dir().map(|d| d.join("glossa").join("glossa.toml"));
    let system = std::path::PathBuf::from("/etc/glossa/glossa.toml");

    [Some(local), user, Some(system)]
        .into_iter()
        .flatten()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
