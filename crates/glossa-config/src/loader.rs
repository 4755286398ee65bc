// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./glossa.toml` > `~/.config/glossa/glossa.toml` > `/etc/glossa/glossa.toml`
//! with environment variable overrides via `GLOSSA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::GlossaConfig;

/// Sections recognised by the env provider, in the order they are matched.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "provider",
    "queue",
    "retry",
    "prompt",
    "translation",
    "sanity",
    "storage",
    "gateway",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/glossa/glossa.toml` (system-wide)
/// 3. `~/.config/glossa/glossa.toml` (user XDG config)
/// 4. `./glossa.toml` (local directory)
/// 5. `GLOSSA_*` environment variables
pub fn load_config() -> Result<GlossaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<GlossaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GlossaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GlossaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GlossaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GlossaConfig::default()))
        .merge(Toml::file("/etc/glossa/glossa.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("glossa/glossa.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("glossa.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `GLOSSA_QUEUE_INTERVAL_CAP` must map to `queue.interval_cap`,
/// not `queue.interval.cap`.
fn env_provider() -> Env {
    Env::prefixed("GLOSSA_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("queue_interval_cap"), "queue.interval_cap");
        assert_eq!(map_env_key("provider_api_key"), "provider.api_key");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("unknown"), "unknown");
    }

    #[test]
    fn env_override_wins_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "glossa.toml",
                "[queue]\ninterval_cap = 5\n\n[provider]\nmodel = \"gpt-4\"\n",
            )?;
            jail.set_env("GLOSSA_QUEUE_INTERVAL_CAP", "7");

            let config = load_config_from_path(Path::new("glossa.toml"))?;
            assert_eq!(config.queue.interval_cap, 7);
            assert_eq!(config.provider.model, "gpt-4");
            Ok(())
        });
    }
}
