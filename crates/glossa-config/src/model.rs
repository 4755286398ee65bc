// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Glossa translation service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Glossa configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to the production values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GlossaConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Completion provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Shared rate-limited work queue.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Gateway retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Prompt character budgets and persona.
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Input limits and output-token heuristic.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Suspicious-output detection and repair.
    #[serde(default)]
    pub sanity: SanityConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name reported in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "glossa".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which completion backend to talk to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// api.openai.com chat completions.
    #[default]
    OpenAi,
    /// Azure OpenAI deployment.
    Azure,
    /// Offline provider that echoes the input back.
    Echo,
}

/// Completion provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    /// API key. `None` falls back to `OPENAI_API_KEY` / `AZURE_OPENAI_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override for the API base URL (OpenAI) or resource endpoint (Azure).
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default)]
    pub frequency_penalty: f32,

    #[serde(default)]
    pub presence_penalty: f32,

    /// Azure deployment name. Required when `kind = "azure"`.
    #[serde(default)]
    pub azure_deployment: Option<String>,

    #[serde(default = "default_azure_api_version")]
    pub azure_api_version: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            azure_deployment: None,
            azure_api_version: default_azure_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    1.0
}

fn default_azure_api_version() -> String {
    "2023-05-15".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Work queue configuration.
///
/// At most `interval_cap` tasks start in any window of `interval_secs`, and at
/// most `concurrency` run at once.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_interval_cap")]
    pub interval_cap: usize,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// A task running longer than this is rejected with a timeout.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            interval_cap: default_interval_cap(),
            interval_secs: default_interval_secs(),
            task_timeout_secs: default_task_timeout_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

fn default_interval_cap() -> usize {
    3
}

fn default_interval_secs() -> u64 {
    60
}

fn default_task_timeout_secs() -> u64 {
    600
}

/// Exponential backoff for transient provider failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_starting_delay_secs")]
    pub starting_delay_secs: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound for a single delay. `None` means unbounded.
    #[serde(default)]
    pub max_delay_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            starting_delay_secs: default_starting_delay_secs(),
            multiplier: default_multiplier(),
            max_delay_secs: None,
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_starting_delay_secs() -> u64 {
    20
}

fn default_multiplier() -> f64 {
    2.0
}

/// Prompt composition budgets, all measured in characters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    /// System persona; the language pair is appended to it.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Hard cap on the sum of all message contents in one prompt.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    #[serde(default = "default_max_history_chars")]
    pub max_history_chars: usize,

    #[serde(default = "default_max_examples_chars")]
    pub max_examples_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            max_prompt_chars: default_max_prompt_chars(),
            max_history_chars: default_max_history_chars(),
            max_examples_chars: default_max_examples_chars(),
        }
    }
}

fn default_persona() -> String {
    "You have an Ph.D in petroleum geology".to_string()
}

fn default_max_prompt_chars() -> usize {
    6000
}

fn default_max_history_chars() -> usize {
    1500
}

fn default_max_examples_chars() -> usize {
    3000
}

/// Input validation and output-token sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationConfig {
    /// Blocks longer than this are rejected before any provider call.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    #[serde(default = "default_min_output_tokens")]
    pub min_output_tokens: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_output_tokens_per_char")]
    pub output_tokens_per_char: f64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            min_output_tokens: default_min_output_tokens(),
            max_output_tokens: default_max_output_tokens(),
            output_tokens_per_char: default_output_tokens_per_char(),
        }
    }
}

fn default_max_input_chars() -> usize {
    2500
}

fn default_min_output_tokens() -> u32 {
    256
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_output_tokens_per_char() -> f64 {
    1.5
}

/// Output sanity checking.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SanityConfig {
    /// Output longer than `length_ratio * input` is suspicious.
    #[serde(default = "default_length_ratio")]
    pub length_ratio: f64,

    /// Floor for the length threshold so short inputs are not over-flagged.
    #[serde(default = "default_min_suspicious_chars")]
    pub min_suspicious_chars: usize,

    /// Extra attempts after the first suspicious output.
    #[serde(default = "default_max_retranslations")]
    pub max_retranslations: u32,

    /// Prefix added to output that stayed suspicious after every retry.
    #[serde(default = "default_review_marker")]
    pub review_marker: String,

    /// Markers that must never leak from the prompt into the output.
    #[serde(default = "default_sentinel_markers")]
    pub sentinel_markers: Vec<String>,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            length_ratio: default_length_ratio(),
            min_suspicious_chars: default_min_suspicious_chars(),
            max_retranslations: default_max_retranslations(),
            review_marker: default_review_marker(),
            sentinel_markers: default_sentinel_markers(),
        }
    }
}

fn default_length_ratio() -> f64 {
    2.2
}

fn default_min_suspicious_chars() -> usize {
    50
}

fn default_max_retranslations() -> u32 {
    10
}

fn default_review_marker() -> String {
    "Check this one:".to_string()
}

fn default_sentinel_markers() -> Vec<String> {
    vec!["↔".to_string()]
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("glossa").join("glossa.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("glossa.db"))
        .to_string_lossy()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*`. `None` leaves the API open to the
    /// upstream proxy that performs authentication.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}
