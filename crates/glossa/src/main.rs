// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Glossa - LLM-backed document translation service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod rollover;
mod serve;
mod translate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use glossa_core::Language;

/// Glossa - LLM-backed document translation service.
#[derive(Parser, Debug)]
#[command(name = "glossa", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Translate a single text and print the result. Nothing is stored.
    Translate {
        /// Text to translate.
        #[arg(long)]
        text: String,
        /// Source language (ru, en, vn).
        #[arg(long, default_value = "vn")]
        from: Language,
        /// Target language (ru, en, vn).
        #[arg(long, default_value = "ru")]
        to: Language,
    },
    /// Close the current month: write usage history and reset monthly counters.
    Rollover,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => glossa_config::load_and_validate_path(path),
        None => glossa_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            glossa_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Translate { text, from, to }) => {
            translate::run_translate(config, text, from, to).await
        }
        Some(Commands::Rollover) => rollover::run_rollover(config).await,
        None => {
            println!("glossa: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("glossa: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("glossa={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn translate_arguments_parse_languages() {
        let cli = Cli::try_parse_from([
            "glossa", "translate", "--text", "Xin chào", "--from", "vn", "--to", "en",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Translate { text, from, to }) => {
                assert_eq!(text, "Xin chào");
                assert_eq!(from, Language::Vn);
                assert_eq!(to, Language::En);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_language_is_rejected() {
        let parsed = Cli::try_parse_from(["glossa", "translate", "--text", "x", "--to", "de"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["glossa", "rollover", "--config", "/tmp/g.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/g.toml")));
        assert!(matches!(cli.command, Some(Commands::Rollover)));
    }
}
