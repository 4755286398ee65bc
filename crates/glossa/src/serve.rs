// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `glossa serve` command implementation.
//!
//! Opens the database, builds the completion provider and the process-wide
//! work queue, wires the translator, usage accounting and document storage
//! into the HTTP gateway, and serves until SIGINT or SIGTERM.

use std::sync::Arc;

use glossa_config::GlossaConfig;
use glossa_core::{ExampleRetriever, GlossaError};
use glossa_gateway::{AuthConfig, DocumentEditor, GatewayState, ServerConfig};
use glossa_resilience::{QueueSettings, WorkQueue};
use glossa_storage::{Database, SqliteDocumentStore, SqliteExampleStore};
use glossa_translate::Translator;
use glossa_usage::{SqliteQuotaStore, UsageAccountant, UsageLedger};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the `glossa serve` command.
pub async fn run_serve(config: GlossaConfig) -> Result<(), GlossaError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let provider = glossa_openai::build_provider(&config.provider)?;

    let queue = WorkQueue::new(QueueSettings::from(&config.queue));
    let retriever: Arc<dyn ExampleRetriever> = Arc::new(SqliteExampleStore::new(db.clone()));
    let translator = Translator::from_config(&config, provider, queue.clone(), Some(retriever));

    let accountant = UsageAccountant::new(Arc::new(SqliteQuotaStore::new(db.clone())))
        .with_ledger(UsageLedger::new(db.clone()));
    let editor = DocumentEditor::new(
        Arc::new(SqliteDocumentStore::new(db.clone())),
        accountant,
        translator,
    );

    let server_config = ServerConfig::from(&config.gateway);
    let state = GatewayState::new(
        editor,
        AuthConfig {
            bearer_token: server_config.bearer_token.clone(),
        },
    );
    if server_config.bearer_token.is_none() {
        warn!("no gateway bearer token configured, /v1 routes rely on upstream auth");
    }

    info!(
        service = %config.service.name,
        provider = %config.provider.kind,
        concurrency = config.queue.concurrency,
        interval_cap = config.queue.interval_cap,
        interval_secs = config.queue.interval_secs,
        "glossa serve starting"
    );

    let cancel = install_signal_handler();
    let shutdown = cancel.clone();
    glossa_gateway::start_server(&server_config, state, async move {
        shutdown.cancelled().await;
    })
    .await?;

    queue.close();
    if let Err(e) = db.checkpoint().await {
        warn!(error = %e, "final WAL checkpoint failed");
    }
    info!("glossa serve shutdown complete");
    Ok(())
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, waiting for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received Ctrl+C, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}
