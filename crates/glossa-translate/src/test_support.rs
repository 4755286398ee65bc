// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted collaborators for the unit tests of this crate.
//!
//! `glossa-test-utils` depends on this crate, so its mocks cannot be used here.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use glossa_core::{
    CompletionProvider, CompletionRequest, ExamplePair, ExampleRetriever, GlossaError, Language,
    ProviderFailure, ProviderResponse, TokenUsage,
};
use glossa_resilience::{BackoffPolicy, QueueSettings, WorkQueue};

/// Replays a fixed list of outcomes, one per call.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderFailure>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
    stalled_calls: usize,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderFailure>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    /// The first `stalled_calls` calls hang for an hour before answering.
    pub fn stalling(
        stalled_calls: usize,
        script: Vec<Result<ProviderResponse, ProviderFailure>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            stalled_calls,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<ProviderResponse, ProviderFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        if call < self.stalled_calls {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(reply("unscripted", 1, 1)))
    }
}

pub fn reply(text: &str, prompt_tokens: u32, completion_tokens: u32) -> ProviderResponse {
    ProviderResponse {
        text: Some(text.to_string()),
        usage: Some(TokenUsage::new(prompt_tokens, completion_tokens)),
    }
}

pub fn transient(status: u16) -> ProviderFailure {
    ProviderFailure::Transient {
        status: Some(status),
        message: format!("status {status}"),
    }
}

pub fn fatal(status: u16) -> ProviderFailure {
    ProviderFailure::Fatal {
        status: Some(status),
        message: format!("status {status}"),
    }
}

pub fn queue() -> WorkQueue {
    WorkQueue::new(QueueSettings {
        concurrency: 1,
        interval_cap: 100,
        interval: Duration::from_secs(1),
        task_timeout: Duration::from_secs(30),
    })
}

pub fn policy(max_attempts: u32) -> BackoffPolicy {
    BackoffPolicy {
        max_attempts,
        starting_delay: Duration::from_secs(20),
        multiplier: 2.0,
        max_delay: None,
    }
}

/// Retriever returning canned pairs, or failing on demand.
pub struct CannedRetriever {
    pub pairs: Vec<ExamplePair>,
    pub fail: bool,
    pub last_budget: Mutex<Option<usize>>,
}

impl CannedRetriever {
    pub fn new(pairs: Vec<ExamplePair>) -> Arc<Self> {
        Arc::new(Self {
            pairs,
            fail: false,
            last_budget: Mutex::new(None),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            pairs: Vec::new(),
            fail: true,
            last_budget: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ExampleRetriever for CannedRetriever {
    async fn find_similar_examples(
        &self,
        _query: &str,
        _source: Language,
        _target: Language,
        max_total_chars: usize,
    ) -> Result<Vec<ExamplePair>, GlossaError> {
        *self.last_budget.lock().unwrap() = Some(max_total_chars);
        if self.fail {
            return Err(GlossaError::Internal("index unavailable".into()));
        }
        Ok(self.pairs.clone())
    }
}
