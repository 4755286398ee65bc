// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt composition under character budgets.
//!
//! A prompt is assembled from four parts, in this order:
//! - the persona system message (new document) or the document's stored one,
//! - a newest-first slice of attached (user, assistant) history pairs,
//! - similar translation examples appended to the instruction,
//! - the instruction itself followed by the input text.
//!
//! History is capped by `max_history_chars`, examples by `max_examples_chars`
//! and whatever the total budget leaves. If the whole prompt still exceeds
//! `max_prompt_chars`, the oldest history pairs go first, then the least
//! similar examples.

use std::sync::Arc;

use glossa_config::model::PromptConfig;
use glossa_core::{
    Block, ConversationMessage, EditKind, ExamplePair, ExampleRetriever, GlossaError,
    PromptMessage, Role, TranslateOptions,
};
use tracing::{debug, warn};

/// Separator between the two sides of a rendered example.
pub const EXAMPLE_SEPARATOR: &str = " ↔ ";

const EXAMPLES_INTRO: &str = ", use these examples:\n";

/// Character budgets for one prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudgets {
    pub max_prompt_chars: usize,
    pub max_history_chars: usize,
    pub max_examples_chars: usize,
}

impl From<&PromptConfig> for PromptBudgets {
    fn from(config: &PromptConfig) -> Self {
        Self {
            max_prompt_chars: config.max_prompt_chars,
            max_history_chars: config.max_history_chars,
            max_examples_chars: config.max_examples_chars,
        }
    }
}

/// What ended up in a composed prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromptStats {
    pub history_pairs: usize,
    pub history_chars: usize,
    pub examples: usize,
    pub examples_chars: usize,
    pub total_chars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    /// Messages to send, in order.
    pub messages: Vec<PromptMessage>,
    /// Records to append to the document history. The last one is always the
    /// user record holding the undecorated input.
    pub new_records: Vec<ConversationMessage>,
    pub stats: PromptStats,
}

/// One replayable exchange from the stored history.
struct HistoryPair<'a> {
    user: &'a ConversationMessage,
    assistant: &'a ConversationMessage,
}

impl HistoryPair<'_> {
    fn char_len(&self) -> usize {
        self.user.content.chars().count() + self.assistant.content.chars().count()
    }

    fn concerns(&self, block_id: &str) -> bool {
        self.user.relevant_block_id.as_deref() == Some(block_id)
            || self.assistant.relevant_block_id.as_deref() == Some(block_id)
    }
}

fn render_example(pair: &ExamplePair) -> String {
    format!("{}{EXAMPLE_SEPARATOR}{}", pair.source, pair.target)
}

fn rendered_examples_len(examples: &[ExamplePair]) -> usize {
    if examples.is_empty() {
        return 0;
    }
    let pairs: usize = examples
        .iter()
        .map(|p| p.char_len() + EXAMPLE_SEPARATOR.chars().count())
        .sum();
    EXAMPLES_INTRO.chars().count() + pairs + examples.len() - 1
}

#[derive(Clone)]
pub struct PromptComposer {
    persona: String,
    budgets: PromptBudgets,
    retriever: Option<Arc<dyn ExampleRetriever>>,
}

impl PromptComposer {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            persona: config.persona.clone(),
            budgets: PromptBudgets::from(config),
            retriever: None,
        }
    }

    /// Pulls few-shot examples from `retriever` for every prompt.
    pub fn with_retriever(mut self, retriever: Arc<dyn ExampleRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn budgets(&self) -> PromptBudgets {
        self.budgets
    }

    /// The system message opening a new document's conversation.
    pub fn persona_message(&self, options: &TranslateOptions) -> String {
        format!(
            "{}, fluent in {} and {}",
            self.persona,
            options.original_language.display_name(),
            options.target_language.display_name()
        )
    }

    /// The final user message for `input`.
    pub fn instruction(
        &self,
        input: &str,
        examples: &[ExamplePair],
        options: &TranslateOptions,
    ) -> String {
        let mut text = format!(
            "Translate from {} to {}, make sure to make no grammar or spelling mistakes",
            options.original_language.display_name(),
            options.target_language.display_name()
        );
        if !examples.is_empty() {
            text.push_str(EXAMPLES_INTRO);
            let rendered: Vec<String> = examples.iter().map(render_example).collect();
            text.push_str(&rendered.join("\n"));
        }
        text.push_str(":\n\n");
        text.push_str(input);
        text
    }

    /// Builds the prompt for `block`, whose text must already be normalized.
    ///
    /// A retrieval error only means the prompt carries no examples. Fails when
    /// the system message and instruction alone exceed `max_prompt_chars`.
    pub async fn compose(
        &self,
        block: &Block,
        history: &[ConversationMessage],
        options: &TranslateOptions,
    ) -> Result<ComposedPrompt, GlossaError> {
        let mut new_records = Vec::new();

        let system = match history.iter().find(|m| m.role == Role::System) {
            Some(stored) => stored.content.clone(),
            None => {
                let persona = self.persona_message(options);
                new_records.push(ConversationMessage::new(Role::System, persona.clone()));
                persona
            }
        };
        let system_chars = system.chars().count();

        let mut pairs = self.select_history(block, history, options.edit_kind);
        let base_instruction_chars = self.instruction(&block.text, &[], options).chars().count();

        let history_chars: usize = pairs.iter().map(HistoryPair::char_len).sum();
        let left = self
            .budgets
            .max_prompt_chars
            .saturating_sub(system_chars + history_chars + base_instruction_chars)
            .saturating_sub(EXAMPLES_INTRO.chars().count());
        let example_budget = left.min(self.budgets.max_examples_chars);
        let mut examples = self.fetch_examples(&block.text, options, example_budget).await;

        // Final guard on the total.
        loop {
            let history_chars: usize = pairs.iter().map(HistoryPair::char_len).sum();
            let total = system_chars
                + history_chars
                + base_instruction_chars
                + rendered_examples_len(&examples);
            if total <= self.budgets.max_prompt_chars {
                break;
            }
            if !pairs.is_empty() {
                pairs.remove(0);
            } else if examples.pop().is_none() {
                warn!(
                    total,
                    budget = self.budgets.max_prompt_chars,
                    "system message and instruction alone exceed the prompt budget"
                );
                return Err(GlossaError::Validation(
                    "prompt does not fit the character budget".into(),
                ));
            }
        }

        let mut messages = Vec::with_capacity(2 + pairs.len() * 2);
        messages.push(PromptMessage::new(Role::System, system));
        for pair in &pairs {
            messages.push(PromptMessage::from(pair.user));
            messages.push(PromptMessage::from(pair.assistant));
        }
        messages.push(PromptMessage::new(
            Role::User,
            self.instruction(&block.text, &examples, options),
        ));

        new_records.push(
            ConversationMessage::new(Role::User, block.text.clone()).for_block(&block.id),
        );

        let stats = PromptStats {
            history_pairs: pairs.len(),
            history_chars: pairs.iter().map(HistoryPair::char_len).sum(),
            examples: examples.len(),
            examples_chars: rendered_examples_len(&examples),
            total_chars: messages.iter().map(PromptMessage::char_len).sum(),
        };
        debug!(
            block_id = %block.id,
            history_pairs = stats.history_pairs,
            history_chars = stats.history_chars,
            examples = stats.examples,
            total_chars = stats.total_chars,
            "prompt composed"
        );

        Ok(ComposedPrompt {
            messages,
            new_records,
            stats,
        })
    }

    /// Attached pairs, newest first until the history budget is hit, returned
    /// in chronological order.
    fn select_history<'a>(
        &self,
        block: &Block,
        history: &'a [ConversationMessage],
        edit_kind: EditKind,
    ) -> Vec<HistoryPair<'a>> {
        let mut selected = Vec::new();
        let mut used = 0;
        let candidates = history
            .windows(2)
            .rev()
            .filter(|w| w[0].role == Role::User && w[1].role == Role::Assistant)
            .map(|w| HistoryPair {
                user: &w[0],
                assistant: &w[1],
            })
            .filter(|p| p.user.attach_to_prompt && p.assistant.attach_to_prompt)
            .filter(|p| edit_kind != EditKind::EditBlock || !p.concerns(&block.id));

        for pair in candidates {
            let len = pair.char_len();
            if used + len > self.budgets.max_history_chars {
                break;
            }
            used += len;
            selected.push(pair);
        }
        selected.reverse();
        selected
    }

    async fn fetch_examples(
        &self,
        query: &str,
        options: &TranslateOptions,
        budget: usize,
    ) -> Vec<ExamplePair> {
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };
        if budget == 0 {
            return Vec::new();
        }

        let found = match retriever
            .find_similar_examples(
                query,
                options.original_language,
                options.target_language,
                budget,
            )
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "example retrieval failed, composing without examples");
                return Vec::new();
            }
        };

        // The retriever's own budget accounting may differ from the rendered size.
        let mut kept = Vec::new();
        for pair in found {
            kept.push(pair);
            if rendered_examples_len(&kept) - EXAMPLES_INTRO.chars().count() > budget {
                kept.pop();
                break;
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CannedRetriever;
    use glossa_core::Language;

    fn options() -> TranslateOptions {
        TranslateOptions {
            original_language: Language::Vn,
            target_language: Language::Ru,
            edit_kind: EditKind::NewBlock,
        }
    }

    fn block(id: &str, text: &str) -> Block {
        Block {
            id: id.into(),
            text: text.into(),
        }
    }

    fn composer() -> PromptComposer {
        PromptComposer::new(&PromptConfig::default())
    }

    fn exchange(block_id: &str, user: &str, assistant: &str) -> Vec<ConversationMessage> {
        vec![
            ConversationMessage::new(Role::User, user).for_block(block_id),
            ConversationMessage::new(Role::Assistant, assistant).for_block(block_id),
        ]
    }

    fn history_with_system() -> Vec<ConversationMessage> {
        vec![ConversationMessage::new(
            Role::System,
            "You have an Ph.D in petroleum geology, fluent in Vietnamese and Russian",
        )]
    }

    #[tokio::test]
    async fn first_prompt_opens_with_persona() {
        let prompt = composer()
            .compose(&block("b1", "Xin chào"), &[], &options())
            .await
            .unwrap();

        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert_eq!(
            prompt.messages[0].content,
            "You have an Ph.D in petroleum geology, fluent in Vietnamese and Russian"
        );

        assert_eq!(prompt.new_records.len(), 2);
        assert_eq!(prompt.new_records[0].role, Role::System);
        assert!(prompt.new_records[0].attach_to_prompt);
        let user = &prompt.new_records[1];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "Xin chào");
        assert_eq!(user.relevant_block_id.as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn instruction_wraps_the_input() {
        let prompt = composer()
            .compose(&block("b1", "Đá phiến sét"), &[], &options())
            .await
            .unwrap();
        let last = prompt.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            last.content,
            "Translate from Vietnamese to Russian, make sure to make no grammar or spelling \
             mistakes:\n\nĐá phiến sét"
        );
    }

    #[tokio::test]
    async fn stored_system_message_and_attached_pairs_are_replayed() {
        let mut history = history_with_system();
        history.extend(exchange("b1", "Một", "Один"));
        history.extend(
            exchange("b2", "Hai", "Два")
                .into_iter()
                .map(|m| m.attached(false)),
        );
        history.extend(exchange("b3", "Ba", "Три"));

        let prompt = composer()
            .compose(&block("b4", "Bốn"), &history, &options())
            .await
            .unwrap();

        let contents: Vec<&str> = prompt.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[0], history[0].content);
        assert_eq!(&contents[1..5], &["Một", "Один", "Ba", "Три"]);
        assert_eq!(prompt.messages.len(), 6);
        assert_eq!(prompt.stats.history_pairs, 2);

        // Only the user record is new; the system message already exists.
        assert_eq!(prompt.new_records.len(), 1);
        assert_eq!(prompt.new_records[0].role, Role::User);
    }

    #[tokio::test]
    async fn editing_a_block_skips_its_old_exchanges() {
        let mut history = history_with_system();
        history.extend(exchange("b1", "Một", "Один"));
        history.extend(exchange("b2", "Hai", "Два"));

        let opts = TranslateOptions {
            edit_kind: EditKind::EditBlock,
            ..options()
        };
        let prompt = composer()
            .compose(&block("b1", "Một lần nữa"), &history, &opts)
            .await
            .unwrap();

        let contents: Vec<&str> = prompt.messages.iter().map(|m| m.content.as_str()).collect();
        assert!(!contents.contains(&"Один"));
        assert!(contents.contains(&"Два"));
    }

    #[tokio::test]
    async fn long_history_keeps_newest_pairs_within_budget() {
        let mut history = history_with_system();
        for i in 0..50 {
            history.extend(exchange(
                &format!("b{i}"),
                &format!("{i:03}{}", "u".repeat(247)),
                &format!("{i:03}{}", "a".repeat(247)),
            ));
        }

        let c = composer();
        let prompt = c
            .compose(&block("new", "Tầng chứa dầu"), &history, &options())
            .await
            .unwrap();

        assert!(prompt.stats.history_chars <= c.budgets().max_history_chars);
        assert_eq!(prompt.stats.history_pairs, 3);
        assert!(prompt.messages[1].content.starts_with("047"));
        assert!(prompt.messages[5].content.starts_with("049"));
        assert!(prompt.stats.total_chars <= c.budgets().max_prompt_chars);
    }

    #[tokio::test]
    async fn examples_are_rendered_with_separator() {
        let retriever = CannedRetriever::new(vec![
            ExamplePair::new("Cát kết", "Песчаник"),
            ExamplePair::new("Đá vôi", "Известняк"),
        ]);
        let prompt = composer()
            .with_retriever(retriever.clone())
            .compose(&block("b1", "Cát kết hạt mịn"), &[], &options())
            .await
            .unwrap();

        let last = &prompt.messages.last().unwrap().content;
        assert!(last.contains(
            ", use these examples:\nCát kết ↔ Песчаник\nĐá vôi ↔ Известняк:\n\n"
        ));
        assert!(last.ends_with("Cát kết hạt mịn"));
        assert_eq!(prompt.stats.examples, 2);

        let budget = retriever.last_budget.lock().unwrap().unwrap();
        assert!(budget <= PromptConfig::default().max_examples_chars);
    }

    #[tokio::test]
    async fn retrieval_failure_means_no_examples() {
        let prompt = composer()
            .with_retriever(CannedRetriever::failing())
            .compose(&block("b1", "Giếng khoan"), &[], &options())
            .await
            .unwrap();
        assert_eq!(prompt.stats.examples, 0);
        assert!(!prompt.messages.last().unwrap().content.contains("examples"));
    }

    #[tokio::test]
    async fn total_budget_is_never_exceeded() {
        let config = PromptConfig {
            max_prompt_chars: 600,
            max_history_chars: 1500,
            max_examples_chars: 3000,
            ..PromptConfig::default()
        };
        let mut history = history_with_system();
        for i in 0..10 {
            history.extend(exchange(&format!("b{i}"), &"u".repeat(50), &"a".repeat(50)));
        }
        let retriever =
            CannedRetriever::new(vec![ExamplePair::new("x".repeat(40), "y".repeat(40))]);
        let c = PromptComposer::new(&config).with_retriever(retriever);

        let prompt = c
            .compose(&block("new", &"z".repeat(200)), &history, &options())
            .await
            .unwrap();

        assert!(prompt.stats.total_chars <= 600, "total {}", prompt.stats.total_chars);
        assert!(prompt.stats.history_pairs < 10);
        let sum: usize = prompt.messages.iter().map(PromptMessage::char_len).sum();
        assert_eq!(sum, prompt.stats.total_chars);
    }

    #[tokio::test]
    async fn oversized_stored_system_message_is_rejected() {
        let config = PromptConfig {
            max_prompt_chars: 600,
            ..PromptConfig::default()
        };
        let history = vec![ConversationMessage::new(Role::System, "p".repeat(700))];

        let err = PromptComposer::new(&config)
            .compose(&block("b1", "Xin chào"), &history, &options())
            .await
            .unwrap_err();

        assert!(matches!(err, GlossaError::Validation(_)));
    }
}
