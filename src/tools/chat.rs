//! Conversational Q&A over the processed texts.

use super::summary::{SummaryLevel, Summarizer};
use super::text::{join_plain, prepare_context, split_sentences, truncate_chars};
use crate::backend::{resilient, Backend, Generated};
use crate::config::Prompts;
use crate::error::StudyBoxError;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Exchanges kept in memory.
pub const MAX_HISTORY: usize = 10;
/// Exchanges included in each prompt.
const PROMPT_HISTORY: usize = 3;
/// Assistant replies are cut to this many characters in the prompt history.
const HISTORY_REPLY_CHARS: usize = 100;

const CANNED_ANSWERS: [&str; 3] = [
    "I could not find that topic in your material. Try rephrasing the question \
     with terms that appear in your notes.",
    "That question goes beyond what I can answer in local mode. Review the \
     sections of your material related to it and ask again with more specific words.",
    "I am running without an AI backend right now. Try the 'summary' or \
     'concepts' commands to get an overview of your material.",
];

pub type ChatReply = Generated<String>;

/// A parsed line of chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Summary,
    Concepts,
    Examples,
    Exit,
    Empty,
    Question(String),
}

impl ChatCommand {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "" => ChatCommand::Empty,
            "summary" | "resumen" => ChatCommand::Summary,
            "concepts" | "conceptos" => ChatCommand::Concepts,
            "examples" | "ejemplos" => ChatCommand::Examples,
            "exit" | "quit" | "bye" | "salir" => ChatCommand::Exit,
            _ => ChatCommand::Question(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub user: String,
    pub assistant: String,
}

/// A chat over a fixed set of texts, with bounded history.
#[derive(Debug, Clone)]
pub struct ChatSession {
    backend: Backend,
    prompts: Prompts,
    summarizer: Summarizer,
    texts: Vec<String>,
    answer_budget: usize,
    command_budget: usize,
    history: Vec<ChatExchange>,
}

impl ChatSession {
    pub fn new(
        backend: Backend,
        prompts: Prompts,
        summarizer: Summarizer,
        texts: &[String],
        answer_budget: usize,
        command_budget: usize,
    ) -> Self {
        Self {
            backend,
            prompts,
            summarizer,
            texts: texts.to_vec(),
            answer_budget,
            command_budget,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatExchange] {
        &self.history
    }

    /// Handle one command. Returns `None` for `Exit` and `Empty`.
    #[instrument(skip(self))]
    pub async fn handle(&mut self, command: ChatCommand) -> Option<ChatReply> {
        let (label, reply) = match command {
            ChatCommand::Exit | ChatCommand::Empty => return None,
            ChatCommand::Summary => (
                "summary".to_string(),
                self.summarizer.summarize(&self.texts, SummaryLevel::Medium).await,
            ),
            ChatCommand::Concepts => (
                "concepts".to_string(),
                self.summarizer.key_concepts(&self.texts).await,
            ),
            ChatCommand::Examples => ("examples".to_string(), self.examples().await),
            ChatCommand::Question(question) => {
                let reply = self.answer(&question).await;
                (question, reply)
            }
        };

        self.remember(label, reply.value.clone());
        Some(reply)
    }

    async fn answer(&self, question: &str) -> ChatReply {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), prepare_context(&self.texts, self.answer_budget));
        vars.insert("history".to_string(), self.format_history());
        vars.insert("question".to_string(), question.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.chat.answer, &vars);

        resilient(
            "chat_answer",
            async {
                let reply = self.backend.generate(&prompt).await?;
                Ok::<_, StudyBoxError>(reply.trim().to_string())
            },
            || fallback_answer(question, &join_plain(&self.texts)),
        )
        .await
    }

    async fn examples(&self) -> ChatReply {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), prepare_context(&self.texts, self.command_budget));
        let prompt = self.prompts.render_with_custom(&self.prompts.chat.examples, &vars);

        resilient(
            "chat_examples",
            async {
                let reply = self.backend.generate(&prompt).await?;
                Ok::<_, StudyBoxError>(reply.trim().to_string())
            },
            || fallback_examples(&join_plain(&self.texts)),
        )
        .await
    }

    fn remember(&mut self, user: String, assistant: String) {
        self.history.push(ChatExchange { user, assistant });
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
        debug!("Chat history holds {} exchanges", self.history.len());
    }

    /// The last few exchanges, replies shortened, for the answer prompt.
    pub fn format_history(&self) -> String {
        if self.history.is_empty() {
            return "(no previous conversation)".to_string();
        }
        let start = self.history.len().saturating_sub(PROMPT_HISTORY);
        self.history[start..]
            .iter()
            .map(|exchange| {
                let reply = truncate_chars(&exchange.assistant, HISTORY_REPLY_CHARS);
                let ellipsis = if reply.len() < exchange.assistant.len() { "..." } else { "" };
                format!("Student: {}\nAssistant: {}{}", exchange.user, reply, ellipsis)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn significant_words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.chars().count() >= 4)
        .collect()
}

/// Answer from the material without a backend.
///
/// Quotes the sentence sharing the most words with the question; with no
/// overlap, picks a canned reply by the question's byte sum.
pub fn fallback_answer(question: &str, text: &str) -> String {
    let wanted = significant_words(question);

    let mut best: Option<(usize, String)> = None;
    for sentence in split_sentences(text) {
        let overlap = significant_words(&sentence).intersection(&wanted).count();
        if overlap > 0 && best.as_ref().map_or(true, |(score, _)| overlap > *score) {
            best = Some((overlap, sentence));
        }
    }

    match best {
        Some((_, sentence)) => format!(
            "From your material: \"{}.\"\n\n(Local mode: connect an AI backend for fuller explanations.)",
            sentence
        ),
        None => {
            let sum: usize = question.bytes().map(usize::from).sum();
            CANNED_ANSWERS[sum % CANNED_ANSWERS.len()].to_string()
        }
    }
}

/// Examples built from the opening sentences of the material.
pub fn fallback_examples(text: &str) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return "No examples are available in local mode: the material is too short.".to_string();
    }
    sentences
        .iter()
        .take(2)
        .enumerate()
        .map(|(i, s)| {
            format!(
                "Example {}: think of a real situation where this applies.\n  {}.",
                i + 1,
                s
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockGenerator, Origin};
    use std::sync::Arc;

    const MATERIAL: &str = "Enzymes speed up chemical reactions in the body. \
        Temperature changes how quickly enzymes work. \
        Each enzyme fits a specific substrate like a key.";

    fn session(backend: Backend) -> ChatSession {
        let prompts = Prompts::default();
        let summarizer = Summarizer::new(backend.clone(), prompts.clone(), 1500);
        ChatSession::new(backend, prompts, summarizer, &[MATERIAL.to_string()], 2000, 1500)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse(" Summary "), ChatCommand::Summary);
        assert_eq!(ChatCommand::parse("concepts"), ChatCommand::Concepts);
        assert_eq!(ChatCommand::parse("EXAMPLES"), ChatCommand::Examples);
        for exit in ["exit", "quit", "bye"] {
            assert_eq!(ChatCommand::parse(exit), ChatCommand::Exit);
        }
        assert_eq!(ChatCommand::parse("   "), ChatCommand::Empty);
        assert_eq!(
            ChatCommand::parse(" What is an enzyme? "),
            ChatCommand::Question("What is an enzyme?".to_string())
        );
    }

    #[test]
    fn test_fallback_answer_quotes_relevant_sentence() {
        let answer = fallback_answer("How does temperature affect them?", MATERIAL);
        assert!(answer.starts_with("From your material: \"Temperature changes how quickly enzymes work.\""));
    }

    #[test]
    fn test_fallback_answer_canned_is_deterministic() {
        let first = fallback_answer("zzz?", MATERIAL);
        let second = fallback_answer("zzz?", MATERIAL);
        assert_eq!(first, second);
        assert!(CANNED_ANSWERS.contains(&first.as_str()));
    }

    #[tokio::test]
    async fn test_exit_and_empty_produce_no_reply() {
        let mut chat = session(Backend::disabled());
        assert!(chat.handle(ChatCommand::Exit).await.is_none());
        assert!(chat.handle(ChatCommand::Empty).await.is_none());
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let mut chat = session(Backend::disabled());
        for i in 0..12 {
            let reply = chat
                .handle(ChatCommand::Question(format!("question {}", i)))
                .await
                .unwrap();
            assert_eq!(reply.origin, Origin::Fallback);
        }
        assert_eq!(chat.history().len(), MAX_HISTORY);
        assert_eq!(chat.history()[0].user, "question 2");
    }

    #[tokio::test]
    async fn test_prompt_carries_recent_history() {
        let long_reply = "x".repeat(150);
        let mock = Arc::new(MockGenerator::replying(&long_reply));
        let mut chat = session(Backend::new(mock.clone()));

        for i in 0..4 {
            chat.handle(ChatCommand::Question(format!("q{}", i))).await.unwrap();
        }

        let last_prompt = mock.prompts().last().cloned().unwrap();
        assert!(last_prompt.contains("CURRENT QUESTION: q3"));
        assert!(last_prompt.contains("Student: q0"));
        assert!(last_prompt.contains("Student: q2"));

        let history = chat.format_history();
        assert!(!history.contains("Student: q0"));
        assert!(history.contains(&format!("Assistant: {}...", "x".repeat(100))));
    }

    #[tokio::test]
    async fn test_special_commands_without_backend() {
        let mut chat = session(Backend::disabled());

        let summary = chat.handle(ChatCommand::Summary).await.unwrap();
        assert!(summary.value.starts_with("Summary (medium, local mode):"));

        let examples = chat.handle(ChatCommand::Examples).await.unwrap();
        assert!(examples.value.starts_with("Example 1:"));

        assert_eq!(chat.history()[0].user, "summary");
        assert_eq!(chat.history()[1].user, "examples");
    }
}
