//! Summaries and key-concept extraction.

use super::text::{frequent_terms, join_plain, prepare_context, split_sentences};
use crate::backend::{resilient, Backend, Generated};
use crate::config::Prompts;
use crate::error::{Result, StudyBoxError};
use std::collections::HashMap;
use tracing::instrument;

const CONCEPT_MIN_CHARS: usize = 6;
const CONCEPT_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryLevel {
    Short,
    #[default]
    Medium,
    Detailed,
}

impl SummaryLevel {
    pub const ALL: [SummaryLevel; 3] = [SummaryLevel::Short, SummaryLevel::Medium, SummaryLevel::Detailed];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLevel::Short => "short",
            SummaryLevel::Medium => "medium",
            SummaryLevel::Detailed => "detailed",
        }
    }

    /// Target number of bullet points.
    pub fn points(&self) -> usize {
        match self {
            SummaryLevel::Short => 3,
            SummaryLevel::Medium => 5,
            SummaryLevel::Detailed => 8,
        }
    }
}

impl std::str::FromStr for SummaryLevel {
    type Err = StudyBoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "short" => Ok(SummaryLevel::Short),
            "2" | "medium" => Ok(SummaryLevel::Medium),
            "3" | "detailed" | "long" => Ok(SummaryLevel::Detailed),
            other => Err(StudyBoxError::InvalidInput(format!(
                "Unknown summary level: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Summarizer {
    backend: Backend,
    prompts: Prompts,
    budget_chars: usize,
}

impl Summarizer {
    pub fn new(backend: Backend, prompts: Prompts, budget_chars: usize) -> Self {
        Self {
            backend,
            prompts,
            budget_chars,
        }
    }

    /// Summarize the texts at the given level.
    #[instrument(skip(self, texts), fields(level = level.as_str()))]
    pub async fn summarize(&self, texts: &[String], level: SummaryLevel) -> Generated<String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), prepare_context(texts, self.budget_chars));
        vars.insert("level".to_string(), level.as_str().to_string());
        vars.insert("points".to_string(), level.points().to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.summary.summary, &vars);

        resilient(
            "summary",
            async {
                let reply = self.backend.generate(&prompt).await?;
                Ok::<_, StudyBoxError>(reply.trim().to_string())
            },
            || fallback_summary(&join_plain(texts), level),
        )
        .await
    }

    /// List the main concepts of the texts.
    #[instrument(skip(self, texts))]
    pub async fn key_concepts(&self, texts: &[String]) -> Generated<String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), prepare_context(texts, self.budget_chars));
        let prompt = self.prompts.render_with_custom(&self.prompts.summary.concepts, &vars);

        resilient(
            "key_concepts",
            async {
                let reply = self.backend.generate(&prompt).await?;
                Ok::<_, StudyBoxError>(reply.trim().to_string())
            },
            || fallback_concepts(&join_plain(texts)),
        )
        .await
    }
}

/// Extractive summary: the first sentences of the material as bullets.
pub fn fallback_summary(text: &str, level: SummaryLevel) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return "Summary (local mode): the material is too short to summarize. \
                Review the full text directly."
            .to_string();
    }

    let mut out = format!("Summary ({}, local mode):\n", level.as_str());
    for sentence in sentences.iter().take(level.points()) {
        out.push_str(&format!("• {}.\n", sentence));
    }
    if sentences.len() > level.points() {
        out.push_str(&format!(
            "\n{} more sentences are in the material.",
            sentences.len() - level.points()
        ));
    }
    out.trim_end().to_string()
}

/// Most frequent long words, as a concept list.
pub fn fallback_concepts(text: &str) -> String {
    let terms = frequent_terms(text, CONCEPT_MIN_CHARS, CONCEPT_LIMIT);
    if terms.is_empty() {
        return "Key concepts (local mode): no recurring terms were found in the material."
            .to_string();
    }

    let mut out = String::from("Key concepts (local mode):\n");
    for (term, count) in terms {
        let mentions = if count == 1 { "mention" } else { "mentions" };
        out.push_str(&format!("• {} ({} {})\n", term, count, mentions));
    }
    out.trim_end().to_string()
}
