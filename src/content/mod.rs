//! Content normalization for extracted text.

use crate::backend::{resilient, Backend};
use crate::config::Prompts;
use crate::error::StudyBoxError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, instrument};

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,;:!?\-()]").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Cleans extracted text and optionally polishes it with the backend.
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    backend: Backend,
    prompts: Prompts,
}

impl ContentNormalizer {
    pub fn new(backend: Backend, prompts: Prompts) -> Self {
        Self { backend, prompts }
    }

    /// Collapse whitespace, drop characters outside the allow-list, trim,
    /// and capitalize the first character.
    ///
    /// The allow-list is word characters, whitespace and `.,;:!?-()`.
    pub fn clean(text: &str) -> String {
        let allowed = DISALLOWED.replace_all(text, "");
        let collapsed = WHITESPACE.replace_all(&allowed, " ");
        capitalize_first(collapsed.trim())
    }

    /// Ask the backend to improve readability.
    ///
    /// Returns the input unchanged when it is blank, the backend is
    /// unavailable, or the call fails.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn improve(&self, text: &str) -> String {
        if text.trim().is_empty() || !self.backend.is_available() {
            debug!("Skipping text improvement");
            return text.to_string();
        }

        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.study.improve, &vars);

        resilient(
            "improve_text",
            async {
                let reply = self.backend.generate(&prompt).await?;
                Ok::<_, StudyBoxError>(reply.trim().to_string())
            },
            || text.to_string(),
        )
        .await
        .value
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockGenerator;
    use std::sync::Arc;

    #[test]
    fn test_clean_collapses_and_capitalizes() {
        assert_eq!(ContentNormalizer::clean("  Hello   world!! "), "Hello world!!");
        assert_eq!(ContentNormalizer::clean("hello\n\n\tthere"), "Hello there");
        assert_eq!(ContentNormalizer::clean(""), "");
        assert_eq!(ContentNormalizer::clean("   \n  "), "");
    }

    #[test]
    fn test_clean_strips_disallowed_characters() {
        assert_eq!(
            ContentNormalizer::clean("price: $5 @ store #1 (approx.)"),
            "Price: 5 store 1 (approx.)"
        );
        assert_eq!(ContentNormalizer::clean("échec - total; ok?"), "Échec - total; ok?");
    }

    #[tokio::test]
    async fn test_improve_without_backend_is_identity() {
        let normalizer = ContentNormalizer::new(Backend::disabled(), Prompts::default());
        assert_eq!(normalizer.improve("Some text").await, "Some text");
    }

    #[tokio::test]
    async fn test_improve_blank_skips_backend() {
        let mock = Arc::new(MockGenerator::replying("should not be used"));
        let normalizer = ContentNormalizer::new(Backend::new(mock.clone()), Prompts::default());
        assert_eq!(normalizer.improve("   ").await, "   ");
        assert!(mock.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_improve_uses_backend_reply() {
        let mock = Arc::new(MockGenerator::replying("  Polished text.  "));
        let normalizer = ContentNormalizer::new(Backend::new(mock.clone()), Prompts::default());
        assert_eq!(normalizer.improve("polished  text").await, "Polished text.");
        assert!(mock.prompts()[0].contains("polished  text"));
    }

    #[tokio::test]
    async fn test_improve_failure_returns_input() {
        let normalizer = ContentNormalizer::new(
            Backend::new(Arc::new(MockGenerator::failing("timeout"))),
            Prompts::default(),
        );
        assert_eq!(normalizer.improve("keep me").await, "keep me");
    }
}
