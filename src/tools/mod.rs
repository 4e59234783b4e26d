//! Study tools built on the processed texts.
//!
//! Every tool tries the configured backend once and falls back to a local
//! generator on any failure, so each operation always produces a result.

pub mod artifact;
pub mod audio_script;
pub mod chat;
pub mod flashcards;
pub mod quiz;
pub mod summary;
pub mod text;

pub use artifact::{ExportFormat, Exported, StudyRecord};
pub use audio_script::{AudioScript, AudioScriptGenerator, ScriptKind};
pub use chat::{ChatCommand, ChatReply, ChatSession};
pub use flashcards::{Flashcard, FlashcardGenerator, FlashcardOptions, FlashcardSet, FlashcardStyle};
pub use quiz::{Quiz, QuizDifficulty, QuizGenerator, QuizOptions, QuizQuestion};
pub use summary::{SummaryLevel, Summarizer};

use crate::backend::Backend;
use crate::config::{Prompts, ToolSettings};
use crate::storage::FileStore;

/// All tools wired to one backend, prompt set and store.
#[derive(Debug, Clone)]
pub struct Toolbox {
    pub backend: Backend,
    pub prompts: Prompts,
    pub flashcards: FlashcardGenerator,
    pub quiz: QuizGenerator,
    pub summarizer: Summarizer,
    pub audio_scripts: AudioScriptGenerator,
    settings: ToolSettings,
}

impl Toolbox {
    pub fn new(backend: Backend, prompts: Prompts, store: FileStore, settings: &ToolSettings) -> Self {
        let budget = settings.study_budget_chars;
        Self {
            flashcards: FlashcardGenerator::new(backend.clone(), prompts.clone(), store.clone(), budget),
            quiz: QuizGenerator::new(backend.clone(), prompts.clone(), store.clone(), budget),
            summarizer: Summarizer::new(
                backend.clone(),
                prompts.clone(),
                settings.summary_budget_chars,
            ),
            audio_scripts: AudioScriptGenerator::new(
                backend.clone(),
                prompts.clone(),
                store,
                settings.chat_budget_chars,
            ),
            backend,
            prompts,
            settings: settings.clone(),
        }
    }

    /// Start a chat over the given texts.
    pub fn chat(&self, texts: &[String]) -> ChatSession {
        ChatSession::new(
            self.backend.clone(),
            self.prompts.clone(),
            self.summarizer.clone(),
            texts,
            self.settings.chat_budget_chars,
            self.settings.summary_budget_chars,
        )
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }
}

/// Make a backend result exactly `count` long.
///
/// Extra records are dropped; missing ones are taken from the local
/// generator, skipping as many of its records as the backend supplied.
pub(crate) fn fit_to_count<T>(mut records: Vec<T>, count: usize, fallback: impl FnOnce(usize) -> Vec<T>) -> Vec<T> {
    if records.len() >= count {
        records.truncate(count);
        return records;
    }
    let have = records.len();
    records.extend(fallback(count).into_iter().skip(have));
    records
}

/// `part` as a percentage of `total`; zero when there is nothing to score.
pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockGenerator;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_audio_scripts_use_chat_budget() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockGenerator::replying("[MAIN CONTENT]\nNarration."));
        let toolbox = Toolbox::new(
            Backend::new(mock.clone()),
            Prompts::default(),
            FileStore::new(dir.path()),
            &ToolSettings::default(),
        );

        toolbox
            .audio_scripts
            .generate(&["ø".repeat(10_000)], ScriptKind::Summary)
            .await
            .unwrap();

        let prompts = mock.prompts();
        let material = prompts[0].chars().filter(|&c| c == 'ø').count();
        assert!(material > 1900);
        assert!(material <= 2000);
    }

    #[test]
    fn test_fit_to_count() {
        let filler = |n: usize| (100..100 + n).collect::<Vec<_>>();
        assert_eq!(fit_to_count(vec![1, 2, 3], 2, filler), vec![1, 2]);
        assert_eq!(fit_to_count(vec![1], 3, filler), vec![1, 101, 102]);
        assert_eq!(fit_to_count(Vec::new(), 2, filler), vec![100, 101]);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 4), 75.0);
    }
}
