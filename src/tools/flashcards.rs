//! Flashcard generation and self-study scoring.

use super::artifact::{save_records, StudyRecord};
use super::text::{blank_out, join_plain, key_term, lead_words, prepare_context, split_sentences};
use super::fit_to_count;
use crate::backend::{parse_json_array, resilient, Backend, Origin};
use crate::config::Prompts;
use crate::error::{Result, StudyBoxError};
use crate::storage::{ArtifactKind, FileStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, instrument};

/// A question/answer card. Serialized with the keys `Q` and `A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(rename = "Q")]
    pub question: String,
    #[serde(rename = "A")]
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

impl StudyRecord for Flashcard {
    fn csv_header() -> &'static [&'static str] {
        &["Pregunta", "Respuesta"]
    }

    fn csv_row(&self) -> Vec<String> {
        vec![self.question.clone(), self.answer.clone()]
    }

    fn text_block(&self, number: usize) -> String {
        format!("Card {}\n  Q: {}\n  A: {}", number, self.question, self.answer)
    }

    fn question(&self) -> &str {
        &self.question
    }

    fn answer(&self) -> &str {
        &self.answer
    }

    fn set_question(&mut self, question: String) {
        self.question = question;
    }

    fn set_answer(&mut self, answer: String) -> Result<()> {
        self.answer = answer;
        Ok(())
    }
}

/// What the cards focus on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashcardStyle {
    #[default]
    Concepts,
    Definitions,
    Questions,
}

impl FlashcardStyle {
    pub const ALL: [FlashcardStyle; 3] = [
        FlashcardStyle::Concepts,
        FlashcardStyle::Definitions,
        FlashcardStyle::Questions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlashcardStyle::Concepts => "concepts",
            FlashcardStyle::Definitions => "definitions",
            FlashcardStyle::Questions => "questions",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FlashcardStyle::Concepts => "key concepts and ideas",
            FlashcardStyle::Definitions => "terms and their definitions",
            FlashcardStyle::Questions => "fill-in-the-blank questions",
        }
    }
}

impl std::str::FromStr for FlashcardStyle {
    type Err = StudyBoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "concepts" | "concept" => Ok(FlashcardStyle::Concepts),
            "2" | "definitions" | "definition" => Ok(FlashcardStyle::Definitions),
            "3" | "questions" | "question" => Ok(FlashcardStyle::Questions),
            other => Err(StudyBoxError::InvalidInput(format!(
                "Unknown flashcard style: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashcardOptions {
    pub count: usize,
    pub style: FlashcardStyle,
}

impl Default for FlashcardOptions {
    fn default() -> Self {
        Self {
            count: 10,
            style: FlashcardStyle::default(),
        }
    }
}

/// A generated and saved set.
#[derive(Debug, Clone)]
pub struct FlashcardSet {
    pub path: PathBuf,
    pub cards: Vec<Flashcard>,
    pub origin: Origin,
}

#[derive(Debug, Clone)]
pub struct FlashcardGenerator {
    backend: Backend,
    prompts: Prompts,
    store: FileStore,
    budget_chars: usize,
}

impl FlashcardGenerator {
    pub fn new(backend: Backend, prompts: Prompts, store: FileStore, budget_chars: usize) -> Self {
        Self {
            backend,
            prompts,
            store,
            budget_chars,
        }
    }

    /// Generate exactly `options.count` cards and save them under `flashcards/`.
    #[instrument(skip(self, texts), fields(count = options.count, style = options.style.as_str()))]
    pub async fn generate(&self, texts: &[String], options: &FlashcardOptions) -> Result<FlashcardSet> {
        let count = options.count.max(1);
        let context = prepare_context(texts, self.budget_chars);
        let plain = join_plain(texts);

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        vars.insert("count".to_string(), count.to_string());
        vars.insert("style".to_string(), options.style.as_str().to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.study.flashcards, &vars);

        let generated = resilient(
            "flashcards",
            async {
                let reply = self.backend.generate(&prompt).await?;
                let cards: Vec<Flashcard> = parse_json_array(&reply)?;
                Ok::<_, StudyBoxError>(fit_to_count(cards, count, |n| {
                    fallback_flashcards(&plain, n, options.style)
                }))
            },
            || fallback_flashcards(&plain, count, options.style),
        )
        .await;

        let stem = format!("flashcards_{}", options.style.as_str());
        let path = self.store.artifact_path(ArtifactKind::Flashcards, &stem, "json")?;
        save_records(&path, &generated.value)?;
        info!(
            "Saved {} flashcards ({}) to {}",
            generated.value.len(),
            generated.origin,
            path.display()
        );

        Ok(FlashcardSet {
            path,
            cards: generated.value,
            origin: generated.origin,
        })
    }

    /// Saved flashcard sets, oldest first.
    pub fn list_sets(&self) -> Result<Vec<PathBuf>> {
        self.store.list_artifacts(ArtifactKind::Flashcards, &["json"])
    }
}

/// Build `count` cards from the material without a backend.
///
/// One card per sentence of at least twenty characters; the rest is padded
/// with review cards so the count is always exact.
pub fn fallback_flashcards(text: &str, count: usize, style: FlashcardStyle) -> Vec<Flashcard> {
    let mut cards: Vec<Flashcard> = split_sentences(text)
        .iter()
        .filter_map(|sentence| sentence_card(sentence, style))
        .take(count)
        .collect();

    let mut filler = 1;
    while cards.len() < count {
        cards.push(Flashcard::new(
            format!(
                "Review card {}: which idea from the material can you explain in your own words?",
                filler
            ),
            "Open answer. Restate one key idea from your notes and give an example of it.",
        ));
        filler += 1;
    }
    cards
}

fn sentence_card(sentence: &str, style: FlashcardStyle) -> Option<Flashcard> {
    match style {
        FlashcardStyle::Concepts => Some(Flashcard::new(
            format!(
                "What does the material say about \"{}\"?",
                lead_words(sentence, 5)
            ),
            format!("{}.", sentence),
        )),
        FlashcardStyle::Definitions => {
            let term = key_term(sentence)?;
            Some(Flashcard::new(
                format!("Define or explain: {}", term),
                format!("{}.", sentence),
            ))
        }
        FlashcardStyle::Questions => {
            let term = key_term(sentence)?;
            Some(Flashcard::new(
                format!("Complete the statement: {}.", blank_out(sentence, &term)),
                term,
            ))
        }
    }
}

/// Tally for a flashcard self-study round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudyScore {
    pub known: usize,
    pub total: usize,
}

impl StudyScore {
    pub fn record(&mut self, known: bool) {
        self.total += 1;
        if known {
            self.known += 1;
        }
    }

    pub fn percentage(&self) -> f64 {
        super::percentage(self.known, self.total)
    }

    /// Feedback band: 80% and above, 60% and above, below.
    pub fn feedback(&self) -> &'static str {
        let pct = self.percentage();
        if pct >= 80.0 {
            "Excellent! You have mastered this material."
        } else if pct >= 60.0 {
            "Good work. Review the cards you missed."
        } else {
            "Keep studying. Go through the set again."
        }
    }
}

/// Parse a self-assessment answer: `y`/`yes`/`s`/`si` count as known.
pub fn parse_self_assessment(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockGenerator;
    use crate::tools::artifact::load_records;
    use std::sync::Arc;

    const MATERIAL: &str = "Photosynthesis converts light into chemical energy. \
        Chlorophyll absorbs mostly blue and red light. \
        Plants release oxygen as a byproduct of the process.";

    fn generator(backend: Backend, root: &std::path::Path) -> FlashcardGenerator {
        FlashcardGenerator::new(backend, Prompts::default(), FileStore::new(root), 8000)
    }

    #[test]
    fn test_flashcard_json_keys() {
        let card = Flashcard::new("What?", "That.");
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, r#"{"Q":"What?","A":"That."}"#);

        let parsed: Flashcard = serde_json::from_str(r#"{"A":"x","Q":"y"}"#).unwrap();
        assert_eq!(parsed, Flashcard::new("y", "x"));
    }

    #[test]
    fn test_fallback_count_is_exact() {
        for count in [1, 2, 3, 7, 25] {
            for style in FlashcardStyle::ALL {
                assert_eq!(fallback_flashcards(MATERIAL, count, style).len(), count);
            }
        }
        assert_eq!(fallback_flashcards("", 4, FlashcardStyle::Concepts).len(), 4);
    }

    #[test]
    fn test_fallback_styles() {
        let concepts = fallback_flashcards(MATERIAL, 1, FlashcardStyle::Concepts);
        assert_eq!(
            concepts[0].question,
            "What does the material say about \"Photosynthesis converts light into chemical...\"?"
        );
        assert_eq!(concepts[0].answer, "Photosynthesis converts light into chemical energy.");

        let definitions = fallback_flashcards(MATERIAL, 2, FlashcardStyle::Definitions);
        assert_eq!(definitions[1].question, "Define or explain: Chlorophyll");

        let questions = fallback_flashcards(MATERIAL, 1, FlashcardStyle::Questions);
        assert_eq!(questions[0].answer, "Photosynthesis");
        assert!(questions[0].question.contains("_____ converts light"));
    }

    #[test]
    fn test_style_parse() {
        assert_eq!("2".parse::<FlashcardStyle>().unwrap(), FlashcardStyle::Definitions);
        assert_eq!("Questions".parse::<FlashcardStyle>().unwrap(), FlashcardStyle::Questions);
        assert!("images".parse::<FlashcardStyle>().is_err());
    }

    #[tokio::test]
    async fn test_generate_without_backend_saves_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(Backend::disabled(), dir.path());

        let set = generator
            .generate(&[MATERIAL.to_string()], &FlashcardOptions::default())
            .await
            .unwrap();

        assert_eq!(set.origin, Origin::Fallback);
        assert_eq!(set.cards.len(), 10);
        assert!(set.path.starts_with(dir.path().join("flashcards")));
        let name = set.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("flashcards_concepts_"));

        let saved: Vec<Flashcard> = load_records(&set.path).unwrap();
        assert_eq!(saved, set.cards);
        assert_eq!(generator.list_sets().unwrap(), vec![set.path]);
    }

    #[tokio::test]
    async fn test_generate_with_backend_fits_count() {
        let dir = tempfile::tempdir().unwrap();
        let reply = "```json\n[{\"Q\":\"What is ATP?\",\"A\":\"Energy currency\"}]\n```";
        let mock = Arc::new(MockGenerator::replying(reply));
        let generator = generator(Backend::new(mock.clone()), dir.path());

        let options = FlashcardOptions {
            count: 3,
            style: FlashcardStyle::Definitions,
        };
        let set = generator.generate(&[MATERIAL.to_string()], &options).await.unwrap();

        assert_eq!(set.origin, Origin::Backend);
        assert_eq!(set.cards.len(), 3);
        assert_eq!(set.cards[0], Flashcard::new("What is ATP?", "Energy currency"));
        assert!(mock.prompts()[0].contains("definitions"));
    }

    #[tokio::test]
    async fn test_generate_with_malformed_reply_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockGenerator::replying("Sure! Here are your cards: none"));
        let generator = generator(Backend::new(mock), dir.path());

        let set = generator
            .generate(&[MATERIAL.to_string()], &FlashcardOptions { count: 2, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(set.origin, Origin::Fallback);
        assert_eq!(set.cards.len(), 2);
    }

    #[test]
    fn test_study_score_bands() {
        let mut score = StudyScore::default();
        for known in [true, true, true, true, false] {
            score.record(known);
        }
        assert_eq!(score.percentage(), 80.0);
        assert!(score.feedback().starts_with("Excellent"));

        let score = StudyScore { known: 3, total: 5 };
        assert!(score.feedback().starts_with("Good"));
        let score = StudyScore { known: 1, total: 5 };
        assert!(score.feedback().starts_with("Keep"));
        assert_eq!(StudyScore::default().percentage(), 0.0);
    }

    #[test]
    fn test_self_assessment() {
        assert!(parse_self_assessment("Y"));
        assert!(parse_self_assessment(" si "));
        assert!(!parse_self_assessment("n"));
        assert!(!parse_self_assessment(""));
    }
}
