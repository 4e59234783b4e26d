//! Multiple-choice quiz generation and grading.

use super::artifact::{save_records, StudyRecord};
use super::fit_to_count;
use super::text::{blank_out, join_plain, key_term, prepare_context, split_sentences};
use crate::backend::{parse_json_array, resilient, Backend, Origin};
use crate::config::Prompts;
use crate::error::{Result, StudyBoxError};
use crate::storage::{ArtifactKind, FileStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Bounds applied to interactively requested question counts.
pub const MIN_QUESTIONS: usize = 5;
pub const MAX_QUESTIONS: usize = 20;

const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

const GENERIC_DISTRACTORS: [&str; 6] = [
    "structure",
    "process",
    "function",
    "system",
    "analysis",
    "pattern",
];

/// One question with lettered options. Serialized as `Q`, `Options`, `Answer`, `Explanation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(rename = "Q")]
    pub question: String,
    #[serde(rename = "Options", default)]
    pub options: Vec<String>,
    #[serde(rename = "Answer")]
    pub answer: String,
    #[serde(rename = "Explanation", default)]
    pub explanation: String,
}

impl QuizQuestion {
    /// Case-insensitive exact match of the response against the answer letter.
    pub fn is_correct(&self, response: &str) -> bool {
        response.trim().eq_ignore_ascii_case(self.answer.trim())
    }

    /// Letters offered by the options, e.g. `['A', 'B', 'C', 'D']`.
    pub fn letters(&self) -> Vec<char> {
        ('A'..='Z').take(self.options.len().max(1)).collect()
    }
}

impl StudyRecord for QuizQuestion {
    fn csv_header() -> &'static [&'static str] {
        &["Pregunta", "Opciones", "Respuesta", "Explicación"]
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.question.clone(),
            self.options.join(" | "),
            self.answer.clone(),
            self.explanation.clone(),
        ]
    }

    fn text_block(&self, number: usize) -> String {
        let mut block = format!("Question {}: {}\n", number, self.question);
        for option in &self.options {
            block.push_str(&format!("  {}\n", option));
        }
        block.push_str(&format!("  Answer: {}", self.answer));
        if !self.explanation.is_empty() {
            block.push_str(&format!("\n  Explanation: {}", self.explanation));
        }
        block
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
        let letter = answer.trim().to_uppercase();
        let valid = letter.chars().count() == 1
            && letter
                .chars()
                .next()
                .is_some_and(|c| self.letters().contains(&c));
        if !valid {
            return Err(StudyBoxError::InvalidInput(format!(
                "Answer must be one of {}",
                self.letters().iter().map(char::to_string).collect::<Vec<_>>().join(", ")
            )));
        }
        self.answer = letter;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl QuizDifficulty {
    pub const ALL: [QuizDifficulty; 3] =
        [QuizDifficulty::Easy, QuizDifficulty::Medium, QuizDifficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizDifficulty::Easy => "easy",
            QuizDifficulty::Medium => "medium",
            QuizDifficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for QuizDifficulty {
    type Err = StudyBoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "easy" => Ok(QuizDifficulty::Easy),
            "2" | "medium" => Ok(QuizDifficulty::Medium),
            "3" | "hard" => Ok(QuizDifficulty::Hard),
            other => Err(StudyBoxError::InvalidInput(format!(
                "Unknown difficulty: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOptions {
    pub count: usize,
    pub difficulty: QuizDifficulty,
}

impl QuizOptions {
    /// Options for an interactively requested count, clamped to 5..=20.
    pub fn clamped(count: usize, difficulty: QuizDifficulty) -> Self {
        Self {
            count: count.clamp(MIN_QUESTIONS, MAX_QUESTIONS),
            difficulty,
        }
    }
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            count: 10,
            difficulty: QuizDifficulty::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Quiz {
    pub path: PathBuf,
    pub questions: Vec<QuizQuestion>,
    pub origin: Origin,
}

#[derive(Debug, Clone)]
pub struct QuizGenerator {
    backend: Backend,
    prompts: Prompts,
    store: FileStore,
    budget_chars: usize,
}

impl QuizGenerator {
    pub fn new(backend: Backend, prompts: Prompts, store: FileStore, budget_chars: usize) -> Self {
        Self {
            backend,
            prompts,
            store,
            budget_chars,
        }
    }

    /// Generate exactly `options.count` questions and save them under `quizzes/`.
    #[instrument(skip(self, texts), fields(count = options.count, difficulty = options.difficulty.as_str()))]
    pub async fn generate(&self, texts: &[String], options: &QuizOptions) -> Result<Quiz> {
        let count = options.count.max(1);
        let plain = join_plain(texts);

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), prepare_context(texts, self.budget_chars));
        vars.insert("count".to_string(), count.to_string());
        vars.insert("difficulty".to_string(), options.difficulty.as_str().to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.study.quiz, &vars);

        let generated = resilient(
            "quiz",
            async {
                let reply = self.backend.generate(&prompt).await?;
                let questions: Vec<QuizQuestion> = parse_json_array(&reply)?;
                let questions = questions.into_iter().map(normalize_answer).collect();
                Ok::<_, StudyBoxError>(fit_to_count(questions, count, |n| {
                    fallback_quiz(&plain, n, options.difficulty)
                }))
            },
            || fallback_quiz(&plain, count, options.difficulty),
        )
        .await;

        let stem = format!("quiz_{}", options.difficulty.as_str());
        let path = self.store.artifact_path(ArtifactKind::Quizzes, &stem, "json")?;
        save_records(&path, &generated.value)?;
        info!(
            "Saved {} quiz questions ({}) to {}",
            generated.value.len(),
            generated.origin,
            path.display()
        );

        Ok(Quiz {
            path,
            questions: generated.value,
            origin: generated.origin,
        })
    }

    /// Saved quizzes, oldest first.
    pub fn list_quizzes(&self) -> Result<Vec<PathBuf>> {
        self.store.list_artifacts(ArtifactKind::Quizzes, &["json"])
    }
}

/// Backends sometimes answer "B) Mitosis" instead of "B".
fn normalize_answer(mut question: QuizQuestion) -> QuizQuestion {
    let trimmed = question.answer.trim();
    if let Some(first) = trimmed.chars().next() {
        let rest = &trimmed[first.len_utf8()..];
        if first.is_ascii_alphabetic() && (rest.is_empty() || rest.starts_with(')')) {
            question.answer = first.to_ascii_uppercase().to_string();
        }
    }
    question
}

/// Build `count` fill-in-the-blank questions without a backend.
///
/// Each usable sentence has its longest word blanked. Distractors are key
/// terms of other sentences (generic words on easy). The correct letter
/// rotates with the question index.
pub fn fallback_quiz(text: &str, count: usize, difficulty: QuizDifficulty) -> Vec<QuizQuestion> {
    let items: Vec<(String, String)> = split_sentences(text)
        .into_iter()
        .filter_map(|sentence| key_term(&sentence).map(|term| (sentence, term)))
        .collect();

    let mut questions = Vec::with_capacity(count);
    for (i, (sentence, term)) in items.iter().enumerate().take(count) {
        let distractors = pick_distractors(&items, i, term, difficulty);
        let correct = i % LETTERS.len();

        let mut choices = distractors;
        choices.insert(correct, term.clone());
        let options = choices
            .iter()
            .zip(LETTERS)
            .map(|(choice, letter)| format!("{}) {}", letter, choice))
            .collect();

        questions.push(QuizQuestion {
            question: format!("Fill in the blank: {}.", blank_out(sentence, term)),
            options,
            answer: LETTERS[correct].to_string(),
            explanation: format!("The material states: \"{}.\"", sentence),
        });
    }

    let mut filler = 1;
    while questions.len() < count {
        questions.push(QuizQuestion {
            question: format!(
                "Review question {}: what is the best way to consolidate this material?",
                filler
            ),
            options: vec![
                "A) Summarize the key ideas in your own words".to_string(),
                "B) Skip the parts you find difficult".to_string(),
                "C) Read the text once without notes".to_string(),
                "D) Memorize isolated words".to_string(),
            ],
            answer: "A".to_string(),
            explanation: "Restating ideas in your own words is an active recall technique."
                .to_string(),
        });
        filler += 1;
    }
    questions
}

fn pick_distractors(
    items: &[(String, String)],
    index: usize,
    term: &str,
    difficulty: QuizDifficulty,
) -> Vec<String> {
    let wanted = LETTERS.len() - 1;
    let mut picked: Vec<String> = Vec::with_capacity(wanted);
    let accept = |candidate: &str, picked: &mut Vec<String>| {
        if picked.len() < wanted
            && !candidate.eq_ignore_ascii_case(term)
            && !picked.iter().any(|p| p.eq_ignore_ascii_case(candidate))
        {
            picked.push(candidate.to_string());
        }
    };

    if difficulty != QuizDifficulty::Easy {
        for offset in 1..items.len() {
            let (_, other) = &items[(index + offset) % items.len()];
            accept(other, &mut picked);
        }
    }
    for generic in GENERIC_DISTRACTORS {
        accept(generic, &mut picked);
    }
    picked
}

/// Result of grading one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    pub fn percentage(&self) -> f64 {
        super::percentage(self.correct, self.total)
    }

    /// Feedback band: 90%, 70%, 50% and below.
    pub fn feedback(&self) -> &'static str {
        let pct = self.percentage();
        if pct >= 90.0 {
            "Outstanding! You know this material very well."
        } else if pct >= 70.0 {
            "Well done. A quick review will close the gaps."
        } else if pct >= 50.0 {
            "Fair result. Review the explanations and try again."
        } else {
            "Needs more study. Go back to the material before retrying."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockGenerator;
    use crate::tools::artifact::{load_records, modify_record};
    use std::sync::Arc;

    const MATERIAL: &str = "Mitochondria produce most of the energy in cells. \
        Ribosomes assemble proteins from amino acids. \
        The nucleus stores genetic information as DNA. \
        Lysosomes digest worn out organelles and debris.";

    #[test]
    fn test_question_json_keys() {
        let json = r#"{"Q":"2+2?","Options":["A) 3","B) 4"],"Answer":"B","Explanation":"Arithmetic."}"#;
        let q: QuizQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(q.question, "2+2?");
        assert_eq!(q.options.len(), 2);
        assert!(q.is_correct(" b "));
        assert!(!q.is_correct("A"));
        assert_eq!(serde_json::to_string(&q).unwrap(), json);
    }

    #[test]
    fn test_fallback_count_is_exact() {
        for count in [1, 4, 5, 10, 20] {
            for difficulty in QuizDifficulty::ALL {
                let quiz = fallback_quiz(MATERIAL, count, difficulty);
                assert_eq!(quiz.len(), count);
                assert!(quiz.iter().all(|q| q.options.len() == 4));
                assert!(quiz.iter().all(|q| !q.question.is_empty() && !q.answer.is_empty()));
            }
        }
    }

    #[test]
    fn test_fallback_answer_points_at_blanked_term() {
        let quiz = fallback_quiz(MATERIAL, 4, QuizDifficulty::Medium);

        for (i, q) in quiz.iter().enumerate() {
            assert_eq!(q.answer, LETTERS[i % 4].to_string());
        }
        assert_eq!(quiz[0].options[0], "A) Mitochondria");
        assert!(quiz[0].question.starts_with("Fill in the blank: _____ produce"));
        assert_eq!(quiz[1].options[1], "B) Ribosomes");
        assert!(quiz[0].explanation.contains("Mitochondria produce most"));

        let distinct: std::collections::HashSet<_> = quiz[2].options.iter().collect();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn test_easy_uses_generic_distractors() {
        let quiz = fallback_quiz(MATERIAL, 1, QuizDifficulty::Easy);
        assert_eq!(
            quiz[0].options,
            vec!["A) Mitochondria", "B) structure", "C) process", "D) function"]
        );
    }

    #[test]
    fn test_clamped_options() {
        assert_eq!(QuizOptions::clamped(1, QuizDifficulty::Easy).count, 5);
        assert_eq!(QuizOptions::clamped(12, QuizDifficulty::Easy).count, 12);
        assert_eq!(QuizOptions::clamped(99, QuizDifficulty::Hard).count, 20);
    }

    #[test]
    fn test_normalize_answer() {
        let q = QuizQuestion {
            question: "q".to_string(),
            options: vec![],
            answer: "c) Golgi".to_string(),
            explanation: String::new(),
        };
        assert_eq!(normalize_answer(q).answer, "C");
    }

    #[test]
    fn test_score_bands() {
        assert!(QuizScore { correct: 9, total: 10 }.feedback().starts_with("Outstanding"));
        assert!(QuizScore { correct: 7, total: 10 }.feedback().starts_with("Well done"));
        assert!(QuizScore { correct: 5, total: 10 }.feedback().starts_with("Fair"));
        assert!(QuizScore { correct: 4, total: 10 }.feedback().starts_with("Needs"));

        let mut score = QuizScore::default();
        score.record(true);
        score.record(false);
        assert_eq!(score.percentage(), 50.0);
    }

    #[test]
    fn test_modify_validates_answer_letter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.json");
        save_records(&path, &fallback_quiz(MATERIAL, 2, QuizDifficulty::Medium)).unwrap();

        let err = modify_record::<QuizQuestion>(&path, 0, None, Some("E".to_string())).unwrap_err();
        assert!(matches!(err, StudyBoxError::InvalidInput(_)));

        let updated: QuizQuestion = modify_record(&path, 0, None, Some("d".to_string())).unwrap();
        assert_eq!(updated.answer, "D");
        let saved: Vec<QuizQuestion> = load_records(&path).unwrap();
        assert_eq!(saved[0].answer, "D");
    }

    #[test]
    fn test_answer_letters_follow_option_count() {
        let mut question = QuizQuestion {
            question: "Which planet is largest?".to_string(),
            options: ["Mercury", "Venus", "Earth", "Mars", "Jupiter"]
                .iter()
                .enumerate()
                .map(|(i, name)| format!("{}) {}", (b'A' + i as u8) as char, name))
                .collect(),
            answer: "A".to_string(),
            explanation: String::new(),
        };

        assert_eq!(question.letters(), vec!['A', 'B', 'C', 'D', 'E']);
        question.set_answer("e".to_string()).unwrap();
        assert_eq!(question.answer, "E");
        assert!(question.set_answer("F".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_generate_without_backend() {
        let dir = tempfile::tempdir().unwrap();
        let generator =
            QuizGenerator::new(Backend::disabled(), Prompts::default(), FileStore::new(dir.path()), 8000);

        let quiz = generator
            .generate(&[MATERIAL.to_string()], &QuizOptions::default())
            .await
            .unwrap();

        assert!(quiz.origin == Origin::Fallback);
        assert_eq!(quiz.questions.len(), 10);
        let name = quiz.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("quiz_medium_"));
        assert_eq!(generator.list_quizzes().unwrap(), vec![quiz.path]);
    }

    #[tokio::test]
    async fn test_generate_with_backend_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let reply = r#"[
            {"Q":"One?","Options":["A) x","B) y"],"Answer":"A","Explanation":""},
            {"Q":"Two?","Options":["A) x","B) y"],"Answer":"B) y","Explanation":""},
            {"Q":"Three?","Options":["A) x","B) y"],"Answer":"A","Explanation":""}
        ]"#;
        let mock = Arc::new(MockGenerator::replying(reply));
        let generator = QuizGenerator::new(
            Backend::new(mock.clone()),
            Prompts::default(),
            FileStore::new(dir.path()),
            8000,
        );

        let options = QuizOptions {
            count: 2,
            difficulty: QuizDifficulty::Hard,
        };
        let quiz = generator.generate(&[MATERIAL.to_string()], &options).await.unwrap();

        assert_eq!(quiz.origin, Origin::Backend);
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[1].answer, "B");
        assert!(mock.prompts()[0].contains("hard"));
    }
}
