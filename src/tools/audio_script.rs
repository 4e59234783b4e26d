//! Narration scripts for listening study sessions.

use super::text::{join_plain, key_term, prepare_context, split_sentences, truncate_chars};
use crate::backend::{resilient, Backend, Origin};
use crate::config::Prompts;
use crate::error::{Result, StudyBoxError};
use crate::storage::{write_atomic, ArtifactKind, FileStore};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{info, instrument};

static STEP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[STEP (\d+)\]").expect("valid regex"));

static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[A-Z][A-Z ]*(?: \d+)?\]").expect("valid regex"));

static SPEAKER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(Student|Tutor)\]:").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Characters of material quoted in a local reading script.
const READING_CHARS: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Summary,
    Concepts,
    Reading,
    Questions,
    Story,
    StudyGuide,
}

impl ScriptKind {
    pub const ALL: [ScriptKind; 6] = [
        ScriptKind::Summary,
        ScriptKind::Concepts,
        ScriptKind::Reading,
        ScriptKind::Questions,
        ScriptKind::Story,
        ScriptKind::StudyGuide,
    ];

    /// File name prefix.
    pub fn slug(&self) -> &'static str {
        match self {
            ScriptKind::Summary => "summary",
            ScriptKind::Concepts => "concepts",
            ScriptKind::Reading => "reading",
            ScriptKind::Questions => "questions",
            ScriptKind::Story => "story",
            ScriptKind::StudyGuide => "study_guide",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ScriptKind::Summary => "Narrated summary",
            ScriptKind::Concepts => "Key concepts explained",
            ScriptKind::Reading => "Full reading",
            ScriptKind::Questions => "Questions and answers",
            ScriptKind::Story => "Educational story",
            ScriptKind::StudyGuide => "Step-by-step study guide",
        }
    }

    fn template<'a>(&self, prompts: &'a Prompts) -> &'a str {
        match self {
            ScriptKind::Summary => &prompts.audio.summary,
            ScriptKind::Concepts => &prompts.audio.concepts,
            ScriptKind::Reading => &prompts.audio.reading,
            ScriptKind::Questions => &prompts.audio.questions,
            ScriptKind::Story => &prompts.audio.story,
            ScriptKind::StudyGuide => &prompts.audio.study_guide,
        }
    }
}

impl std::str::FromStr for ScriptKind {
    type Err = StudyBoxError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        ScriptKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| StudyBoxError::InvalidInput(format!("Unknown script kind: {}", s.trim())))
    }
}

/// A generated, saved script.
#[derive(Debug, Clone)]
pub struct AudioScript {
    pub kind: ScriptKind,
    pub text: String,
    pub path: PathBuf,
    pub origin: Origin,
}

#[derive(Debug, Clone)]
pub struct AudioScriptGenerator {
    backend: Backend,
    prompts: Prompts,
    store: FileStore,
    budget_chars: usize,
}

impl AudioScriptGenerator {
    pub fn new(backend: Backend, prompts: Prompts, store: FileStore, budget_chars: usize) -> Self {
        Self {
            backend,
            prompts,
            store,
            budget_chars,
        }
    }

    /// Write one script and save it under `audio_scripts/`.
    #[instrument(skip(self, texts), fields(kind = kind.slug()))]
    pub async fn generate(&self, texts: &[String], kind: ScriptKind) -> Result<AudioScript> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), prepare_context(texts, self.budget_chars));
        let prompt = self.prompts.render_with_custom(kind.template(&self.prompts), &vars);

        let generated = resilient(
            "audio_script",
            async {
                let reply = self.backend.generate(&prompt).await?;
                Ok::<_, StudyBoxError>(reply.trim().to_string())
            },
            || fallback_script(kind, &join_plain(texts)),
        )
        .await;

        let path = self.store.artifact_path(ArtifactKind::AudioScripts, kind.slug(), "txt")?;
        write_atomic(&path, generated.value.as_bytes())?;
        info!("Saved {} script ({}) to {}", kind.slug(), generated.origin, path.display());

        Ok(AudioScript {
            kind,
            text: generated.value,
            path,
            origin: generated.origin,
        })
    }

    /// Write every kind in turn.
    pub async fn generate_all(&self, texts: &[String]) -> Result<Vec<AudioScript>> {
        let mut scripts = Vec::with_capacity(ScriptKind::ALL.len());
        for kind in ScriptKind::ALL {
            scripts.push(self.generate(texts, kind).await?);
        }
        Ok(scripts)
    }

    /// Saved scripts, oldest first.
    pub fn list_scripts(&self) -> Result<Vec<PathBuf>> {
        self.store.list_artifacts(ArtifactKind::AudioScripts, &["txt"])
    }
}

/// Sectioned script built from slices of the material.
pub fn fallback_script(kind: ScriptKind, text: &str) -> String {
    let sentences = split_sentences(text);
    let termed: Vec<(String, String)> = sentences
        .iter()
        .filter_map(|s| key_term(s).map(|t| (t, s.clone())))
        .collect();

    let mut out = String::new();
    match kind {
        ScriptKind::Summary => {
            out.push_str("[INTRODUCTION]\nHi, I'm your study assistant. Today we'll review the most important ideas of your material. [PAUSE]\n\n[MAIN CONTENT]\n");
            for sentence in sentences.iter().take(5) {
                out.push_str(&format!("{}. [PAUSE]\n", sentence));
            }
            out.push_str("\n[CONCLUSION]\nTo sum up, we covered the key points of your material. Listen again whenever you need a refresher.");
        }
        ScriptKind::Concepts => {
            out.push_str("[INTRODUCTION]\nToday we'll understand the fundamental concepts of your material. [PAUSE]\n");
            for (i, (term, sentence)) in termed.iter().take(3).enumerate() {
                out.push_str(&format!(
                    "\n[CONCEPT {}]\nConcept number {} is {}. {}. [PAUSE]\n",
                    i + 1,
                    i + 1,
                    term,
                    sentence
                ));
            }
            let terms: Vec<&str> = termed.iter().take(3).map(|(t, _)| t.as_str()).collect();
            out.push_str(&format!(
                "\n[REVIEW]\nLet's review. The concepts were: {}. Try to explain each one in your own words.",
                if terms.is_empty() { "the main ideas of your notes".to_string() } else { terms.join(", ") }
            ));
        }
        ScriptKind::Reading => {
            out.push_str("[INTRODUCTION]\nWelcome to this study session. Let's read through your material together. [PAUSE]\n\n[MAIN READING]\n");
            out.push_str(truncate_chars(text, READING_CHARS));
            out.push_str("\n\n[CONCLUSION]\nWe have finished reviewing the material. Take a moment to recall what you heard.");
        }
        ScriptKind::Questions => {
            out.push_str("[INTRODUCTION]\nToday we'll answer some important questions about your material. [PAUSE]\n");
            for (i, (term, sentence)) in termed.iter().take(5).enumerate() {
                out.push_str(&format!(
                    "\n[QUESTION {}]\nQ: What does the material tell us about {}?\nA: {}. [PAUSE]\n",
                    i + 1,
                    term,
                    sentence
                ));
            }
            out.push_str("\n[CONCLUSION]\nI hope these answers helped. Pause the recording and answer each question again from memory.");
        }
        ScriptKind::Story => {
            for (i, (term, sentence)) in termed.iter().take(3).enumerate() {
                out.push_str(&format!(
                    "[SCENE {}]\n[Student]: \"I'm still confused about {}.\"\n[Tutor]: \"Here's the idea: {}.\"\n\n",
                    i + 1,
                    term,
                    sentence
                ));
            }
            if termed.is_empty() {
                out.push_str("[SCENE 1]\n[Student]: \"Where should I start with these notes?\"\n[Tutor]: \"Read them once, then tell me what you remember.\"\n\n");
            }
            out.push_str("[CONCLUSION]\nAnd so the student learned the material one question at a time.");
        }
        ScriptKind::StudyGuide => {
            out.push_str("[INTRODUCTION]\nHi, I'm your study tutor. I'll guide you step by step. [PAUSE]\n");
            let mut step = 1;
            for sentence in sentences.iter().take(3) {
                out.push_str(&format!(
                    "\n[STEP {}]\nRead this idea carefully: {}. [PAUSE]\n",
                    step, sentence
                ));
                step += 1;
            }
            let terms: Vec<&str> = termed.iter().take(5).map(|(t, _)| t.as_str()).collect();
            if !terms.is_empty() {
                out.push_str(&format!(
                    "\n[STEP {}]\nTo memorize better, repeat these key terms aloud: {}.\n",
                    step,
                    terms.join(", ")
                ));
            }
            out.push_str("\n[CONCLUSION]\nWith these steps you'll be ready to review on your own.");
        }
    }
    out
}

fn ordinal(n: usize) -> String {
    const WORDS: [&str; 10] = [
        "First", "Second", "Third", "Fourth", "Fifth", "Sixth", "Seventh", "Eighth", "Ninth", "Tenth",
    ];
    match n.checked_sub(1).and_then(|i| WORDS.get(i)) {
        Some(word) => format!("{} step. ", word),
        None => format!("Step {}. ", n),
    }
}

/// Turn a script into plain narration text.
///
/// Pauses become sentence breaks, steps become spoken ordinals, other markers
/// and speaker tags are removed. The result is capped at `max_chars` plus `...`.
pub fn clean_for_tts(script: &str, max_chars: usize) -> String {
    let text = script.replace("[PAUSE]", ". ");
    let text = STEP_MARKER.replace_all(&text, |caps: &regex::Captures| {
        ordinal(caps[1].parse().unwrap_or(0))
    });
    let text = SPEAKER_TAG.replace_all(&text, "");
    let text = SECTION_MARKER.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    let mut text = text.trim().replace(" .", ".");
    while text.contains("..") {
        text = text.replace("..", ".");
    }

    let cut = truncate_chars(&text, max_chars);
    if cut.len() < text.len() {
        format!("{}...", cut)
    } else {
        text
    }
}
