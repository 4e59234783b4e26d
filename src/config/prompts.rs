//! Prompt templates for StudyBox.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    pub summary: SummaryPrompts,
    pub study: StudyPrompts,
    pub audio: AudioPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the study chatbot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub answer: String,
    pub examples: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            answer: r#"You are a study assistant that helps students understand and learn academic material.

STUDY MATERIAL:
{{context}}

RECENT CONVERSATION:
{{history}}

CURRENT QUESTION: {{question}}

INSTRUCTIONS:
- Answer clearly and in an educational tone
- Use examples when appropriate
- Keep a friendly, encouraging voice
- If the question is unrelated to the material, explain that you can only help with the available study material
- If there is not enough information, say so honestly
- Answer in the same language as the study material"#
                .to_string(),

            examples: r#"Based on the following study material, write practical and clear examples:

{{context}}

The examples must be:
- Easy to understand
- Relevant to the material
- Useful for learning

Format: explain each example step by step."#
                .to_string(),
        }
    }
}

/// Prompts for summaries and key concepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub summary: String,
    pub concepts: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            summary: r#"Write a {{level}} structured summary of the following study material:

{{context}}

The summary must include:
- The main topics
- The key concepts
- The most important points to remember

Use about {{points}} bullet points. Be clear and direct."#
                .to_string(),

            concepts: r#"Extract the main concepts and key terms from the following study material:

{{context}}

Format: list the most important concepts, one per line, each with a short explanation."#
                .to_string(),
        }
    }
}

/// Prompts for flashcards, quizzes and text polishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyPrompts {
    pub flashcards: String,
    pub quiz: String,
    pub improve: String,
}

impl Default for StudyPrompts {
    fn default() -> Self {
        Self {
            flashcards: r#"Create {{count}} study flashcards of type "{{style}}" from the following material:

{{context}}

Respond ONLY with a JSON array. Each element must have exactly these keys:
- "Q": the front of the card (a question or term)
- "A": the back of the card (a concise answer or definition)

Example:
[{"Q": "What is encapsulation?", "A": "Bundling data with the methods that operate on it."}]"#
                .to_string(),

            quiz: r#"Create a {{difficulty}} multiple-choice quiz with {{count}} questions from the following material:

{{context}}

Respond ONLY with a JSON array. Each element must have exactly these keys:
- "Q": the question
- "Options": four options formatted as "A) ...", "B) ...", "C) ...", "D) ..."
- "Answer": the letter of the correct option (A, B, C or D)
- "Explanation": one sentence explaining why the answer is correct

Example:
[{"Q": "Which principle hides internal state?", "Options": ["A) Inheritance", "B) Encapsulation", "C) Polymorphism", "D) Recursion"], "Answer": "B", "Explanation": "Encapsulation restricts direct access to an object's state."}]"#
                .to_string(),

            improve: r#"Improve the readability of the following extracted text. Fix spacing, punctuation and obvious extraction errors. Do not add, remove or summarize content. Return only the improved text.

{{text}}"#
                .to_string(),
        }
    }
}

/// Prompts for audio scripts, one per script kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPrompts {
    pub summary: String,
    pub concepts: String,
    pub reading: String,
    pub questions: String,
    pub story: String,
    pub study_guide: String,
}

impl Default for AudioPrompts {
    fn default() -> Self {
        Self {
            summary: r#"Write an audio script for a narrated educational summary of the following material:

{{context}}

The script must be conversational, easy to follow by ear, include an introduction and a conclusion, last about 3-5 minutes, and mark natural pauses with [PAUSE].

Format:
[INTRODUCTION]
Hi, I'm your study assistant. Today we'll review the most important ideas of...

[MAIN CONTENT]
The key points to remember are...

[CONCLUSION]
To sum up, we covered...

Write the complete script:"#
                .to_string(),

            concepts: r#"Write an educational audio script that explains the key concepts of the following material:

{{context}}

Explain each concept clearly with simple analogies, at a calm pace, repeating what matters. About 5-7 minutes.

Structure:
[INTRODUCTION]
Today we'll understand the fundamental concepts...

[CONCEPT 1]
The first concept is...

[CONCEPT 2]
Now let's talk about...

[REVIEW]
To make sure you understood...

Write the complete script:"#
                .to_string(),

            reading: r#"Write an audio script for a complete, fluent reading of the following material:

{{context}}

Emphasize important points and add strategic pauses for reflection. About 8-12 minutes, professional narration.

Structure:
[INTRODUCTION]
Welcome to this study session. We'll explore...

[MAIN READING]
(material adapted for listening)

[CONCLUSION]
We have finished reviewing...

Write the complete script:"#
                .to_string(),

            questions: r#"Write an educational audio script in question-and-answer format based on:

{{context}}

Include 5-7 important questions with clear, complete answers, in an interview style. About 6-8 minutes.

Structure:
[INTRODUCTION]
Today we'll answer some important questions about...

[QUESTION 1]
Q: What is...?
A: Great question...

[CONCLUSION]
I hope these answers helped...

Write the complete script:"#
                .to_string(),

            story: r#"Write an educational audio script as a story or conversation based on:

{{context}}

Use characters or narrative situations with natural dialogue; entertaining but educational. About 7-10 minutes.

Structure:
[SCENE 1]
[Student]: "Did you know that...?"
[Tutor]: "Tell me more..."

[SCENE 2]
(story develops the concepts)

[CONCLUSION]
(what was learned through the story)

Write the complete script:"#
                .to_string(),

            study_guide: r#"Write a step-by-step study guide audio script based on:

{{context}}

Give clear, organized steps and memorization tips, like a personal tutor. About 5-7 minutes.

Structure:
[INTRODUCTION]
Hi, I'm your study tutor. I'll guide you step by step...

[STEP 1]
First, let's identify the key concepts...

[STEP 2]
Now, let's connect the ideas...

[STEP 3]
To memorize better, use this technique...

[CONCLUSION]
With these steps you'll be ready to...

Write the complete script:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let study_path = custom_path.join("study.toml");
            if study_path.exists() {
                let content = std::fs::read_to_string(&study_path)?;
                prompts.study = toml::from_str(&content)?;
            }

            let audio_path = custom_path.join("audio.toml");
            if audio_path.exists() {
                let content = std::fs::read_to_string(&audio_path)?;
                prompts.audio = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
