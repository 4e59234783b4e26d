//! Scripted generator for tests and offline demos.

use super::TextGenerator;
use crate::error::{Result, StudyBoxError};
use async_trait::async_trait;
use std::sync::Mutex;

/// Generator that returns a fixed reply (or a fixed failure) and records prompts.
pub struct MockGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Always reply with `text`.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a backend error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> String {
        "mock".to_string()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply.clone().map_err(StudyBoxError::Backend)
    }
}
