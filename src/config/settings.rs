//! Configuration settings for StudyBox.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub backend: BackendSettings,
    pub tts: TtsSettings,
    pub tools: ToolSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Storage root for uploaded files and generated artifacts.
    pub storage_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            storage_dir: "~/.studybox/storage".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Generative backend provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Google Gemini `generateContent` REST API.
    #[default]
    Gemini,
    /// OpenAI (or any OpenAI-compatible) chat completions.
    OpenAI,
}

impl std::str::FromStr for BackendProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(BackendProvider::Gemini),
            "openai" => Ok(BackendProvider::OpenAI),
            _ => Err(format!("Unknown backend provider: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendProvider::Gemini => write!(f, "gemini"),
            BackendProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Generative backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Backend provider (gemini, openai).
    pub provider: BackendProvider,
    /// Model name passed to the provider.
    pub model: String,
    /// Override for the provider base URL (OpenAI-compatible servers, proxies).
    pub api_base: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            provider: BackendProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            api_base: None,
            timeout_secs: 120,
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    /// Language code for the free TTS endpoint.
    pub language: String,
    /// Voice ID for the premium provider.
    pub voice_id: String,
    /// Model ID for the premium provider.
    pub model_id: String,
    /// Maximum characters per request to the free endpoint.
    pub chunk_chars: usize,
    /// Maximum characters of cleaned script sent to any provider.
    pub max_script_chars: usize,
    /// Per-request timeout in seconds for the free endpoint.
    pub timeout_secs: u64,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            language: "es".to_string(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            chunk_chars: 200,
            max_script_chars: 4000,
            timeout_secs: 10,
        }
    }
}

/// Tool behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Default number of flashcards per set.
    pub flashcard_count: usize,
    /// Default number of quiz questions.
    pub quiz_count: usize,
    /// Prompt budget for flashcards and quizzes (characters).
    pub study_budget_chars: usize,
    /// Prompt budget for chat answers and audio scripts (characters).
    pub chat_budget_chars: usize,
    /// Prompt budget for summaries, concepts and examples (characters).
    pub summary_budget_chars: usize,
    /// Ask the backend to polish extracted text while processing files.
    pub improve_text: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            flashcard_count: 10,
            quiz_count: 10,
            study_budget_chars: 8000,
            chat_budget_chars: 2000,
            summary_budget_chars: 1500,
            improve_text: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::StudyBoxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studybox")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded storage directory path.
    pub fn storage_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.storage_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [backend]
            provider = "openai"
            model = "gpt-4o-mini"

            [tools]
            quiz_count = 15
            "#,
        )
        .unwrap();

        assert_eq!(settings.backend.provider, BackendProvider::OpenAI);
        assert_eq!(settings.backend.timeout_secs, 120);
        assert_eq!(settings.tools.quiz_count, 15);
        assert_eq!(settings.tools.flashcard_count, 10);
        assert_eq!(settings.tts.chunk_chars, 200);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.tools.improve_text = true;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert!(loaded.tools.improve_text);
        assert_eq!(loaded.backend.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.general.storage_dir, "~/.studybox/storage");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Google".parse::<BackendProvider>().unwrap(), BackendProvider::Gemini);
        assert_eq!("openai".parse::<BackendProvider>().unwrap(), BackendProvider::OpenAI);
        assert!("cohere".parse::<BackendProvider>().is_err());
    }
}
