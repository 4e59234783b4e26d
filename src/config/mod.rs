//! Configuration module for StudyBox.
//!
//! Handles loading application settings, prompt templates and API credentials.

mod credentials;
mod prompts;
mod settings;

pub use credentials::Credentials;
pub use prompts::{AudioPrompts, ChatPrompts, Prompts, StudyPrompts, SummaryPrompts};
pub use settings::{
    BackendProvider, BackendSettings, GeneralSettings, PromptSettings, Settings, ToolSettings,
    TtsSettings,
};
