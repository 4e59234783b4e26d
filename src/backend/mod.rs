//! Generative-text backend abstraction.
//!
//! Every tool talks to the backend through [`Backend`], which is either wired
//! to a provider or disabled. A disabled backend fails every call with
//! [`StudyBoxError::BackendUnavailable`], which the tools treat exactly like a
//! network or model failure: they fall back to local generation.

mod gemini;
mod mock;
mod openai;
pub mod resilient;
pub mod response;

pub use gemini::GeminiGenerator;
pub use mock::MockGenerator;
pub use openai::OpenAIGenerator;
pub use resilient::{resilient, Generated, Origin};
pub use response::{parse_json_array, strip_code_fences};

use crate::config::{BackendProvider, BackendSettings, Credentials};
use crate::error::{Result, StudyBoxError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Trait for generative-text providers: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable provider/model name.
    fn name(&self) -> String;

    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Handle to the configured generative backend, shared by all tools.
#[derive(Clone, Default)]
pub struct Backend {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Backend {
    /// A backend that always reports itself unavailable.
    pub fn disabled() -> Self {
        Self { generator: None }
    }

    /// Wrap an existing generator.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Build the backend from settings and startup credentials.
    ///
    /// Without an API key the backend is disabled rather than failing.
    pub fn from_config(settings: &BackendSettings, credentials: &Credentials) -> Result<Self> {
        let Some(api_key) = credentials.generative_api_key.as_deref() else {
            info!("No generative API key configured; tools will use local generation");
            return Ok(Self::disabled());
        };

        let timeout = Duration::from_secs(settings.timeout_secs);
        let generator: Arc<dyn TextGenerator> = match settings.provider {
            BackendProvider::Gemini => Arc::new(GeminiGenerator::new(
                api_key,
                &settings.model,
                settings.api_base.as_deref(),
                timeout,
            )?),
            BackendProvider::OpenAI => Arc::new(OpenAIGenerator::new(
                api_key,
                &settings.model,
                settings.api_base.as_deref(),
                timeout,
            )?),
        };

        info!("Generative backend configured: {}", generator.name());
        Ok(Self::new(generator))
    }

    /// Whether a provider is configured.
    pub fn is_available(&self) -> bool {
        self.generator.is_some()
    }

    /// Provider name, or "local" when disabled.
    pub fn name(&self) -> String {
        self.generator
            .as_ref()
            .map(|g| g.name())
            .unwrap_or_else(|| "local".to_string())
    }

    /// Send a prompt to the provider.
    ///
    /// An empty reply is reported as a malformed response.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            StudyBoxError::BackendUnavailable("no API key configured".to_string())
        })?;

        debug!("Sending prompt ({} chars) to {}", prompt.len(), generator.name());
        let reply = generator.generate(prompt).await?;

        if reply.trim().is_empty() {
            return Err(StudyBoxError::MalformedResponse(
                "empty reply from backend".to_string(),
            ));
        }

        Ok(reply)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("provider", &self.name()).finish()
    }
}
