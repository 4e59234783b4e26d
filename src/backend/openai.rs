//! OpenAI chat-completions provider with configured timeout.

use super::TextGenerator;
use crate::error::{Result, StudyBoxError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

/// Create an OpenAI client with the given key, optional base URL and timeout.
pub fn create_client(
    api_key: &str,
    api_base: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIGenerator {
    pub fn new(
        api_key: &str,
        model: &str,
        api_base: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key, api_base, timeout)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| StudyBoxError::Backend(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(0.7)
            .build()
            .map_err(|e| StudyBoxError::Backend(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| StudyBoxError::Backend(format!("Chat API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| StudyBoxError::MalformedResponse("no choices in response".to_string()))
    }
}
