//! ElevenLabs premium voices.

use super::SpeechSynthesizer;
use crate::config::TtsSettings;
use crate::error::{Result, StudyBoxError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const API_BASE: &str = "https://api.elevenlabs.io/v1";

/// Premium requests carry a whole script, so they get a longer timeout than chunked ones.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabsSynthesizer {
    http: reqwest::Client,
    api_key: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: &str, settings: &TtsSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            voice_id: settings.voice_id.clone(),
            model_id: settings.model_id.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/text-to-speech/{}", API_BASE, self.voice_id)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    fn label(&self) -> &'static str {
        "ElevenLabs (premium)"
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StudyBoxError::Tts(format!(
                "ElevenLabs returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(StudyBoxError::Tts("ElevenLabs returned no audio".to_string()));
        }
        debug!("Received {} bytes from ElevenLabs", audio.len());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let request = SpeechRequest {
            text: "Hello",
            model_id: "eleven_monolingual_v1",
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["model_id"], "eleven_monolingual_v1");
        assert_eq!(json["voice_settings"]["stability"], 0.5);
    }

    #[test]
    fn test_endpoint_uses_voice() {
        let synth = ElevenLabsSynthesizer::new("key", &TtsSettings::default()).unwrap();
        assert_eq!(
            synth.endpoint(),
            "https://api.elevenlabs.io/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM"
        );
        assert_eq!(synth.name(), "elevenlabs");
    }
}
