//! Free voice through the Google Translate speech endpoint.

use super::{chunk_text, SpeechSynthesizer};
use crate::config::TtsSettings;
use crate::error::{Result, StudyBoxError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const ENDPOINT: &str = "https://translate.google.com/translate_tts";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Chunks fetched concurrently. Results are reassembled in order.
const MAX_CONCURRENT_CHUNKS: usize = 3;

pub struct GoogleTranslateSynthesizer {
    http: reqwest::Client,
    language: String,
    chunk_chars: usize,
}

impl GoogleTranslateSynthesizer {
    pub fn new(settings: &TtsSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            language: settings.language.clone(),
            chunk_chars: settings.chunk_chars,
        })
    }

    fn chunk_url(&self, chunk: &str, index: usize, total: usize) -> Result<Url> {
        let index = index.to_string();
        let total = total.to_string();
        Url::parse_with_params(
            ENDPOINT,
            &[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", self.language.as_str()),
                ("client", "tw-ob"),
                ("idx", index.as_str()),
                ("total", total.as_str()),
            ],
        )
        .map_err(|e| StudyBoxError::Tts(format!("Invalid speech URL: {}", e)))
    }

    async fn fetch_chunk(&self, chunk: &str, index: usize, total: usize) -> Result<Vec<u8>> {
        let url = self.chunk_url(chunk, index, total)?;
        let response = self
            .http
            .get(url)
            .header("Referer", "https://translate.google.com/")
            .header("Accept", "audio/mpeg,audio/*,*/*;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudyBoxError::Tts(format!("Speech endpoint returned {}", status)));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateSynthesizer {
    fn name(&self) -> &'static str {
        "google"
    }

    fn label(&self) -> &'static str {
        "Google Translate voice (free)"
    }

    /// Fetch each chunk and concatenate the MP3 frames. Failed chunks are
    /// skipped; if none succeed the call fails.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = chunk_text(text, self.chunk_chars);
        let total = chunks.len();
        if total == 0 {
            return Err(StudyBoxError::Tts("Nothing to synthesize".to_string()));
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Voice     [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );

        let results: Vec<(usize, Result<Vec<u8>>)> = stream::iter(0..total)
            .map(|idx| {
                let chunk = &chunks[idx];
                async move {
                    let result = self.fetch_chunk(chunk, idx, total).await;
                    (idx, result)
                }
            })
            .buffered(MAX_CONCURRENT_CHUNKS)
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_and_clear();

        let mut audio = Vec::new();
        let mut failed = 0;
        for (idx, result) in results {
            match result {
                Ok(bytes) if !bytes.is_empty() => audio.extend_from_slice(&bytes),
                Ok(_) => {
                    failed += 1;
                    warn!("Chunk {} returned no audio", idx);
                }
                Err(e) => {
                    failed += 1;
                    warn!("Chunk {} failed: {}", idx, e);
                }
            }
        }

        if audio.is_empty() {
            return Err(StudyBoxError::Tts(format!("All {} speech chunks failed", total)));
        }
        debug!("Synthesized {} of {} chunks", total - failed, total);
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_url_encodes_text() {
        let synth = GoogleTranslateSynthesizer::new(&TtsSettings::default()).unwrap();
        let url = synth.chunk_url("¿Qué es la célula?", 1, 3).unwrap();

        assert_eq!(url.host_str(), Some("translate.google.com"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("q".to_string(), "¿Qué es la célula?".to_string())));
        assert!(pairs.contains(&("tl".to_string(), "es".to_string())));
        assert!(pairs.contains(&("idx".to_string(), "1".to_string())));
        assert!(pairs.contains(&("total".to_string(), "3".to_string())));
    }

    #[tokio::test]
    async fn test_empty_text_is_error() {
        let synth = GoogleTranslateSynthesizer::new(&TtsSettings::default()).unwrap();
        let err = synth.synthesize("   ").await.unwrap_err();
        assert!(matches!(err, StudyBoxError::Tts(_)));
    }
}
