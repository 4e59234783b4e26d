//! Text-to-speech for audio scripts.

mod elevenlabs;
mod google;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use google::GoogleTranslateSynthesizer;

use crate::config::{Credentials, TtsSettings};
use crate::error::{Result, StudyBoxError};
use crate::storage::{write_atomic, ArtifactKind, FileStore};
use crate::tools::audio_script::clean_for_tts;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// Converts narration text into audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short provider name, used in output file names.
    fn name(&self) -> &'static str;

    /// Human-readable label for menus.
    fn label(&self) -> &'static str;

    /// File extension of the produced audio.
    fn extension(&self) -> &'static str {
        "mp3"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Synthesizers usable with the current credentials, premium first.
pub fn available_synthesizers(
    settings: &TtsSettings,
    credentials: &Credentials,
) -> Result<Vec<Arc<dyn SpeechSynthesizer>>> {
    let mut synthesizers: Vec<Arc<dyn SpeechSynthesizer>> = Vec::new();
    if let Some(key) = credentials.tts_api_key.as_deref() {
        synthesizers.push(Arc::new(ElevenLabsSynthesizer::new(key, settings)?));
    }
    synthesizers.push(Arc::new(GoogleTranslateSynthesizer::new(settings)?));
    Ok(synthesizers)
}

/// Clean a script, synthesize it, and save the audio under `generated_audio/`.
///
/// Returns the saved path and the cleaned narration text.
#[instrument(skip(synthesizer, store, script), fields(provider = synthesizer.name()))]
pub async fn narrate(
    synthesizer: &dyn SpeechSynthesizer,
    store: &FileStore,
    kind_slug: &str,
    script: &str,
    max_chars: usize,
) -> Result<PathBuf> {
    let text = clean_for_tts(script, max_chars);
    if text.is_empty() {
        return Err(StudyBoxError::Tts("Script has no speakable text".to_string()));
    }

    let audio = synthesizer.synthesize(&text).await?;
    let stem = format!("{}_{}", kind_slug, synthesizer.name());
    let path = store.artifact_path(ArtifactKind::GeneratedAudio, &stem, synthesizer.extension())?;
    write_atomic(&path, &audio)?;

    info!("Saved {} bytes of audio to {}", audio.len(), path.display());
    Ok(path)
}

/// Split text into chunks of at most `max_chars` characters, breaking at
/// whitespace where possible.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };

        if needed <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        // A single word longer than the limit is hard-split.
        let chars: Vec<char> = word.chars().collect();
        let mut pieces = chars.chunks(max_chars).map(|c| c.iter().collect::<String>()).peekable();
        while let Some(piece) = pieces.next() {
            if pieces.peek().is_some() {
                chunks.push(piece);
            } else {
                current_len = piece.chars().count();
                current = piece;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
