//! API credentials, read once from the environment at startup.

use super::BackendProvider;

/// Values that are shipped in sample `.env` files and mean "not configured".
const PLACEHOLDER_KEYS: &[&str] = &["your_api_key_here", "tu_api_key_aqui", "changeme"];

/// API keys for the external services.
///
/// A missing key is not an error: every tool falls back to local generation.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Key for the generative-text backend.
    pub generative_api_key: Option<String>,
    /// Key for the premium text-to-speech provider.
    pub tts_api_key: Option<String>,
}

impl Credentials {
    /// Read keys from the process environment, loading `.env` first if present.
    pub fn from_env(provider: BackendProvider) -> Self {
        dotenvy::dotenv().ok();

        Self {
            generative_api_key: Self::read_key(Self::backend_key_var(provider)),
            tts_api_key: Self::read_key("ELEVENLABS_API_KEY"),
        }
    }

    /// Environment variable holding the generative backend key.
    pub fn backend_key_var(provider: BackendProvider) -> &'static str {
        match provider {
            BackendProvider::Gemini => "GEMINI_API_KEY",
            BackendProvider::OpenAI => "OPENAI_API_KEY",
        }
    }

    fn read_key(var: &str) -> Option<String> {
        std::env::var(var).ok().and_then(|v| Self::usable(&v))
    }

    /// Normalize a raw key value, treating blanks and sample placeholders as absent.
    pub fn usable(raw: &str) -> Option<String> {
        let key = raw.trim();
        if key.is_empty() || PLACEHOLDER_KEYS.contains(&key.to_lowercase().as_str()) {
            None
        } else {
            Some(key.to_string())
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("generative_api_key", &self.generative_api_key.as_ref().map(|_| "<set>"))
            .field("tts_api_key", &self.tts_api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_absent() {
        assert_eq!(Credentials::usable(""), None);
        assert_eq!(Credentials::usable("   "), None);
        assert_eq!(Credentials::usable("tu_api_key_aqui"), None);
        assert_eq!(Credentials::usable("YOUR_API_KEY_HERE"), None);
        assert_eq!(Credentials::usable(" abc123 "), Some("abc123".to_string()));
    }

    #[test]
    fn test_debug_hides_keys() {
        let creds = Credentials {
            generative_api_key: Some("secret".to_string()),
            tts_api_key: None,
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<set>"));
    }
}
