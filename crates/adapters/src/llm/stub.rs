//! Stub generator for testing and offline mode

use async_trait::async_trait;
use infopost_domain::{GenerateError, TextGenerator};

const DEFAULT_REPLY: &str = r#"{"information": "Offline mode: the stub generator answered instead of Gemini.", "hashtags": ["stub", "offline"]}"#;

/// Stub generator that returns configurable replies
pub struct StubGenerator {
    reply: Option<String>,
    error: Option<GenerateError>,
}

impl StubGenerator {
    /// Create a stub that always returns the given reply text
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            error: None,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: GenerateError) -> Self {
        Self {
            reply: None,
            error: Some(error),
        }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::with_reply(DEFAULT_REPLY)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        if let Some(ref error) = self.error {
            return Err(match error {
                GenerateError::Api(msg) => GenerateError::Api(msg.clone()),
                GenerateError::InvalidFormat(msg) => GenerateError::InvalidFormat(msg.clone()),
                GenerateError::RateLimited => GenerateError::RateLimited,
                GenerateError::Timeout => GenerateError::Timeout,
                GenerateError::Config(msg) => GenerateError::Config(msg.clone()),
            });
        }

        Ok(self.reply.clone().unwrap_or_else(|| DEFAULT_REPLY.to_string()))
    }

    fn provider(&self) -> &'static str {
        "stub"
    }
}
