//! Bluesky (AT Protocol) adapters

mod session;
mod write;

pub use session::{Credentials, Session};
pub use write::{BlueskyPublisher, DEFAULT_SERVICE, MAX_POST_CHARS};

use async_trait::async_trait;
use infopost_domain::{PostReceipt, PostText, PublishError, Publisher};

/// Stub publisher for testing and dry runs; records instead of posting
#[derive(Default)]
pub struct StubPublisher {
    published: std::sync::Mutex<Vec<PostText>>,
}

impl StubPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all posts that were published
    pub fn get_published(&self) -> Vec<PostText> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, text: &PostText) -> Result<PostReceipt, PublishError> {
        let count = match self.published.lock() {
            Ok(mut published) => {
                published.push(text.clone());
                published.len()
            }
            Err(_) => return Err(PublishError::Api("Stub state poisoned".to_string())),
        };

        Ok(PostReceipt {
            uri: format!("at://did:plc:stub/app.bsky.feed.post/{}", count),
            cid: format!("stub_{}", count),
        })
    }

    fn platform(&self) -> &'static str {
        "stub"
    }
}
