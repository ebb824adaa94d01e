//! Bluesky write adapter for publishing posts

use async_trait::async_trait;
use infopost_domain::{PostReceipt, PostText, PublishError, Publisher};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::session::{Credentials, create_session};

/// Default PDS for bsky.social accounts
pub const DEFAULT_SERVICE: &str = "https://bsky.social";

/// Grapheme limit Bluesky enforces on post text
pub const MAX_POST_CHARS: usize = 300;

const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Bluesky publisher. Logs in on every publish; the HTTP client and
/// credentials are built once and shared.
pub struct BlueskyPublisher {
    client: Client,
    service: String,
    credentials: Credentials,
    max_chars: usize,
}

impl BlueskyPublisher {
    pub fn new(credentials: Credentials) -> Result<Self, PublishError> {
        Self::with_service(credentials, DEFAULT_SERVICE.to_string(), MAX_POST_CHARS)
    }

    pub fn with_service(
        credentials: Credentials,
        service: String,
        max_chars: usize,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PublishError::Api(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            service: service.trim_end_matches('/').to_string(),
            credentials,
            max_chars,
        })
    }
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'static str,
    record: PostRecord<'a>,
}

#[derive(Serialize)]
struct PostRecord<'a> {
    #[serde(rename = "$type")]
    record_type: &'static str,
    text: &'a str,
    #[serde(rename = "createdAt")]
    created_at: String,
}

#[derive(Deserialize)]
struct CreateRecordResponse {
    uri: String,
    cid: String,
}

#[async_trait]
impl Publisher for BlueskyPublisher {
    async fn publish(&self, text: &PostText) -> Result<PostReceipt, PublishError> {
        // Validate content length
        let len = text.char_len();
        if len > self.max_chars {
            return Err(PublishError::ContentTooLong {
                len,
                max: self.max_chars,
            });
        }

        let session = create_session(&self.client, &self.service, &self.credentials).await?;

        let now = OffsetDateTime::now_utc();
        let request = CreateRecordRequest {
            repo: &session.did,
            collection: POST_COLLECTION,
            record: PostRecord {
                record_type: POST_COLLECTION,
                text: text.as_str(),
                created_at: now
                    .format(&Rfc3339)
                    .map_err(|e| PublishError::Api(format!("Timestamp: {}", e)))?,
            },
        };

        let url = format!("{}/xrpc/com.atproto.repo.createRecord", self.service);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", session.access_jwt.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout
                } else {
                    PublishError::Api(e.to_string())
                }
            })?;

        if response.status() == 401 {
            return Err(PublishError::Auth("Session rejected".to_string()));
        }

        if response.status() == 429 {
            return Err(PublishError::RateLimited);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(format!("Failed to create post: {}", body)));
        }

        let created: CreateRecordResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        Ok(PostReceipt {
            uri: created.uri,
            cid: created.cid,
        })
    }

    fn platform(&self) -> &'static str {
        "bluesky"
    }
}
