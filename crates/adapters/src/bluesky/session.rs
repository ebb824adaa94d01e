//! AT Protocol session creation

use infopost_domain::PublishError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Login credentials for a Bluesky account
#[derive(Debug)]
pub struct Credentials {
    /// Handle or email, e.g. `example.bsky.social`
    pub identifier: String,
    /// App password
    pub password: SecretString,
}

/// An authenticated session returned by `createSession`
#[derive(Debug)]
pub struct Session {
    pub did: String,
    pub handle: String,
    pub access_jwt: SecretString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    did: String,
    handle: String,
    access_jwt: String,
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// Log in against `service` and return a fresh session
pub(crate) async fn create_session(
    client: &Client,
    service: &str,
    credentials: &Credentials,
) -> Result<Session, PublishError> {
    let url = format!("{}/xrpc/com.atproto.server.createSession", service);

    let response = client
        .post(&url)
        .json(&CreateSessionRequest {
            identifier: &credentials.identifier,
            password: credentials.password.expose_secret(),
        })
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                PublishError::Timeout
            } else {
                PublishError::Api(format!("Login request failed: {}", e))
            }
        })?;

    let status = response.status();

    if status == 429 {
        return Err(PublishError::RateLimited);
    }

    if status == 400 || status == 401 {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Auth(body));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Api(format!("Login returned {}: {}", status, body)));
    }

    let created: CreateSessionResponse = response
        .json()
        .await
        .map_err(|e| PublishError::Api(format!("Invalid session response: {}", e)))?;

    let session = Session {
        did: created.did,
        handle: created.handle,
        access_jwt: SecretString::new(created.access_jwt.into()),
    };

    tracing::debug!(handle = %session.handle, did = %session.did, "Authenticated");
    Ok(session)
}
