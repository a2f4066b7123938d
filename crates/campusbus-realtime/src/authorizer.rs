//! Private channel authorization against the backend's broadcast-auth route.

use std::time::Duration;

use async_trait::async_trait;
use campusbus_common::AuthError;
use serde::Serialize;
use tracing::debug;

/// Exchanges a connection's socket id for a signature that lets it join a
/// private channel.
#[async_trait]
pub trait ChannelAuthorizer: Send + Sync {
    async fn authorize(&self, socket_id: &str, channel_name: &str) -> Result<String, AuthError>;
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    socket_id: &'a str,
    channel_name: &'a str,
}

/// Pull the `auth` signature out of a broadcast-auth response body.
pub(crate) fn parse_auth_response(body: &serde_json::Value) -> Result<String, AuthError> {
    match body.get("auth") {
        Some(serde_json::Value::String(auth)) if !auth.is_empty() => Ok(auth.clone()),
        Some(serde_json::Value::String(_)) => {
            Err(AuthError::InvalidResponse("empty `auth` field".to_string()))
        }
        Some(other) => Err(AuthError::InvalidResponse(format!(
            "`auth` is not a string: {other}"
        ))),
        None => Err(AuthError::InvalidResponse("missing `auth` field".to_string())),
    }
}

// ---------------------------------------------------------------------------
// HTTP Authorizer
// ---------------------------------------------------------------------------

/// Posts `{socket_id, channel_name}` to the broadcast-auth endpoint with an
/// optional bearer token.
pub struct HttpAuthorizer {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthorizer")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpAuthorizer {
    /// `timeout` of `None` lets the request wait as long as the server does.
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AuthError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChannelAuthorizer for HttpAuthorizer {
    async fn authorize(&self, socket_id: &str, channel_name: &str) -> Result<String, AuthError> {
        debug!(endpoint = %self.endpoint, channel = %channel_name, "Requesting channel authorization");

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("accept", "application/json")
            .json(&AuthRequest {
                socket_id,
                channel_name,
            });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = text.chars().take(200).collect::<String>();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        parse_auth_response(&body)
    }
}
