use serde::{Deserialize, Serialize};

/// Application backend used for channel authorization.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://bus.example.edu/api`.
    pub base_url: String,
    pub broadcast_auth_path: String,
    /// Bearer token sent with the auth request. Empty means none.
    pub token: String,
    /// Auth request timeout in seconds. 0 disables the timeout.
    pub auth_timeout_secs: u32,
}

impl ApiConfig {
    /// Full URL of the broadcast-auth endpoint.
    pub fn broadcast_auth_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.broadcast_auth_path
        )
    }

    pub fn bearer_token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("broadcast_auth_path", &self.broadcast_auth_path)
            .field("token", &self.bearer_token().map(|_| "[REDACTED]"))
            .field("auth_timeout_secs", &self.auth_timeout_secs)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            broadcast_auth_path: "/broadcasting/auth".into(),
            token: String::new(),
            auth_timeout_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_url_joins_without_double_slash() {
        let api = ApiConfig {
            base_url: "https://bus.example.edu/api/".into(),
            ..Default::default()
        };
        assert_eq!(
            api.broadcast_auth_url(),
            "https://bus.example.edu/api/broadcasting/auth"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let api = ApiConfig {
            token: "secret-token".into(),
            ..Default::default()
        };
        let debug = format!("{api:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn empty_token_is_none() {
        assert_eq!(ApiConfig::default().bearer_token(), None);
    }
}
