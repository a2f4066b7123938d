use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("invalid environment variable {name}: {message}")]
    EnvError { name: String, message: String },
}

/// Failures of the broadcast-auth call that exchanges a socket id for a
/// channel signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Network(String),

    #[error("auth endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("auth response unusable: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    #[error("invalid channel name: {0:?}")]
    InvalidChannel(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("connection closed")]
    Closed,

    #[error("connection failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CampusBusError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<AuthError> for CampusBusError {
    fn from(err: AuthError) -> Self {
        CampusBusError::Realtime(RealtimeError::Auth(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::EnvError {
            name: "CAMPUSBUS_BROADCAST_PORT".into(),
            message: "not a number".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid environment variable CAMPUSBUS_BROADCAST_PORT: not a number"
        );
    }

    #[test]
    fn auth_error_display() {
        let err = AuthError::Status {
            status: 403,
            body: "Forbidden".into(),
        };
        assert_eq!(err.to_string(), "auth endpoint returned HTTP 403: Forbidden");

        let err = AuthError::InvalidResponse("missing `auth`".into());
        assert_eq!(err.to_string(), "auth response unusable: missing `auth`");
    }

    #[test]
    fn realtime_error_wraps_auth_transparently() {
        let err: RealtimeError = AuthError::Network("connection refused".into()).into();
        assert!(matches!(err, RealtimeError::Auth(_)));
        assert_eq!(err.to_string(), "auth request failed: connection refused");
    }

    #[test]
    fn campusbus_error_from_auth_goes_through_realtime() {
        let err: CampusBusError = AuthError::Network("timeout".into()).into();
        assert!(matches!(
            err,
            CampusBusError::Realtime(RealtimeError::Auth(AuthError::Network(_)))
        ));
    }

    #[test]
    fn campusbus_error_from_config() {
        let err: CampusBusError = ConfigError::ValidationError("broadcast.host is empty".into()).into();
        assert!(matches!(err, CampusBusError::Config(_)));
        assert!(err.to_string().contains("broadcast.host"));
    }

    #[test]
    fn campusbus_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: CampusBusError = io_err.into();
        assert!(matches!(err, CampusBusError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }
}
