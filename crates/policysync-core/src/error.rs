// ── Core error types ──
//
// The reconciler's error taxonomy. Transport details (reqwest errors,
// JSON parse failures) are folded into these variants by the
// `From<policysync_api::Error>` impl, so callers branch on meaning
// rather than on how a request failed.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session ──────────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Upstream ─────────────────────────────────────────────────────
    /// Any non-2xx from the controller or an upstream source, plus
    /// timeouts and connection failures (`status` is `None` for those).
    #[error("API error{}: {body}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Api { status: Option<u16>, body: String },

    // ── Addressing ───────────────────────────────────────────────────
    #[error("{kind} not found: {identifier}")]
    ObjectNotFound { kind: String, identifier: String },

    // ── Request validation ───────────────────────────────────────────
    #[error("Invalid action '{action}' (supported: {supported})")]
    InvalidAction { action: String, supported: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable snake_case tag used in JSON results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "auth_error",
            Self::Api { .. } => "api_error",
            Self::ObjectNotFound { .. } => "object_not_found",
            Self::InvalidAction { .. } => "invalid_action",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Config { .. } => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub(crate) fn invalid_action(action: &str, supported: &[&str]) -> Self {
        Self::InvalidAction {
            action: action.to_owned(),
            supported: supported.join(", "),
        }
    }

    pub(crate) fn not_found(kind: &str, identifier: &str) -> Self {
        Self::ObjectNotFound {
            kind: kind.to_owned(),
            identifier: identifier.to_owned(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<policysync_api::Error> for CoreError {
    fn from(err: policysync_api::Error) -> Self {
        let status = err.status();
        if err.is_auth_failure() {
            let message = match err {
                policysync_api::Error::Authentication { message } => message,
                policysync_api::Error::NotLoggedIn => "no active session -- login required".into(),
                other => format!("session rejected: {other}"),
            };
            return CoreError::Authentication { message };
        }

        match err {
            policysync_api::Error::Api { body, .. } => CoreError::Api { status, body },
            policysync_api::Error::Transport(e) => CoreError::Api {
                status,
                body: e.to_string(),
            },
            policysync_api::Error::Timeout { timeout_secs } => CoreError::Api {
                status: None,
                body: format!("request timed out after {timeout_secs}s"),
            },
            policysync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            policysync_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            policysync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            policysync_api::Error::Dns { name, message } => CoreError::Api {
                status: None,
                body: format!("DNS lookup for {name} failed: {message}"),
            },
            err @ (policysync_api::Error::Authentication { .. }
            | policysync_api::Error::NotLoggedIn) => CoreError::Authentication {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_api_error() {
        let err: CoreError = policysync_api::Error::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, CoreError::Api { status: None, .. }));
        assert_eq!(err.to_string(), "API error: request timed out after 30s");
    }

    #[test]
    fn api_status_is_kept() {
        let err: CoreError = policysync_api::Error::Api {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert_eq!(err.to_string(), "API error (HTTP 502): bad gateway");
        assert_eq!(err.kind(), "api_error");
    }

    #[test]
    fn unauthorized_response_is_authentication() {
        let err: CoreError = policysync_api::Error::Api {
            status: 401,
            body: "session expired".into(),
        }
        .into();
        assert_eq!(err.kind(), "auth_error");
        assert!(err.to_string().contains("session expired"), "got: {err}");

        let err: CoreError = policysync_api::Error::NotLoggedIn.into();
        assert!(matches!(err, CoreError::Authentication { .. }));
    }
}
