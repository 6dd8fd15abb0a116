use thiserror::Error;

/// Top-level error type for the `policysync-api` crate.
///
/// Covers every failure mode across the controller, CoPilot, meta-IP,
/// and DNS clients. `policysync-core` maps these into the reconciler's
/// error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the login response carried no session token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A session-scoped call was made before `login()` succeeded.
    #[error("Not logged in -- call login() first")]
    NotLoggedIn,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Upstream API ────────────────────────────────────────────────
    /// Any non-2xx response, with the raw body for the caller.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── DNS ─────────────────────────────────────────────────────────
    /// Resolver failure other than "no records".
    #[error("DNS lookup for {name} failed: {message}")]
    Dns { name: String, message: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is unusable
    /// and a fresh login might resolve it.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Authentication { .. } | Self::NotLoggedIn => true,
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// The HTTP status, if the error came from an upstream response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
