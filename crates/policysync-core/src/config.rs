// ── Runtime connection configuration ──
//
// These types describe *how* to reach the controller and CoPilot.
// They carry credential data and connection tuning, but never touch
// disk or the environment. The CLI constructs them and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use policysync_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for controllers.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one controller session.
///
/// Built by the CLI, passed to [`crate::session::connect`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://10.0.0.5`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout; expiry surfaces as an API error.
    pub timeout: Duration,
}

impl ControllerConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookie_jar: None,
        }
    }
}

/// Configuration for the CoPilot log API.
#[derive(Debug, Clone)]
pub struct CopilotConfig {
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl CopilotConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}
