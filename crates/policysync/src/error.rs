//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use policysync_config::ConfigError;
use policysync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UPSTREAM: i32 = 5;
    pub const PARTIAL: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(policysync::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Run: policysync config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(policysync::no_credentials),
        help(
            "Configure credentials with: policysync config init\n\
             Or set POLICYSYNC_USERNAME and POLICYSYNC_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{kind} '{identifier}' not found")]
    #[diagnostic(
        code(policysync::not_found),
        help("Run: policysync groups list to see available SmartGroups")
    )]
    NotFound { kind: String, identifier: String },

    // ── Upstream ─────────────────────────────────────────────────────

    #[error("{0}")]
    #[diagnostic(
        code(policysync::api_error),
        help("Re-run with -vv to see the request trace.")
    )]
    Api(String),

    #[error("{failed} of {total} group(s) failed to sync")]
    #[diagnostic(
        code(policysync::partial_failure),
        help("The per-group results above name the cause of each failure.")
    )]
    PartialFailure { failed: usize, total: usize },

    #[error("Handler returned HTTP {status}")]
    #[diagnostic(code(policysync::handler_status))]
    HandlerStatus { status: u16 },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(policysync::validation))]
    Validation { field: String, reason: String },

    #[error("{0}")]
    #[diagnostic(code(policysync::invalid_action))]
    InvalidAction(String),

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(policysync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: policysync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(policysync::no_config),
        help(
            "Create a profile with: policysync config init\n\
             Or pass --controller. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(policysync::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(code(policysync::keyring))]
    Keyring(#[from] keyring::Error),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(policysync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(policysync::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(policysync::json), help("Check the JSON input and try again."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Api(_) => exit_code::UPSTREAM,
            Self::PartialFailure { .. } | Self::HandlerStatus { .. } => exit_code::PARTIAL,
            Self::Validation { .. }
            | Self::InvalidAction(_)
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoConfig { .. }
            | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::ObjectNotFound { kind, identifier } => {
                CliError::NotFound { kind, identifier }
            }
            err @ CoreError::InvalidAction { .. } => CliError::InvalidAction(err.to_string()),
            CoreError::InvalidRequest { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            err @ CoreError::Api { .. } => CliError::Api(err.to_string()),
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<policysync_api::Error> for CliError {
    fn from(err: policysync_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Serialization(e) => CliError::Internal(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::Authentication {
                    message: "bad".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::ObjectNotFound {
                    kind: "SmartGroup".into(),
                    identifier: "x".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::InvalidAction {
                    action: "UPSERT".into(),
                    supported: "ADD, DELETE".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::Api {
                    status: Some(500),
                    body: "boom".into(),
                },
                exit_code::UPSTREAM,
            ),
            (CoreError::Internal("x".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn invalid_action_keeps_supported_list() {
        let err = CliError::from(CoreError::InvalidAction {
            action: "UPSERT".into(),
            supported: "ADD, DELETE".into(),
        });
        assert!(err.to_string().contains("ADD, DELETE"));
    }
}
