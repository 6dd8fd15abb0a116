//! Shared configuration for policysync.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `policysync_core::ControllerConfig` /
//! `CopilotConfig`. The CLI layers its `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use policysync_core::{ControllerConfig, CopilotConfig, TlsVerification};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "policysync";

/// Prefix for environment overrides (`POLICYSYNC_DEFAULTS__TIMEOUT=60`).
pub const ENV_PREFIX: &str = "POLICYSYNC_";

/// Environment variable consulted for the password before the keyring.
pub const PASSWORD_ENV: &str = "POLICYSYNC_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named controller profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Controller address: a URL or a bare host (`10.0.0.5`).
    pub controller: String,

    /// Controller username.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name holding the password.
    pub password_env: Option<String>,

    /// CoPilot address for log-based recommendations.
    pub copilot: Option<String>,

    /// CoPilot username when it differs from the controller's.
    pub copilot_username: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Meta-IP endpoint keys mirrored into `external_github_*` groups.
    #[serde(default)]
    pub github_endpoints: Vec<String>,

    /// Meta-IP API base URL override.
    pub github_api: Option<String>,

    /// Hosts that should have an `fqdn_*` group even before one exists.
    #[serde(default)]
    pub fqdns: Vec<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "policysync", "policysync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("policysync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path. A missing file yields the defaults
/// (plus any environment overrides).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Value parsing ───────────────────────────────────────────────────

/// Parse a controller/CoPilot address. Bare hosts get `https://`.
pub fn parse_address(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };
    candidate.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Parse an endpoint list given as a JSON array (`["git","web"]`) or as
/// comma-separated names (`git,web`).
pub fn parse_name_list(field: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str(raw).map_err(|e| ConfigError::Validation {
            field: field.into(),
            reason: format!("expected a JSON array of strings: {e}"),
        });
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Keyring entry holding a profile's password.
pub fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Resolve the controller username: profile, then `POLICYSYNC_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("POLICYSYNC_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn tls_for(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::DangerAcceptInvalid // controllers are typically self-signed
    }
}

/// Build a `ControllerConfig` from a profile, no CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ControllerConfig, ConfigError> {
    Ok(ControllerConfig {
        url: parse_address("controller", &profile.controller)?,
        username: resolve_username(profile, profile_name)?,
        password: resolve_password(profile, profile_name)?,
        tls: tls_for(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(default_timeout())),
    })
}

/// Build a `CopilotConfig` from a profile. CoPilot shares the
/// controller's credentials unless `copilot_username` is set.
pub fn profile_to_copilot_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<CopilotConfig, ConfigError> {
    let raw = profile.copilot.as_deref().ok_or_else(|| ConfigError::Validation {
        field: "copilot".into(),
        reason: format!("profile '{profile_name}' has no CoPilot address"),
    })?;

    let username = match profile.copilot_username.clone() {
        Some(user) => user,
        None => resolve_username(profile, profile_name)?,
    };

    Ok(CopilotConfig {
        url: parse_address("copilot", raw)?,
        username,
        password: resolve_password(profile, profile_name)?,
        tls: tls_for(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(default_timeout())),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bare_host_gets_https() {
        let url = parse_address("controller", "10.0.0.5").unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.5/");
        let url = parse_address("controller", "http://ctl.local:8443").unwrap();
        assert_eq!(url.as_str(), "http://ctl.local:8443/");
    }

    #[test]
    fn name_lists_accept_json_or_commas() {
        assert_eq!(
            parse_name_list("github_endpoints", r#"["git", "web"]"#).unwrap(),
            vec!["git", "web"]
        );
        assert_eq!(
            parse_name_list("github_endpoints", " git, web ,").unwrap(),
            vec!["git", "web"]
        );
        assert!(parse_name_list("github_endpoints", "[1, 2").is_err());
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            insecure: Some(true),
            ca_cert: Some("/tmp/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(tls_for(&profile), TlsVerification::DangerAcceptInvalid);

        let profile = Profile {
            ca_cert: Some("/tmp/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(tls_for(&profile), TlsVerification::CustomCa("/tmp/ca.pem".into()));
    }

    #[test]
    fn copilot_requires_address() {
        let profile = Profile {
            controller: "10.0.0.5".into(),
            username: Some("admin".into()),
            password: Some("pw".into()),
            ..Profile::default()
        };
        let err = profile_to_copilot_config(&profile, "default").unwrap_err();
        assert!(err.to_string().contains("copilot"));
    }
}
