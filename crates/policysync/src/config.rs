//! CLI configuration: thin wrapper around `policysync_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--controller, --username, etc.).

use policysync_core::{ControllerConfig, CopilotConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use policysync_config::{
    Config, Profile, config_path, keyring_entry, load_config_or_default, parse_address,
    parse_name_list, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile with CLI flag overrides applied.
///
/// Without a matching profile, `--controller` (or `POLICYSYNC_CONTROLLER`)
/// is enough to build one from flags and environment alone.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);

    let mut profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.controller.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref controller) = global.controller {
        profile.controller.clone_from(controller);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    profile.timeout = Some(global.timeout);

    Ok((name, profile))
}

/// Build the controller session config from profile + flags.
pub fn resolve_controller_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ControllerConfig, CliError> {
    let (name, profile) = effective_profile(global, config)?;
    if profile.controller.trim().is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    Ok(policysync_config::profile_to_controller_config(&profile, &name)?)
}

/// Build the CoPilot session config; `copilot` overrides the profile address.
pub fn resolve_copilot_config(
    global: &GlobalOpts,
    config: &Config,
    copilot: Option<&str>,
) -> Result<CopilotConfig, CliError> {
    let (name, mut profile) = effective_profile(global, config)?;
    if let Some(address) = copilot {
        profile.copilot = Some(address.to_owned());
    }
    Ok(policysync_config::profile_to_copilot_config(&profile, &name)?)
}

/// Endpoint keys for the meta-IP sync: flag value, else the profile list.
pub fn resolve_github_endpoints(
    flag: Option<&str>,
    profile: &Profile,
) -> Result<Vec<String>, CliError> {
    let endpoints = match flag {
        Some(raw) => parse_name_list("endpoints", raw)?,
        None => profile.github_endpoints.clone(),
    };
    if endpoints.is_empty() {
        return Err(CliError::Validation {
            field: "github_endpoints".into(),
            reason: "no endpoints given; pass --endpoints or set github_endpoints in the profile"
                .into(),
        });
    }
    Ok(endpoints)
}

/// Meta-IP API base: flag, then profile, then the public default.
pub fn resolve_github_api(flag: Option<&str>, profile: &Profile) -> Result<url::Url, CliError> {
    match flag.or(profile.github_api.as_deref()) {
        Some(raw) => Ok(parse_address("github_api", raw)?),
        None => policysync_api::GITHUB_API_URL
            .parse()
            .map_err(|e: url::ParseError| CliError::Internal(e.to_string())),
    }
}
