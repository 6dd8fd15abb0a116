#![allow(clippy::unwrap_used)]
// Config file loading against a temporary directory.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use tempfile::TempDir;

use policysync_config::{
    Config, Profile, load_config_from, profile_to_controller_config, save_config_to,
};

const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
output = "json"
timeout = 45

[profiles.lab]
controller = "10.0.0.5"
username = "admin"
password = "plaintext-pw"
copilot = "copilot.lab"
github_endpoints = ["git", "web"]
fqdns = ["api.github.com"]
timeout = 12
"#;

#[test]
fn loads_profiles_from_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let cfg = load_config_from(&path).unwrap();

    assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
    assert_eq!(cfg.defaults.output, "json");
    assert_eq!(cfg.defaults.timeout, 45);

    let lab = &cfg.profiles["lab"];
    assert_eq!(lab.github_endpoints, vec!["git", "web"]);
    assert_eq!(lab.fqdns, vec!["api.github.com"]);
    assert_eq!(lab.copilot.as_deref(), Some("copilot.lab"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    assert!(cfg.profiles.is_empty());
    assert_eq!(cfg.defaults.timeout, 30);
}

#[test]
fn profile_builds_controller_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    let cfg = load_config_from(&path).unwrap();

    let controller = profile_to_controller_config(&cfg.profiles["lab"], "lab").unwrap();

    assert_eq!(controller.url.as_str(), "https://10.0.0.5/");
    assert_eq!(controller.username, "admin");
    assert_eq!(controller.timeout, Duration::from_secs(12));
    assert!(!controller.password.expose_secret().is_empty());
}

#[test]
fn save_then_load_keeps_profiles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.profiles.insert(
        "default".into(),
        Profile {
            controller: "https://ctl.example".into(),
            username: Some("ops".into()),
            github_endpoints: vec!["actions".into()],
            ..Profile::default()
        },
    );
    save_config_to(&cfg, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let profile = &loaded.profiles["default"];
    assert_eq!(profile.controller, "https://ctl.example");
    assert_eq!(profile.github_endpoints, vec!["actions"]);
}
