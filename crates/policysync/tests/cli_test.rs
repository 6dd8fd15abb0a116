//! Integration tests for the `policysync` CLI binary.
//!
//! Argument parsing, help output, shell completions, and error handling
//! run without a controller; the wiremock-backed tests drive full
//! commands against a mock controller.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUP_UUID: &str = "60477a53-72d0-4175-a3f6-5b861b77cfed";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `policysync` binary with env isolation.
///
/// Clears all `POLICYSYNC_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn policysync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("policysync");
    cmd.env("HOME", "/tmp/policysync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/policysync-cli-test-nonexistent")
        .env_remove("POLICYSYNC_PROFILE")
        .env_remove("POLICYSYNC_CONTROLLER")
        .env_remove("POLICYSYNC_USERNAME")
        .env_remove("POLICYSYNC_PASSWORD")
        .env_remove("POLICYSYNC_OUTPUT")
        .env_remove("POLICYSYNC_INSECURE")
        .env_remove("POLICYSYNC_TIMEOUT")
        .env_remove("POLICYSYNC_COPILOT")
        .env_remove("POLICYSYNC_GITHUB_ENDPOINTS")
        .env_remove("POLICYSYNC_LOG_JSON");
    cmd
}

/// A command wired to a mock controller with env-supplied credentials.
fn against(server_uri: &str) -> assert_cmd::Command {
    let mut cmd = policysync_cmd();
    cmd.env("POLICYSYNC_PASSWORD", "test-password")
        .args(["--controller", server_uri, "--username", "admin"]);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_controller() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/api"))
        .and(body_string_contains("action=login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": true,
            "CID": "test-cid"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.5/api/app-domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "app_domains": [{
                "uuid": GROUP_UUID,
                "name": "partner_ranges",
                "selector": {"any": [{"all": {"cidr": "1.1.1.1"}}]}
            }]
        })))
        .mount(&server)
        .await;

    server
}

/// Run a blocking command from inside an async test.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = policysync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    policysync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("SmartGroups")
            .and(predicate::str::contains("github"))
            .and(predicate::str::contains("rules"))
            .and(predicate::str::contains("egress")),
    );
}

#[test]
fn test_version_flag() {
    policysync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("policysync"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    policysync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_invalid_shell() {
    policysync_cmd()
        .args(["completions", "tcsh"])
        .assert()
        .failure();
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_prints_toml_path() {
    policysync_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_profiles_empty() {
    let output = policysync_cmd().args(["config", "profiles"]).output().unwrap();
    assert!(output.status.success());
    assert!(combined_output(&output).contains("No profiles configured"));
}

#[test]
fn test_config_use_unknown_profile() {
    let output = policysync_cmd()
        .args(["config", "use", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("nope"));
}

// ── Argument validation (no controller needed) ──────────────────────

#[test]
fn test_missing_controller_is_usage_error() {
    let output = policysync_cmd().args(["groups", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No controller configured"), "got:\n{text}");
}

#[test]
fn test_unknown_profile_flag() {
    let output = policysync_cmd()
        .args(["--profile", "ghost", "rules", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("ghost"));
}

#[test]
fn test_groups_update_rejects_unknown_action() {
    policysync_cmd()
        .args(["groups", "update", GROUP_UUID, "--action", "upsert", "10.0.0.0/8"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("upsert"));
}

#[test]
fn test_groups_update_rejects_non_uuid() {
    let output = against("http://127.0.0.1:9")
        .args(["groups", "update", "not-a-uuid", "--action", "add", "10.0.0.0/8"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("not a UUID"));
}

#[test]
fn test_github_sync_without_endpoints() {
    let output = against("http://127.0.0.1:9")
        .args(["github", "sync"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("github_endpoints"));
}

#[test]
fn test_no_credentials() {
    let output = policysync_cmd()
        .args(["--controller", "10.0.0.5", "groups", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No credentials"));
}

// ── Against a mock controller ───────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_update_writes_union() {
    let server = mock_controller().await;

    Mock::given(method("PUT"))
        .and(path(format!("/v2.5/api/app-domains/{GROUP_UUID}")))
        .and(body_string_contains("10.0.0.0/8"))
        .and(body_string_contains("1.1.1.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"return": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = against(&server.uri());
    cmd.args([
        "-o", "json", "groups", "update", GROUP_UUID, "--action", "add", "10.0.0.0/8", "2001:db8::/32",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value, json!({"return": true}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_update_unknown_uuid_is_not_found() {
    let server = mock_controller().await;

    let mut cmd = against(&server.uri());
    cmd.args([
        "groups",
        "update",
        "00000000-0000-0000-0000-000000000000",
        "--action",
        "delete",
        "1.1.1.1",
    ]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_list_plain() {
    let server = mock_controller().await;

    let mut cmd = against(&server.uri());
    cmd.args(["-o", "plain", "groups", "list"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), GROUP_UUID);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invoke_smartgroup_bad_action_returns_400() {
    let server = mock_controller().await;

    let event = json!({
        "body": json!({
            "smartgroup_uuid": GROUP_UUID,
            "domains": ["10.0.0.0/8"],
            "action": "UPSERT",
        })
        .to_string()
    });

    let mut cmd = against(&server.uri());
    cmd.args(["invoke", "smartgroup"]).write_stdin(event.to_string());
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["statusCode"], 400);
    let body: serde_json::Value =
        serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["error"]["kind"], "invalid_action");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejected_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": false,
            "reason": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    let mut cmd = against(&server.uri());
    cmd.args(["rules", "list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
