//! Integration tests for CLI argument handling
//!
//! Runs the binary for commands that never touch the network.

use std::process::Command;

use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_nearby"))
        .args(args)
        .env_remove("NEARBY_CACHE_DIR")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute nearby")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nearby"), "Help should mention nearby");
    assert!(stdout.contains("feed"), "Help should list the feed command");
    assert!(stdout.contains("invalidate"), "Help should list the invalidate command");
}

#[test]
fn test_invalid_namespace_prints_error_and_exits() {
    let output = run_cli(&["--ephemeral", "invalidate", "offers"]);
    assert!(!output.status.success(), "Expected invalid namespace to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid namespace") || stderr.contains("invalid"),
        "Should print error message about invalid namespace: {}",
        stderr
    );
}

#[test]
fn test_invalidate_succeeds_without_cached_entry() {
    let output = run_cli(&["--ephemeral", "invalidate", "home-feed"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"invalidated\""));
    assert!(stdout.contains("home-feed"));
}

#[test]
fn test_status_reports_policies() {
    let output = run_cli(&["--ephemeral", "--proximity-km", "2.5", "status"]);
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status should print JSON");
    let policies = value["policies"].as_array().expect("policies array");
    assert_eq!(policies.len(), 2);
    assert_eq!(policies[0]["namespace"], "home-feed");
    assert_eq!(policies[0]["ttl_secs"], 3600);
    assert_eq!(policies[0]["proximity_km"], 2.5);
    assert_eq!(policies[1]["namespace"], "user-profile");
    assert_eq!(policies[1]["ttl_secs"], 7200);
    assert!(policies[1]["proximity_km"].is_null());
}

#[test]
fn test_startup_writes_version_to_cache_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let dir = temp_dir.path().to_str().expect("utf-8 temp path");

    let output = run_cli(&["--cache-dir", dir, "status"]);

    assert!(output.status.success());
    assert!(temp_dir.path().join("cache_version.json").exists());
}

#[test]
fn test_zero_ttl_is_rejected() {
    let output = run_cli(&["--ephemeral", "--home-feed-ttl-secs", "0", "status"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TTL") || stderr.contains("InvalidTtl"), "stderr: {}", stderr);
}

#[test]
fn test_out_of_range_latitude_is_rejected() {
    let output = run_cli(&["--ephemeral", "feed", "--lat", "95", "--lng", "91.78"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use nearby::cache::CacheNamespace;
    use nearby::cli::{parse_location, Cli, Command};

    #[test]
    fn test_cli_requires_a_command() {
        assert!(Cli::try_parse_from(["nearby"]).is_err());
    }

    #[test]
    fn test_cli_profile_refresh_flag() {
        let cli = Cli::parse_from(["nearby", "profile", "--refresh"]);
        assert_eq!(cli.command, Command::Profile { refresh: true });
    }

    #[test]
    fn test_cli_invalidate_accepts_aliases() {
        let cli = Cli::parse_from(["nearby", "invalidate", "profile"]);
        assert_eq!(
            cli.command,
            Command::Invalidate {
                namespace: CacheNamespace::UserProfile
            }
        );
    }

    #[test]
    fn test_cli_global_flags_before_command() {
        let cli = Cli::parse_from([
            "nearby",
            "--api-url",
            "http://localhost:8080",
            "--token",
            "secret",
            "--ephemeral",
            "status",
        ]);
        assert_eq!(cli.api_url, "http://localhost:8080");
        assert_eq!(cli.token.as_deref(), Some("secret"));
        assert!(cli.ephemeral);
    }

    #[test]
    fn test_parse_location_rejects_bad_longitude() {
        assert!(parse_location(Some(22.0), Some(181.0), false).is_err());
    }
}
