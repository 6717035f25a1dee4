//! Integration tests for CLI argument handling

use std::process::Command;

/// Helper to run the binary with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mta-violations"))
        .args(args)
        .output()
        .expect("Failed to execute mta-violations")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mta-violations"), "Help should mention the binary");
    assert!(stdout.contains("--stale-policy"), "Help should mention --stale-policy");
    assert!(stdout.contains("--allowed-origin"), "Help should mention --allowed-origin");
}

#[test]
fn test_invalid_stale_policy_prints_error_and_exits() {
    let output = run_cli(&["--stale-policy", "sometimes"]);
    assert!(!output.status.success(), "Expected invalid policy to fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("sometimes") || stderr.contains("invalid"),
        "Should print error message about the invalid policy: {}",
        stderr
    );
}

#[test]
fn test_zero_timeout_is_rejected_before_serving() {
    let output = run_cli(&["--timeout", "0", "--port", "0"]);
    assert!(!output.status.success(), "Expected zero timeout to fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("request_timeout_secs"), "{}", stderr);
}

#[test]
fn test_missing_config_file_is_reported() {
    let output = run_cli(&["--config", "/nonexistent/mta-violations.toml"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file"), "{}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! CLI parsing that doesn't require running the binary

    use clap::Parser;
    use mta_violations::cli::Cli;
    use mta_violations::config::StalePolicy;

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["mta-violations", "-H", "0.0.0.0", "-p", "8080"]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_cli_stale_policy_values() {
        let cli = Cli::parse_from(["mta-violations", "--stale-policy", "serve-stale"]);
        assert_eq!(cli.stale_policy, Some(StalePolicy::ServeStale));

        let cli = Cli::parse_from(["mta-violations", "--stale-policy", "fail"]);
        assert_eq!(cli.stale_policy, Some(StalePolicy::Fail));
    }
}
