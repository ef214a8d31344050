use clap::Parser;
use express_mcp::core::signer::SignatureAlgorithm;
use express_mcp::{CliConfig, ErrorKind};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_cli_loads_provider_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("express.toml");
    std::fs::write(
        &path,
        r#"
[provider]
tracking_url = "https://track.example.com/query"
pricing_url = "https://price.example.com/query"
signature = "sha256"

[comparison]
carriers = ["shunfeng", "ems", "jd"]
per_carrier_timeout_ms = 2500
"#,
    )
    .unwrap();

    let cli = CliConfig::parse_from([
        "express-mcp",
        "--customer=C001",
        "--auth_key=secret",
        "--config",
        path.to_str().unwrap(),
    ]);
    let config = cli.load().unwrap();

    assert_eq!(config.credentials.account_id(), "C001");
    assert_eq!(config.credentials.auth_key(), "secret");
    assert_eq!(config.provider.provider.signature, SignatureAlgorithm::Sha256);

    let settings = config.provider.comparison_settings();
    assert_eq!(settings.carriers, vec!["shunfeng", "ems", "jd"]);
    assert_eq!(settings.per_carrier_timeout, Duration::from_millis(2500));
    assert_eq!(settings.default_currency, "CNY");
}

#[test]
fn test_cli_rejects_invalid_provider_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("express.toml");
    std::fs::write(&path, "[comparison]\ncarriers = []\n").unwrap();

    let cli = CliConfig::parse_from(["express-mcp", "--config", path.to_str().unwrap()]);
    let err = cli.load().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_cli_reports_missing_provider_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.toml");

    let cli = CliConfig::parse_from(["express-mcp", "--config", path.to_str().unwrap()]);
    let err = cli.load().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("missing.toml"));
}
