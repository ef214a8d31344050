pub mod toml_config;

use crate::domain::model::Credentials;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::fmt;
use toml_config::ProviderConfig;

#[derive(Clone, Parser)]
#[command(name = "express-mcp")]
#[command(about = "MCP server for express tracking and shipping price comparison")]
pub struct CliConfig {
    #[arg(long = "auth_key", default_value = "", help = "Provider signing key")]
    pub auth_key: String,

    #[arg(long, default_value = "", help = "Provider customer (account) id")]
    pub customer: String,

    #[arg(long, help = "Optional TOML file with endpoints, carriers and timeouts")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

// 不可輸出金鑰
impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("auth_key", &"<redacted>")
            .field("customer", &"<redacted>")
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub provider: ProviderConfig,
}

impl AppConfig {
    pub fn new(credentials: Credentials, provider: ProviderConfig) -> Self {
        Self {
            credentials,
            provider,
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.provider.validate()
    }
}

impl CliConfig {
    /// Loads the provider file if one was given, otherwise uses defaults.
    pub fn load(&self) -> Result<AppConfig> {
        let provider = match &self.config {
            Some(path) => ProviderConfig::from_file(path)?,
            None => ProviderConfig::default(),
        };
        let config = AppConfig::new(
            Credentials::new(self.customer.clone(), self.auth_key.clone()),
            provider,
        );
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_underscore_flags() {
        let cli = CliConfig::parse_from([
            "express-mcp",
            "--auth_key=secret",
            "--customer=C001",
        ]);
        assert_eq!(cli.auth_key, "secret");
        assert_eq!(cli.customer, "C001");
        assert!(cli.config.is_none());

        let debug = format!("{:?}", cli);
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_missing_credentials_default_to_empty() {
        let cli = CliConfig::parse_from(["express-mcp"]);
        let config = cli.load().unwrap();
        assert!(config.credentials.is_unauthenticated());
        assert_eq!(config.credentials.account_id(), "");
    }
}
