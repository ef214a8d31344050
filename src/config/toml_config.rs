use crate::core::comparison::ComparisonSettings;
use crate::core::signer::SignatureAlgorithm;
use crate::core::transport::{duration_ms, Endpoints};
use crate::utils::error::{ExpressError, Result};
use crate::utils::validation::{
    validate_carrier_list, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 上游服務與比價設定，全部欄位皆有預設值
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider: UpstreamConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_tracking_url")]
    pub tracking_url: String,
    #[serde(default = "default_pricing_url")]
    pub pricing_url: String,
    #[serde(default)]
    pub signature: SignatureAlgorithm,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            tracking_url: default_tracking_url(),
            pricing_url: default_pricing_url(),
            signature: SignatureAlgorithm::default(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "default_carriers")]
    pub carriers: Vec<String>,
    #[serde(default = "default_per_carrier_timeout_ms")]
    pub per_carrier_timeout_ms: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            carriers: default_carriers(),
            per_carrier_timeout_ms: default_per_carrier_timeout_ms(),
            currency: default_currency(),
        }
    }
}

fn default_tracking_url() -> String {
    "https://poll.kuaidi100.com/poll/query.do".to_string()
}

fn default_pricing_url() -> String {
    "https://poll.kuaidi100.com/order/borderapi.do?method=price".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_carriers() -> Vec<String> {
    ComparisonSettings::default().carriers
}

fn default_per_carrier_timeout_ms() -> u64 {
    duration_ms(ComparisonSettings::default().per_carrier_timeout)
}

fn default_currency() -> String {
    ComparisonSettings::default().default_currency
}

impl ProviderConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExpressError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| ExpressError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${KUAIDI_ENDPOINT})，未定義者保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ExpressError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            tracking: self.provider.tracking_url.clone(),
            pricing: self.provider.pricing_url.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.request_timeout_seconds)
    }

    pub fn comparison_settings(&self) -> ComparisonSettings {
        ComparisonSettings {
            carriers: self.comparison.carriers.clone(),
            per_carrier_timeout: Duration::from_millis(self.comparison.per_carrier_timeout_ms),
            default_currency: self.comparison.currency.clone(),
        }
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<()> {
        validate_url("provider.tracking_url", &self.provider.tracking_url)?;
        validate_url("provider.pricing_url", &self.provider.pricing_url)?;
        validate_positive_number(
            "provider.request_timeout_seconds",
            self.provider.request_timeout_seconds,
            1,
        )?;
        validate_carrier_list("comparison.carriers", &self.comparison.carriers)?;
        validate_positive_number(
            "comparison.per_carrier_timeout_ms",
            self.comparison.per_carrier_timeout_ms,
            1,
        )?;
        if self.comparison.currency.trim().is_empty() {
            return Err(ExpressError::config("comparison.currency cannot be empty"));
        }
        Ok(())
    }
}
