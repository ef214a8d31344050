//! MCP server exposing `query_express` and `compare_price` over rmcp.

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::signer::DigestSigner;
use crate::core::transport::HttpTransport;
use crate::domain::model::{ComparisonResult, TrackingResult};
use crate::utils::error::{ErrorKind, Result as ExpressResult};
use crate::ExpressClient;

// ============================================================================
// Request Types
// ============================================================================

/// Parameters for the query_express tool
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QueryExpressParams {
    /// Courier company name or code
    #[schemars(description = "Courier company name or code, e.g. shunfeng")]
    pub com: String,
    /// Tracking number
    #[schemars(description = "Tracking number")]
    pub num: String,
}

/// Parameters for the compare_price tool
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ComparePriceParams {
    #[serde(default, deserialize_with = "lenient_number")]
    #[schemars(description = "Parcel weight in kg (defaults to 1)")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[schemars(description = "Parcel length in cm")]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[schemars(description = "Parcel width in cm")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[schemars(description = "Parcel height in cm")]
    pub height: Option<f64>,
    #[schemars(description = "Origin address")]
    pub from: String,
    #[schemars(description = "Destination address")]
    pub to: String,
}

/// 數字或數字字串照用，其他值視為未提供，交由 PriceRequest 套用預設
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

pub fn render_tracking(result: &TrackingResult) -> ExpressResult<String> {
    Ok(format!(
        "Express tracking result: {}",
        serde_json::to_string(result)?
    ))
}

pub fn render_comparison(result: &ComparisonResult) -> ExpressResult<String> {
    Ok(format!(
        "Express price comparison:\n{}",
        serde_json::to_string_pretty(result)?
    ))
}

/// 參數錯誤回報為協議錯誤，其餘失敗回報為工具錯誤結果
fn into_tool_result(result: ExpressResult<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) if e.kind() == ErrorKind::InvalidArgument => {
            Err(McpError::invalid_params(e.user_friendly_message(), None))
        }
        Err(e) => Ok(CallToolResult::error(vec![Content::text(
            e.user_friendly_message(),
        )])),
    }
}

// ============================================================================
// MCP Service
// ============================================================================

/// Express MCP Service
#[derive(Clone)]
pub struct ExpressService {
    client: Arc<ExpressClient<HttpTransport, DigestSigner>>,
    tool_router: ToolRouter<Self>,
}

impl ExpressService {
    pub fn new(client: ExpressClient<HttpTransport, DigestSigner>) -> Self {
        Self {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    pub async fn handle_query_express(&self, params: QueryExpressParams) -> ExpressResult<String> {
        let result = self.client.query(&params.com, &params.num).await?;
        render_tracking(&result)
    }

    pub async fn handle_compare_price(&self, params: ComparePriceParams) -> ExpressResult<String> {
        let result = self
            .client
            .compare_price(
                params.weight,
                params.length,
                params.width,
                params.height,
                &params.from,
                &params.to,
            )
            .await?;
        render_comparison(&result)
    }
}

#[tool_router]
impl ExpressService {
    /// Real-time tracking for a single parcel
    #[tool(description = "Query real-time logistics information for a parcel")]
    async fn query_express(
        &self,
        Parameters(params): Parameters<QueryExpressParams>,
    ) -> Result<CallToolResult, McpError> {
        into_tool_result(self.handle_query_express(params).await)
    }

    /// Price comparison across the configured carriers
    #[tool(description = "Compare shipping prices across multiple courier companies")]
    async fn compare_price(
        &self,
        Parameters(params): Parameters<ComparePriceParams>,
    ) -> Result<CallToolResult, McpError> {
        into_tool_result(self.handle_compare_price(params).await)
    }
}

#[tool_handler]
impl ServerHandler for ExpressService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-server-express".to_string(),
                title: Some("Express".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Express MCP Server - track parcels and compare shipping prices".to_string(),
            ),
        }
    }
}
