use crate::config::AppConfig;
use crate::core::comparison::{ComparisonSettings, PriceComparisonEngine};
use crate::core::signer::DigestSigner;
use crate::core::tracking::TrackingService;
use crate::core::transport::HttpTransport;
use crate::domain::model::{ComparisonResult, PriceRequest, TrackingRequest, TrackingResult};
use crate::domain::ports::{RequestSigner, Transport};
use crate::utils::error::Result;
use std::sync::Arc;

/// Courier data provider client: tracking plus multi-carrier price comparison.
pub struct ExpressClient<T: Transport, G: RequestSigner> {
    tracking: TrackingService<T, G>,
    comparison: PriceComparisonEngine<T, G>,
}

impl ExpressClient<HttpTransport, DigestSigner> {
    /// 依啟動配置建立 HTTP 客戶端
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = &config.provider;
        let transport = HttpTransport::new(provider.endpoints(), provider.request_timeout())?;
        let signer = DigestSigner::new(
            Arc::new(config.credentials.clone()),
            provider.provider.signature,
        );

        Ok(Self::new(
            transport,
            signer,
            provider.comparison_settings(),
        ))
    }
}

impl<T: Transport, G: RequestSigner> ExpressClient<T, G> {
    pub fn new(transport: T, signer: G, settings: ComparisonSettings) -> Self {
        let transport = Arc::new(transport);
        let signer = Arc::new(signer);
        Self {
            tracking: TrackingService::new(transport.clone(), signer.clone()),
            comparison: PriceComparisonEngine::new(transport, signer, settings),
        }
    }

    pub async fn query(&self, carrier: &str, tracking_number: &str) -> Result<TrackingResult> {
        self.tracking.query(carrier, tracking_number).await
    }

    pub async fn query_with(&self, request: &TrackingRequest) -> Result<TrackingResult> {
        self.tracking.query_with(request).await
    }

    /// Validates the inputs, then compares prices across every configured carrier.
    pub async fn compare_price(
        &self,
        weight: Option<f64>,
        length: Option<f64>,
        width: Option<f64>,
        height: Option<f64>,
        origin: &str,
        destination: &str,
    ) -> Result<ComparisonResult> {
        let request = PriceRequest::new(weight, length, width, height, origin, destination)?;
        self.comparison.compare_price(&request).await
    }

    pub fn carriers(&self) -> &[String] {
        &self.comparison.settings().carriers
    }
}
