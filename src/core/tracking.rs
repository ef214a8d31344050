use crate::domain::model::{Operation, TrackingRequest, TrackingResult};
use crate::domain::ports::{RequestSigner, Transport};
use crate::utils::error::Result;
use std::sync::Arc;

/// Single-carrier tracking lookups.
pub struct TrackingService<T: Transport, G: RequestSigner> {
    transport: Arc<T>,
    signer: Arc<G>,
}

impl<T: Transport, G: RequestSigner> TrackingService<T, G> {
    pub fn new(transport: Arc<T>, signer: Arc<G>) -> Self {
        Self { transport, signer }
    }

    /// 以預設選項查詢，參數驗證在任何網路呼叫之前完成
    pub async fn query(&self, carrier: &str, tracking_number: &str) -> Result<TrackingResult> {
        let request = TrackingRequest::new(carrier, tracking_number)?;
        self.query_with(&request).await
    }

    pub async fn query_with(&self, request: &TrackingRequest) -> Result<TrackingResult> {
        tracing::info!(
            "📦 Querying tracking number {} via {}",
            request.tracking_number(),
            request.carrier()
        );

        let signed = self.signer.sign(Operation::Tracking, &request.to_params())?;
        let payload = self.transport.send(&signed).await.map_err(|e| {
            tracing::warn!("❌ Tracking query for {} failed: {}", request.carrier(), e);
            e
        })?;

        Ok(TrackingResult(payload))
    }
}
