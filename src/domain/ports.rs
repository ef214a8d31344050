use crate::domain::model::{Operation, RequestParams, SignedRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Produces the authentication artifact the provider requires.
///
/// Must be deterministic and must not modify `params`.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, operation: Operation, params: &RequestParams) -> Result<SignedRequest>;
}

/// One outbound call per invocation, no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &SignedRequest) -> Result<serde_json::Value>;
}
