use crate::domain::model::{Credentials, Operation, RequestParams, SignedRequest};
use crate::domain::ports::RequestSigner;
use crate::utils::error::Result;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Md5,
    Sha256,
}

/// 簽名 = 大寫十六進位摘要(param + key + customer)
#[derive(Debug, Clone)]
pub struct DigestSigner {
    credentials: Arc<Credentials>,
    algorithm: SignatureAlgorithm,
}

impl DigestSigner {
    pub fn new(credentials: Arc<Credentials>, algorithm: SignatureAlgorithm) -> Self {
        Self {
            credentials,
            algorithm,
        }
    }

    fn digest(&self, payload: &str) -> String {
        let key = self.credentials.auth_key();
        let customer = self.credentials.account_id();
        let bytes = match self.algorithm {
            SignatureAlgorithm::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(payload.as_bytes());
                hasher.update(key.as_bytes());
                hasher.update(customer.as_bytes());
                hasher.finalize().to_vec()
            }
            SignatureAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(payload.as_bytes());
                hasher.update(key.as_bytes());
                hasher.update(customer.as_bytes());
                hasher.finalize().to_vec()
            }
        };
        hex::encode_upper(bytes)
    }
}

impl RequestSigner for DigestSigner {
    fn sign(&self, operation: Operation, params: &RequestParams) -> Result<SignedRequest> {
        let payload = params.canonical_json()?;
        let sign = self.digest(&payload);

        tracing::debug!("Signed {} request with {} fields", operation, params.len());

        Ok(SignedRequest {
            operation,
            params: params.clone(),
            customer: self.credentials.account_id().to_string(),
            sign,
            payload,
        })
    }
}
