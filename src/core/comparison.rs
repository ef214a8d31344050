use crate::domain::model::{CarrierQuote, ComparisonResult, Operation, PriceRequest};
use crate::core::transport::duration_ms;
use crate::domain::ports::{RequestSigner, Transport};
use crate::utils::error::{CarrierFailure, ExpressError, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSettings {
    /// Candidate carriers in enumeration order.
    pub carriers: Vec<String>,
    pub per_carrier_timeout: Duration,
    pub default_currency: String,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            carriers: ["shunfeng", "zhongtong", "yuantong", "yunda", "jtexpress", "ems"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            per_carrier_timeout: Duration::from_millis(5000),
            default_currency: "CNY".to_string(),
        }
    }
}

/// Fans a price request out to every configured carrier and ranks the quotes.
pub struct PriceComparisonEngine<T: Transport, G: RequestSigner> {
    transport: Arc<T>,
    signer: Arc<G>,
    settings: ComparisonSettings,
}

impl<T: Transport, G: RequestSigner> PriceComparisonEngine<T, G> {
    pub fn new(transport: Arc<T>, signer: Arc<G>, settings: ComparisonSettings) -> Self {
        Self {
            transport,
            signer,
            settings,
        }
    }

    pub fn settings(&self) -> &ComparisonSettings {
        &self.settings
    }

    /// 同時向所有承運商詢價；單一承運商失敗只影響自己的報價。
    ///
    /// Fails only when no carrier is configured or when every carrier fails.
    pub async fn compare_price(&self, request: &PriceRequest) -> Result<ComparisonResult> {
        if self.settings.carriers.is_empty() {
            return Err(ExpressError::config("no carriers configured for price comparison"));
        }

        tracing::info!(
            "💰 Comparing prices {} -> {} ({}kg) across {} carriers",
            request.origin(),
            request.destination(),
            request.weight(),
            self.settings.carriers.len()
        );

        let calls = self
            .settings
            .carriers
            .iter()
            .map(|carrier| self.quote_carrier(carrier, request));
        let quotes = join_all(calls).await;

        let ranked = rank_quotes(quotes);
        let succeeded = ranked.iter().filter(|q| q.is_success()).count();
        tracing::info!(
            "💰 Price comparison finished: {} succeeded, {} failed",
            succeeded,
            ranked.len() - succeeded
        );

        if succeeded == 0 {
            let failures = ranked
                .iter()
                .filter_map(|q| {
                    q.error.map(|kind| CarrierFailure {
                        carrier: q.carrier_id.clone(),
                        kind,
                        detail: q.detail.clone().unwrap_or_default(),
                    })
                })
                .collect();
            return Err(ExpressError::AllCarriersFailed { failures });
        }

        Ok(ComparisonResult::new(ranked))
    }

    async fn quote_carrier(&self, carrier: &str, request: &PriceRequest) -> CarrierQuote {
        let deadline = self.settings.per_carrier_timeout;
        let outcome = match timeout(deadline, self.fetch_quote(carrier, request)).await {
            Ok(result) => result,
            Err(_) => Err(ExpressError::Timeout {
                timeout_ms: duration_ms(deadline),
            }),
        };

        match outcome {
            Ok(quote) => {
                tracing::debug!("✅ {} quoted {:?}", carrier, quote.price);
                quote
            }
            Err(e) => {
                tracing::warn!("❌ {} price lookup failed: {}", carrier, e);
                CarrierQuote::failure(carrier, self.settings.default_currency.as_str(), &e)
            }
        }
    }

    async fn fetch_quote(&self, carrier: &str, request: &PriceRequest) -> Result<CarrierQuote> {
        let signed = self
            .signer
            .sign(Operation::Pricing, &request.to_params(carrier))?;
        let body = self.transport.send(&signed).await?;
        extract_quote(carrier, &body, &self.settings.default_currency)
    }
}

/// 穩定排序：成功報價依價格遞增，失敗者依原順序附在最後
pub fn rank_quotes(quotes: Vec<CarrierQuote>) -> Vec<CarrierQuote> {
    let (mut successes, failures): (Vec<_>, Vec<_>) =
        quotes.into_iter().partition(|q| q.is_success());

    successes.sort_by(|a, b| {
        a.price
            .unwrap_or(f64::MAX)
            .total_cmp(&b.price.unwrap_or(f64::MAX))
    });
    successes.extend(failures);
    successes
}

/// Reads `data.price` (or a top-level `price`), accepting numbers or numeric strings.
pub fn extract_quote(
    carrier: &str,
    body: &serde_json::Value,
    default_currency: &str,
) -> Result<CarrierQuote> {
    let data = match body.get("data") {
        Some(serde_json::Value::Array(items)) => items.first().unwrap_or(body),
        Some(data @ serde_json::Value::Object(_)) => data,
        _ => body,
    };

    let price = numeric_field(data, "price")
        .or_else(|| numeric_field(body, "price"))
        .ok_or_else(|| {
            ExpressError::decode(format!("no price in response for carrier {}", carrier))
        })?;
    if price < 0.0 {
        return Err(ExpressError::decode(format!(
            "negative price {} for carrier {}",
            price, carrier
        )));
    }

    let currency = data
        .get("currency")
        .and_then(|v| v.as_str())
        .filter(|c| !c.is_empty())
        .unwrap_or(default_currency);

    Ok(CarrierQuote::success(
        carrier,
        price,
        currency,
        numeric_field(data, "estimatedDays"),
    ))
}

fn numeric_field(value: &serde_json::Value, field: &str) -> Option<f64> {
    let number = match value.get(field)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signer::{DigestSigner, SignatureAlgorithm};
    use crate::domain::model::{Credentials, SignedRequest};
    use crate::utils::error::ErrorKind;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Instant;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    enum Behavior {
        Price(f64),
        Fail(ExpressError),
        Hang,
        Slow(Duration, f64),
    }

    struct MockTransport {
        behaviors: HashMap<String, Behavior>,
        dispatched: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(behaviors: &[(&str, Behavior)]) -> Self {
            Self {
                behaviors: behaviors
                    .iter()
                    .map(|(c, b)| (c.to_string(), b.clone()))
                    .collect(),
                dispatched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: &SignedRequest) -> Result<serde_json::Value> {
            let carrier = request.params.get("kuaidicom").unwrap_or_default().to_string();
            self.dispatched.lock().await.push(carrier.clone());

            match self.behaviors.get(&carrier).cloned() {
                Some(Behavior::Price(price)) => Ok(serde_json::json!({
                    "result": true,
                    "returnCode": "200",
                    "data": {"price": price, "estimatedDays": 2}
                })),
                Some(Behavior::Fail(e)) => Err(e),
                Some(Behavior::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(serde_json::json!({}))
                }
                Some(Behavior::Slow(delay, price)) => {
                    tokio::time::sleep(delay).await;
                    Ok(serde_json::json!({"data": {"price": price}}))
                }
                None => Err(ExpressError::UpstreamRejected {
                    code: "404".to_string(),
                    message: "unknown carrier".to_string(),
                }),
            }
        }
    }

    fn engine(
        transport: Arc<MockTransport>,
        carriers: &[&str],
        per_carrier_timeout: Duration,
    ) -> PriceComparisonEngine<MockTransport, DigestSigner> {
        let signer = DigestSigner::new(
            Arc::new(Credentials::new("cust", "key")),
            SignatureAlgorithm::Md5,
        );
        PriceComparisonEngine::new(
            transport,
            Arc::new(signer),
            ComparisonSettings {
                carriers: carriers.iter().map(|c| c.to_string()).collect(),
                per_carrier_timeout,
                default_currency: "CNY".to_string(),
            },
        )
    }

    fn beijing_to_shanghai(weight: f64) -> PriceRequest {
        PriceRequest::new(Some(weight), None, None, None, "Beijing", "Shanghai").unwrap()
    }

    fn carrier_ids(result: &ComparisonResult) -> Vec<&str> {
        result.quotes().iter().map(|q| q.carrier_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_timeout_on_one_carrier_keeps_the_others() {
        let transport = Arc::new(MockTransport::new(&[
            ("a", Behavior::Price(18.0)),
            ("b", Behavior::Hang),
            ("c", Behavior::Price(12.0)),
        ]));
        let engine = engine(transport, &["a", "b", "c"], Duration::from_millis(100));

        let result = engine.compare_price(&beijing_to_shanghai(2.0)).await.unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(carrier_ids(&result), vec!["c", "a", "b"]);
        assert_eq!(result.quotes()[0].price, Some(12.0));
        assert_eq!(result.quotes()[1].price, Some(18.0));
        assert_eq!(result.quotes()[2].error, Some(ErrorKind::Timeout));
        assert_eq!(result.successes().count(), 2);
        assert_eq!(result.failures().count(), 1);
        assert_eq!(result.cheapest().map(|q| q.carrier_id.as_str()), Some("c"));
    }

    #[tokio::test]
    async fn test_failures_follow_successes_in_enumeration_order() {
        let transport = Arc::new(MockTransport::new(&[
            ("a", Behavior::Fail(ExpressError::TransportFailure {
                message: "connection reset".to_string(),
            })),
            ("b", Behavior::Price(20.0)),
            ("c", Behavior::Fail(ExpressError::decode("garbage"))),
            ("d", Behavior::Price(20.0)),
            ("e", Behavior::Price(8.5)),
        ]));
        let engine = engine(transport.clone(), &["a", "b", "c", "d", "e"], Duration::from_secs(1));

        let result = engine.compare_price(&beijing_to_shanghai(1.0)).await.unwrap();

        // equal prices keep enumeration order (b before d)
        assert_eq!(carrier_ids(&result), vec!["e", "b", "d", "a", "c"]);
        assert_eq!(result.quotes()[3].error, Some(ErrorKind::TransportFailure));
        assert_eq!(result.quotes()[4].error, Some(ErrorKind::DecodeFailure));
        assert!(result.quotes()[3]
            .detail
            .as_deref()
            .is_some_and(|d| d.contains("connection reset")));

        let mut dispatched = transport.dispatched.lock().await.clone();
        dispatched.sort();
        assert_eq!(dispatched, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_all_carriers_failing_is_terminal() {
        let transport = Arc::new(MockTransport::new(&[
            ("a", Behavior::Fail(ExpressError::UpstreamRejected {
                code: "601".to_string(),
                message: "key expired".to_string(),
            })),
            ("b", Behavior::Hang),
        ]));
        let engine = engine(transport, &["a", "b"], Duration::from_millis(50));

        let err = engine.compare_price(&beijing_to_shanghai(1.0)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AllCarriersFailed);
        match err {
            ExpressError::AllCarriersFailed { failures } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].carrier, "a");
                assert_eq!(failures[0].kind, ErrorKind::UpstreamRejected);
                assert_eq!(failures[1].kind, ErrorKind::Timeout);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_carriers_are_queried_concurrently() {
        let transport = Arc::new(MockTransport::new(&[
            ("a", Behavior::Slow(Duration::from_millis(200), 3.0)),
            ("b", Behavior::Slow(Duration::from_millis(200), 2.0)),
            ("c", Behavior::Slow(Duration::from_millis(200), 1.0)),
        ]));
        let engine = engine(transport, &["a", "b", "c"], Duration::from_secs(2));

        let started = Instant::now();
        let result = engine.compare_price(&beijing_to_shanghai(1.0)).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(550));
        assert_eq!(carrier_ids(&result), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_each_carrier_gets_its_own_signed_request() {
        let transport = Arc::new(MockTransport::new(&[("a", Behavior::Price(1.0))]));
        let engine = engine(transport.clone(), &["a"], Duration::from_secs(1));

        let request =
            PriceRequest::new(Some(3.0), Some(10.0), None, None, "Beijing", "Shanghai").unwrap();
        let result = engine.compare_price(&request).await.unwrap();

        assert_eq!(result.quotes()[0].currency, "CNY");
        assert_eq!(result.quotes()[0].estimated_days, Some(2.0));
        assert_eq!(transport.dispatched.lock().await.as_slice(), ["a"]);
    }

    #[tokio::test]
    async fn test_empty_carrier_list_is_config_error() {
        let transport = Arc::new(MockTransport::new(&[]));
        let engine = engine(transport, &[], Duration::from_secs(1));

        let err = engine.compare_price(&beijing_to_shanghai(1.0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_rank_quotes_is_stable() {
        let timeout = ExpressError::Timeout { timeout_ms: 10 };
        let ranked = rank_quotes(vec![
            CarrierQuote::failure("x", "CNY", &timeout),
            CarrierQuote::success("a", 5.0, "CNY", None),
            CarrierQuote::success("b", 3.0, "CNY", None),
            CarrierQuote::failure("y", "CNY", &timeout),
            CarrierQuote::success("c", 5.0, "CNY", None),
        ]);

        let ids: Vec<_> = ranked.iter().map(|q| q.carrier_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "x", "y"]);
    }

    #[test]
    fn test_extract_quote_shapes() {
        let quote = extract_quote(
            "shunfeng",
            &serde_json::json!({"data": {"price": "23.5", "currency": "HKD", "estimatedDays": "1"}}),
            "CNY",
        )
        .unwrap();
        assert_eq!(quote.price, Some(23.5));
        assert_eq!(quote.currency, "HKD");
        assert_eq!(quote.estimated_days, Some(1.0));

        let quote = extract_quote("ems", &serde_json::json!({"price": 9}), "CNY").unwrap();
        assert_eq!(quote.price, Some(9.0));
        assert_eq!(quote.currency, "CNY");

        let quote =
            extract_quote("yunda", &serde_json::json!({"data": [{"price": 7.2}]}), "CNY").unwrap();
        assert_eq!(quote.price, Some(7.2));

        let err = extract_quote("ems", &serde_json::json!({"data": {}}), "CNY").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        assert!(err.to_string().contains("ems"));
    }
}
