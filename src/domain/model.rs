use crate::utils::error::{ErrorKind, ExpressError, Result};
use crate::utils::validation::validate_non_empty_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 上游服務的身分資料，程序啟動時建立後不再變動
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account_id: String,
    auth_key: String,
}

impl Credentials {
    pub fn new(account_id: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            auth_key: auth_key.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn auth_key(&self) -> &str {
        &self.auth_key
    }

    /// Empty credentials are allowed; upstream decides whether to accept them.
    pub fn is_unauthenticated(&self) -> bool {
        self.account_id.is_empty() || self.auth_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &"<redacted>")
            .field("auth_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Tracking,
    Pricing,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tracking => write!(f, "tracking"),
            Self::Pricing => write!(f, "pricing"),
        }
    }
}

/// Ordered field name -> string value mapping sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    fields: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing the value in place if the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 以鍵排序的 JSON 物件，作為簽名的標準化內容
    pub fn canonical_json(&self) -> Result<String> {
        let sorted: BTreeMap<&str, &str> = self.iter().collect();
        Ok(serde_json::to_string(&sorted)?)
    }
}

/// Parameters plus the authentication fields the provider requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub operation: Operation,
    pub params: RequestParams,
    pub customer: String,
    pub sign: String,
    pub payload: String,
}

impl SignedRequest {
    /// Form body as posted to the provider.
    pub fn form_fields(&self) -> Vec<(&str, &str)> {
        vec![
            ("customer", self.customer.as_str()),
            ("sign", self.sign.as_str()),
            ("param", self.payload.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Raw,
    #[default]
    Json,
}

impl ResponseFormat {
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Json => "0",
            Self::Raw => "3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn wire_value(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// 單一承運商的物流追蹤請求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRequest {
    carrier: String,
    tracking_number: String,
    pub phone: String,
    pub origin: String,
    pub destination: String,
    pub extended_status: bool,
    pub response_format: ResponseFormat,
    pub order: SortOrder,
}

impl TrackingRequest {
    /// Validating factory; optional fields start at their defaults.
    pub fn new(carrier: impl Into<String>, tracking_number: impl Into<String>) -> Result<Self> {
        let carrier = carrier.into();
        let tracking_number = tracking_number.into();
        validate_non_empty_string("com", &carrier)?;
        validate_non_empty_string("num", &tracking_number)?;

        Ok(Self {
            carrier: carrier.trim().to_string(),
            tracking_number: tracking_number.trim().to_string(),
            phone: String::new(),
            origin: String::new(),
            destination: String::new(),
            extended_status: false,
            response_format: ResponseFormat::Json,
            order: SortOrder::Desc,
        })
    }

    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.destination = destination.into();
        self
    }

    pub fn with_extended_status(mut self, enabled: bool) -> Self {
        self.extended_status = enabled;
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn to_params(&self) -> RequestParams {
        RequestParams::new()
            .with("com", self.carrier.as_str())
            .with("num", self.tracking_number.as_str())
            .with("phone", self.phone.as_str())
            .with("from", self.origin.as_str())
            .with("to", self.destination.as_str())
            .with("resultv2", if self.extended_status { "1" } else { "0" })
            .with("show", self.response_format.wire_value())
            .with("order", self.order.wire_value())
    }
}

/// Decoded tracking payload, passed through without reshaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingResult(pub serde_json::Value);

impl TrackingResult {
    /// Tracking number echoed by the provider (`nu`), if present.
    pub fn tracking_number(&self) -> Option<&str> {
        self.0.get("nu").and_then(|v| v.as_str())
    }
}

/// 運費查詢請求，重量預設 1，尺寸可省略
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    weight: f64,
    length: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    origin: String,
    destination: String,
}

impl PriceRequest {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    pub fn new(
        weight: Option<f64>,
        length: Option<f64>,
        width: Option<f64>,
        height: Option<f64>,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Self> {
        let origin = origin.into();
        let destination = destination.into();
        validate_non_empty_string("from", &origin)?;
        validate_non_empty_string("to", &destination)?;

        let weight = weight
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(Self::DEFAULT_WEIGHT);

        Ok(Self {
            weight,
            length: dimension("length", length)?,
            width: dimension("width", width)?,
            height: dimension("height", height)?,
            origin: origin.trim().to_string(),
            destination: destination.trim().to_string(),
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn dimensions(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        (self.length, self.width, self.height)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// One pricing call's parameters for the given carrier.
    pub fn to_params(&self, carrier: &str) -> RequestParams {
        let mut params = RequestParams::new()
            .with("kuaidicom", carrier)
            .with("sendAddr", self.origin.as_str())
            .with("recAddr", self.destination.as_str())
            .with("weight", self.weight.to_string());

        for (name, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if let Some(value) = value {
                params.insert(name, value.to_string());
            }
        }
        params
    }
}

// 非有限值視為未提供，負值拒絕
fn dimension(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Ok(None),
        Some(v) if v < 0.0 => Err(ExpressError::invalid_argument(
            field,
            format!("must not be negative (got {})", v),
        )),
        other => Ok(other),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierQuote {
    pub carrier_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CarrierQuote {
    pub fn success(
        carrier_id: impl Into<String>,
        price: f64,
        currency: impl Into<String>,
        estimated_days: Option<f64>,
    ) -> Self {
        Self {
            carrier_id: carrier_id.into(),
            price: Some(price),
            currency: currency.into(),
            estimated_days,
            error: None,
            detail: None,
        }
    }

    pub fn failure(
        carrier_id: impl Into<String>,
        currency: impl Into<String>,
        error: &ExpressError,
    ) -> Self {
        Self {
            carrier_id: carrier_id.into(),
            price: None,
            currency: currency.into(),
            estimated_days: None,
            error: Some(error.kind()),
            detail: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.price.is_some() && self.error.is_none()
    }
}

/// Ranked quotes: successes by ascending price, then failures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonResult {
    quotes: Vec<CarrierQuote>,
}

impl ComparisonResult {
    pub fn new(quotes: Vec<CarrierQuote>) -> Self {
        Self { quotes }
    }

    pub fn quotes(&self) -> &[CarrierQuote] {
        &self.quotes
    }

    pub fn successes(&self) -> impl Iterator<Item = &CarrierQuote> {
        self.quotes.iter().filter(|q| q.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CarrierQuote> {
        self.quotes.iter().filter(|q| !q.is_success())
    }

    pub fn cheapest(&self) -> Option<&CarrierQuote> {
        self.quotes.first().filter(|q| q.is_success())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
