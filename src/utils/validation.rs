use crate::utils::error::{ExpressError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ExpressError::config(format!("{}: URL cannot be empty", field_name)));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ExpressError::config(format!(
                "{}: unsupported URL scheme: {}",
                field_name, scheme
            ))),
        },
        Err(e) => Err(ExpressError::config(format!(
            "{}: invalid URL format: {}",
            field_name, e
        ))),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(ExpressError::config(format!(
            "{}: value {} must be at least {}",
            field_name, value, min_value
        )));
    }
    Ok(())
}

/// 承運商清單不可為空，也不可重複
pub fn validate_carrier_list(field_name: &str, carriers: &[String]) -> Result<()> {
    if carriers.is_empty() {
        return Err(ExpressError::config(format!(
            "{}: at least one carrier is required",
            field_name
        )));
    }

    let mut seen = HashSet::new();
    for carrier in carriers {
        if carrier.trim().is_empty() {
            return Err(ExpressError::config(format!(
                "{}: carrier codes cannot be empty",
                field_name
            )));
        }
        if !seen.insert(carrier.as_str()) {
            return Err(ExpressError::config(format!(
                "{}: duplicate carrier `{}`",
                field_name, carrier
            )));
        }
    }
    Ok(())
}

/// Request-level check: the value must contain something other than whitespace.
pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ExpressError::invalid_argument(
            field_name,
            "value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}
