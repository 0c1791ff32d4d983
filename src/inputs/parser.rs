use std::collections::HashMap;

use serde_json::Value;

use crate::binding::{ErrorKind, FieldError, ValidationReport};

/// Parses an already-encoded query string into name/value pairs.
///
/// Pairs without an `=` and pairs that fail percent-decoding are skipped.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => Some((
                    urlencoding::decode(key).ok()?.into_owned(),
                    urlencoding::decode(value).ok()?.into_owned(),
                )),
                _ => None,
            }
        })
        .collect()
}

/// Parses a `Cookie` request header value into name/value pairs.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Parses JSON body bytes into a value for [`RawInputs`](super::RawInputs).
///
/// A malformed body is reported as a single validation error located at
/// the body category, matching how field-level failures are surfaced.
pub fn parse_json_body(data: &[u8]) -> Result<Value, ValidationReport> {
    serde_json::from_slice(data).map_err(|e| {
        let mut report = ValidationReport::new();
        report.push(FieldError::new(
            vec!["body".to_string()],
            ErrorKind::JsonInvalid,
            format!("invalid JSON body: {}", e),
        ));
        report
    })
}
