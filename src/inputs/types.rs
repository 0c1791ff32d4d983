use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Source category a raw request value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
            Location::Body => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw value looked up from [`RawInputs`].
///
/// Path, query, header and cookie values arrive as text; body fields are
/// already-decoded JSON.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Text(&'a str),
    Json(&'a Value),
}

/// Normalized per-request input values, keyed by category then name.
///
/// This is the sole surface through which the resolver touches request
/// data; the transport layer is responsible for filling it. Header names
/// are normalized to lowercase on insert and lookup.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    path: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Option<Value>,
}

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Merges every pair from an already-encoded query string.
    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query.extend(super::parser::parse_query_string(query));
        self
    }

    /// Merges every pair from a `Cookie` request header value.
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        self.cookies
            .extend(super::parser::parse_cookie_header(header));
        self
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Looks up the named value within one source category.
    pub fn get(&self, location: Location, name: &str) -> Option<RawValue<'_>> {
        match location {
            Location::Path => self.path.get(name).map(|v| RawValue::Text(v)),
            Location::Query => self.query.get(name).map(|v| RawValue::Text(v)),
            Location::Header => self
                .headers
                .get(&name.to_lowercase())
                .map(|v| RawValue::Text(v)),
            Location::Cookie => self.cookies.get(name).map(|v| RawValue::Text(v)),
            Location::Body => self.body.as_ref().and_then(|b| b.get(name)).map(RawValue::Json),
        }
    }

    pub fn contains(&self, location: Location, name: &str) -> bool {
        self.get(location, name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_by_category() {
        let inputs = RawInputs::new()
            .with_path("item_id", "42")
            .with_query("q", "rust")
            .with_cookie("session", "abc");

        assert_eq!(
            inputs.get(Location::Path, "item_id"),
            Some(RawValue::Text("42"))
        );
        assert_eq!(inputs.get(Location::Query, "q"), Some(RawValue::Text("rust")));
        assert_eq!(
            inputs.get(Location::Cookie, "session"),
            Some(RawValue::Text("abc"))
        );
        assert_eq!(inputs.get(Location::Query, "missing"), None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let inputs = RawInputs::new().with_header("X-Token", "secret");
        assert_eq!(
            inputs.get(Location::Header, "x-token"),
            Some(RawValue::Text("secret"))
        );
        assert_eq!(
            inputs.get(Location::Header, "X-TOKEN"),
            Some(RawValue::Text("secret"))
        );
    }

    #[test]
    fn test_body_field_lookup() {
        let body = json!({"name": "widget", "price": 9.5});
        let inputs = RawInputs::new().with_body(body.clone());

        assert_eq!(
            inputs.get(Location::Body, "name"),
            Some(RawValue::Json(&body["name"]))
        );
        assert_eq!(inputs.get(Location::Body, "absent"), None);
    }

    #[test]
    fn test_body_lookup_without_body() {
        let inputs = RawInputs::new();
        assert_eq!(inputs.get(Location::Body, "name"), None);
    }

    #[test]
    fn test_query_string_merge() {
        let inputs = RawInputs::new().with_query_string("skip=5&limit=10");
        assert_eq!(inputs.get(Location::Query, "skip"), Some(RawValue::Text("5")));
        assert_eq!(
            inputs.get(Location::Query, "limit"),
            Some(RawValue::Text("10"))
        );
    }
}
