use std::collections::HashMap;

use serde_json::Value;

/// Transport-neutral view of an incoming request.
///
/// Header names are stored lowercased so lookups are case-insensitive.
#[derive(Clone, Debug, Default)]
pub struct GateRequest {
    headers: HashMap<String, String>,
    body: Option<Value>,
    body_malformed: bool,
}

impl GateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn set_body(&mut self, body: Option<Value>) {
        self.body = body;
        self.body_malformed = false;
    }

    /// Record that the transport carried a body that is not JSON.
    ///
    /// Such a request cannot be checked against ticket constraints.
    pub fn mark_body_malformed(&mut self) {
        self.body = None;
        self.body_malformed = true;
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn body_is_malformed(&self) -> bool {
        self.body_malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive() {
        let request = GateRequest::new().with_header("X-ASOC-Proof", "token");
        assert_eq!(request.header("x-asoc-proof"), Some("token"));
        assert_eq!(request.header("X-Asoc-Proof"), Some("token"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn body_roundtrip() {
        let request = GateRequest::new().with_body(serde_json::json!({"amount": 1}));
        assert_eq!(request.body().unwrap()["amount"], 1);
        assert!(GateRequest::new().body().is_none());
    }

    #[test]
    fn malformed_body_replaces_parsed_body() {
        let mut request = GateRequest::new().with_body(serde_json::json!({"amount": 1}));
        request.mark_body_malformed();
        assert!(request.body().is_none());
        assert!(request.body_is_malformed());

        request.set_body(Some(serde_json::json!({})));
        assert!(!request.body_is_malformed());
    }
}
