//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and parses `HttpResponse` values; the host (the `app` crate, or a
//! test) performs the network round-trip and owns cancellation and timeouts.
//!
//! All fields use owned types so values can move into spawned tasks freely.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is absolute (base URL already applied). Query parameters are kept
/// apart so the host can hand them to its HTTP library, or call `url()` for
/// the fully assembled string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub(crate) fn new(method: HttpMethod, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    pub(crate) fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn with_json_body(mut self, body: String) -> Self {
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self.body = Some(body);
        self
    }

    /// Path plus query string. Query values produced by the client are
    /// numeric, so no percent-encoding is applied.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_query_is_path() {
        let req = HttpRequest::new(HttpMethod::Get, "http://h/students/1".to_string());
        assert_eq!(req.url(), "http://h/students/1");
    }

    #[test]
    fn url_joins_query_in_insertion_order() {
        let req = HttpRequest::new(HttpMethod::Get, "http://h/students".to_string())
            .with_query("_page", 2)
            .with_query("_limit", 10);
        assert_eq!(req.url(), "http://h/students?_page=2&_limit=10");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = HttpResponse {
            status: 200,
            headers: vec![("X-Total-Count".to_string(), "25".to_string())],
            body: String::new(),
        };
        assert_eq!(resp.header("x-total-count"), Some("25"));
        assert_eq!(resp.header("etag"), None);
    }
}
