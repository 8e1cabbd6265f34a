//! Transport-neutral request/response values.
//!
//! Apps and the dispatch endpoint work on these, so they can be exercised
//! without a socket. `response.rs` converts to and from `tiny_http`.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use tiny_http::Method;

use crate::utils::mime::types::{HTML, JAVASCRIPT, PLAIN};

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Percent-decoded path, without query.
    pub path: String,
    /// Raw query string, without `?`.
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Build from a method and a raw request URL (`/path?query`).
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let path = percent_decode_str(path).decode_utf8_lossy().into_owned();
        Self {
            method,
            path,
            query: query.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        crate::session::read_cookie(self.header("Cookie")?, name)
    }

    pub fn query_pairs(&self) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
        url::form_urlencoded::parse(self.query.as_bytes())
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn is_read(&self) -> bool {
        matches!(self.method, Method::Get | Method::Head)
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn html(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, HTML, body)
    }

    pub fn javascript(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, JAVASCRIPT, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, PLAIN, "404 Not Found")
    }

    pub fn method_not_allowed(allow: &str) -> Self {
        Self::new(405, PLAIN, "405 Method Not Allowed").with_header("Allow", allow)
    }

    pub fn unavailable() -> Self {
        Self::new(503, PLAIN, "503 Service Unavailable")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parts() {
        let req = HttpRequest::new(Method::Post, "/second/__action/a%2Db?target=t1&swap=outline")
            .with_header("cookie", "x=1; pw_sid_demo=s9");

        assert_eq!(req.path, "/second/__action/a-b");
        assert_eq!(req.query_param("target").as_deref(), Some("t1"));
        assert_eq!(req.query_param("swap").as_deref(), Some("outline"));
        assert_eq!(req.query_param("missing"), None);
        assert_eq!(req.cookie("pw_sid_demo"), Some("s9"));
        assert!(!req.is_read());
    }

    #[test]
    fn test_response_helpers() {
        let resp = HttpResponse::method_not_allowed("POST");
        assert_eq!(resp.status, 405);
        assert_eq!(resp.header("allow"), Some("POST"));
        assert_eq!(HttpResponse::html(200, "<p>x</p>").text(), "<p>x</p>");
    }
}
