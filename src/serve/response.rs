//! `tiny_http` adapter.

use std::io::Read;

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use super::http::{HttpRequest, HttpResponse};

/// Read `request` into an [`HttpRequest`].
///
/// At most `body_limit + 1` bytes are read, so an oversized body is
/// detectable without buffering all of it.
pub fn read_request(request: &mut Request, body_limit: usize) -> Result<HttpRequest> {
    let mut req = HttpRequest::new(request.method().clone(), request.url());
    req.headers = request
        .headers()
        .iter()
        .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
        .collect();

    let limit = u64::try_from(body_limit).unwrap_or(u64::MAX).saturating_add(1);
    request.as_reader().take(limit).read_to_end(&mut req.body)?;
    Ok(req)
}

/// Send `response`; HEAD requests get the headers only.
pub fn respond(request: Request, response: HttpResponse, head: bool) -> Result<()> {
    let mut headers = vec![make_header("Content-Type", response.content_type)?];
    for (name, value) in &response.headers {
        headers.push(make_header(name, value)?);
    }

    let status = StatusCode(response.status);
    let body = if head { Vec::new() } else { response.body };
    let mut reply = Response::from_data(body).with_status_code(status);
    for header in headers {
        reply.add_header(header);
    }

    request.respond(reply)?;
    Ok(())
}

fn make_header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow::anyhow!("invalid header {}: {:?}", name, value))
}
