//! Dispatch endpoint: `POST {prefix}/__action/{key}`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tiny_http::Method;

use super::error::DispatchError;
use crate::app::{App, Context};
use crate::bind::BodyItem;
use crate::serve::{HttpRequest, HttpResponse};
use crate::session::SessionId;
use crate::target::{SwapMode, Target, is_dom_safe};

/// Run the action `key` for `session` and render the response.
///
/// Failures become error fragments with their status; a panicking handler
/// is logged and answered with a 500, the server keeps going.
pub fn dispatch(app: &App, request: &HttpRequest, key: &str, session: SessionId) -> HttpResponse {
    let target = swap_target(request);
    let swap = target.as_ref().map_or("none", |t| t.mode().as_str());
    match run(app, request, key, session, target.clone()) {
        Ok(html) => {
            let mut response = HttpResponse::html(200, html).with_header("X-Swap", swap);
            if let Some(target) = &target {
                response = response.with_header("X-Target", target.id());
            }
            response
        }
        Err(err) => {
            match &err {
                DispatchError::HandlerFault => {}
                DispatchError::RegistryMiss(_) => crate::debug!("action"; "{}", err),
                _ => crate::log!("action"; "{}: {}", key, err),
            }
            let mut response = HttpResponse::html(err.status(), err.fragment());
            if matches!(err, DispatchError::MethodNotAllowed) {
                response = response.with_header("Allow", "POST");
            }
            response
        }
    }
}

fn run(
    app: &App,
    request: &HttpRequest,
    key: &str,
    session: SessionId,
    target: Option<Target>,
) -> Result<String, DispatchError> {
    if request.method != Method::Post {
        return Err(DispatchError::MethodNotAllowed);
    }

    let limit = app.body_limit();
    if request.body.len() > limit {
        return Err(DispatchError::BodyTooLarge { limit });
    }

    let entry = app
        .registry()
        .resolve(key)
        .ok_or_else(|| DispatchError::RegistryMiss(key.to_string()))?;

    let items = parse_items(&request.body)?;
    let mut ctx = Context::new(app, session, items, target);

    panic::catch_unwind(AssertUnwindSafe(|| entry.invoke(&mut ctx))).map_err(|payload| {
        crate::log!("action"; "handler `{}` panicked: {}", key, panic_message(payload.as_ref()));
        DispatchError::HandlerFault
    })
}

/// An empty body means no items.
fn parse_items(body: &[u8]) -> Result<Vec<BodyItem>, DispatchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Target the client will swap the response into, if any.
///
/// Only well-formed ids count; an unknown mode falls back to the default.
fn swap_target(request: &HttpRequest) -> Option<Target> {
    let swap = request.query_param("swap");
    if swap.as_deref() == Some("none") {
        return None;
    }
    let id = request.query_param("target").filter(|id| is_dom_safe(id))?;
    let mode = swap.and_then(|s| s.parse::<SwapMode>().ok()).unwrap_or_default();
    Some(Target::with_id(id).with_mode(mode))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
