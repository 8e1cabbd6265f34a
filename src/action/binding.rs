//! Client-side bindings of registered actions.

use std::fmt;

use crate::bind::BodyItem;
use crate::target::Target;
use crate::utils::html::js_call;

use super::key::ActionKey;

/// DOM event an [`Action`] renders for by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Click,
    Submit,
}

/// A registered action as the page sees it: endpoint, swap directive and the
/// state snapshot carried to the client and posted back.
///
/// `Display` renders the event attribute, so it drops straight into markup:
///
/// ```ignore
/// format!("<button {}>+</button>", ctx.call(&state, increment).swap(&panel))
/// ```
#[derive(Debug, Clone)]
pub struct Action {
    endpoint: String,
    target: Option<Target>,
    values: Vec<BodyItem>,
    trigger: Trigger,
}

impl Action {
    pub(crate) fn new(
        prefix: &str,
        key: &ActionKey,
        target: Target,
        values: Vec<BodyItem>,
        trigger: Trigger,
    ) -> Self {
        Self {
            endpoint: format!("{prefix}/__action/{key}"),
            target: Some(target),
            values,
            trigger,
        }
    }

    /// Swap the response into `target` with its mode.
    pub fn swap(mut self, target: &Target) -> Self {
        self.target = Some(target.clone());
        self
    }

    /// Fire and forget: the response is discarded.
    pub fn none(mut self) -> Self {
        self.target = None;
        self
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn values(&self) -> &[BodyItem] {
        &self.values
    }

    /// Endpoint URL with the swap directive in the query.
    pub fn url(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(target) = &self.target {
            query.append_pair("target", target.id());
        }
        query.append_pair("swap", self.swap_name());
        format!("{}?{}", self.endpoint, query.finish())
    }

    fn swap_name(&self) -> &'static str {
        self.target.as_ref().map_or("none", |t| t.mode().as_str())
    }

    fn script(&self, function: &str) -> String {
        js_call(
            function,
            &[
                &self.url(),
                &self.target.as_ref().map(Target::id),
                &self.swap_name(),
                &self.values,
            ],
        )
    }

    /// Attribute-escaped JS expression for this action's trigger.
    pub fn js(&self) -> String {
        match self.trigger {
            Trigger::Click => self.script("__pw.call"),
            Trigger::Submit => self.script("__pw.submit"),
        }
    }

    pub fn on_click(&self) -> String {
        format!(r#"onclick="{}""#, self.script("__pw.call"))
    }

    /// Posts the enclosing form's fields merged over the carried state.
    pub fn on_submit(&self) -> String {
        format!(r#"onsubmit="{}""#, self.script("__pw.submit"))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trigger {
            Trigger::Click => f.write_str(&self.on_click()),
            Trigger::Submit => f.write_str(&self.on_submit()),
        }
    }
}
