//! Embedded client resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `client` - Page shell (shell.html) and client runtime (live.js)
//!
//! `live.js` is minified at build time with `live.css` inlined into it.
//!
//! # Usage
//!
//! ```ignore
//! use embed::client::{LIVE_JS, SHELL_HTML, ShellVars};
//!
//! let page = SHELL_HTML.render(&ShellVars { title: "Demo", body: &html, .. });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod client {
    use super::{Template, TemplateVars};
    use crate::utils::html::escape;

    /// Variables for shell.html.
    pub struct ShellVars<'a> {
        pub title: &'a str,
        /// Mount prefix without trailing slash ("" for root).
        pub prefix: &'a str,
        pub session: &'a str,
        pub ws_port: u16,
        pub root_id: &'a str,
        pub toasts_id: &'a str,
        /// Rendered page body (trusted HTML).
        pub body: &'a str,
    }

    impl TemplateVars for ShellVars<'_> {
        fn apply(&self, content: &str) -> String {
            // Body goes in last so placeholders inside page HTML stay untouched.
            content
                .replace("__TITLE__", &escape(self.title))
                .replace("__PREFIX__", &escape(self.prefix))
                .replace("__SESSION__", &escape(self.session))
                .replace("__WS_PORT__", &self.ws_port.to_string())
                .replace("__TOASTS_ID__", self.toasts_id)
                .replace("__ROOT_ID__", self.root_id)
                .replace("__BODY__", self.body)
        }
    }

    /// HTML document wrapping every rendered page.
    pub const SHELL_HTML: Template<ShellVars<'static>> =
        Template::new(include_str!("client/shell.html"));

    /// Client runtime served at `{prefix}/__live.js`.
    pub const LIVE_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/live.min.js"));
}
