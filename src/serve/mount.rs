//! Path-prefix routing of mounted apps.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::app::App;
use crate::push::{HubRouter, PushHub};
use crate::session::is_token;

/// Why an app could not be mounted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("prefix `{0}` is already mounted")]
    DuplicatePrefix(String),

    #[error("an app named `{0}` is already mounted")]
    DuplicateName(String),

    #[error("invalid mount prefix `{0}`: expected `/` or `/segment[/segment...]`")]
    InvalidPrefix(String),

    #[error("invalid app name `{0}`: must be a non-empty cookie token")]
    InvalidName(String),

    #[error("app `{0}` is already mounted on a listener")]
    AlreadyMounted(String),
}

/// Normalize a mount prefix: `/` becomes `""`, trailing slashes go.
///
/// Segments may not start with `__`, which is reserved for the endpoints
/// every app serves (`__action`, `__live`).
pub fn normalize_prefix(raw: &str) -> Result<String, MountError> {
    let invalid = || MountError::InvalidPrefix(raw.to_string());
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        return if raw.starts_with('/') { Ok(String::new()) } else { Err(invalid()) };
    }

    let rest = trimmed.strip_prefix('/').ok_or_else(invalid)?;
    let valid = rest.split('/').all(|segment| {
        !segment.is_empty()
            && !segment.starts_with("__")
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'))
    });

    if valid { Ok(trimmed.to_string()) } else { Err(invalid()) }
}

struct Mounted {
    prefix: String,
    app: App,
}

/// Apps by prefix, longest first.
#[derive(Default)]
pub struct MountTable {
    mounted: Vec<Mounted>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `app` under `prefix`. Returns the normalized prefix.
    pub fn insert(&mut self, prefix: &str, app: App) -> Result<String, MountError> {
        let prefix = normalize_prefix(prefix)?;

        if !is_token(app.name()) {
            return Err(MountError::InvalidName(app.name().to_string()));
        }
        if self.mounted.iter().any(|m| m.prefix == prefix) {
            return Err(MountError::DuplicatePrefix(display_prefix(&prefix)));
        }
        if self.mounted.iter().any(|m| m.app.name() == app.name()) {
            return Err(MountError::DuplicateName(app.name().to_string()));
        }

        self.mounted.push(Mounted {
            prefix: prefix.clone(),
            app,
        });
        self.mounted
            .sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Ok(prefix)
    }

    /// App owning `path`, and the path relative to its prefix.
    pub fn route(&self, path: &str) -> Option<(App, String)> {
        self.mounted.iter().find_map(|m| {
            let rest = path.strip_prefix(m.prefix.as_str())?;
            if !rest.is_empty() && !rest.starts_with('/') {
                return None;
            }
            let rest = if rest.is_empty() { "/" } else { rest };
            Some((m.app.clone(), rest.to_string()))
        })
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// `(prefix, app)` pairs, longest prefix first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &App)> {
        self.mounted.iter().map(|m| (m.prefix.as_str(), &m.app))
    }
}

/// `""` reads as `/` in messages.
pub fn display_prefix(prefix: &str) -> String {
    if prefix.is_empty() { "/".to_string() } else { prefix.to_string() }
}

impl HubRouter for RwLock<MountTable> {
    fn route(&self, path: &str) -> Option<Arc<PushHub>> {
        let (app, rest) = self.read().route(path)?;
        (rest == "/__live").then(|| app.hub())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_app;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert_eq!(normalize_prefix("/second/").unwrap(), "/second");
        assert_eq!(normalize_prefix("/a/b").unwrap(), "/a/b");
        assert!(normalize_prefix("").is_err());
        assert!(normalize_prefix("second").is_err());
        assert!(normalize_prefix("/a//b").is_err());
        assert!(normalize_prefix("/__live").is_err());
        assert!(normalize_prefix("/a b").is_err());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut table = MountTable::new();
        table.insert("/", test_app("root")).unwrap();
        table.insert("/second", test_app("second")).unwrap();

        let (app, rest) = table.route("/second/__action/k").unwrap();
        assert_eq!(app.name(), "second");
        assert_eq!(rest, "/__action/k");

        let (app, rest) = table.route("/second").unwrap();
        assert_eq!(app.name(), "second");
        assert_eq!(rest, "/");

        // Not a segment boundary: falls through to the root app.
        let (app, rest) = table.route("/secondary").unwrap();
        assert_eq!(app.name(), "root");
        assert_eq!(rest, "/secondary");
    }

    #[test]
    fn test_no_root_app() {
        let mut table = MountTable::new();
        table.insert("/only", test_app("only")).unwrap();
        assert!(table.route("/other").is_none());
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut table = MountTable::new();
        table.insert("/a", test_app("a")).unwrap();
        assert_eq!(
            table.insert("/a/", test_app("b")),
            Err(MountError::DuplicatePrefix("/a".into()))
        );
        assert_eq!(
            table.insert("/b", test_app("a")),
            Err(MountError::DuplicateName("a".into()))
        );
        assert_eq!(
            table.insert("/c", test_app("bad name")),
            Err(MountError::InvalidName("bad name".into()))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_hub_routing_only_for_live_endpoint() {
        let mut table = MountTable::new();
        let root = test_app("root");
        let second = test_app("second");
        table.insert("/", root.clone()).unwrap();
        table.insert("/second", second.clone()).unwrap();
        let router = RwLock::new(table);

        let hub = HubRouter::route(&router, "/second/__live").unwrap();
        assert!(Arc::ptr_eq(&hub, &second.hub()));
        let hub = HubRouter::route(&router, "/__live").unwrap();
        assert!(Arc::ptr_eq(&hub, &root.hub()));
        assert!(HubRouter::route(&router, "/second/page").is_none());
    }
}
