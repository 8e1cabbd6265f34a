//! Registry keys.

use std::any::{TypeId, type_name};
use std::borrow::Borrow;
use std::fmt;

use crate::utils::hash::fingerprint;

/// Key of a registered action; URL-path safe (`[A-Za-z0-9_.-]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey(String);

impl ActionKey {
    /// Explicit key chosen by the page author.
    pub fn named(name: &str) -> Self {
        Self(sanitize(name))
    }

    /// Key derived from the handler type: readable tail of its type name
    /// plus a fingerprint of its `TypeId`, so two closures defined in the
    /// same function still get distinct keys.
    pub fn of<F: 'static>() -> Self {
        let mut tail: Vec<String> = type_name::<F>()
            .rsplit("::")
            .take(2)
            .map(sanitize)
            .collect();
        tail.reverse();
        Self(format!("{}-{}", tail.join("."), fingerprint(&TypeId::of::<F>())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn sanitize(raw: &str) -> String {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    // `.` and `..` would be folded away by URL normalization.
    if clean.bytes().all(|b| b == b'.') { "action".to_string() } else { clean }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ActionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn increment() {}
    fn decrement() {}

    fn key_of<F: 'static>(_: &F) -> ActionKey {
        ActionKey::of::<F>()
    }

    #[test]
    fn test_named_keys_are_sanitized() {
        assert_eq!(ActionKey::named("bump").as_str(), "bump");
        assert_eq!(ActionKey::named("a/b c?").as_str(), "abc");
        assert_eq!(ActionKey::named("../").as_str(), "action");
        assert_eq!(ActionKey::named("").as_str(), "action");
    }

    #[test]
    fn test_derived_keys() {
        let inc = key_of(&increment);
        assert!(inc.as_str().starts_with("tests.increment-"), "{inc}");
        assert_eq!(inc, key_of(&increment));
        assert_ne!(inc, key_of(&decrement));

        let a = || 1;
        let b = || 1;
        let (ka, kb) = (key_of(&a), key_of(&b));
        assert!(ka.as_str().contains("closure"), "{ka}");
        assert_ne!(ka, kb);
        assert!(
            ka.as_str()
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
        );
    }
}
