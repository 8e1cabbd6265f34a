//! Session identity and cookies.
//!
//! Two identities are in play:
//!
//! - [`BrowserId`] lives in the app's cookie and names the browser. It is
//!   created on the first request that arrives without one.
//! - [`SessionId`] names one rendered page (one tab) and its push channel.
//!   Every page render opens a new one, owned by the browser that asked.
//!
//! Both are unguessable tokens. The cookie is scoped per app: its name carries
//! the app name and its `Path` the mount prefix, so two apps on one listener
//! never read each other's browser id.

use std::borrow::Borrow;
use std::fmt;

use crate::target::is_dom_safe;
use crate::utils::hash::secret_token;

/// Request header carrying the page's session on action posts.
pub const SESSION_HEADER: &str = "X-Pw-Session";

/// One page render's identity; keys its push channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh, unguessable id.
    pub fn generate() -> Self {
        Self(format!("s{}", secret_token()))
    }

    /// Accept an id presented by a client, if well-formed.
    pub fn parse(raw: &str) -> Option<Self> {
        is_dom_safe(raw).then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The browser behind a cookie; owns the sessions it rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrowserId(String);

impl BrowserId {
    pub fn generate() -> Self {
        Self(format!("b{}", secret_token()))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        is_dom_safe(raw).then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BrowserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Cookies
// =============================================================================

/// Cookie name for one app: `{base}_{app}`.
pub fn cookie_name(base: &str, app: &str) -> String {
    format!("{base}_{app}")
}

/// Find cookie `name` in a `Cookie` request header.
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.trim_matches('"'))
    })
}

/// `Set-Cookie` value for a browser id, scoped to the mount prefix.
pub fn issue_cookie(name: &str, browser: &BrowserId, prefix: &str) -> String {
    let path = if prefix.is_empty() { "/" } else { prefix };
    format!("{name}={browser}; Path={path}; HttpOnly; SameSite=Lax")
}

/// RFC 6265 token check, used for cookie and app names.
pub fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'!' | b'~' | b'*')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_distinct_and_parse_back() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with('s'));
        assert_eq!(SessionId::parse(a.as_str()), Some(a));

        let browser = BrowserId::generate();
        assert!(browser.as_str().starts_with('b'));
        assert_eq!(BrowserId::parse(browser.as_str()), Some(browser));
    }

    #[test]
    fn test_next_id_not_derivable_from_previous() {
        let mine = SessionId::generate();
        let theirs = SessionId::generate();

        // Bumping any trailing hex digit of one id never yields the next.
        let raw = mine.as_str();
        let guesses: Vec<String> = (1..=16u32)
            .filter_map(|step| {
                let (head, last) = raw.split_at(raw.len() - 1);
                let digit = u32::from_str_radix(last, 16).ok()?;
                Some(format!("{head}{:x}", (digit + step) % 16))
            })
            .collect();
        assert!(!guesses.iter().any(|g| g == theirs.as_str()));
        assert_ne!(mine.as_str()[..9], theirs.as_str()[..9]);
    }

    #[test]
    fn test_parse_rejects_unsafe_ids() {
        assert_eq!(SessionId::parse(""), None);
        assert_eq!(SessionId::parse("a;b"), None);
        assert_eq!(SessionId::parse("../x"), None);
    }

    #[test]
    fn test_read_cookie() {
        let header = "theme=dark; pw_sid_main=s1_2; pw_sid_second=\"s1_3\"";
        assert_eq!(read_cookie(header, "pw_sid_main"), Some("s1_2"));
        assert_eq!(read_cookie(header, "pw_sid_second"), Some("s1_3"));
        assert_eq!(read_cookie(header, "pw_sid"), None);
    }

    #[test]
    fn test_issue_cookie_is_scoped_to_prefix() {
        let id = BrowserId::parse("b1_a").unwrap();
        assert_eq!(
            issue_cookie("pw_sid_second", &id, "/second"),
            "pw_sid_second=b1_a; Path=/second; HttpOnly; SameSite=Lax"
        );
        assert!(issue_cookie("pw_sid_main", &id, "").contains("Path=/;"));
    }

    #[test]
    fn test_is_token() {
        assert!(is_token("pw_sid"));
        assert!(!is_token("pw sid"));
        assert!(!is_token("a=b"));
        assert!(!is_token(""));
    }
}
