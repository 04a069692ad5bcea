//! Path prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefixes start and end with `/`, so `/bare/` never matches `/baremux/x`
//! - No regex to guarantee O(n) matching

use std::borrow::Cow;

/// A URL path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefix {
    prefix: String,
}

impl PathPrefix {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` falls under this prefix.
    ///
    /// The bare directory form (`/uv` for `/uv/`) also matches so that the
    /// static layer can redirect it to the canonical directory URL.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// The part of `path` after the prefix, if it matches.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        if let Some(rest) = path.strip_prefix(self.prefix.as_str()) {
            return Some(rest);
        }
        let bare = self.prefix.strip_suffix('/')?;
        (!bare.is_empty() && path == bare).then_some("")
    }

    /// Replace this prefix with `replacement` at the start of `path`.
    ///
    /// Paths that do not match are returned untouched.
    pub fn replace<'p>(&self, path: &'p str, replacement: &str) -> Cow<'p, str> {
        match self.strip(path) {
            Some(rest) => Cow::Owned(format!("{}{}", replacement, rest)),
            None => Cow::Borrowed(path),
        }
    }
}
