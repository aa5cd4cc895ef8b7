//! Configuration locators.
//!
//! A locator is a `link#ref` string pointing at a remote repository and a
//! symbolic ref inside it. It is parsed once at startup and never changes.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ref assumed when a locator does not name one.
pub const DEFAULT_REF: &str = "master";

/// Errors produced while parsing a locator string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    /// The link part is empty (e.g. `#main`).
    #[error("locator has an empty link: {0:?}")]
    EmptyLink(String),
}

/// A parsed `link#ref` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocator {
    /// Repository link (URL or local path).
    pub link: String,
    /// Symbolic ref, `None` when the locator carried no `#ref` part.
    pub reference: Option<String>,
    /// Second-to-last path segment of the link, if any.
    pub namespace: Option<String>,
    /// Last path segment of the link, if any.
    pub component: Option<String>,
}

impl ConfigLocator {
    /// Split a `link#ref` string on the first `#`.
    pub fn split(s: &str) -> Self {
        let (link, reference) = match s.split_once('#') {
            Some((link, reference)) => (link, Some(reference.to_string())),
            None => (s, None),
        };

        let segments: Vec<&str> = link.split('/').collect();
        let component = segments.last().map(|c| c.to_string());
        let namespace = if segments.len() >= 2 {
            Some(segments[segments.len() - 2].to_string())
        } else {
            None
        };

        Self {
            link: link.to_string(),
            reference,
            namespace,
            component,
        }
    }

    /// The ref to operate on, falling back to [`DEFAULT_REF`].
    pub fn ref_or_default(&self) -> &str {
        self.reference.as_deref().unwrap_or(DEFAULT_REF)
    }
}

impl FromStr for ConfigLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let locator = Self::split(s);
        if locator.link.is_empty() {
            return Err(LocatorError::EmptyLink(s.to_string()));
        }
        Ok(locator)
    }
}

impl fmt::Display for ConfigLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(r) => write!(f, "{}#{}", self.link, r),
            None => write!(f, "{}", self.link),
        }
    }
}
