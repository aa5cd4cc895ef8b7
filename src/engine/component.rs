//! Component selections.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token that does not follow the `namespace/component` grammar.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot process {0}; looks like garbage")]
pub struct InvalidComponent(pub String);

/// Namespaces the sync engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Rpms,
    Modules,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Rpms, Namespace::Modules];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Rpms => "rpms",
            Namespace::Modules => "modules",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `namespace/component` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    pub namespace: Namespace,
    pub name: String,
}

impl Component {
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

fn valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '_' | '+' | '-')
}

impl FromStr for Component {
    type Err = InvalidComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidComponent(s.to_string());
        let (ns, name) = s.split_once('/').ok_or_else(invalid)?;
        let namespace = match ns {
            "rpms" => Namespace::Rpms,
            "modules" => Namespace::Modules,
            _ => return Err(invalid()),
        };
        if name.is_empty() || !name.chars().all(valid_name_char) {
            return Err(invalid());
        }
        Ok(Component::new(namespace, name))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Raw `namespace/component` tokens chosen for a run. Empty means all.
///
/// Tokens are kept verbatim; validation happens when the engine walks the
/// selection so that garbage is reported rather than rejected up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<String>);

impl Selection {
    /// Parse a space-separated token list.
    pub fn parse(tokens: &str) -> Self {
        Self(tokens.split_whitespace().map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Tokens in case-insensitive order, the order the engine processes them.
    pub fn ordered(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.0.iter().map(String::as_str).collect();
        tokens.sort_by_key(|t| t.to_lowercase());
        tokens
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeSet<String>> for Selection {
    fn from(set: BTreeSet<String>) -> Self {
        Self(set)
    }
}
