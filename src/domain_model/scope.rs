use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const OFFLINE_ACCESS: &str = "offline_access";

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(pub String);

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Scope(name.into())
    }

    pub fn offline_access() -> Self {
        Scope(OFFLINE_ACCESS.to_string())
    }

    pub fn is_offline(&self) -> bool {
        self.0 == OFFLINE_ACCESS
    }

    /// Label shown on consent and account pages.
    pub fn display_name(&self) -> String {
        match self.0.as_str() {
            OFFLINE_ACCESS => "Offline access".to_string(),
            "openid" => "OpenID".to_string(),
            "profile" => "User profile".to_string(),
            "email" => "Email address".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered set of scope names. Ordering keeps the wire form and the account
/// view deterministic.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<Scope>);

impl ScopeSet {
    pub fn new() -> Self {
        ScopeSet(BTreeSet::new())
    }

    /// Parses a space separated scope string, as found in OAuth requests and
    /// the `scope` token claim.
    pub fn parse(raw: &str) -> Self {
        ScopeSet(raw.split_whitespace().map(Scope::new).collect())
    }

    pub fn contains(&self, scope: &Scope) -> bool {
        self.0.contains(scope)
    }

    pub fn has_offline(&self) -> bool {
        self.0.iter().any(Scope::is_offline)
    }

    pub fn is_subset(&self, other: &ScopeSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn union(&self, other: &ScopeSet) -> ScopeSet {
        ScopeSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn intersection(&self, other: &ScopeSet) -> ScopeSet {
        ScopeSet(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn difference(&self, other: &ScopeSet) -> ScopeSet {
        ScopeSet(self.0.difference(&other.0).cloned().collect())
    }

    pub fn without_offline(&self) -> ScopeSet {
        ScopeSet(self.0.iter().filter(|s| !s.is_offline()).cloned().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.0.iter()
    }

    pub fn display_names(&self) -> Vec<String> {
        self.0.iter().map(Scope::display_name).collect()
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|s| s.0.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&joined)
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ScopeSet(iter.into_iter().map(|s| Scope(s.into())).collect())
    }
}
