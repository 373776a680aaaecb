//! Namespace model and the include/exclude resolver.
//!
//! The resolver never talks to a database. It receives the discovered
//! inventory (already stripped of administrative and oversized databases)
//! and narrows it down with the operator's patterns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection name MongoDB uses to store view definitions.
pub const SYSTEM_VIEWS: &str = "system.views";

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while parsing patterns or resolving the worklist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Both include and exclude patterns were supplied
    #[error("include and exclude namespace patterns cannot be combined, remove one of them")]
    ConflictingFilters,

    /// An include pattern names a namespace that was not discovered
    #[error("namespace not found for include pattern '{pattern}'")]
    PatternNotFound { pattern: String },

    /// Pattern is not of the form `database.collection` or `database.*`
    #[error("invalid namespace pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

// ============================================================================
// Namespace
// ============================================================================

/// Kind of a collection as reported by `listCollections`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    Collection,
    View,
    Timeseries,
    #[serde(untagged)]
    Other(String),
}

impl From<&str> for CollectionType {
    fn from(value: &str) -> Self {
        match value {
            "collection" => CollectionType::Collection,
            "view" => CollectionType::View,
            "timeseries" => CollectionType::Timeseries,
            other => CollectionType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionType::Collection => f.write_str("collection"),
            CollectionType::View => f.write_str("view"),
            CollectionType::Timeseries => f.write_str("timeseries"),
            CollectionType::Other(other) => f.write_str(other),
        }
    }
}

/// A discovered `(database, collection)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub database: String,
    pub collection: String,
    pub collection_type: CollectionType,
}

impl Namespace {
    pub fn new(
        database: impl Into<String>,
        collection: impl Into<String>,
        collection_type: CollectionType,
    ) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            collection_type,
        }
    }

    /// Whether `other` names the same `(database, collection)` pair.
    pub fn same_key(&self, other: &Namespace) -> bool {
        self.database == other.database && self.collection == other.collection
    }

    /// Views and the view-definition collection cannot be sampled.
    pub fn is_view(&self) -> bool {
        self.collection == SYSTEM_VIEWS || self.collection_type == CollectionType::View
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// Collection half of a [`NamespacePattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionSelector {
    /// `db.*`
    All,
    /// `db.collection`
    Named(String),
}

/// Parsed `database.collection` / `database.*` filter.
///
/// The string is split on the first `.` only, so `app.system.views`
/// selects the `system.views` collection of `app`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePattern {
    raw: String,
    database: String,
    collection: CollectionSelector,
}

impl NamespacePattern {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &CollectionSelector {
        &self.collection
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, namespace: &Namespace) -> bool {
        if namespace.database != self.database {
            return false;
        }
        match &self.collection {
            CollectionSelector::All => true,
            CollectionSelector::Named(name) => &namespace.collection == name,
        }
    }
}

impl FromStr for NamespacePattern {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ResolveError::InvalidPattern {
            pattern: s.to_string(),
            reason: reason.to_string(),
        };

        let (database, collection) = s
            .split_once('.')
            .ok_or_else(|| invalid("missing '.' separator"))?;
        if database.is_empty() {
            return Err(invalid("empty database name"));
        }
        if collection.is_empty() {
            return Err(invalid("empty collection name"));
        }

        let collection = if collection == "*" {
            CollectionSelector::All
        } else {
            CollectionSelector::Named(collection.to_string())
        };

        Ok(Self {
            raw: s.to_string(),
            database: database.to_string(),
            collection,
        })
    }
}

impl fmt::Display for NamespacePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Include or exclude selection, mutually exclusive by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NamespaceFilter {
    #[default]
    All,
    Include(Vec<NamespacePattern>),
    Exclude(Vec<NamespacePattern>),
}

impl NamespaceFilter {
    /// Build a filter from raw pattern lists. An empty list counts as absent.
    pub fn from_lists<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ResolveError> {
        match (include.is_empty(), exclude.is_empty()) {
            (false, false) => Err(ResolveError::ConflictingFilters),
            (true, true) => Ok(NamespaceFilter::All),
            (false, true) => Ok(NamespaceFilter::Include(parse_patterns(include)?)),
            (true, false) => Ok(NamespaceFilter::Exclude(parse_patterns(exclude)?)),
        }
    }
}

fn parse_patterns<S: AsRef<str>>(raw: &[S]) -> Result<Vec<NamespacePattern>, ResolveError> {
    raw.iter().map(|p| p.as_ref().parse()).collect()
}

/// How `db.*` include patterns combine with earlier patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncludePolicy {
    /// Each `db.*` pattern replaces everything selected so far with that
    /// database's collections. Earlier selections are lost.
    #[default]
    LastWildcardWins,
    /// `db.*` matches are appended like every other pattern.
    Accumulate,
}

/// Narrow `inventory` down to the namespaces selected by `filter`.
pub fn resolve(
    inventory: &[Namespace],
    filter: &NamespaceFilter,
    policy: IncludePolicy,
) -> Result<Vec<Namespace>, ResolveError> {
    match filter {
        NamespaceFilter::All => Ok(inventory.to_vec()),
        NamespaceFilter::Include(patterns) => include(inventory, patterns, policy),
        NamespaceFilter::Exclude(patterns) => Ok(exclude(inventory, patterns)),
    }
}

fn include(
    inventory: &[Namespace],
    patterns: &[NamespacePattern],
    policy: IncludePolicy,
) -> Result<Vec<Namespace>, ResolveError> {
    let mut selected: Vec<Namespace> = Vec::new();

    for pattern in patterns {
        match pattern.collection() {
            CollectionSelector::All => {
                let matches = inventory.iter().filter(|ns| pattern.matches(ns));
                match policy {
                    IncludePolicy::LastWildcardWins => {
                        if !selected.is_empty() {
                            tracing::debug!(
                                "Pattern '{}' replaces {} previously selected namespaces",
                                pattern,
                                selected.len()
                            );
                        }
                        selected = matches.cloned().collect();
                    }
                    IncludePolicy::Accumulate => {
                        for ns in matches {
                            push_unique(&mut selected, ns.clone());
                        }
                    }
                }
            }
            CollectionSelector::Named(collection) => {
                let found = inventory
                    .iter()
                    .find(|ns| pattern.matches(ns))
                    .ok_or_else(|| ResolveError::PatternNotFound {
                        pattern: pattern.to_string(),
                    })?;
                push_unique(
                    &mut selected,
                    Namespace::new(
                        pattern.database(),
                        collection.as_str(),
                        found.collection_type.clone(),
                    ),
                );
            }
        }
    }

    Ok(selected)
}

fn push_unique(selected: &mut Vec<Namespace>, namespace: Namespace) {
    if !selected.iter().any(|ns| ns.same_key(&namespace)) {
        selected.push(namespace);
    }
}

fn exclude(inventory: &[Namespace], patterns: &[NamespacePattern]) -> Vec<Namespace> {
    inventory
        .iter()
        .filter(|ns| !patterns.iter().any(|p| p.matches(ns)))
        .cloned()
        .collect()
}

/// Drop views and `system.views`; they are never sampled.
pub fn sampleable(namespaces: Vec<Namespace>) -> Vec<Namespace> {
    namespaces
        .into_iter()
        .filter(|ns| {
            if ns.collection == SYSTEM_VIEWS {
                tracing::info!("Skipping view definition collection {}", ns);
                false
            } else if ns.collection_type == CollectionType::View {
                tracing::info!("Skipping view {}", ns);
                false
            } else {
                true
            }
        })
        .collect()
}
