//! Exclusion of dependencies from the generated descriptor.
//!
//! A rule is either an exact value or, when it ends with
//! [`PACKAGE_PREFIX_MARK`], a raw string prefix. The prefix test does not
//! respect package boundaries: `com.acme.internal.*` also drops
//! `com.acme.internalization`.

use std::collections::BTreeSet;

use facade_util::maven::MavenCoordinate;

/// Trailing marker that turns a pattern into a prefix rule.
pub const PACKAGE_PREFIX_MARK: &str = ".*";

/// One exclusion or inclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRule {
    /// The value must equal the pattern.
    Exact(String),
    /// The value must start with the pattern, marker removed.
    Prefix(String),
}

impl FilterRule {
    /// Interpret a pattern string.
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix(PACKAGE_PREFIX_MARK) {
            Some(prefix) => Self::Prefix(prefix.to_owned()),
            None => Self::Exact(pattern.to_owned()),
        }
    }

    /// Interpret a list of pattern strings.
    pub fn parse_all(patterns: &[String]) -> Vec<Self> {
        patterns.iter().map(|p| Self::parse(p)).collect()
    }

    /// Whether `value` satisfies this rule.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(exact) => value == exact,
            Self::Prefix(prefix) => value.starts_with(prefix.as_str()),
        }
    }
}

/// Exclusion rules applied to the flattened dependency set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeRules {
    /// Rules tested against `groupId` only.
    pub group_ids: Vec<FilterRule>,
    /// Rules tested against `artifactId` only.
    pub artifact_ids: Vec<FilterRule>,
}

impl ExcludeRules {
    /// Build rules from raw pattern lists.
    pub fn from_patterns(group_ids: &[String], artifact_ids: &[String]) -> Self {
        Self {
            group_ids: FilterRule::parse_all(group_ids),
            artifact_ids: FilterRule::parse_all(artifact_ids),
        }
    }

    /// Whether any rule drops `coordinate`.
    pub fn excludes(&self, coordinate: &MavenCoordinate) -> bool {
        self.group_ids
            .iter()
            .any(|r| r.matches(&coordinate.group_id))
            || self
                .artifact_ids
                .iter()
                .any(|r| r.matches(&coordinate.artifact_id))
    }
}

/// Keep the coordinates that no rule excludes and that are not internal modules.
///
/// The output preserves input order.
pub fn filter_artifacts(
    coordinates: &[MavenCoordinate],
    rules: &ExcludeRules,
    internal_artifact_ids: &BTreeSet<String>,
) -> Vec<MavenCoordinate> {
    coordinates
        .iter()
        .filter(|c| {
            if internal_artifact_ids.contains(&c.artifact_id) {
                tracing::debug!("skip {c}: module of the base project");
                return false;
            }
            if rules.excludes(c) {
                tracing::debug!("skip {c}: excluded by rule");
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

/// Drop coordinates whose scope is listed in `scopes`.
pub fn drop_scopes(coordinates: Vec<MavenCoordinate>, scopes: &[String]) -> Vec<MavenCoordinate> {
    coordinates
        .into_iter()
        .filter(|c| !c.scope.as_ref().is_some_and(|scope| scopes.contains(scope)))
        .collect()
}
