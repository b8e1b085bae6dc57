//! Maven artifact coordinates.

use std::fmt;

use crate::error::UtilError;

/// A Maven coordinate identifying a single artifact.
///
/// Two coordinates name the same artifact when their [`key`](Self::key)s are
/// equal; the version is carried along but is not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoordinate {
    /// Maven group identifier, e.g. `"com.acme"`.
    pub group_id: String,
    /// Maven artifact identifier, e.g. `"lib-a"`.
    pub artifact_id: String,
    /// Artifact version, e.g. `"1.0.0"`.
    pub version: String,
    /// Artifact type (defaults to `"jar"`).
    pub packaging: String,
    /// Optional classifier, e.g. `"sources"`.
    pub classifier: Option<String>,
    /// Dependency scope as reported by the tree, e.g. `"compile"`.
    pub scope: Option<String>,
}

impl MavenCoordinate {
    /// Create a new coordinate with packaging `"jar"` and no scope.
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_owned(),
            artifact_id: artifact_id.to_owned(),
            version: version.to_owned(),
            packaging: "jar".to_owned(),
            classifier: None,
            scope: None,
        }
    }

    /// Builder method to set the scope.
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_owned());
        self
    }

    /// The identity used for de-duplication and filtering.
    pub fn key(&self) -> (&str, &str) {
        (&self.group_id, &self.artifact_id)
    }

    /// Parse one entry of a `dependency:tree` listing, drawing prefix already removed.
    ///
    /// Accepted formats:
    /// - `"group:artifact:type:version:scope"`
    /// - `"group:artifact:type:classifier:version:scope"`
    ///
    /// # Errors
    /// Returns `UtilError::InvalidMavenCoordinate` when the entry has any other
    /// number of parts or any part is empty.
    pub fn parse_tree_entry(entry: &str) -> Result<Self, UtilError> {
        let parts: Vec<&str> = entry.split(':').collect();

        if let Some(pos) = parts.iter().position(|p| p.is_empty()) {
            return Err(UtilError::InvalidMavenCoordinate {
                coordinate: entry.to_owned(),
                reason: format!("part {} is empty", pos + 1),
            });
        }

        match parts.as_slice() {
            [group, artifact, packaging, version, scope] => Ok(Self {
                packaging: (*packaging).to_owned(),
                ..Self::new(group, artifact, version).with_scope(scope)
            }),
            [group, artifact, packaging, classifier, version, scope] => Ok(Self {
                packaging: (*packaging).to_owned(),
                classifier: Some((*classifier).to_owned()),
                ..Self::new(group, artifact, version).with_scope(scope)
            }),
            _ => Err(UtilError::InvalidMavenCoordinate {
                coordinate: entry.to_owned(),
                reason: format!(
                    "expected group:artifact:type[:classifier]:version:scope, got {} parts",
                    parts.len()
                ),
            }),
        }
    }
}

impl fmt::Display for MavenCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
