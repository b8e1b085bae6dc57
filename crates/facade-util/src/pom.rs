//! Minimal reading of Maven `pom.xml` descriptors.
//!
//! Only the fields the facade pipeline needs are extracted: identity,
//! the `<parent>` reference and the declared `<modules>`.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::UtilError;

/// Reference to a parent POM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// The parts of a POM the facade pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomModel {
    /// `<groupId>` declared directly on the project, if any.
    pub group_id: Option<String>,
    /// `<artifactId>` of the project.
    pub artifact_id: String,
    /// `<version>` declared directly on the project, if any.
    pub version: Option<String>,
    /// The `<parent>` block, if any.
    pub parent: Option<ParentRef>,
    /// Entries of the project's own `<modules>` block, in declaration order.
    pub modules: Vec<String>,
}

impl PomModel {
    /// Read and parse a POM file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not well-formed XML,
    /// or has no `<artifactId>`.
    pub fn from_path(path: &Path) -> Result<Self, UtilError> {
        let content = std::fs::read_to_string(path).map_err(|source| UtilError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse POM text. `origin` is used in error messages only.
    ///
    /// # Errors
    /// Returns an error if the text is not well-formed XML or has no `<artifactId>`.
    pub fn parse(content: &str, origin: &str) -> Result<Self, UtilError> {
        let doc = Document::parse(content).map_err(|e| UtilError::InvalidPom {
            path: origin.to_owned(),
            message: e.to_string(),
        })?;
        let project = doc.root_element();
        if !project.has_tag_name("project") {
            return Err(UtilError::InvalidPom {
                path: origin.to_owned(),
                message: format!(
                    "root element is <{}>, expected <project>",
                    project.tag_name().name()
                ),
            });
        }

        let artifact_id =
            child_text(project, "artifactId").ok_or_else(|| UtilError::MissingArtifactId {
                path: origin.to_owned(),
            })?;

        let parent = child(project, "parent").and_then(|p| {
            Some(ParentRef {
                group_id: child_text(p, "groupId")?,
                artifact_id: child_text(p, "artifactId")?,
                version: child_text(p, "version")?,
            })
        });

        let modules = child(project, "modules")
            .map(|m| {
                m.children()
                    .filter(|n| n.has_tag_name("module"))
                    .filter_map(|n| n.text())
                    .map(|t| t.trim().to_owned())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            group_id: child_text(project, "groupId"),
            artifact_id,
            version: child_text(project, "version"),
            parent,
            modules,
        })
    }

    /// The group id, inherited from `<parent>` when not declared.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// The version, inherited from `<parent>` when not declared.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
}
