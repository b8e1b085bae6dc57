use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The `facade.toml` configuration file.
///
/// Every section is optional; an absent file behaves like an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacadeConfig {
    #[serde(default)]
    pub facade: FacadeSection,
    #[serde(default)]
    pub parent: Option<ParentSection>,
    #[serde(default, rename = "license")]
    pub licenses: Vec<LicenseSection>,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub exclude: ExcludeSection,
    #[serde(default)]
    pub build: BuildSection,
}

/// Identity and housekeeping of the generated module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacadeSection {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_true")]
    pub clean_after: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_java_version")]
    pub java_version: String,
}

impl Default for FacadeSection {
    fn default() -> Self {
        Self {
            group_id: None,
            artifact_id: None,
            version: None,
            clean_after: true,
            output_dir: default_output_dir(),
            java_version: default_java_version(),
        }
    }
}

/// Inherited baseline (`<parent>`) for the generated descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentSection {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// One `<license>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseSection {
    pub name: String,
    pub url: String,
}

/// Source files copied into the facade module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesSection {
    /// Fully-qualified class names, or package prefixes ending in `.*`.
    #[serde(default)]
    pub include: Vec<String>,
}

/// Dependencies left out of the generated descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeSection {
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub artifact_ids: Vec<String>,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for ExcludeSection {
    fn default() -> Self {
        Self {
            group_ids: Vec::new(),
            artifact_ids: Vec::new(),
            scopes: default_scopes(),
        }
    }
}

/// How a version is chosen when the tree lists one artifact more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mediation {
    /// The shallowest occurrence wins; ties go to the earlier line.
    #[default]
    Nearest,
    /// The earliest line wins regardless of depth.
    First,
}

/// How the external build tool is invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default)]
    pub mvn: Option<PathBuf>,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub user_settings: Option<PathBuf>,
    #[serde(default)]
    pub global_settings: Option<PathBuf>,
    #[serde(default)]
    pub skip_unreadable_modules: bool,
    #[serde(default)]
    pub mediation: Mediation,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    "outputs".to_owned()
}

fn default_java_version() -> String {
    "1.8".to_owned()
}

fn default_scopes() -> Vec<String> {
    vec!["test".to_owned()]
}

impl FacadeConfig {
    /// Read and parse a `facade.toml` from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Like [`from_path`](Self::from_path), but an absent file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is invalid.
    pub fn from_path_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    /// Parse TOML text. `origin` names the source in error messages.
    ///
    /// # Errors
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: FacadeConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_owned(),
            source: e,
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Check values serde cannot check on its own. `origin` names the source in error messages.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first offending value.
    pub fn validate(&self, origin: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: origin.to_owned(),
            message,
        };

        for (field, value) in [
            ("facade.group_id", &self.facade.group_id),
            ("facade.artifact_id", &self.facade.artifact_id),
            ("facade.version", &self.facade.version),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(invalid(format!("{field} must not be empty")));
            }
        }
        if self.facade.output_dir.trim().is_empty() {
            return Err(invalid("facade.output_dir must not be empty".to_owned()));
        }

        let patterns = self
            .sources
            .include
            .iter()
            .chain(&self.exclude.group_ids)
            .chain(&self.exclude.artifact_ids);
        for pattern in patterns {
            if pattern.trim().is_empty() || pattern == ".*" {
                return Err(invalid(format!(
                    "pattern \"{pattern}\" matches everything — remove it or name a prefix"
                )));
            }
        }

        if let Some(profile) = self.build.profiles.iter().find(|p| p.trim().is_empty()) {
            return Err(invalid(format!("build.profiles contains an empty entry \"{profile}\"")));
        }
        if self.build.properties.keys().any(|k| k.trim().is_empty()) {
            return Err(invalid("build.properties contains an empty key".to_owned()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid facade.toml at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid facade.toml at {path}: {message}")]
    Invalid { path: String, message: String },
}
