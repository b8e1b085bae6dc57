//! Rendering of the facade module's `pom.xml`.

use std::io::Write;
use std::path::{Path, PathBuf};

use facade_util::maven::MavenCoordinate;
use facade_util::pom::ParentRef;

use crate::error::EngineError;

const INDENT: &str = "    ";
const MAVEN_PLUGINS_GROUP: &str = "org.apache.maven.plugins";

/// Which kind of module is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeMode {
    /// Direct dependencies, each cut off from its transitive dependencies,
    /// plus optional sources compiled into a jar.
    Facade,
    /// A `pom` module whose `<dependencyManagement>` pins every version.
    BaseDependency,
}

impl FacadeMode {
    /// Short name used in logs and CLI output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Facade => "facade",
            Self::BaseDependency => "base-dependency",
        }
    }
}

/// A `<license>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub name: String,
    pub url: String,
}

impl License {
    /// The license base-dependency modules carry when none is configured.
    pub fn apache() -> Self {
        Self {
            name: "The Apache License, Version 2.0".to_owned(),
            url: "http://www.apache.org/licenses/LICENSE-2.0.txt".to_owned(),
        }
    }
}

/// Everything needed to render the generated descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacadeModuleSpec {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub mode: FacadeMode,
    pub parent: Option<ParentRef>,
    pub licenses: Vec<License>,
    /// Filtered dependencies in output order.
    pub dependencies: Vec<MavenCoordinate>,
    /// Source files copied into the module, relative to `src/main/java`.
    pub source_files: Vec<PathBuf>,
    /// Compiler `source`/`target` level.
    pub java_version: String,
}

impl FacadeModuleSpec {
    /// `jar` when there is something to compile, `pom` otherwise.
    pub fn packaging(&self) -> &'static str {
        match self.mode {
            FacadeMode::Facade if !self.source_files.is_empty() => "jar",
            _ => "pom",
        }
    }
}

/// Line-oriented XML writer that tracks indentation.
struct XmlWriter {
    output: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            output: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.output.push_str(INDENT);
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.line(&format!("<{tag}>"));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{tag}>"));
    }

    /// Write `<tag>value</tag>`. The value must already be validated.
    fn element(&mut self, tag: &str, value: &str) {
        self.line(&format!("<{tag}>{value}</{tag}>"));
    }

    fn finish(self) -> String {
        self.output
    }
}

/// Reject values that would break the document or produce an unusable descriptor.
///
/// Values are never escaped: a coordinate containing markup characters
/// cannot name a real artifact.
fn checked<'a>(field: &str, value: &'a str) -> Result<&'a str, EngineError> {
    let reject = |reason: &str| EngineError::Render {
        field: field.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    };
    if value.trim().is_empty() {
        return Err(reject("value is empty"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| matches!(c, '<' | '>' | '&' | '"' | '\'') || c.is_control())
    {
        return Err(reject(&format!("contains {c:?}")));
    }
    Ok(value)
}

/// Render the descriptor for `spec`.
///
/// # Errors
/// Returns `EngineError::Render` naming the first field whose value is empty
/// or contains markup or control characters.
pub fn render_descriptor(spec: &FacadeModuleSpec) -> Result<String, EngineError> {
    let mut w = XmlWriter::new();
    w.line(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    w.line(
        r#"<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">"#,
    );
    w.depth = 1;
    w.element("modelVersion", "4.0.0");

    if let Some(parent) = &spec.parent {
        w.open("parent");
        w.element("groupId", checked("parent groupId", &parent.group_id)?);
        w.element("artifactId", checked("parent artifactId", &parent.artifact_id)?);
        w.element("version", checked("parent version", &parent.version)?);
        w.close("parent");
    }

    w.element("groupId", checked("groupId", &spec.group_id)?);
    w.element("artifactId", checked("artifactId", &spec.artifact_id)?);
    w.element("version", checked("version", &spec.version)?);
    w.element("packaging", spec.packaging());

    if !spec.licenses.is_empty() {
        w.open("licenses");
        for license in &spec.licenses {
            w.open("license");
            w.element("name", checked("license name", &license.name)?);
            w.element("url", checked("license url", &license.url)?);
            w.close("license");
        }
        w.close("licenses");
    }

    if !spec.dependencies.is_empty() {
        match spec.mode {
            FacadeMode::Facade => {
                render_dependencies(&mut w, &spec.dependencies, true)?;
            }
            FacadeMode::BaseDependency => {
                w.open("dependencyManagement");
                render_dependencies(&mut w, &spec.dependencies, false)?;
                w.close("dependencyManagement");
            }
        }
    }

    render_build(&mut w, spec)?;

    w.depth = 0;
    w.line("</project>");
    Ok(w.finish())
}

fn render_dependencies(
    w: &mut XmlWriter,
    dependencies: &[MavenCoordinate],
    exclude_transitive: bool,
) -> Result<(), EngineError> {
    w.open("dependencies");
    for dep in dependencies {
        w.open("dependency");
        w.element("groupId", checked("dependency groupId", &dep.group_id)?);
        w.element("artifactId", checked("dependency artifactId", &dep.artifact_id)?);
        w.element("version", checked("dependency version", &dep.version)?);
        if dep.packaging != "jar" {
            w.element("type", checked("dependency type", &dep.packaging)?);
        }
        if let Some(classifier) = &dep.classifier {
            w.element("classifier", checked("dependency classifier", classifier)?);
        }
        if exclude_transitive {
            w.open("exclusions");
            w.open("exclusion");
            w.element("groupId", "*");
            w.element("artifactId", "*");
            w.close("exclusion");
            w.close("exclusions");
        }
        w.close("dependency");
    }
    w.close("dependencies");
    Ok(())
}

fn render_build(w: &mut XmlWriter, spec: &FacadeModuleSpec) -> Result<(), EngineError> {
    let java_version = checked("java version", &spec.java_version)?;

    w.open("build");
    w.open("plugins");

    w.open("plugin");
    w.element("groupId", MAVEN_PLUGINS_GROUP);
    w.element("artifactId", "maven-source-plugin");
    w.element("version", "2.0.2");
    w.open("executions");
    w.open("execution");
    w.element("id", "attach-sources");
    w.open("goals");
    w.element("goal", "jar");
    w.close("goals");
    w.close("execution");
    w.close("executions");
    w.close("plugin");

    if spec.mode == FacadeMode::Facade {
        w.open("plugin");
        w.element("groupId", MAVEN_PLUGINS_GROUP);
        w.element("artifactId", "maven-jar-plugin");
        w.element("version", "2.2");
        w.close("plugin");
    }

    w.open("plugin");
    w.element("groupId", MAVEN_PLUGINS_GROUP);
    w.element("artifactId", "maven-compiler-plugin");
    w.element("version", "3.8.1");
    w.open("configuration");
    w.element("source", java_version);
    w.element("target", java_version);
    w.close("configuration");
    w.close("plugin");

    if spec.mode == FacadeMode::BaseDependency {
        w.open("plugin");
        w.element("groupId", "org.codehaus.mojo");
        w.element("artifactId", "flatten-maven-plugin");
        w.open("executions");
        for (id, phase, goal) in [
            ("flatten", "process-resources", "flatten"),
            ("flatten.clean", "clean", "clean"),
        ] {
            w.open("execution");
            w.element("id", id);
            w.element("phase", phase);
            w.open("goals");
            w.element("goal", goal);
            w.close("goals");
            w.close("execution");
        }
        w.close("executions");
        w.element("inherited", "false");
        w.open("configuration");
        w.element("updatePomFile", "true");
        w.element("flattenMode", "resolveCiFriendliesOnly");
        w.close("configuration");
        w.close("plugin");
    }

    w.close("plugins");
    w.close("build");
    Ok(())
}

/// Write `text` to `path`, flushed and synced before returning.
///
/// # Errors
/// Returns `EngineError::Io` if the file cannot be created or written.
pub fn write_descriptor(path: &Path, text: &str) -> Result<(), EngineError> {
    let io_err = |source| EngineError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = std::io::BufWriter::new(file);
    writer.write_all(text.as_bytes()).map_err(io_err)?;
    let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
    file.sync_all().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roxmltree::{Document, Node};

    use super::*;

    fn spec(mode: FacadeMode) -> FacadeModuleSpec {
        FacadeModuleSpec {
            group_id: "com.acme".to_owned(),
            artifact_id: "acme-facade".to_owned(),
            version: "1.0.0".to_owned(),
            mode,
            parent: None,
            licenses: Vec::new(),
            dependencies: vec![
                MavenCoordinate::new("org.slf4j", "slf4j-api", "1.7.36"),
                MavenCoordinate::new("com.google.guava", "guava", "31.1-jre"),
            ],
            source_files: Vec::new(),
            java_version: "1.8".to_owned(),
        }
    }

    fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
        node.children()
            .find(|n| n.is_element() && n.tag_name().name() == name)
    }

    fn text(node: Node<'_, '_>, name: &str) -> Option<String> {
        child(node, name).and_then(|n| n.text()).map(str::to_owned)
    }

    fn dependencies_of(project: Node<'_, '_>) -> Vec<(String, String, String)> {
        let deps = child(project, "dependencies")
            .or_else(|| child(project, "dependencyManagement").and_then(|m| child(m, "dependencies")));
        deps.map(|d| {
            d.children()
                .filter(|n| n.tag_name().name() == "dependency")
                .map(|n| {
                    (
                        text(n, "groupId").unwrap(),
                        text(n, "artifactId").unwrap(),
                        text(n, "version").unwrap(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
    }

    fn plugin_ids(project: Node<'_, '_>) -> Vec<String> {
        child(project, "build")
            .and_then(|b| child(b, "plugins"))
            .map(|p| {
                p.children()
                    .filter(|n| n.tag_name().name() == "plugin")
                    .filter_map(|n| text(n, "artifactId"))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn facade_mode_round_trip() {
        let xml = render_descriptor(&spec(FacadeMode::Facade)).unwrap();
        let doc = Document::parse(&xml).unwrap();
        let project = doc.root_element();

        assert_eq!(text(project, "groupId").as_deref(), Some("com.acme"));
        assert_eq!(text(project, "artifactId").as_deref(), Some("acme-facade"));
        assert_eq!(text(project, "version").as_deref(), Some("1.0.0"));
        assert_eq!(text(project, "packaging").as_deref(), Some("pom"));
        assert_eq!(
            dependencies_of(project),
            vec![
                ("org.slf4j".to_owned(), "slf4j-api".to_owned(), "1.7.36".to_owned()),
                ("com.google.guava".to_owned(), "guava".to_owned(), "31.1-jre".to_owned()),
            ]
        );
        assert!(child(project, "dependencyManagement").is_none());
    }

    #[test]
    fn facade_mode_excludes_all_transitives() {
        let xml = render_descriptor(&spec(FacadeMode::Facade)).unwrap();
        let doc = Document::parse(&xml).unwrap();
        let deps: Vec<Node<'_, '_>> = doc
            .descendants()
            .filter(|n| n.tag_name().name() == "dependency")
            .collect();
        assert_eq!(deps.len(), 2);
        for dep in deps {
            let exclusion = child(dep, "exclusions").and_then(|e| child(e, "exclusion")).unwrap();
            assert_eq!(text(exclusion, "groupId").as_deref(), Some("*"));
            assert_eq!(text(exclusion, "artifactId").as_deref(), Some("*"));
        }
    }

    #[test]
    fn facade_mode_plugins() {
        let xml = render_descriptor(&spec(FacadeMode::Facade)).unwrap();
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(
            plugin_ids(doc.root_element()),
            vec!["maven-source-plugin", "maven-jar-plugin", "maven-compiler-plugin"]
        );
    }

    #[test]
    fn sources_switch_packaging_to_jar() {
        let mut with_sources = spec(FacadeMode::Facade);
        with_sources.source_files = vec![PathBuf::from("com/acme/api/Widget.java")];
        assert_eq!(with_sources.packaging(), "jar");

        let mut base = spec(FacadeMode::BaseDependency);
        base.source_files = vec![PathBuf::from("com/acme/api/Widget.java")];
        assert_eq!(base.packaging(), "pom");
    }

    #[test]
    fn base_dependency_mode_uses_management_block() {
        let mut base = spec(FacadeMode::BaseDependency);
        base.parent = Some(ParentRef {
            group_id: "com.acme".to_owned(),
            artifact_id: "acme-bom".to_owned(),
            version: "3.26.0".to_owned(),
        });
        base.licenses = vec![License::apache()];

        let xml = render_descriptor(&base).unwrap();
        let doc = Document::parse(&xml).unwrap();
        let project = doc.root_element();

        assert!(child(project, "dependencies").is_none());
        assert_eq!(dependencies_of(project).len(), 2);
        assert!(!xml.contains("<exclusions>"));
        assert_eq!(
            child(project, "parent").and_then(|p| text(p, "artifactId")).as_deref(),
            Some("acme-bom")
        );
        assert!(xml.contains("<name>The Apache License, Version 2.0</name>"));
        assert_eq!(
            plugin_ids(project),
            vec!["maven-source-plugin", "maven-compiler-plugin", "flatten-maven-plugin"]
        );
        assert!(xml.contains("<flattenMode>resolveCiFriendliesOnly</flattenMode>"));
        assert!(xml.contains("<id>flatten.clean</id>"));
    }

    #[test]
    fn compiler_level_is_configurable() {
        let mut s = spec(FacadeMode::Facade);
        s.java_version = "17".to_owned();
        let xml = render_descriptor(&s).unwrap();
        assert!(xml.contains("<source>17</source>"));
        assert!(xml.contains("<target>17</target>"));
    }

    #[test]
    fn type_and_classifier_only_when_not_default() {
        let mut s = spec(FacadeMode::Facade);
        let mut native = MavenCoordinate::new("io.netty", "netty-epoll", "4.1.100.Final");
        native.classifier = Some("linux-x86_64".to_owned());
        native.packaging = "test-jar".to_owned();
        s.dependencies = vec![native];

        let xml = render_descriptor(&s).unwrap();
        assert!(xml.contains("<classifier>linux-x86_64</classifier>"));
        assert!(xml.contains("<type>test-jar</type>"));
        assert_eq!(render_descriptor(&spec(FacadeMode::Facade)).unwrap().matches("<type>").count(), 0);
    }

    #[test]
    fn empty_dependency_set_omits_block() {
        let mut s = spec(FacadeMode::BaseDependency);
        s.dependencies.clear();
        let xml = render_descriptor(&s).unwrap();
        assert!(!xml.contains("<dependencyManagement>"));
        assert!(Document::parse(&xml).is_ok());
    }

    #[test]
    fn markup_in_coordinate_is_render_error() {
        let mut s = spec(FacadeMode::Facade);
        s.dependencies
            .push(MavenCoordinate::new("com.acme", "evil</artifactId>", "1.0"));
        let err = render_descriptor(&s).unwrap_err();
        match err {
            EngineError::Render { field, value, .. } => {
                assert_eq!(field, "dependency artifactId");
                assert_eq!(value, "evil</artifactId>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_identity_is_render_error() {
        let mut s = spec(FacadeMode::Facade);
        s.version = " ".to_owned();
        assert!(matches!(
            render_descriptor(&s),
            Err(EngineError::Render { field, .. }) if field == "version"
        ));
    }

    #[test]
    fn control_character_is_render_error() {
        let mut s = spec(FacadeMode::Facade);
        s.group_id = "com.acme\n".to_owned();
        assert!(render_descriptor(&s).is_err());
    }

    #[test]
    fn write_descriptor_persists_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pom.xml");
        let xml = render_descriptor(&spec(FacadeMode::Facade)).unwrap();
        write_descriptor(&path, &xml).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), xml);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use proptest::prelude::*;
    use roxmltree::Document;

    use super::*;

    fn coordinate() -> impl Strategy<Value = MavenCoordinate> {
        (
            "[a-z]{1,8}(\\.[a-z0-9]{1,8}){0,3}",
            "[a-z][a-z0-9-]{0,15}",
            "[0-9]{1,2}\\.[0-9]{1,2}(\\.[0-9]{1,2})?(-[A-Za-z]{1,6})?",
        )
            .prop_map(|(g, a, v)| MavenCoordinate::new(&g, &a, &v))
    }

    proptest! {
        /// Identity and dependencies read back from the rendered text equal the input.
        #[test]
        fn render_round_trip(
            deps in proptest::collection::vec(coordinate(), 0..12),
            base in any::<bool>(),
        ) {
            let mode = if base { FacadeMode::BaseDependency } else { FacadeMode::Facade };
            let spec = FacadeModuleSpec {
                group_id: "com.acme".to_owned(),
                artifact_id: "acme-facade".to_owned(),
                version: "2.0.0-SNAPSHOT".to_owned(),
                mode,
                parent: None,
                licenses: Vec::new(),
                dependencies: deps.clone(),
                source_files: Vec::new(),
                java_version: "1.8".to_owned(),
            };
            let xml = render_descriptor(&spec).unwrap();
            let doc = Document::parse(&xml).unwrap();

            let parsed: Vec<(String, String, String)> = doc
                .descendants()
                .filter(|n| n.tag_name().name() == "dependency")
                .map(|n| {
                    let field = |name: &str| {
                        n.children()
                            .find(|c| c.tag_name().name() == name)
                            .and_then(|c| c.text())
                            .unwrap()
                            .to_owned()
                    };
                    (field("groupId"), field("artifactId"), field("version"))
                })
                .collect();
            let expected: Vec<(String, String, String)> = deps
                .iter()
                .map(|d| (d.group_id.clone(), d.artifact_id.clone(), d.version.clone()))
                .collect();
            prop_assert_eq!(parsed, expected);

            let project = doc.root_element();
            let identity = |name: &str| {
                project
                    .children()
                    .find(|c| c.tag_name().name() == name)
                    .and_then(|c| c.text())
                    .map(str::to_owned)
            };
            let group_id = identity("groupId");
            let artifact_id = identity("artifactId");
            let version = identity("version");
            prop_assert_eq!(group_id.as_deref(), Some("com.acme"));
            prop_assert_eq!(artifact_id.as_deref(), Some("acme-facade"));
            prop_assert_eq!(version.as_deref(), Some("2.0.0-SNAPSHOT"));
        }
    }
}
