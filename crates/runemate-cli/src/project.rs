//! `runemate.toml` project files and multi-project workspaces

use runemate_config::BuildLayout;
use runemate_manifest::{DeclarationSpec, ManifestDeclaration, ManifestFormat};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dependencies::ExternalDependencyPolicy;
use crate::errors::ProjectError;

pub const PROJECT_FILE: &str = "runemate.toml";

/// Source roots used when a project does not list its own; missing ones are ignored
pub const DEFAULT_SOURCE_ROOTS: &[&str] = &["src/main/java", "src/main/kotlin", "src/main/resources"];

pub const DEFAULT_BUILD_DIR: &str = "build";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ProjectFile {
    #[serde(default)]
    project: ProjectSection,
    workspace: Option<WorkspaceSection>,
    #[serde(default)]
    dependencies: Vec<String>,
    /// Kept as a table so declarations stay in file order
    #[serde(default)]
    manifests: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ProjectSection {
    name: Option<String>,
    build_dir: Option<PathBuf>,
    source_roots: Option<Vec<PathBuf>>,
    #[serde(default)]
    manifest_format: ManifestFormat,
    #[serde(default)]
    allow_external_dependencies: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkspaceSection {
    #[serde(default)]
    members: Vec<String>,
}

/// One project: its declarations, sources and declared dependencies
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub dir: PathBuf,
    pub source_roots: Vec<PathBuf>,
    pub declarations: Vec<ManifestDeclaration>,
    pub dependencies: Vec<String>,
    pub manifest_format: ManifestFormat,
    pub dependency_policy: ExternalDependencyPolicy,
}

/// The root project plus every member, sharing one build root
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root_dir: PathBuf,
    pub layout: BuildLayout,
    pub projects: Vec<Project>,
}

fn read_project_file(dir: &Path) -> Result<ProjectFile, ProjectError> {
    let path = dir.join(PROJECT_FILE);
    if !path.is_file() {
        return Err(ProjectError::NotFound(path));
    }
    let content = fs::read_to_string(&path).map_err(|source| ProjectError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ProjectError::Parse {
        path,
        message: e.to_string(),
    })
}

impl Project {
    fn from_file(dir: PathBuf, file: ProjectFile) -> Result<Self, ProjectError> {
        let name = file.project.name.clone().unwrap_or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "project".to_string())
        });

        let source_roots: Vec<PathBuf> = match &file.project.source_roots {
            Some(roots) => roots.iter().map(|r| dir.join(r)).collect(),
            None => DEFAULT_SOURCE_ROOTS
                .iter()
                .map(|r| dir.join(r))
                .filter(|r| r.is_dir())
                .collect(),
        };

        let mut declarations = Vec::with_capacity(file.manifests.len());
        for (declaration_name, value) in file.manifests {
            let spec: DeclarationSpec = value.try_into().map_err(|e: toml::de::Error| {
                ProjectError::Parse {
                    path: dir.join(PROJECT_FILE),
                    message: format!("manifests.{}: {}", declaration_name, e),
                }
            })?;
            declarations.push(spec.into_declaration(declaration_name));
        }

        debug!(
            "Loaded project '{}' with {} declarations and {} source roots",
            name,
            declarations.len(),
            source_roots.len()
        );

        Ok(Project {
            name,
            dir,
            source_roots,
            declarations,
            dependencies: file.dependencies,
            manifest_format: file.project.manifest_format,
            dependency_policy: ExternalDependencyPolicy::from_allow_flag(
                file.project.allow_external_dependencies,
            ),
        })
    }

    /// Label used in stage names, e.g. `:woodcutting:generate`
    pub fn path_label(&self) -> String {
        format!(":{}", self.name)
    }
}

impl Workspace {
    /// Load the project at `dir` and, when it declares a workspace, every member
    pub fn load(dir: &Path) -> Result<Self, ProjectError> {
        let root_dir = fs::canonicalize(dir).map_err(|_| ProjectError::NotFound(dir.join(PROJECT_FILE)))?;
        let mut root_file = read_project_file(&root_dir)?;

        let build_dir = root_file
            .project
            .build_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR));
        let layout = BuildLayout::new(root_dir.join(build_dir));
        let members = root_file
            .workspace
            .take()
            .map(|w| w.members)
            .unwrap_or_default();

        let mut projects = vec![Project::from_file(root_dir.clone(), root_file)?];
        for member in members {
            let member_dir = root_dir.join(&member);
            let member_file = read_project_file(&member_dir)?;
            if member_file.workspace.is_some() {
                return Err(ProjectError::NestedWorkspace { member });
            }
            projects.push(Project::from_file(member_dir, member_file)?);
        }

        Ok(Workspace {
            root_dir,
            layout,
            projects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            assert!(fs::create_dir_all(parent).is_ok());
        }
        assert!(fs::write(path, contents).is_ok());
    }

    fn tempdir() -> TempDir {
        match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => panic!("tempdir: {e}"),
        }
    }

    const ROOT: &str = r#"
dependencies = ["com.runemate:runemate-game-api"]

[project]
name = "woodcutting"

[workspace]
members = ["bots/fishing"]

[manifests.Woodcutter]
main-class = "bots/Woodcutter"
tagline = "Simple woodcutting bot"
description = "Chops trees"
version = "1.0.0"

[manifests.Firemaker]
main-class = "bots/Firemaker"
tagline = "Burns logs"
description = "Lights fires"
version = "1.0.0"
publish = false
"#;

    #[test]
    fn test_load_workspace_with_member() {
        let dir = tempdir();
        write(dir.path(), PROJECT_FILE, ROOT);
        write(dir.path(), "src/main/java/bots/Woodcutter.java", "class Woodcutter {}");
        write(
            dir.path(),
            "bots/fishing/runemate.toml",
            "[project]\nmanifest-format = \"yaml\"\nallow-external-dependencies = true\n",
        );

        let result = Workspace::load(dir.path());
        let Ok(workspace) = result else {
            panic!("load failed: {result:?}");
        };
        assert_eq!(workspace.projects.len(), 2);
        assert_eq!(
            workspace.layout.build_root(),
            workspace.root_dir.join("build")
        );

        let root = &workspace.projects[0];
        assert_eq!(root.name, "woodcutting");
        assert_eq!(
            root.declarations
                .iter()
                .map(|d| d.name().to_string())
                .collect::<Vec<_>>(),
            vec!["Woodcutter", "Firemaker"]
        );
        assert!(!root.declarations[1].is_published());
        assert_eq!(root.source_roots, vec![workspace.root_dir.join("src/main/java")]);
        assert_eq!(root.dependency_policy, ExternalDependencyPolicy::Deny);
        assert_eq!(root.manifest_format, ManifestFormat::Json);

        let member = &workspace.projects[1];
        assert_eq!(member.name, "fishing");
        assert_eq!(member.manifest_format, ManifestFormat::Yaml);
        assert_eq!(member.dependency_policy, ExternalDependencyPolicy::Warn);
        assert!(member.source_roots.is_empty());
    }

    #[test]
    fn test_explicit_source_roots_are_kept_even_if_missing() {
        let dir = tempdir();
        write(
            dir.path(),
            PROJECT_FILE,
            "[project]\nsource-roots = [\".\", \"generated\"]\n",
        );
        let result = Workspace::load(dir.path());
        let Ok(workspace) = result else {
            panic!("load failed: {result:?}");
        };
        let root = &workspace.projects[0];
        assert_eq!(
            root.source_roots,
            vec![root.dir.join("."), root.dir.join("generated")]
        );
    }

    #[test]
    fn test_missing_project_file() {
        let dir = tempdir();
        assert!(matches!(
            Workspace::load(dir.path()),
            Err(ProjectError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_declaration_names_table() {
        let dir = tempdir();
        write(
            dir.path(),
            PROJECT_FILE,
            "[manifests.Broken]\naccess = \"vip\"\n",
        );
        let result = Workspace::load(dir.path());
        let Err(ProjectError::Parse { message, .. }) = result else {
            panic!("expected parse error, got {result:?}");
        };
        assert!(message.contains("manifests.Broken"));
    }

    #[test]
    fn test_nested_workspace_rejected() {
        let dir = tempdir();
        write(dir.path(), PROJECT_FILE, "[workspace]\nmembers = [\"inner\"]\n");
        write(dir.path(), "inner/runemate.toml", "[workspace]\nmembers = []\n");
        assert!(matches!(
            Workspace::load(dir.path()),
            Err(ProjectError::NestedWorkspace { .. })
        ));
    }
}
