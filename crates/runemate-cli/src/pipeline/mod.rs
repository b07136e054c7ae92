//! Publish pipeline
//!
//! Stages form a small dependency graph assembled once per run:
//!
//! ```text
//! per project:  generate -> validate -> collect ─┐
//! root, once:   clean ─────────────────────────────> bundle -> submit
//! ```
//!
//! [`Pipeline::plan`] resolves the stages a target needs in dependency order.
//! `clean` always runs first so a bundle never picks up stale files.

pub mod bundle;
pub mod collect;
pub mod generate;
pub mod submit;
pub mod validate;

use runemate_logger as logger;
use runemate_manifest::{Codecs, ManifestFormat};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use crate::dependencies;
use crate::errors::PublishError;
use crate::project::Workspace;
use crate::submission::{SubmissionClient, SubmissionReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Clean,
    Generate,
    Validate,
    Collect,
    Bundle,
    Submit,
}

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Clean => "clean",
            StageKind::Generate => "generate",
            StageKind::Validate => "validate",
            StageKind::Collect => "collect",
            StageKind::Bundle => "bundle",
            StageKind::Submit => "submit",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a stage runs: inside one project (by index) or once for the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Project(usize),
    Root,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId {
    pub kind: StageKind,
    pub scope: Scope,
}

impl StageId {
    pub fn project(kind: StageKind, index: usize) -> Self {
        StageId {
            kind,
            scope: Scope::Project(index),
        }
    }

    pub fn root(kind: StageKind) -> Self {
        StageId {
            kind,
            scope: Scope::Root,
        }
    }
}

#[derive(Debug, Clone)]
struct Registration {
    id: StageId,
    after: Vec<StageId>,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Registration>,
    project_labels: Vec<String>,
}

/// A manifest file written by the generate stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedManifest {
    pub declaration: String,
    pub path: PathBuf,
    pub format: ManifestFormat,
}

/// Credential and client used by the submit stage
pub struct SubmissionSettings {
    pub credential: Option<String>,
    pub client: SubmissionClient,
}

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<String>,
    pub generated: Vec<PathBuf>,
    pub validated: usize,
    pub collected: usize,
    pub archive: Option<PathBuf>,
    pub submission: Option<SubmissionReceipt>,
}

/// Mutable state threaded through the stages of one run
pub struct PipelineContext<'a> {
    pub workspace: &'a Workspace,
    pub codecs: Codecs,
    pub submission: Option<SubmissionSettings>,
    generated: Vec<Vec<GeneratedManifest>>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        PipelineContext {
            workspace,
            codecs: Codecs::new(),
            submission: None,
            generated: vec![Vec::new(); workspace.projects.len()],
        }
    }

    pub fn with_submission(mut self, settings: SubmissionSettings) -> Self {
        self.submission = Some(settings);
        self
    }

    pub fn generated(&self, project: usize) -> &[GeneratedManifest] {
        self.generated.get(project).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Pipeline {
    /// Register every stage for the workspace
    pub fn assemble(workspace: &Workspace) -> Self {
        let mut pipeline = Pipeline {
            stages: Vec::new(),
            project_labels: workspace.projects.iter().map(|p| p.path_label()).collect(),
        };

        for index in 0..workspace.projects.len() {
            let generate = StageId::project(StageKind::Generate, index);
            let validate = StageId::project(StageKind::Validate, index);
            let collect = StageId::project(StageKind::Collect, index);
            pipeline.register(generate, Vec::new());
            pipeline.register(validate, vec![generate]);
            pipeline.register(collect, vec![validate]);
        }
        pipeline.register_root_stages();
        pipeline
    }

    /// Add `clean`, `bundle` and `submit`; a second call changes nothing
    pub fn register_root_stages(&mut self) -> bool {
        let clean = StageId::root(StageKind::Clean);
        let bundle = StageId::root(StageKind::Bundle);
        let submit = StageId::root(StageKind::Submit);

        if self.contains(submit) {
            return false;
        }

        let mut bundle_after = vec![clean];
        bundle_after.extend(
            self.stages
                .iter()
                .filter(|r| r.id.kind == StageKind::Collect)
                .map(|r| r.id),
        );

        self.register(clean, Vec::new());
        self.register(bundle, bundle_after);
        self.register(submit, vec![bundle]);
        true
    }

    fn register(&mut self, id: StageId, after: Vec<StageId>) -> bool {
        if self.contains(id) {
            return false;
        }
        self.stages.push(Registration { id, after });
        true
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.stages.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn dependencies_of(&self, id: StageId) -> &[StageId] {
        self.stages
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.after.as_slice())
            .unwrap_or_default()
    }

    /// Stages needed to reach every stage of `target`, in execution order
    pub fn plan(&self, target: StageKind) -> Vec<StageId> {
        let mut ordered = Vec::new();
        for registration in self.stages.iter().filter(|r| r.id.kind == target) {
            self.visit(registration.id, &mut ordered);
        }
        // Stable: everything else keeps dependency order
        ordered.sort_by_key(|id| id.kind != StageKind::Clean);
        ordered
    }

    fn visit(&self, id: StageId, ordered: &mut Vec<StageId>) {
        if ordered.contains(&id) {
            return;
        }
        for dependency in self.dependencies_of(id) {
            self.visit(*dependency, ordered);
        }
        ordered.push(id);
    }

    /// Gradle-style path such as `:woodcutting:generate` or `:bundle`
    pub fn label(&self, id: StageId) -> String {
        match id.scope {
            Scope::Root => format!(":{}", id.kind),
            Scope::Project(index) => match self.project_labels.get(index) {
                Some(project) => format!("{}:{}", project, id.kind),
                None => format!(":{}", id.kind),
            },
        }
    }

    /// Check dependencies, then execute the plan for `target`
    pub fn run(
        &self,
        target: StageKind,
        ctx: &mut PipelineContext<'_>,
    ) -> Result<PipelineReport, PublishError> {
        for project in &ctx.workspace.projects {
            dependencies::enforce_project(project)?;
        }

        let mut report = PipelineReport::default();
        for id in self.plan(target) {
            let label = self.label(id);
            logger::lifecycle(&format!("Task {}", label));
            self.execute(id, ctx, &mut report)?;
            report.stages.push(label);
        }
        Ok(report)
    }

    fn execute(
        &self,
        id: StageId,
        ctx: &mut PipelineContext<'_>,
        report: &mut PipelineReport,
    ) -> Result<(), PublishError> {
        let workspace = ctx.workspace;
        let layout = &workspace.layout;

        match (id.kind, id.scope) {
            (StageKind::Clean, _) => bundle::clean(layout),
            (StageKind::Generate, Scope::Project(index)) => {
                let Some(project) = workspace.projects.get(index) else {
                    return Ok(());
                };
                let written = generate::run(project, layout, &ctx.codecs)?;
                report
                    .generated
                    .extend(written.iter().map(|g| g.path.clone()));
                if let Some(slot) = ctx.generated.get_mut(index) {
                    *slot = written;
                }
                Ok(())
            }
            (StageKind::Validate, Scope::Project(index)) => {
                let Some(project) = workspace.projects.get(index) else {
                    return Ok(());
                };
                let batch = validate::run(project, layout, ctx.generated(index), &ctx.codecs)?;
                report.validated += batch.len();
                Ok(())
            }
            (StageKind::Collect, Scope::Project(index)) => {
                let Some(project) = workspace.projects.get(index) else {
                    return Ok(());
                };
                report.collected += collect::run(project, layout)?;
                Ok(())
            }
            (StageKind::Bundle, _) => {
                report.archive = Some(bundle::run(layout)?);
                Ok(())
            }
            (StageKind::Submit, _) => {
                let project_name = workspace
                    .projects
                    .first()
                    .map_or("project", |p| p.name.as_str());
                let settings = ctx
                    .submission
                    .as_ref()
                    .ok_or(PublishError::MissingCredential)?;
                report.submission = Some(submit::run(layout, project_name, settings)?);
                Ok(())
            }
            (kind, Scope::Root) => {
                debug!("Stage {} has no root-scoped form", kind);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::ExternalDependencyPolicy;
    use crate::project::Project;
    use runemate_config::BuildLayout;

    fn workspace(names: &[&str]) -> Workspace {
        Workspace {
            root_dir: PathBuf::from("/work"),
            layout: BuildLayout::new("/work/build"),
            projects: names
                .iter()
                .map(|name| Project {
                    name: (*name).to_string(),
                    dir: PathBuf::from("/work").join(name),
                    source_roots: Vec::new(),
                    declarations: Vec::new(),
                    dependencies: Vec::new(),
                    manifest_format: ManifestFormat::Json,
                    dependency_policy: ExternalDependencyPolicy::Deny,
                })
                .collect(),
        }
    }

    fn labels(pipeline: &Pipeline, target: StageKind) -> Vec<String> {
        pipeline
            .plan(target)
            .into_iter()
            .map(|id| pipeline.label(id))
            .collect()
    }

    #[test]
    fn test_plan_single_project_submit() {
        let pipeline = Pipeline::assemble(&workspace(&["woodcutting"]));
        assert_eq!(
            labels(&pipeline, StageKind::Submit),
            vec![
                ":clean",
                ":woodcutting:generate",
                ":woodcutting:validate",
                ":woodcutting:collect",
                ":bundle",
                ":submit",
            ]
        );
    }

    #[test]
    fn test_plan_up_to_validate_skips_clean() {
        let pipeline = Pipeline::assemble(&workspace(&["root", "fishing"]));
        assert_eq!(
            labels(&pipeline, StageKind::Validate),
            vec![
                ":root:generate",
                ":root:validate",
                ":fishing:generate",
                ":fishing:validate",
            ]
        );
    }

    #[test]
    fn test_bundle_waits_for_every_project() {
        let pipeline = Pipeline::assemble(&workspace(&["root", "fishing", "mining"]));
        let plan = labels(&pipeline, StageKind::Bundle);
        assert_eq!(plan.first().map(String::as_str), Some(":clean"));
        assert_eq!(plan.last().map(String::as_str), Some(":bundle"));
        for project in ["root", "fishing", "mining"] {
            assert!(plan.contains(&format!(":{}:collect", project)));
        }
        assert_eq!(plan.len(), 11);
    }

    #[test]
    fn test_root_stages_register_once() {
        let mut pipeline = Pipeline::assemble(&workspace(&["root", "fishing"]));
        let before = pipeline.len();
        assert!(!pipeline.register_root_stages());
        assert_eq!(pipeline.len(), before);
        assert_eq!(before, 2 * 3 + 3);
    }

    fn tempdir() -> tempfile::TempDir {
        match tempfile::TempDir::new() {
            Ok(dir) => dir,
            Err(e) => panic!("tempdir: {e}"),
        }
    }

    fn write(dir: &std::path::Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            assert!(std::fs::create_dir_all(parent).is_ok());
        }
        assert!(std::fs::write(path, contents).is_ok());
    }

    const PROJECT: &str = r#"
dependencies = ["com.runemate:runemate-game-api:1.0"]

[project]
name = "woodcutting"

[manifests.Woodcutter]
main-class = "com/example/bots/Woodcutter"
tagline = "Simple woodcutting bot"
description = "Chops trees"
version = "1.0.0"
"#;

    #[test]
    fn test_full_run_submits_bundle() {
        let dir = tempdir();
        write(dir.path(), "runemate.toml", PROJECT);
        write(dir.path(), "src/main/java/com/example/bots/Woodcutter.java", "class Woodcutter {}");
        let Ok(ws) = Workspace::load(dir.path()) else {
            panic!("workspace did not load");
        };

        let fake = crate::submission::tests::FakeTransport::answering(200, "");
        let pipeline = Pipeline::assemble(&ws);
        let mut ctx = PipelineContext::new(&ws).with_submission(SubmissionSettings {
            credential: Some("key".to_string()),
            client: SubmissionClient::new("https://example.test/submit", Box::new(fake.clone())),
        });

        let result = pipeline.run(StageKind::Submit, &mut ctx);
        let Ok(report) = result else {
            panic!("run failed: {result:?}");
        };
        assert_eq!(report.stages.len(), 6);
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.validated, 1);
        assert_eq!(report.collected, 1);
        assert_eq!(report.archive, Some(ws.layout.archive_path()));
        assert!(report.submission.is_some());
        assert_eq!(fake.seen.borrow().len(), 1);
    }

    #[test]
    fn test_external_dependency_stops_before_any_stage() {
        let dir = tempdir();
        write(
            dir.path(),
            "runemate.toml",
            &PROJECT.replace("com.runemate:runemate-game-api:1.0", "com.google.guava:guava:33.0"),
        );
        let Ok(ws) = Workspace::load(dir.path()) else {
            panic!("workspace did not load");
        };
        let pipeline = Pipeline::assemble(&ws);
        let mut ctx = PipelineContext::new(&ws);
        let result = pipeline.run(StageKind::Generate, &mut ctx);
        assert!(matches!(result, Err(PublishError::Dependency(_))));
        assert!(!ws.layout.manifests_dir().exists());
    }

    #[test]
    fn test_submit_without_settings_fails_before_network() {
        let ws = workspace(&[]);
        let pipeline = Pipeline::assemble(&ws);
        let mut ctx = PipelineContext::new(&ws);
        let mut report = PipelineReport::default();
        let result = pipeline.execute(StageId::root(StageKind::Submit), &mut ctx, &mut report);
        assert!(matches!(result, Err(PublishError::MissingCredential)));
    }
}
