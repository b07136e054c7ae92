//! Validate stage
//!
//! Checks a project's batch: the manifests generated for it plus any manifest
//! files found under its source roots. Generated files must decode; a source
//! file that isn't a manifest is skipped, and the staging area is never
//! scanned even when it sits under a source root. Every manifest in the batch must pass
//! the rules and no two may share an internalId.

use runemate_config::BuildLayout;
use runemate_manifest::{check_duplicates, discover, rules, Codecs, SourcedManifest};
use std::fs;
use tracing::debug;

use super::GeneratedManifest;
use crate::errors::PublishError;
use crate::project::Project;

pub fn run(
    project: &Project,
    layout: &BuildLayout,
    generated: &[GeneratedManifest],
    codecs: &Codecs,
) -> Result<Vec<SourcedManifest>, PublishError> {
    let mut batch = Vec::with_capacity(generated.len());

    for entry in generated {
        let origin = format!("declaration {}", entry.declaration);
        let bytes = fs::read(&entry.path).map_err(|e| PublishError::io(&entry.path, e))?;
        let manifest = codecs.for_format(entry.format).decode(&bytes, &origin)?;
        batch.push(SourcedManifest::new(origin, manifest));
    }

    batch.extend(discover(
        codecs,
        &project.dir,
        &project.source_roots,
        &layout.staging_root(),
    )?);

    let mut accepted = Vec::with_capacity(batch.len());
    for SourcedManifest { origin, manifest } in batch {
        let manifest = rules::validate(manifest, &origin)?;
        accepted.push(SourcedManifest::new(origin, manifest));
    }
    check_duplicates(&accepted)?;

    debug!(
        "Validated {} manifests for project '{}'",
        accepted.len(),
        project.name
    );
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::ExternalDependencyPolicy;
    use runemate_manifest::{ManifestError, ManifestFormat, Rule};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const WOODCUTTER_YAML: &str = "\
mainClass: com/example/bots/Woodcutter
name: Woodcutter
tagline: Simple woodcutting bot
description: Chops trees
version: 1.0.0
internalId: Woodcutter
";

    fn tempdir() -> TempDir {
        match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => panic!("tempdir: {e}"),
        }
    }

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            assert!(fs::create_dir_all(parent).is_ok());
        }
        assert!(fs::write(&path, contents).is_ok());
        path
    }

    fn layout(dir: &Path) -> BuildLayout {
        BuildLayout::new(dir.join("build"))
    }

    fn project(dir: &Path) -> Project {
        Project {
            name: "woodcutting".to_string(),
            dir: dir.to_path_buf(),
            source_roots: vec![dir.join("src/main/resources")],
            declarations: Vec::new(),
            dependencies: Vec::new(),
            manifest_format: ManifestFormat::Yaml,
            dependency_policy: ExternalDependencyPolicy::Deny,
        }
    }

    #[test]
    fn test_generated_and_discovered_pass() {
        let dir = tempdir();
        let generated = vec![GeneratedManifest {
            declaration: "Woodcutter".to_string(),
            path: write(dir.path(), "build/woodcutter.manifest.yaml", WOODCUTTER_YAML),
            format: ManifestFormat::Yaml,
        }];
        write(
            dir.path(),
            "src/main/resources/fisher.manifest.yml",
            &WOODCUTTER_YAML.replace("Woodcutter", "Fisher"),
        );
        write(
            dir.path(),
            "src/main/resources/config.yml",
            "mainClass: not really\n",
        );

        let result = run(&project(dir.path()), &layout(dir.path()), &generated, &Codecs::new());
        let Ok(batch) = result else {
            panic!("validate failed: {result:?}");
        };
        let origins: Vec<&str> = batch.iter().map(|s| s.origin.as_str()).collect();
        assert_eq!(
            origins,
            vec![
                "declaration Woodcutter",
                "file src/main/resources/fisher.manifest.yml"
            ]
        );
    }

    #[test]
    fn test_duplicate_between_declaration_and_file() {
        let dir = tempdir();
        let generated = vec![GeneratedManifest {
            declaration: "Woodcutter".to_string(),
            path: write(dir.path(), "build/woodcutter.manifest.yaml", WOODCUTTER_YAML),
            format: ManifestFormat::Yaml,
        }];
        write(
            dir.path(),
            "src/main/resources/copy.manifest.yml",
            WOODCUTTER_YAML,
        );

        let result = run(&project(dir.path()), &layout(dir.path()), &generated, &Codecs::new());
        let Err(PublishError::Manifest(ManifestError::DuplicateIdentity {
            internal_id,
            sources,
        })) = result
        else {
            panic!("expected duplicate, got {result:?}");
        };
        assert_eq!(internal_id, "Woodcutter");
        assert_eq!(
            sources,
            vec![
                "declaration Woodcutter",
                "file src/main/resources/copy.manifest.yml"
            ]
        );
    }

    #[test]
    fn test_discovered_file_breaking_a_rule() {
        let dir = tempdir();
        write(
            dir.path(),
            "src/main/resources/paid.manifest.yml",
            &format!("{}price: 1.50\naccess: SUPPORTER\n", WOODCUTTER_YAML),
        );
        let result = run(&project(dir.path()), &layout(dir.path()), &[], &Codecs::new());
        let Err(PublishError::Manifest(ManifestError::Validation { rule, origin })) = result else {
            panic!("expected rule failure, got {result:?}");
        };
        assert_eq!(rule, Rule::PriceBadAccess);
        assert_eq!(origin, "file src/main/resources/paid.manifest.yml");
    }

    #[test]
    fn test_numeric_version_still_reaches_the_rules() {
        let dir = tempdir();
        write(
            dir.path(),
            "src/main/resources/paid.manifest.yml",
            "mainClass: bots/Paid\nname: Paid\ntagline: t\ndescription: d\nversion: 2\nprice: 5\naccess: SUPPORTER\n",
        );
        let result = run(&project(dir.path()), &layout(dir.path()), &[], &Codecs::new());
        let Err(PublishError::Manifest(ManifestError::Validation { rule, .. })) = result else {
            panic!("expected rule failure, got {result:?}");
        };
        assert_eq!(rule, Rule::PriceBadAccess);
    }

    #[test]
    fn test_staged_copy_is_not_a_duplicate() {
        let dir = tempdir();
        write(dir.path(), "bot.yml", WOODCUTTER_YAML);
        let mut project = project(dir.path());
        project.source_roots = vec![dir.path().to_path_buf()];
        let layout = layout(dir.path());

        let first = run(&project, &layout, &[], &Codecs::new());
        assert!(first.as_ref().is_ok_and(|b| b.len() == 1), "{first:?}");

        assert!(matches!(crate::pipeline::collect::run(&project, &layout), Ok(1)));
        assert!(layout.sources_dir().join("bot.yml").is_file());

        let second = run(&project, &layout, &[], &Codecs::new());
        let Ok(batch) = second else {
            panic!("validate after collect failed: {second:?}");
        };
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].origin, "file bot.yml");
    }

    #[test]
    fn test_malformed_generated_file_is_fatal() {
        let dir = tempdir();
        let generated = vec![GeneratedManifest {
            declaration: "Woodcutter".to_string(),
            path: write(
                dir.path(),
                "build/woodcutter.manifest.json",
                r#"{"mainClass":"bots/Woodcutter","name":"Woodcutter","tagline":"t","description":"d","version":"1","access":"VIP"}"#,
            ),
            format: ManifestFormat::Json,
        }];
        let result = run(&project(dir.path()), &layout(dir.path()), &generated, &Codecs::new());
        let Err(PublishError::Manifest(ManifestError::MalformedManifest { origin, .. })) = result else {
            panic!("expected malformed manifest, got {result:?}");
        };
        assert_eq!(origin, "declaration Woodcutter");
    }

    #[test]
    fn test_unreadable_generated_file_is_fatal() {
        let dir = tempdir();
        let generated = vec![GeneratedManifest {
            declaration: "Gone".to_string(),
            path: dir.path().join("missing.manifest.json"),
            format: ManifestFormat::Json,
        }];
        assert!(matches!(
            run(&project(dir.path()), &layout(dir.path()), &generated, &Codecs::new()),
            Err(PublishError::Io { .. })
        ));
    }
}
