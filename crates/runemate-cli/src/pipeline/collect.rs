//! Collect stage: copy source roots into the staging sources directory

use runemate_config::BuildLayout;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::PublishError;
use crate::project::Project;

/// Copy every file under the project's source roots, keeping paths relative to
/// each root. Returns the number of files copied.
pub fn run(project: &Project, layout: &BuildLayout) -> Result<usize, PublishError> {
    let destination = layout.sources_dir();
    let staging = layout.staging_root();
    let mut copied = 0;

    for root in &project.source_roots {
        if !root.is_dir() {
            debug!("Source root {} does not exist, skipping", root.display());
            continue;
        }
        copied += copy_tree(root, &destination, &staging)?;
    }

    debug!(
        "Collected {} files for project '{}'",
        copied, project.name
    );
    Ok(copied)
}

fn copy_tree(root: &Path, destination: &Path, skip: &Path) -> Result<usize, PublishError> {
    let mut copied = 0;
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.path().starts_with(skip));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            PublishError::io(path, io::Error::other(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let target = destination.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| PublishError::io(parent, e))?;
        }
        fs::copy(entry.path(), &target).map_err(|e| PublishError::io(entry.path(), e))?;
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::ExternalDependencyPolicy;
    use runemate_manifest::ManifestFormat;
    use tempfile::TempDir;

    fn tempdir() -> TempDir {
        match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => panic!("tempdir: {e}"),
        }
    }

    fn write(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            assert!(fs::create_dir_all(parent).is_ok());
        }
        assert!(fs::write(path, rel).is_ok());
    }

    #[test]
    fn test_copies_roots_relative() {
        let dir = tempdir();
        write(dir.path(), "src/main/java/bots/Woodcutter.java");
        write(dir.path(), "src/main/java/bots/ui/Panel.java");
        write(dir.path(), "src/main/resources/icon.png");

        let project = Project {
            name: "woodcutting".to_string(),
            dir: dir.path().to_path_buf(),
            source_roots: vec![
                dir.path().join("src/main/java"),
                dir.path().join("src/main/resources"),
                dir.path().join("src/main/kotlin"),
            ],
            declarations: Vec::new(),
            dependencies: Vec::new(),
            manifest_format: ManifestFormat::Json,
            dependency_policy: ExternalDependencyPolicy::Deny,
        };
        let layout = BuildLayout::new(dir.path().join("build"));

        let result = run(&project, &layout);
        assert!(matches!(result, Ok(3)));

        let sources = layout.sources_dir();
        assert!(sources.join("bots/Woodcutter.java").is_file());
        assert!(sources.join("bots/ui/Panel.java").is_file());
        assert!(sources.join("icon.png").is_file());
    }

    #[test]
    fn test_staging_area_inside_root_is_not_recopied() {
        let dir = tempdir();
        write(dir.path(), "Bot.java");
        write(dir.path(), "build/runemate/sources/stale.txt");

        let project = Project {
            name: "flat".to_string(),
            dir: dir.path().to_path_buf(),
            source_roots: vec![dir.path().to_path_buf()],
            declarations: Vec::new(),
            dependencies: Vec::new(),
            manifest_format: ManifestFormat::Json,
            dependency_policy: ExternalDependencyPolicy::Deny,
        };
        let layout = BuildLayout::new(dir.path().join("build"));
        assert!(matches!(run(&project, &layout), Ok(1)));
    }
}
