//! Generate stage: declarations to manifest files under the staging area

use runemate_config::BuildLayout;
use runemate_logger as logger;
use runemate_manifest::{rules, Codecs, Manifest};
use std::fs;
use tracing::debug;

use super::GeneratedManifest;
use crate::errors::PublishError;
use crate::project::Project;

/// Build and validate every published declaration, then write one file per slug.
///
/// Nothing is written unless every declaration validates. A single file that
/// cannot be written is logged and skipped.
pub fn run(
    project: &Project,
    layout: &BuildLayout,
    codecs: &Codecs,
) -> Result<Vec<GeneratedManifest>, PublishError> {
    let mut built: Vec<(String, String, Manifest)> = Vec::new();

    for declaration in project.declarations.iter().filter(|d| d.is_published()) {
        let origin = format!("declaration {}", declaration.name());
        let manifest = rules::validate(declaration.build()?, &origin)?;
        let slug = manifest.slug();

        match built.iter().position(|(existing, _, _)| *existing == slug) {
            Some(index) => {
                logger::warn(&format!(
                    "Declarations '{}' and '{}' share the file name '{}'; keeping '{}'",
                    built[index].1,
                    declaration.name(),
                    slug,
                    declaration.name()
                ));
                built[index] = (slug, declaration.name().to_string(), manifest);
            }
            None => built.push((slug, declaration.name().to_string(), manifest)),
        }
    }

    if built.is_empty() {
        debug!("Project '{}' declares no published manifests", project.name);
        return Ok(Vec::new());
    }

    let dir = layout.manifests_dir();
    fs::create_dir_all(&dir).map_err(|e| PublishError::io(&dir, e))?;

    let format = project.manifest_format;
    let codec = codecs.for_format(format);
    let mut written = Vec::with_capacity(built.len());

    for (slug, declaration, manifest) in built {
        let path = layout.manifest_path(&slug, format.extension());
        let bytes = match codec.encode(&manifest) {
            Ok(bytes) => bytes,
            Err(e) => {
                logger::error(&format!("Skipping declaration '{}': {}", declaration, e));
                continue;
            }
        };
        if let Err(e) = fs::write(&path, bytes) {
            logger::error(&format!(
                "Failed to write manifest {}: {}",
                path.display(),
                e
            ));
            continue;
        }
        logger::step(&format!("Wrote {}", path.display()));
        written.push(GeneratedManifest {
            declaration,
            path,
            format,
        });
    }

    Ok(written)
}
