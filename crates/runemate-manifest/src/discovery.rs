//! Candidate discovery and batch identity checks
//!
//! Source roots are walked once; only files that pass [`is_candidate`] are
//! handed to a codec. Hidden directories and the excluded tree (the staging
//! area) are never entered. Files that turn out not to be manifests are
//! skipped quietly, malformed ones are logged loudly and skipped as well.

use ahash::AHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::{DirEntry, WalkDir};

use crate::codec::{is_candidate, Codecs, ManifestFormat};
use crate::errors::ManifestError;
use crate::types::Manifest;

/// A decoded manifest and a human-readable label of where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedManifest {
    pub origin: String,
    pub manifest: Manifest,
}

impl SourcedManifest {
    pub fn new(origin: impl Into<String>, manifest: Manifest) -> Self {
        SourcedManifest {
            origin: origin.into(),
            manifest,
        }
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Walk every root outside `exclude` and return the files that look like
/// manifests, sorted by path
pub fn scan_candidates(roots: &[PathBuf], exclude: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for root in roots {
        if !root.is_dir() {
            debug!("Skipping missing source root {}", root.display());
            continue;
        }
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e) && !e.path().starts_with(exclude))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| ManifestFormat::of(e.path()).is_ok())
        {
            let Ok(contents) = fs::read_to_string(entry.path()) else {
                continue;
            };
            if is_candidate(entry.path(), &contents) {
                candidates.push(entry.into_path());
            }
        }
    }
    candidates
}

/// Label a scanned file relative to the project directory
pub fn file_origin(project_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(project_dir).unwrap_or(path);
    format!("file {}", relative.display())
}

/// Decode one scanned file. `Ok(None)` means the file was skipped.
pub fn load_candidate(
    codecs: &Codecs,
    path: &Path,
    origin: &str,
) -> Result<Option<Manifest>, ManifestError> {
    let codec = codecs.for_path(path)?;
    let bytes = fs::read(path)?;
    match codec.decode(&bytes, origin) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(err) if err.is_not_a_manifest() => {
            info!("{}", err);
            Ok(None)
        }
        Err(err @ ManifestError::MalformedManifest { .. }) => {
            error!("{}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Scan the roots and decode every candidate, labelling each relative to `project_dir`
pub fn discover(
    codecs: &Codecs,
    project_dir: &Path,
    roots: &[PathBuf],
    exclude: &Path,
) -> Result<Vec<SourcedManifest>, ManifestError> {
    let mut found = Vec::new();
    for path in scan_candidates(roots, exclude) {
        let origin = file_origin(project_dir, &path);
        if let Some(manifest) = load_candidate(codecs, &path, &origin)? {
            debug!("Discovered manifest '{}' in {}", manifest.internal_id, origin);
            found.push(SourcedManifest::new(origin, manifest));
        }
    }
    Ok(found)
}

/// Fail on the first internalId shared by more than one manifest in the batch
pub fn check_duplicates(batch: &[SourcedManifest]) -> Result<(), ManifestError> {
    let mut groups: AHashMap<&str, Vec<&str>> = AHashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for entry in batch {
        let id = entry.manifest.internal_id.as_str();
        let sources = groups.entry(id).or_insert_with(|| {
            order.push(id);
            Vec::new()
        });
        sources.push(entry.origin.as_str());
    }

    for id in order {
        let Some(sources) = groups.get(id) else {
            continue;
        };
        if sources.len() > 1 {
            return Err(ManifestError::DuplicateIdentity {
                internal_id: id.to_string(),
                sources: sources.iter().map(|s| (*s).to_string()).collect(),
            });
        }
    }
    Ok(())
}
