use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::rules::Rule;

/// Errors that can occur while declaring, decoding or validating bot manifests
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a manifest at all (wrong shape, missing fields, unparseable)
    #[error("{origin} was not parseable as a manifest: {reason}")]
    NotAManifest { origin: String, reason: String },

    /// The input looks like a manifest but a value has the wrong type or shape
    #[error("Invalid value in {origin}: {detail}")]
    MalformedManifest { origin: String, detail: String },

    #[error("Invalid manifest: {} ({origin})", rule.description())]
    Validation { rule: Rule, origin: String },

    #[error("{} manifests have the same internalId '{internal_id}': [{}]", sources.len(), sources.join(", "))]
    DuplicateIdentity {
        internal_id: String,
        sources: Vec<String>,
    },

    #[error("Missing properties {} in {declaration}", format_fields(fields))]
    MissingRequiredFields {
        declaration: String,
        fields: Vec<&'static str>,
    },

    #[error("Unsupported manifest format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to encode manifest: {0}")]
    Encode(String),
}

impl ManifestError {
    /// Whether this failure only means "this file isn't ours"
    pub fn is_not_a_manifest(&self) -> bool {
        matches!(self, ManifestError::NotAManifest { .. })
    }
}

fn format_fields(fields: &[&'static str]) -> String {
    fields
        .iter()
        .map(|f| format!("'{}'", f))
        .collect::<Vec<_>>()
        .join(", ")
}
