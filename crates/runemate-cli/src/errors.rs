//! Error types for the runemate binary
//!
//! Library crates carry their own errors; everything that can stop a command
//! in this crate is one of the enums below.

use runemate_manifest::ManifestError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::submission::SubmissionError;

/// Errors loading a `runemate.toml` project or workspace
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("No project file found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Workspace member '{member}' is itself a workspace; nested workspaces are not supported")]
    NestedWorkspace { member: String },
}

/// A resolved dependency outside the allow-list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("RuneMate does not support external dependencies, please remove: {key}")]
    External { key: String },
}

/// Errors that stop a publish pipeline stage
#[derive(Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("I/O failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("No submission key configured. Pass --key, set RUNEMATE_SUBMISSION_KEY or run `runemate config set submission-key <KEY>`")]
    MissingCredential,
}

impl PublishError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PublishError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_error_display() {
        let err = DependencyError::External {
            key: "com.google.guava:guava".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "RuneMate does not support external dependencies, please remove: com.google.guava:guava"
        );
    }

    #[test]
    fn test_manifest_errors_pass_through() {
        let err = PublishError::from(ManifestError::DuplicateIdentity {
            internal_id: "Fisher".to_string(),
            sources: vec!["file a.yml".to_string(), "file b.yml".to_string()],
        });
        assert_eq!(
            err.to_string(),
            "2 manifests have the same internalId 'Fisher': [file a.yml, file b.yml]"
        );
    }
}
