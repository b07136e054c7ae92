//! Dependency allow-list
//!
//! Bots published through the store may only depend on the RuneMate API and a
//! handful of libraries bundled with the client. Keys are `group:artifact`; a
//! trailing `:version` is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use runemate_logger as logger;

use crate::errors::DependencyError;
use crate::project::Project;

const ALLOWED_PATTERNS: &[&str] = &[
    "com.runemate:.*",
    "org.openjfx:.*",
    "org.json:json",
    "org.jblas:jblas",
    "org.jetbrains.kotlin:.*",
    "org.projectlombok:lombok",
    "org.jetbrains:annotations",
];

/// Patterns anchored for full-key matching
static ALLOW_LIST: Lazy<Vec<Regex>> = Lazy::new(|| {
    ALLOWED_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(&format!("^(?:{})$", p)).ok())
        .collect()
});

/// What to do with a dependency outside the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalDependencyPolicy {
    /// Fail the build
    #[default]
    Deny,
    /// Log a warning and continue
    Warn,
}

impl ExternalDependencyPolicy {
    /// Map the `allow-external-dependencies` project flag
    pub fn from_allow_flag(allow: bool) -> Self {
        if allow {
            ExternalDependencyPolicy::Warn
        } else {
            ExternalDependencyPolicy::Deny
        }
    }
}

/// Strip any version suffix: `group:artifact:1.0` -> `group:artifact`
pub fn dependency_key(coordinate: &str) -> &str {
    let trimmed = coordinate.trim();
    match trimmed.match_indices(':').nth(1) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

pub fn is_allowed(coordinate: &str) -> bool {
    let key = dependency_key(coordinate);
    ALLOW_LIST.iter().any(|re| re.is_match(key))
}

/// Verdict for one declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyVerdict {
    pub key: String,
    pub allowed: bool,
}

pub fn audit(dependencies: &[String]) -> Vec<DependencyVerdict> {
    dependencies
        .iter()
        .map(|coordinate| DependencyVerdict {
            key: dependency_key(coordinate).to_string(),
            allowed: is_allowed(coordinate),
        })
        .collect()
}

/// Apply the policy to every dependency: the first external one fails under
/// `Deny`, each one is warned about under `Warn`
pub fn enforce(
    dependencies: &[String],
    policy: ExternalDependencyPolicy,
) -> Result<(), DependencyError> {
    for verdict in audit(dependencies) {
        if verdict.allowed {
            continue;
        }
        let err = DependencyError::External { key: verdict.key };
        match policy {
            ExternalDependencyPolicy::Deny => return Err(err),
            ExternalDependencyPolicy::Warn => logger::warn(&err.to_string()),
        }
    }
    Ok(())
}

pub fn enforce_project(project: &Project) -> Result<(), DependencyError> {
    enforce(&project.dependencies, project.dependency_policy)
}
