use anyhow::{Context, Result};
use colored::Colorize;

use crate::common::GlobalOpts;
use crate::dependencies::{self, audit, ExternalDependencyPolicy};
use crate::project::Workspace;

/// Print the allow-list verdict for every declared dependency
pub fn handle_deps(opts: &GlobalOpts) -> Result<()> {
    let dir = opts.project_dir();
    let workspace = Workspace::load(&dir)
        .with_context(|| format!("Failed to load project in {}", dir.display()))?;

    let mut first_failure = None;
    for project in &workspace.projects {
        let policy = match project.dependency_policy {
            ExternalDependencyPolicy::Deny => "deny external",
            ExternalDependencyPolicy::Warn => "warn on external",
        };
        println!("{} {}", project.path_label().bold(), format!("({})", policy).dimmed());

        let verdicts = audit(&project.dependencies);
        if verdicts.is_empty() {
            println!("  {}", "(no dependencies)".dimmed());
        }
        for verdict in verdicts {
            if verdict.allowed {
                println!("  {} {}", "✔".green(), verdict.key);
            } else {
                println!("  {} {}", "✘".red(), verdict.key.red());
            }
        }

        if let Err(e) = dependencies::enforce_project(project) {
            if first_failure.is_none() {
                first_failure = Some(e);
            }
        }
    }

    match first_failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
