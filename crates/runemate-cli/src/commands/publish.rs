//! Stage commands: `generate`, `validate`, `collect`, `bundle` and `submit`

use anyhow::{Context, Result};
use colored::Colorize;
use runemate_config::Config;
use runemate_logger as logger;

use crate::common::GlobalOpts;
use crate::pipeline::{Pipeline, PipelineContext, PipelineReport, StageKind, SubmissionSettings};
use crate::project::Workspace;
use crate::submission::{
    resolve_credential, ReqwestTransport, SubmissionClient, CREDENTIAL_ENV,
};

/// Run every stage `target` depends on, then `target` itself
pub fn handle_stage(target: StageKind, key: Option<String>, opts: &GlobalOpts) -> Result<()> {
    let dir = opts.project_dir();
    logger::debug(&format!("Loading project from {}", dir.display()));
    let workspace = Workspace::load(&dir)
        .with_context(|| format!("Failed to load project in {}", dir.display()))?;

    let pipeline = Pipeline::assemble(&workspace);
    let mut ctx = PipelineContext::new(&workspace);
    if target == StageKind::Submit {
        ctx = ctx.with_submission(submission_settings(key)?);
    }

    let report = pipeline.run(target, &mut ctx)?;
    print_summary(target, &report);
    Ok(())
}

fn submission_settings(key: Option<String>) -> Result<SubmissionSettings> {
    let config = Config::load().context("Failed to load config")?;
    let env = std::env::var(CREDENTIAL_ENV).ok();
    let credential = resolve_credential(
        key.as_deref(),
        env.as_deref(),
        config.submission_key.as_deref(),
    );
    let transport = ReqwestTransport::new()?;
    Ok(SubmissionSettings {
        credential,
        client: SubmissionClient::new(config.submission_url(), Box::new(transport)),
    })
}

fn print_summary(target: StageKind, report: &PipelineReport) {
    if logger::is_quiet() {
        return;
    }
    for path in &report.generated {
        logger::info(&format!("Generated {}", path.display()));
    }

    match target {
        StageKind::Generate => println!(
            "{} Generated {} manifest(s)",
            "✔".green(),
            report.generated.len()
        ),
        StageKind::Validate => println!(
            "{} Validated {} manifest(s)",
            "✔".green(),
            report.validated
        ),
        StageKind::Collect => println!(
            "{} Collected {} source file(s)",
            "✔".green(),
            report.collected
        ),
        StageKind::Bundle | StageKind::Clean => {
            if let Some(archive) = &report.archive {
                println!("{} Bundled {}", "✔".green(), archive.display());
            }
        }
        StageKind::Submit => {
            if let Some(receipt) = &report.submission {
                println!(
                    "{} Submitted {} ({} bytes)",
                    "✔".green(),
                    receipt.archive.display(),
                    receipt.bytes
                );
            }
        }
    }
    logger::success(&format!("{} stage(s) completed", report.stages.len()));
}
