use crate::common::GlobalOpts;
use crate::project::PROJECT_FILE;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use runemate_logger as logger;
use std::fs;
use std::path::Path;

const DEFAULT_NAME: &str = "my-bot";

const PROJECT_TEMPLATE: &str = r#"# RuneMate project
# Only allow-listed dependencies (com.runemate, org.openjfx, kotlin, lombok, ...)
# may be bundled unless allow-external-dependencies is set.
dependencies = [
    "com.runemate:runemate-game-api",
]

[project]
name = "{{name}}"
# build-dir = "build"
# source-roots = ["src/main/java", "src/main/kotlin", "src/main/resources"]
# manifest-format = "json"
allow-external-dependencies = false

# One table per bot; the table key is the store display name
[manifests.{{class}}]
main-class = "com/example/bots/{{class}}"
tagline = "A short one-line pitch"
description = "What the bot does, in at most 110 characters"
version = "1.0.0"
categories = ["OTHER"]
# internal-id = "{{class}}"
# access = "PUBLIC"
# tags = ["example"]

# [manifests.{{class}}.pricing]
# price = "0.00"

# [manifests.{{class}}.features]
# required = ["DIRECT_INPUT"]
"#;

/// `my-bot` -> `MyBot`
fn class_name(name: &str) -> String {
    let class: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if class.is_empty() || class.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Bot{}", class)
    } else {
        class
    }
}

fn render(name: &str) -> String {
    PROJECT_TEMPLATE
        .replace("{{name}}", name)
        .replace("{{class}}", &class_name(name))
}

fn default_name(dir: &Path) -> String {
    fs::canonicalize(dir)
        .ok()
        .and_then(|d| d.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

/// Write a starter `runemate.toml`; an existing file is never overwritten
pub fn handle_init(name: Option<String>, opts: &GlobalOpts) -> Result<()> {
    let dir = opts.project_dir();
    let target = dir.join(PROJECT_FILE);
    logger::debug(&format!("Target file: {}", target.display()));

    if target.exists() {
        bail!("{} already exists", target.display());
    }

    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let name = name.unwrap_or_else(|| default_name(&dir));
    fs::write(&target, render(&name))
        .with_context(|| format!("Failed to write {}", target.display()))?;

    logger::success(&format!("Created project file: {}", target.display()));
    if !logger::is_quiet() {
        println!();
        println!("Next steps:");
        println!("  1. Edit {} with your bot details", PROJECT_FILE.bold());
        println!("  2. Check dependencies: runemate deps");
        println!("  3. Validate manifests: runemate validate");
        println!("  4. Submit for review: runemate submit --key <KEY>");
    }
    Ok(())
}
