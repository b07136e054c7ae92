use crate::common::GlobalOpts;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use runemate_config::Config;
use runemate_logger as logger;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set a configuration value (submission-key, submission-url)
    Set { key: String, value: String },
    /// Get or set the path to the config file.
    /// If `new_path` is provided, later commands read the config from there.
    /// If omitted, the current configuration file path is printed.
    Path {
        /// Optional new config path to set
        new_path: Option<String>,
    },
}

/// Hide all but the last four characters of a credential
fn mask(value: &str) -> String {
    let visible: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", visible)
    }
}

pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load().context("Failed to load config")?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    let shown = if key == "submission-key" {
                        mask(&value)
                    } else {
                        value
                    };
                    println!("  {}: {}", key.cyan(), shown);
                }
            }
            println!(
                "  {}: {}",
                "effective submission-url".dimmed(),
                config.submission_url()
            );
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load().context("Failed to load config")?;
            config.set(&key, value)?;
            let path = config.save().context("Failed to save config")?;
            logger::debug(&format!("Saved config to {}", path.display()));
            logger::success(&format!("Set {}", key));
            Ok(())
        }
        ConfigAction::Path { new_path } => {
            let config_path = Config::path();
            logger::debug(&format!("Reading config from: {}", config_path.display()));
            match new_path {
                Some(p) => {
                    Config::set_pointer(&p).context("Failed to set config path")?;
                    logger::success(&format!("Config path set to {}", p));
                }
                None => {
                    println!("{}", config_path.display());
                    if let Some(target) = Config::pointer_target() {
                        println!("{} {}", "overridden-by".cyan(), target.display());
                    }
                }
            }
            Ok(())
        }
    }
}
