//! User-facing output for the runemate CLI
//!
//! Every message is appended to a per-run log file; what reaches the console
//! depends on the verbosity chosen at startup:
//!
//! | level       | console            |
//! |-------------|--------------------|
//! | `lifecycle` | unless `--quiet`   |
//! | `info`      | `-v`               |
//! | `debug`     | `-v`               |
//! | `step`      | `-vv`              |
//! | `warn`      | always             |
//! | `error`     | always             |
//! | `success`   | unless `--quiet`   |

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub const LOG_FILE_NAME: &str = "runemate.log";

#[derive(Debug)]
struct LoggerState {
    log_file: Option<PathBuf>,
    verbosity: u8,
    quiet: bool,
}

static STATE: Mutex<LoggerState> = Mutex::new(LoggerState {
    log_file: None,
    verbosity: 0,
    quiet: false,
});
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

pub fn get_verbosity() -> u8 {
    STATE.lock().ok().map_or(0, |s| s.verbosity)
}

pub fn is_quiet() -> bool {
    STATE.lock().ok().is_some_and(|s| s.quiet)
}

/// Set console verbosity and open a fresh log file in the user config directory
pub fn init_with_verbosity(verbosity: u8, quiet: bool) -> Result<(), String> {
    let dir = log_dir().ok_or("Could not determine home directory")?;
    init_in(&dir, verbosity, quiet)
}

/// Same as [`init_with_verbosity`] with an explicit log directory
pub fn init_in(dir: &Path, verbosity: u8, quiet: bool) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;

    let log_file = dir.join(LOG_FILE_NAME);
    // One log per run
    if log_file.exists() {
        fs::remove_file(&log_file).map_err(|e| format!("Failed to reset log file: {}", e))?;
    }

    let mut state = STATE
        .lock()
        .map_err(|_| "Logger state poisoned".to_string())?;
    state.log_file = Some(log_file);
    state.verbosity = verbosity;
    state.quiet = quiet;
    Ok(())
}

fn log_dir() -> Option<PathBuf> {
    #[cfg(not(target_os = "windows"))]
    let base = dirs::home_dir().map(|home| home.join(".config"));

    #[cfg(target_os = "windows")]
    let base = dirs::config_dir();

    base.map(|dir| dir.join("runemate"))
}

fn write_to_log(tag: &str, message: &str) {
    let Some(path) = get_log_path() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{}] {} {}", timestamp, tag, message);
    }
}

/// Progress of the build itself, e.g. "> Task :generate"
pub fn lifecycle(message: &str) {
    write_to_log("LIFECYCLE", message);
    if !is_quiet() {
        eprintln!("{} {}", ">".cyan().bold(), message);
    }
}

pub fn info(message: &str) {
    write_to_log("INFO", message);
    if get_verbosity() >= 1 {
        eprintln!("{}", message);
    }
}

pub fn debug(message: &str) {
    write_to_log("DEBUG", message);
    if get_verbosity() >= 1 {
        eprintln!("{} {}", "DEBUG:".blue().bold(), message);
    }
}

pub fn step(message: &str) {
    write_to_log("STEP", message);
    if get_verbosity() >= 2 {
        eprintln!("TRACE: {}", message);
    }
}

pub fn warn(message: &str) {
    write_to_log("WARN", message);
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

pub fn error(message: &str) {
    write_to_log("ERROR", message);
    eprintln!("{} {}", "Error:".red().bold(), message);
}

pub fn success(message: &str) {
    write_to_log("SUCCESS", message);
    if !is_quiet() {
        eprintln!("{} {}", "\u{2714}".green().bold(), message);
    }
}

pub fn get_log_path() -> Option<PathBuf> {
    STATE.lock().ok().and_then(|s| s.log_file.clone())
}

pub fn show_log_path() {
    match get_log_path() {
        Some(path) => eprintln!("Log file: {}", path.display()),
        None => eprintln!("Log file location not available"),
    }
}

/// Start a spinner unless verbose or quiet output was requested
pub fn spinner_start(message: &str) {
    write_to_log("STEP", message);
    if get_verbosity() > 0 || is_quiet() {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    if let Ok(mut guard) = SPINNER.lock() {
        *guard = Some(spinner);
    }
}

pub fn spinner_stop() {
    if let Ok(mut guard) = SPINNER.lock() {
        if let Some(spinner) = guard.take() {
            spinner.finish_and_clear();
        }
    }
}

pub fn spinner_success(message: &str) {
    spinner_stop();
    success(message);
}

pub fn spinner_error(message: &str) {
    spinner_stop();
    write_to_log("ERROR", message);
    eprintln!("  {} {}", "✗".red().bold(), message);
}
