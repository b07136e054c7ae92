//! RuneMate publishing library - exposes modules for the binary and tests
//!
//! A project declares its bots in `runemate.toml`; the pipeline turns those
//! declarations into manifest files, validates them together with any manifest
//! files already in the sources, stages and bundles the sources, and submits
//! the archive for review.

pub mod commands;
pub mod common;
pub mod dependencies;
pub mod errors;
pub mod pipeline;
pub mod project;
pub mod submission;
