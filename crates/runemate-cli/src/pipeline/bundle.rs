//! Clean and bundle stages
//!
//! The archive is a gzip-compressed tarball of the staging sources directory,
//! entries in sorted order with deterministic headers, so the same sources
//! always produce the same bytes.

use flate2::{Compression, GzBuilder};
use runemate_config::BuildLayout;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tar::Builder;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::PublishError;

/// Remove everything a previous run staged
pub fn clean(layout: &BuildLayout) -> Result<(), PublishError> {
    let staging = layout.staging_root();
    if staging.exists() {
        debug!("Removing {}", staging.display());
        fs::remove_dir_all(&staging).map_err(|e| PublishError::io(&staging, e))?;
    }
    Ok(())
}

/// Archive the sources directory and return the archive path
pub fn run(layout: &BuildLayout) -> Result<PathBuf, PublishError> {
    let sources = layout.sources_dir();
    fs::create_dir_all(&sources).map_err(|e| PublishError::io(&sources, e))?;

    let distribution = layout.distribution_dir();
    fs::create_dir_all(&distribution).map_err(|e| PublishError::io(&distribution, e))?;

    let archive = layout.archive_path();
    let file = File::create(&archive).map_err(|e| PublishError::io(&archive, e))?;
    write_archive(BufWriter::new(file), &sources).map_err(|e| PublishError::io(&archive, e))?;

    debug!("Wrote {}", archive.display());
    Ok(archive)
}

fn write_archive<W: io::Write>(writer: W, sources: &Path) -> io::Result<()> {
    let gz = GzBuilder::new()
        .mtime(0)
        .write(writer, Compression::default());
    let mut tar = Builder::new(gz);
    tar.mode(tar::HeaderMode::Deterministic);
    tar.follow_symlinks(false);

    for entry in WalkDir::new(sources).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry.path().strip_prefix(sources).unwrap_or(entry.path());
        if entry.file_type().is_dir() {
            tar.append_dir(relative, entry.path())?;
        } else {
            tar.append_path_with_name(entry.path(), relative)?;
        }
    }

    let gz = tar.into_inner()?;
    let mut writer = gz.finish()?;
    io::Write::flush(&mut writer)
}
