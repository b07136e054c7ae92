//! On-disk layout of a publish run under the build root
//!
//! ```text
//! <build-root>/runemate/
//!   sources/                      collected source trees
//!   sources/.runemate/            generated manifests
//!   distribution/runemate-publish.tar.gz
//! ```

use std::path::{Path, PathBuf};

pub const STAGING_DIR: &str = "runemate";
pub const SOURCES_DIR: &str = "sources";
pub const MANIFESTS_DIR: &str = ".runemate";
pub const DISTRIBUTION_DIR: &str = "distribution";
pub const ARCHIVE_NAME: &str = "runemate-publish.tar.gz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    build_root: PathBuf,
}

impl BuildLayout {
    pub fn new(build_root: impl Into<PathBuf>) -> Self {
        BuildLayout {
            build_root: build_root.into(),
        }
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Everything a run owns; removed by the clean stage
    pub fn staging_root(&self) -> PathBuf {
        self.build_root.join(STAGING_DIR)
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.staging_root().join(SOURCES_DIR)
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.sources_dir().join(MANIFESTS_DIR)
    }

    pub fn distribution_dir(&self) -> PathBuf {
        self.staging_root().join(DISTRIBUTION_DIR)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.distribution_dir().join(ARCHIVE_NAME)
    }

    /// `<slug>.manifest.<ext>` inside the manifests directory
    pub fn manifest_path(&self, slug: &str, extension: &str) -> PathBuf {
        self.manifests_dir()
            .join(format!("{}.manifest.{}", slug, extension))
    }
}
