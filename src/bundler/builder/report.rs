//! Results of a build run.

use super::checksum::{artifact_size, calculate_sha256};
use crate::bundler::{
    OptionalAsset, PackageType, Result, host::toolkit::ToolkitStrategy,
};
use std::path::{Path, PathBuf};

/// A verified artifact on disk.
#[derive(Clone, Debug)]
pub struct BundledArtifact {
    /// What kind of artifact this is.
    pub package_type: PackageType,
    /// File (or onedir directory) path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Hex SHA-256.
    pub checksum: String,
}

impl BundledArtifact {
    /// Measures and hashes an existing artifact.
    pub async fn describe(package_type: PackageType, path: &Path) -> Result<Self> {
        Ok(Self {
            package_type,
            path: path.to_path_buf(),
            size: artifact_size(path).await?,
            checksum: calculate_sha256(path).await?,
        })
    }
}

/// Outcome of one secondary packaging tail.
#[derive(Debug)]
pub struct SecondaryOutcome {
    /// Format attempted.
    pub package_type: PackageType,
    /// Artifact, or the advisory error that prevented it.
    pub result: Result<BundledArtifact>,
}

/// Everything a successful run produced.
#[derive(Debug)]
pub struct BuildReport {
    /// The frozen executable or onedir bundle.
    pub primary: BundledArtifact,
    /// Optional assets embedded in the primary artifact.
    pub bundled_assets: Vec<OptionalAsset>,
    /// Whether psutil was available and bundled as a hidden import.
    pub resource_monitor: bool,
    /// How the tkinter requirement was met.
    pub toolkit: ToolkitStrategy,
    /// Converters fetched by `--download-tools`.
    pub fetched_tools: Vec<String>,
    /// Converter fetch failures (advisory).
    pub fetch_failures: Vec<String>,
    /// AppImage/Flatpak results, in the order they ran.
    pub secondary: Vec<SecondaryOutcome>,
}

impl BuildReport {
    /// Secondary tails that failed.
    pub fn secondary_failures(&self) -> impl Iterator<Item = &SecondaryOutcome> {
        self.secondary.iter().filter(|o| o.result.is_err())
    }

    /// Every artifact produced, primary first.
    pub fn artifacts(&self) -> impl Iterator<Item = &BundledArtifact> {
        std::iter::once(&self.primary)
            .chain(self.secondary.iter().filter_map(|o| o.result.as_ref().ok()))
    }
}
