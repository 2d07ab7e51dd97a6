//! Main bundler orchestration.
//!
//! This module provides the [`Bundler`] that runs every pipeline stage in
//! order and collects the results into a [`BuildReport`].

use super::{
    BuildReport, BundledArtifact, SecondaryOutcome,
    hook::RuntimeHook,
    packager::{PACKAGER_PACKAGE, PackagerInvocation, RESOURCE_MONITOR_PACKAGE},
};
use crate::bundler::{
    BuildMode, Error, OptionalAsset, PackageType, Result, Settings,
    host::{Host, pip, toolkit::{self, ToolkitStrategy}},
    platform::linux::{appimage, flatpak},
    tools,
    utils::{fs, process},
};
use std::path::Path;

/// Per-run switches that are not part of the project settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    /// Remove `dist/`, `build/` and the spec file before building.
    pub clean: bool,
    /// Fetch missing converter binaries before collecting assets.
    pub download_tools: bool,
}

/// Result of the optional runtime support stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RuntimeSupport {
    /// psutil is importable and will be bundled.
    pub resource_monitor: bool,
    /// Strategy that made tkinter importable.
    pub toolkit: ToolkitStrategy,
}

/// Main bundler orchestrator.
///
/// Runs the linear pipeline against one project directory. Stages up to
/// [`Bundler::verify_artifact`] are fatal; the AppImage and Flatpak tails
/// only ever produce a [`SecondaryOutcome`].
///
/// # Examples
///
/// ```no_run
/// use romconv_bundler::bundler::{Bundler, RunOptions, Settings};
///
/// # async fn example(settings: Settings) -> romconv_bundler::bundler::Result<()> {
/// let bundler = Bundler::new(settings);
/// let report = bundler.run(&RunOptions::default()).await?;
/// assert!(report.primary.path.exists());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler {
    settings: Settings,
    host: Host,
}

impl Bundler {
    /// Creates a bundler using the settings' interpreter and the process PATH.
    pub fn new(settings: Settings) -> Self {
        let host = Host::new(settings.python());
        Self { settings, host }
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the full pipeline.
    ///
    /// Returns `Err` only for fatal failures. Secondary packaging failures
    /// are inside [`BuildReport::secondary`].
    pub async fn run(&self, options: &RunOptions) -> Result<BuildReport> {
        self.preflight().await?;

        if options.clean {
            self.clean().await?;
        }

        self.ensure_packager_installed().await?;
        let runtime = self.ensure_optional_runtime_support().await?;

        let (fetched_tools, fetch_failures) = if options.download_tools {
            self.fetch_converters().await
        } else {
            (Vec::new(), Vec::new())
        };

        let assets = self.collect_optional_assets().await;
        self.remove_stale_artifact().await?;
        let hook_path = RuntimeHook::path_for(&self.settings);
        let invocation =
            PackagerInvocation::new(&self.settings, &assets, runtime.resource_monitor, &hook_path);
        self.invoke(&invocation).await?;

        let primary = self.verify_artifact(&self.settings.expected_artifact()).await?;
        log::info!("✓ Built {}", primary.path.display());

        let mut secondary = Vec::new();
        for package_type in self.settings.package_types() {
            let result = match package_type {
                PackageType::AppImage => self.package_appimage(Some(&primary)).await,
                PackageType::Flatpak => self.package_container_bundle(Some(&primary)).await,
                PackageType::Executable => continue,
            };
            if let Err(e) = &result {
                log::warn!("{} packaging failed: {}", package_type, e);
            }
            secondary.push(SecondaryOutcome {
                package_type: *package_type,
                result,
            });
        }

        Ok(BuildReport {
            primary,
            bundled_assets: assets,
            resource_monitor: runtime.resource_monitor,
            toolkit: runtime.toolkit,
            fetched_tools,
            fetch_failures,
            secondary,
        })
    }

    /// Fails with [`Error::MissingSource`] if the script is absent.
    pub async fn preflight(&self) -> Result<()> {
        let script = self.settings.script_path();
        if !tokio::fs::try_exists(&script).await.unwrap_or(false) {
            return Err(Error::MissingSource(script));
        }
        log::debug!("Found source script {}", script.display());
        Ok(())
    }

    /// Removes previous outputs. Missing paths are not an error.
    pub async fn clean(&self) -> Result<()> {
        log::info!("Cleaning previous build outputs");
        fs::remove_dir_all(&self.settings.output_dir()).await?;
        fs::remove_dir_all(&self.settings.work_dir()).await?;
        fs::remove_file(&self.settings.spec_file()).await?;
        Ok(())
    }

    /// Installs PyInstaller unless `pip show` already finds it.
    pub async fn ensure_packager_installed(&self) -> Result<()> {
        if pip::ensure(&self.host, PACKAGER_PACKAGE).await? {
            log::info!("✓ Installed {}", PACKAGER_PACKAGE);
        }
        Ok(())
    }

    /// Installs psutil (advisory) and makes tkinter importable (fatal).
    pub async fn ensure_optional_runtime_support(&self) -> Result<RuntimeSupport> {
        let resource_monitor = match pip::ensure(&self.host, RESOURCE_MONITOR_PACKAGE).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!(
                    "{} unavailable, resource monitoring will be disabled: {}",
                    RESOURCE_MONITOR_PACKAGE,
                    e
                );
                false
            }
        };

        let toolkit = toolkit::ensure_toolkit(&self.host).await?;
        Ok(RuntimeSupport {
            resource_monitor,
            toolkit,
        })
    }

    async fn fetch_converters(&self) -> (Vec<String>, Vec<String>) {
        let mut fetched = Vec::new();
        let mut failures = Vec::new();
        for asset in self.settings.assets().iter().filter(|a| a.is_converter()) {
            match tools::fetch_converter(asset, &self.settings, &self.host).await {
                Ok(Some(path)) => {
                    log::info!("✓ Fetched {} to {}", asset.name(), path.display());
                    fetched.push(asset.name().to_string());
                }
                Ok(None) => log::debug!("{} already present", asset.name()),
                Err(e) => {
                    log::warn!("Could not fetch {}: {:#}", asset.name(), e);
                    failures.push(format!("{}: {:#}", asset.name(), e));
                }
            }
        }
        (fetched, failures)
    }

    /// Returns the configured assets that exist on disk.
    pub async fn collect_optional_assets(&self) -> Vec<OptionalAsset> {
        let project_dir = self.settings.project_dir();
        let mut present = Vec::new();
        for asset in self.settings.assets() {
            let path = asset.resolve(project_dir);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                log::info!("✓ Bundling {}", asset.name());
                present.push(asset.clone());
            } else {
                log::info!("{} not found at {}, skipping", asset.name(), path.display());
            }
        }
        present
    }

    /// Runs PyInstaller with the timestamp hook in place.
    ///
    /// The hook file is removed when this returns, on every path.
    pub async fn invoke(&self, invocation: &PackagerInvocation) -> Result<()> {
        let hook = RuntimeHook::create(&self.settings).await?;
        let mut cmd = invocation.command(&self.host, self.settings.project_dir());

        log::info!("Running PyInstaller for {}", self.settings.product_name());
        let status = process::status(&mut cmd)
            .await
            .map_err(|e| Error::Packaging(e.to_string()))?;
        drop(hook);

        if !status.success() {
            return Err(Error::Packaging(format!("PyInstaller exited with {}", status)));
        }
        Ok(())
    }

    /// Deletes the artifact a previous run left behind, so only this run's
    /// output can pass [`Bundler::verify_artifact`].
    pub async fn remove_stale_artifact(&self) -> Result<()> {
        let expected = self.settings.expected_artifact();
        if tokio::fs::symlink_metadata(&expected).await.is_ok() {
            log::debug!("Removing previous artifact {}", expected.display());
        }
        fs::remove_path(&expected).await
    }

    /// Confirms the artifact exists with the expected shape and records its
    /// size and checksum.
    ///
    /// This is the authoritative success signal; the packager's exit code
    /// alone is never trusted. A onefile build must be a regular file; a
    /// onedir build must be a directory holding the executable.
    pub async fn verify_artifact(&self, expected: &Path) -> Result<BundledArtifact> {
        let shape_ok = match self.settings.mode() {
            BuildMode::OneFile => is_file(expected).await,
            BuildMode::OneDir => {
                if !is_dir(expected).await {
                    false
                } else if !is_file(&self.settings.expected_executable()).await {
                    return Err(Error::ArtifactMissing(self.settings.expected_executable()));
                } else {
                    true
                }
            }
        };
        if !shape_ok {
            return Err(Error::ArtifactMissing(expected.to_path_buf()));
        }
        BundledArtifact::describe(PackageType::Executable, expected).await
    }

    /// Wraps the verified artifact into an AppImage.
    pub async fn package_appimage(
        &self,
        source: Option<&BundledArtifact>,
    ) -> Result<BundledArtifact> {
        let path = appimage::bundle_project(&self.settings, &self.host, source)
            .await
            .map_err(|e| advisory(PackageType::AppImage, e))?;
        BundledArtifact::describe(PackageType::AppImage, &path)
            .await
            .map_err(|e| advisory(PackageType::AppImage, e))
    }

    /// Wraps the verified artifact into a Flatpak bundle.
    pub async fn package_container_bundle(
        &self,
        source: Option<&BundledArtifact>,
    ) -> Result<BundledArtifact> {
        let path = flatpak::bundle_project(&self.settings, &self.host, source)
            .await
            .map_err(|e| advisory(PackageType::Flatpak, e))?;
        BundledArtifact::describe(PackageType::Flatpak, &path)
            .await
            .map_err(|e| advisory(PackageType::Flatpak, e))
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

/// Keeps secondary failures advisory whatever their underlying cause.
fn advisory(package_type: PackageType, error: Error) -> Error {
    if !error.is_fatal() {
        return error;
    }
    match package_type {
        PackageType::Flatpak => Error::FlatpakPackaging(error.to_string()),
        _ => Error::AppImagePackaging(error.to_string()),
    }
}
