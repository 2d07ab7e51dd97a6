//! Core Settings struct and implementations.

use super::{AppImageSettings, Arch, FlatpakSettings, OptionalAsset, PackageSettings};
use crate::bundler::platform::PackageType;
use std::path::{Path, PathBuf};

/// Shape of the primary PyInstaller output.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BuildMode {
    /// One consolidated executable (`--onefile`).
    #[default]
    OneFile,
    /// A directory holding the executable and its libraries (`--onedir`).
    OneDir,
}

impl BuildMode {
    /// PyInstaller flag selecting this mode.
    pub fn flag(self) -> &'static str {
        match self {
            BuildMode::OneFile => "--onefile",
            BuildMode::OneDir => "--onedir",
        }
    }
}

/// Main settings for a build run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder). All paths
/// derive from the project directory:
///
/// - `dist/` holds the artifacts
/// - `build/` holds PyInstaller's intermediate files and our staging dirs
/// - `<product>.spec` is PyInstaller's generated spec file
#[derive(Clone, Debug)]
pub struct Settings {
    package: PackageSettings,
    project_dir: PathBuf,
    script: PathBuf,
    icon: Option<PathBuf>,
    mode: BuildMode,
    assets: Vec<OptionalAsset>,
    python: PathBuf,
    build_timestamp: i64,
    build_time_env: String,
    package_types: Vec<PackageType>,
    appimage: AppImageSettings,
    flatpak: FlatpakSettings,
    arch: Arch,
}

impl Settings {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the package description.
    pub fn description(&self) -> &str {
        &self.package.description
    }

    /// Returns the package metadata.
    pub fn package(&self) -> &PackageSettings {
        &self.package
    }

    /// Root of the project being packaged.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Absolute path of the primary script.
    pub fn script_path(&self) -> PathBuf {
        self.project_dir.join(&self.script)
    }

    /// Absolute path of the configured icon, if any.
    pub fn icon_path(&self) -> Option<PathBuf> {
        self.icon.as_ref().map(|icon| self.project_dir.join(icon))
    }

    /// Directory all artifacts are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.project_dir.join("dist")
    }

    /// Directory for intermediate build files.
    pub fn work_dir(&self) -> PathBuf {
        self.project_dir.join("build")
    }

    /// Where downloaded helper tools are cached.
    ///
    /// The user cache dir when one exists, else `build/.tools`.
    pub fn tool_cache_dir(&self) -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("tools"))
            .unwrap_or_else(|| self.work_dir().join(".tools"))
    }

    /// The spec file PyInstaller generates.
    pub fn spec_file(&self) -> PathBuf {
        self.project_dir.join(format!("{}.spec", self.product_name()))
    }

    /// Primary output mode.
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Optional assets considered for bundling.
    pub fn assets(&self) -> &[OptionalAsset] {
        &self.assets
    }

    /// Python interpreter used for pip and PyInstaller.
    pub fn python(&self) -> &Path {
        &self.python
    }

    /// Build timestamp injected into the artifact.
    pub fn build_timestamp(&self) -> i64 {
        self.build_timestamp
    }

    /// Environment variable the artifact reads the timestamp from.
    pub fn build_time_env(&self) -> &str {
        &self.build_time_env
    }

    /// Secondary package types requested.
    pub fn package_types(&self) -> &[PackageType] {
        &self.package_types
    }

    /// AppImage settings.
    pub fn appimage(&self) -> &AppImageSettings {
        &self.appimage
    }

    /// Flatpak settings.
    pub fn flatpak(&self) -> &FlatpakSettings {
        &self.flatpak
    }

    /// Host architecture.
    pub fn binary_arch(&self) -> Arch {
        self.arch
    }

    /// File name of the frozen executable.
    ///
    /// Automatically appends `.exe` on Windows.
    pub fn executable_name(&self) -> String {
        format!("{}{}", self.product_name(), std::env::consts::EXE_SUFFIX)
    }

    /// The artifact PyInstaller is expected to produce.
    ///
    /// For `--onedir` this is the bundle directory; the executable inside it
    /// is [`Settings::expected_executable`].
    pub fn expected_artifact(&self) -> PathBuf {
        match self.mode {
            BuildMode::OneFile => self.output_dir().join(self.executable_name()),
            BuildMode::OneDir => self.output_dir().join(self.product_name()),
        }
    }

    /// The executable inside the expected artifact.
    pub fn expected_executable(&self) -> PathBuf {
        match self.mode {
            BuildMode::OneFile => self.expected_artifact(),
            BuildMode::OneDir => self.expected_artifact().join(self.executable_name()),
        }
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        package: PackageSettings,
        project_dir: PathBuf,
        script: PathBuf,
        icon: Option<PathBuf>,
        mode: BuildMode,
        assets: Vec<OptionalAsset>,
        python: PathBuf,
        build_timestamp: i64,
        build_time_env: String,
        package_types: Vec<PackageType>,
        appimage: AppImageSettings,
        flatpak: FlatpakSettings,
        arch: Arch,
    ) -> Self {
        Self {
            package,
            project_dir,
            script,
            icon,
            mode,
            assets,
            python,
            build_timestamp,
            build_time_env,
            package_types,
            appimage,
            flatpak,
            arch,
        }
    }
}
