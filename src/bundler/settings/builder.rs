//! Builder for constructing Settings.

use super::{
    AppImageSettings, Arch, BuildMode, FlatpakSettings, OptionalAsset, PackageSettings, Settings,
};
use crate::bundler::platform::PackageType;
use std::path::{Path, PathBuf};

/// Default name of the primary script.
pub const DEFAULT_SCRIPT: &str = "rom_converter.py";

/// Default environment variable carrying the build timestamp.
pub const DEFAULT_BUILD_TIME_ENV: &str = "ROM_CONVERTER_BUILD_TIME";

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use romconv_bundler::bundler::{BuildMode, SettingsBuilder};
///
/// # fn example() -> romconv_bundler::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_dir(".")
///     .mode(BuildMode::OneDir)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    project_dir: Option<PathBuf>,
    package_settings: Option<PackageSettings>,
    script: Option<PathBuf>,
    icon: Option<PathBuf>,
    mode: BuildMode,
    assets: Option<Vec<OptionalAsset>>,
    python: Option<PathBuf>,
    build_timestamp: Option<i64>,
    build_time_env: Option<String>,
    package_types: Vec<PackageType>,
    appimage: AppImageSettings,
    flatpak: FlatpakSettings,
    arch: Option<Arch>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the project directory.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn project_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets package metadata.
    ///
    /// Default: [`PackageSettings::default`]
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = Some(settings);
        self
    }

    /// Sets the primary script, relative to the project directory.
    ///
    /// Default: `rom_converter.py`
    pub fn script<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.script = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the icon, relative to the project directory.
    ///
    /// Default: `icon.ico` if it exists, else `icon.png` if it exists.
    pub fn icon<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.icon = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output mode.
    pub fn mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replaces the optional asset list.
    ///
    /// Default: [`OptionalAsset::defaults`]
    pub fn assets(mut self, assets: Vec<OptionalAsset>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Sets the Python interpreter.
    ///
    /// Default: `python` on Windows, `python3` elsewhere.
    pub fn python<P: AsRef<Path>>(mut self, python: P) -> Self {
        self.python = Some(python.as_ref().to_path_buf());
        self
    }

    /// Pins the build timestamp.
    ///
    /// Default: `SOURCE_DATE_EPOCH` if set and numeric, else the current time.
    pub fn build_timestamp(mut self, timestamp: i64) -> Self {
        self.build_timestamp = Some(timestamp);
        self
    }

    /// Sets the environment variable name for the timestamp.
    pub fn build_time_env(mut self, name: impl Into<String>) -> Self {
        self.build_time_env = Some(name.into());
        self
    }

    /// Sets the secondary package types to create.
    pub fn package_types(mut self, types: Vec<PackageType>) -> Self {
        self.package_types = types;
        self
    }

    /// Sets AppImage configuration.
    pub fn appimage(mut self, settings: AppImageSettings) -> Self {
        self.appimage = settings;
        self
    }

    /// Sets Flatpak configuration.
    pub fn flatpak(mut self, settings: FlatpakSettings) -> Self {
        self.flatpak = settings;
        self
    }

    /// Overrides the detected architecture.
    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `project_dir` is missing or the product name
    /// contains a path separator.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        let project_dir = self
            .project_dir
            .context("project_dir is required")?;
        let package = self.package_settings.unwrap_or_default();

        if package.product_name.is_empty()
            || package.product_name.contains(['/', '\\'])
        {
            crate::bail!(
                "invalid product name {:?}: must be non-empty without path separators",
                package.product_name
            );
        }

        let icon = self.icon.or_else(|| {
            ["icon.ico", "icon.png"]
                .into_iter()
                .map(PathBuf::from)
                .find(|candidate| project_dir.join(candidate).is_file())
        });

        let python = self.python.unwrap_or_else(|| {
            PathBuf::from(if cfg!(windows) { "python" } else { "python3" })
        });

        let build_timestamp = self.build_timestamp.unwrap_or_else(default_build_timestamp);

        Ok(Settings::new(
            package,
            project_dir,
            self.script.unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT)),
            icon,
            self.mode,
            self.assets.unwrap_or_else(OptionalAsset::defaults),
            python,
            build_timestamp,
            self.build_time_env
                .unwrap_or_else(|| DEFAULT_BUILD_TIME_ENV.to_string()),
            self.package_types,
            self.appimage,
            self.flatpak,
            self.arch.unwrap_or_else(Arch::host),
        ))
    }
}

/// `SOURCE_DATE_EPOCH` when set (reproducible builds), else now.
fn default_build_timestamp() -> i64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or_else(|| chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_project_dir() {
        assert!(SettingsBuilder::new().build().is_err());
    }

    #[test]
    fn derives_fixed_paths_from_project_dir() {
        let settings = SettingsBuilder::new()
            .project_dir("/proj")
            .build_timestamp(1_700_000_000)
            .build()
            .unwrap();

        assert_eq!(settings.script_path(), PathBuf::from("/proj/rom_converter.py"));
        assert_eq!(settings.output_dir(), PathBuf::from("/proj/dist"));
        assert_eq!(settings.work_dir(), PathBuf::from("/proj/build"));
        assert_eq!(settings.spec_file(), PathBuf::from("/proj/ROM_Converter.spec"));
        assert_eq!(settings.build_timestamp(), 1_700_000_000);
        assert_eq!(settings.build_time_env(), DEFAULT_BUILD_TIME_ENV);
        assert_eq!(settings.assets().len(), 3);
    }

    #[test]
    fn onedir_artifact_is_bundle_directory() {
        let settings = SettingsBuilder::new()
            .project_dir("/proj")
            .mode(BuildMode::OneDir)
            .build()
            .unwrap();

        assert_eq!(settings.expected_artifact(), PathBuf::from("/proj/dist/ROM_Converter"));
        assert_eq!(
            settings.expected_executable(),
            PathBuf::from("/proj/dist/ROM_Converter").join(settings.executable_name())
        );
    }

    #[test]
    fn rejects_product_names_with_separators() {
        let result = SettingsBuilder::new()
            .project_dir("/proj")
            .package_settings(PackageSettings {
                product_name: "../escape".into(),
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn picks_up_icon_next_to_script() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("icon.png"), b"png").unwrap();

        let settings = SettingsBuilder::new().project_dir(dir.path()).build().unwrap();
        assert_eq!(settings.icon_path(), Some(dir.path().join("icon.png")));
    }
}
