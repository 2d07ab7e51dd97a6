//! Project configuration from `romconv.toml`.

use crate::bundler::{
    AppImageSettings, FlatpakSettings, OptionalAsset, PackageSettings, SettingsBuilder,
};
use crate::error::{BundlerError, CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up in the project directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "romconv.toml";

/// Contents of `romconv.toml`. Every key is optional.
///
/// ```toml
/// product_name = "ROM_Converter"
/// version = "1.2.0"
/// script = "rom_converter.py"
/// icon = "icon.ico"
///
/// [[assets]]
/// name = "chdman"
/// path = "bin/chdman"
/// kind = "binary"
///
/// [flatpak]
/// runtime-version = "24.08"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub product_name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub script: Option<PathBuf>,
    pub icon: Option<PathBuf>,
    pub build_time_env: Option<String>,
    pub assets: Option<Vec<OptionalAsset>>,
    pub appimage: Option<AppImageSettings>,
    pub flatpak: Option<FlatpakSettings>,
}

impl ProjectConfig {
    /// Parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|error| BundlerError::Config {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Layers the configured values over the builder's defaults.
    pub fn apply(self, builder: SettingsBuilder) -> SettingsBuilder {
        let defaults = PackageSettings::default();
        let package = PackageSettings {
            product_name: self.product_name.unwrap_or(defaults.product_name),
            version: self.version.unwrap_or(defaults.version),
            description: self.description.unwrap_or(defaults.description),
            categories: self.categories.unwrap_or(defaults.categories),
        };

        let mut builder = builder.package_settings(package);
        if let Some(script) = self.script {
            builder = builder.script(script);
        }
        if let Some(icon) = self.icon {
            builder = builder.icon(icon);
        }
        if let Some(name) = self.build_time_env {
            builder = builder.build_time_env(name);
        }
        if let Some(assets) = self.assets {
            builder = builder.assets(assets);
        }
        if let Some(appimage) = self.appimage {
            builder = builder.appimage(appimage);
        }
        if let Some(flatpak) = self.flatpak {
            builder = builder.flatpak(flatpak);
        }
        builder
    }
}

/// Finds and loads the project config.
///
/// An explicit path must exist. Without one, `<project_dir>/romconv.toml`
/// is used when present and defaults otherwise.
pub fn load_config(project_dir: &Path, explicit: Option<&Path>) -> Result<Option<ProjectConfig>> {
    let path = match explicit {
        Some(path) if !path.is_file() => {
            return Err(CliError::MissingPath {
                what: "config file",
                path: path.to_path_buf(),
            }
            .into());
        }
        Some(path) => path.to_path_buf(),
        None => {
            let discovered = project_dir.join(CONFIG_FILE_NAME);
            if !discovered.is_file() {
                log::debug!("No {} in {}", CONFIG_FILE_NAME, project_dir.display());
                return Ok(None);
            }
            discovered
        }
    };

    log::info!("Loading config from {}", path.display());
    ProjectConfig::load(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::AssetKind;

    #[test]
    fn absent_config_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(dir.path(), None).unwrap().is_none());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_config(dir.path(), Some(&missing)),
            Err(BundlerError::Cli(CliError::MissingPath { .. }))
        ));
    }

    #[test]
    fn config_values_reach_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
product_name = "RomConv"
script = "app/main.py"
build_time_env = "RC_BUILT"

[[assets]]
name = "chdman"
path = "bin/chdman"
kind = "binary"

[flatpak]
app-id = "org.example.RomConv"
"#,
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap().unwrap();
        let settings = config
            .apply(SettingsBuilder::new().project_dir(dir.path()))
            .build()
            .unwrap();

        assert_eq!(settings.product_name(), "RomConv");
        assert_eq!(settings.version_string(), PackageSettings::default().version);
        assert_eq!(settings.script_path(), dir.path().join("app/main.py"));
        assert_eq!(settings.build_time_env(), "RC_BUILT");
        assert_eq!(settings.assets().len(), 1);
        assert_eq!(settings.assets()[0].kind(), AssetKind::Binary);
        assert_eq!(settings.flatpak().app_id, "org.example.RomConv");
        // untouched keys keep their defaults
        assert_eq!(settings.flatpak().runtime, "org.freedesktop.Platform");
    }

    #[test]
    fn malformed_config_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "product_name = [").unwrap();

        let err = load_config(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
