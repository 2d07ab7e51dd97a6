//! Linux distribution format settings.

/// Default location of the AppImage helper releases.
pub const APPIMAGETOOL_BASE_URL: &str =
    "https://github.com/AppImage/appimagetool/releases/download/continuous";

/// AppImage configuration.
///
/// # Configuration
///
/// ```toml
/// [appimage]
/// helper-base-url = "https://mirror.example.com/appimagetool"
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppImageSettings {
    /// Base URL the `appimagetool-<arch>.AppImage` helper is downloaded from
    /// when it is not on PATH.
    pub helper_base_url: String,
}

impl Default for AppImageSettings {
    fn default() -> Self {
        Self {
            helper_base_url: APPIMAGETOOL_BASE_URL.into(),
        }
    }
}

/// Flatpak configuration.
///
/// # Configuration
///
/// ```toml
/// [flatpak]
/// app-id = "io.github.romconverter.ROMConverter"
/// runtime-version = "24.08"
/// finish-args = ["--share=ipc", "--socket=x11"]
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FlatpakSettings {
    /// Reverse-DNS application id.
    pub app_id: String,

    /// Runtime ref name.
    pub runtime: String,

    /// SDK ref name.
    pub sdk: String,

    /// Branch pinned for both runtime and SDK.
    pub runtime_version: String,

    /// Remote the runtime is installed from.
    pub remote_name: String,

    /// `.flatpakrepo` URL of the remote.
    pub remote_url: String,

    /// Sandbox permission grants.
    pub finish_args: Vec<String>,
}

impl Default for FlatpakSettings {
    fn default() -> Self {
        Self {
            app_id: "io.github.romconverter.ROMConverter".into(),
            runtime: "org.freedesktop.Platform".into(),
            sdk: "org.freedesktop.Sdk".into(),
            runtime_version: "23.08".into(),
            remote_name: "flathub".into(),
            remote_url: "https://dl.flathub.org/repo/flathub.flatpakrepo".into(),
            finish_args: vec![
                "--share=ipc".into(),
                "--share=network".into(),
                "--socket=x11".into(),
                "--socket=wayland".into(),
                "--device=dri".into(),
                "--filesystem=home".into(),
                "--filesystem=/media".into(),
                "--filesystem=/run/media".into(),
            ],
        }
    }
}
