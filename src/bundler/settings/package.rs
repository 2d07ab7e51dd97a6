//! Package metadata and configuration.

/// Package metadata shared by every output format.
///
/// `product_name` doubles as the PyInstaller `--name`, so it also fixes the
/// artifact file names (`dist/<product_name>`, `<product_name>.spec`,
/// `<product_name>-x86_64.AppImage`).
///
/// # Examples
///
/// ```no_run
/// use romconv_bundler::bundler::PackageSettings;
///
/// let settings = PackageSettings {
///     product_name: "ROM_Converter".into(),
///     version: "1.0.0".into(),
///     description: "Bulk disc image converter".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct PackageSettings {
    /// Product name used for the executable and every artifact name.
    ///
    /// Must not contain path separators.
    pub product_name: String,

    /// Version string.
    ///
    /// Example: "1.0.0"
    pub version: String,

    /// Brief description of the application.
    ///
    /// Used as the desktop entry comment.
    pub description: String,

    /// freedesktop.org categories for desktop entries.
    ///
    /// Default: `["Utility"]`
    pub categories: Vec<String>,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            product_name: "ROM_Converter".into(),
            version: "1.0.0".into(),
            description: "Bulk convert disc images to CHD, CSO and ZSO".into(),
            categories: vec!["Utility".into()],
        }
    }
}
