//! Desktop entry generation.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::Settings,
};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;

const DESKTOP_TEMPLATE: &str = "[Desktop Entry]
Type=Application
Name={{name}}
Comment={{comment}}
Exec={{exec}}
Icon={{icon}}
Categories={{categories}}
Terminal=false
X-AppImage-Version={{version}}
";

/// Fields of a `.desktop` file.
#[derive(Clone, Debug, Serialize)]
pub struct DesktopEntry {
    name: String,
    comment: String,
    exec: String,
    icon: String,
    categories: String,
    version: String,
}

impl DesktopEntry {
    /// Entry launching `exec` and showing `icon` (an icon name, not a path).
    pub fn new(settings: &Settings, exec: impl Into<String>, icon: impl Into<String>) -> Self {
        let mut categories = settings.package().categories.join(";");
        if !categories.is_empty() {
            categories.push(';');
        }
        Self {
            name: settings.product_name().replace('_', " "),
            comment: settings.description().to_string(),
            exec: exec.into(),
            icon: icon.into(),
            categories,
            version: settings.version_string().to_string(),
        }
    }

    /// Renders the entry.
    pub fn render(&self) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string("desktop", DESKTOP_TEMPLATE)
            .map_err(|e| Error::GenericError(format!("failed to register desktop template: {}", e)))?;
        Ok(handlebars.render("desktop", self)?)
    }

    /// Renders the entry to `path`.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let contents = self.render()?;
        tokio::fs::write(path, contents)
            .await
            .fs_context("writing desktop file", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::SettingsBuilder;

    #[test]
    fn renders_freedesktop_entry() {
        let settings = SettingsBuilder::new().project_dir("/proj").build().unwrap();
        let entry = DesktopEntry::new(&settings, "ROM_Converter", "ROM_Converter");
        let rendered = entry.render().unwrap();

        assert!(rendered.starts_with("[Desktop Entry]\nType=Application\n"));
        assert!(rendered.contains("Name=ROM Converter\n"));
        assert!(rendered.contains("Exec=ROM_Converter\n"));
        assert!(rendered.contains("Categories=Utility;\n"));
        assert!(rendered.contains("X-AppImage-Version=1.0.0\n"));
        assert!(rendered.ends_with("Terminal=false\n"));
    }
}
