//! Platform-specific packaging formats.

pub mod linux;

use std::fmt;

/// Kind of artifact produced by a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PackageType {
    /// The frozen executable (or onedir bundle) produced by PyInstaller.
    Executable,
    /// Single-file universal Linux package.
    AppImage,
    /// Sandboxed Flatpak bundle.
    Flatpak,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageType::Executable => "executable",
            PackageType::AppImage => "AppImage",
            PackageType::Flatpak => "Flatpak",
        };
        f.write_str(name)
    }
}
