//! CPU architecture types and utilities.

/// CPU architecture of the host producing the artifacts.
///
/// PyInstaller cannot cross-compile, so the artifact architecture is always
/// the host architecture.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X86_64,
    /// x86 / i686 (32-bit)
    X86,
    /// AArch64 / ARM64 (64-bit)
    AArch64,
    /// ARM with hard-float (32-bit)
    Armhf,
}

impl Arch {
    /// Detects the architecture this binary was compiled for.
    pub fn host() -> Self {
        Self::from_target(std::env::consts::ARCH)
    }

    /// Maps a target triple or `std::env::consts::ARCH` value.
    ///
    /// Unknown values fall back to `X86_64`.
    pub fn from_target(target: &str) -> Self {
        if target.starts_with("x86_64") {
            Arch::X86_64
        } else if target.starts_with("aarch64") {
            Arch::AArch64
        } else if target.starts_with("arm") {
            Arch::Armhf
        } else if target.starts_with('i') || target == "x86" {
            Arch::X86
        } else {
            Arch::X86_64
        }
    }

    /// Architecture name as used by AppImage tooling.
    pub fn appimage_name(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "i686",
            Arch::AArch64 => "aarch64",
            Arch::Armhf => "armhf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_targets() {
        assert_eq!(Arch::from_target("x86_64"), Arch::X86_64);
        assert_eq!(Arch::from_target("x86_64-unknown-linux-gnu"), Arch::X86_64);
        assert_eq!(Arch::from_target("aarch64"), Arch::AArch64);
        assert_eq!(Arch::from_target("x86"), Arch::X86);
        assert_eq!(Arch::from_target("i686-unknown-linux-gnu"), Arch::X86);
        assert_eq!(Arch::from_target("armv7-unknown-linux-gnueabihf"), Arch::Armhf);
        assert_eq!(Arch::AArch64.appimage_name(), "aarch64");
    }
}
