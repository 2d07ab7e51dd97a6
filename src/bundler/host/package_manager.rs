//! Native package manager detection and installs.

use super::Host;
use crate::bundler::{
    error::{Error, Result},
    utils::process,
};
use std::fmt;

/// Native package managers, in detection priority order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PackageManager {
    /// Debian, Ubuntu
    Apt,
    /// Fedora, RHEL 8+
    Dnf,
    /// Older RHEL, CentOS
    Yum,
    /// Arch
    Pacman,
    /// openSUSE
    Zypper,
    /// Alpine
    Apk,
    /// Homebrew
    Brew,
}

/// System packages the pipeline may install.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SystemPackage {
    /// Tcl/Tk bindings for the system Python.
    Tkinter,
    /// `flatpak-builder`
    FlatpakBuilder,
    /// Package shipping `chdman`.
    MameTools,
}

impl fmt::Display for SystemPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SystemPackage::Tkinter => "tkinter",
            SystemPackage::FlatpakBuilder => "flatpak-builder",
            SystemPackage::MameTools => "chdman",
        })
    }
}

impl PackageManager {
    /// Detection order; the first one on PATH wins.
    pub const PRIORITY: [PackageManager; 7] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Pacman,
        PackageManager::Zypper,
        PackageManager::Apk,
        PackageManager::Brew,
    ];

    /// Executable name.
    pub fn binary(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
            PackageManager::Apk => "apk",
            PackageManager::Brew => "brew",
        }
    }

    /// Homebrew refuses to run as root; everything else needs it.
    pub fn needs_root(self) -> bool {
        !matches!(self, PackageManager::Brew)
    }

    /// Distribution package name for `package`, if this manager ships it.
    pub fn package_name(self, package: SystemPackage) -> Option<&'static str> {
        use PackageManager::*;
        match package {
            SystemPackage::Tkinter => Some(match self {
                Apt => "python3-tk",
                Dnf | Yum => "python3-tkinter",
                Pacman => "tk",
                Zypper => "python3-tk",
                Apk => "py3-tkinter",
                Brew => "python-tk",
            }),
            SystemPackage::FlatpakBuilder => match self {
                Brew => None,
                _ => Some("flatpak-builder"),
            },
            SystemPackage::MameTools => match self {
                Apt | Dnf | Pacman | Zypper => Some("mame-tools"),
                Brew => Some("rom-tools"),
                Yum | Apk => None,
            },
        }
    }

    /// Non-interactive install arguments.
    pub fn install_args(self, name: &str) -> Vec<String> {
        let args: &[&str] = match self {
            PackageManager::Apt | PackageManager::Dnf | PackageManager::Yum => &["install", "-y"],
            PackageManager::Pacman => &["-S", "--noconfirm", "--needed"],
            PackageManager::Zypper => &["--non-interactive", "install"],
            PackageManager::Apk => &["add"],
            PackageManager::Brew => &["install"],
        };
        args.iter()
            .map(|a| a.to_string())
            .chain(std::iter::once(name.to_string()))
            .collect()
    }

    /// First package manager found on the host search path.
    pub fn detect(host: &Host) -> Option<Self> {
        let found = Self::PRIORITY
            .into_iter()
            .find(|pm| host.which(pm.binary()).is_some());
        match found {
            Some(pm) => log::debug!("Detected package manager: {}", pm.binary()),
            None => log::debug!("No supported package manager found"),
        }
        found
    }

    /// Installs `package`, escalating privileges when required.
    pub async fn install(self, host: &Host, package: SystemPackage) -> Result<()> {
        let name = self.package_name(package).ok_or_else(|| Error::DependencyInstall {
            package: package.to_string(),
            reason: format!("{} has no package for it", self.binary()),
        })?;
        let binary = host.which(self.binary()).ok_or_else(|| Error::DependencyInstall {
            package: name.to_string(),
            reason: format!("{} not found in PATH", self.binary()),
        })?;

        log::info!("Installing {} with {}", name, self.binary());
        let mut cmd = if self.needs_root() {
            host.privileged(&binary)
        } else {
            host.command(&binary)
        };
        cmd.args(self.install_args(name));

        let status = process::status(&mut cmd).await?;
        if !status.success() {
            return Err(Error::DependencyInstall {
                package: name.to_string(),
                reason: format!("{} exited with {}", self.binary(), status),
            });
        }
        Ok(())
    }
}
