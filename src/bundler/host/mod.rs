//! The machine the build runs on.
//!
//! [`Host`] answers questions about the environment (what is on PATH, are we
//! root, is this an rpm-ostree system, is FUSE usable) and builds commands
//! for the Python interpreter and privileged package installs.
//!
//! # Module Organization
//!
//! - [`strategy`] - ordered fallback chains with tri-state outcomes
//! - [`package_manager`] - native package manager detection and installs
//! - [`pip`] - Python package checks and installs
//! - [`toolkit`] - GUI toolkit binding remediation chain

pub mod package_manager;
pub mod pip;
pub mod strategy;
pub mod toolkit;

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tokio::process::Command;

/// Environment the pipeline runs in.
#[derive(Clone, Debug)]
pub struct Host {
    python: PathBuf,
    search_path: Option<OsString>,
    root: PathBuf,
}

impl Host {
    /// Creates a host view using the process PATH and `/` as filesystem root.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            search_path: std::env::var_os("PATH"),
            root: PathBuf::from("/"),
        }
    }

    /// Overrides the directories searched for tools.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Overrides the filesystem root used for system probes
    /// (`/run/ostree-booted`, `/dev/fuse`, library locations).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Python interpreter.
    pub fn python(&self) -> &Path {
        &self.python
    }

    /// Filesystem root for system probes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A command running the Python interpreter.
    pub fn python_command(&self) -> Command {
        self.command(&self.python)
    }

    /// A command for `program`, with PATH set to the host search path.
    pub fn command(&self, program: impl AsRef<std::ffi::OsStr>) -> Command {
        let mut cmd = Command::new(program);
        if let Some(path) = &self.search_path {
            cmd.env("PATH", path);
        }
        cmd
    }

    /// Locates a tool on the host search path.
    pub fn which(&self, name: &str) -> Option<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| self.root.clone());
        match which::which_in(name, self.search_path.as_ref(), cwd) {
            Ok(path) => {
                log::debug!("Found {} at: {}", name, path.display());
                Some(path)
            }
            Err(e) => {
                log::debug!("{} not found in PATH: {}", name, e);
                None
            }
        }
    }

    /// Whether the current user is root.
    pub fn is_root(&self) -> bool {
        #[cfg(unix)]
        {
            users::get_current_uid() == 0
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// A command that runs `program` with root privileges.
    ///
    /// Uses `sudo` when not already root and `sudo` is available; otherwise
    /// runs the program directly and lets it fail on its own terms.
    pub fn privileged(&self, program: &Path) -> Command {
        if !self.is_root()
            && let Some(sudo) = self.which("sudo")
        {
            let mut cmd = self.command(sudo);
            cmd.arg(program);
            return cmd;
        }
        self.command(program)
    }

    /// Whether this is an image-based rpm-ostree system (Silverblue, Kinoite, Bazzite...).
    pub fn is_ostree_booted(&self) -> bool {
        self.root.join("run/ostree-booted").exists()
    }

    /// Whether AppImages can mount themselves.
    pub fn fuse_available(&self) -> bool {
        self.root.join("dev/fuse").exists()
            && (self.which("fusermount").is_some() || self.which("fusermount3").is_some())
    }
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    /// Writes an executable shell script into `dir`.
    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
