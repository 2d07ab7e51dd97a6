//! PyInstaller argument assembly.

use crate::bundler::{OptionalAsset, Settings, host::Host, settings::AssetKind};
use std::path::Path;
use tokio::process::Command;

/// pip distribution name of the packager.
pub const PACKAGER_PACKAGE: &str = "pyinstaller";
/// Module run with `python -m`.
pub const PACKAGER_MODULE: &str = "PyInstaller";
/// Optional resource-monitoring library picked up as a hidden import.
pub const RESOURCE_MONITOR_PACKAGE: &str = "psutil";

/// One packager run: the argument list after `-m PyInstaller`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PackagerInvocation {
    args: Vec<String>,
}

impl PackagerInvocation {
    /// Assembles the argument list.
    ///
    /// `assets` must already be filtered to the ones present on disk; each
    /// contributes exactly one `--add-binary`/`--add-data` pair.
    pub fn new(
        settings: &Settings,
        assets: &[OptionalAsset],
        resource_monitor: bool,
        hook: &Path,
    ) -> Self {
        let project_dir = settings.project_dir();

        let mut args: Vec<String> = vec![
            "--noconfirm".into(),
            "--windowed".into(),
            "--name".into(),
            settings.product_name().into(),
            settings.mode().flag().into(),
            "--distpath".into(),
            path_arg(&settings.output_dir()),
            "--workpath".into(),
            path_arg(&settings.work_dir()),
            "--specpath".into(),
            path_arg(project_dir),
            "--runtime-hook".into(),
            path_arg(hook),
        ];

        if let Some(icon) = settings.icon_path().filter(|icon| icon.is_file()) {
            args.push("--icon".into());
            args.push(path_arg(&icon));
        }

        if resource_monitor {
            args.push("--hidden-import".into());
            args.push(RESOURCE_MONITOR_PACKAGE.into());
        }

        for asset in assets {
            args.extend(asset.bundle_flag(project_dir));
        }

        args.push(path_arg(&settings.script_path()));

        Self { args }
    }

    /// Arguments passed after `-m PyInstaller`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of embedded assets.
    pub fn bundle_flag_count(&self) -> usize {
        self.args
            .iter()
            .filter(|a| a.as_str() == AssetKind::Binary.flag() || a.as_str() == AssetKind::Data.flag())
            .count()
    }

    /// The full packager command, run from the project directory.
    pub fn command(&self, host: &Host, project_dir: &Path) -> Command {
        let mut cmd = host.python_command();
        cmd.arg("-m")
            .arg(PACKAGER_MODULE)
            .args(&self.args)
            .current_dir(project_dir);
        cmd
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{BuildMode, SettingsBuilder};
    use std::path::PathBuf;

    fn settings(dir: &Path, mode: BuildMode) -> Settings {
        SettingsBuilder::new()
            .project_dir(dir)
            .mode(mode)
            .build_timestamp(0)
            .build()
            .unwrap()
    }

    #[test]
    fn argument_order_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path(), BuildMode::OneFile);
        let hook = dir.path().join("hook.py");
        let assets = vec![OptionalAsset::new("aes_keys.txt", "aes_keys.txt", AssetKind::Data)];

        let inv = PackagerInvocation::new(&s, &assets, true, &hook);
        let d = |p: PathBuf| p.display().to_string();
        let expected: Vec<String> = vec![
            "--noconfirm".into(),
            "--windowed".into(),
            "--name".into(),
            "ROM_Converter".into(),
            "--onefile".into(),
            "--distpath".into(),
            d(dir.path().join("dist")),
            "--workpath".into(),
            d(dir.path().join("build")),
            "--specpath".into(),
            d(dir.path().to_path_buf()),
            "--runtime-hook".into(),
            d(hook.clone()),
            "--hidden-import".into(),
            "psutil".into(),
            "--add-data".into(),
            format!(
                "{}{}.",
                d(dir.path().join("aes_keys.txt")),
                crate::bundler::settings::add_data_separator()
            ),
            d(dir.path().join("rom_converter.py")),
        ];
        assert_eq!(inv.args(), expected.as_slice());
        assert_eq!(inv.bundle_flag_count(), 1);
    }

    #[test]
    fn onedir_and_icon_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("icon.ico"), b"ico").unwrap();
        let s = settings(dir.path(), BuildMode::OneDir);

        let inv = PackagerInvocation::new(&s, &[], false, &dir.path().join("hook.py"));
        let args = inv.args();
        assert!(args.contains(&"--onedir".to_string()));
        assert!(!args.contains(&"--onefile".to_string()));
        let icon = args.iter().position(|a| a == "--icon").unwrap();
        assert_eq!(args[icon + 1], dir.path().join("icon.ico").display().to_string());
        assert!(!args.contains(&"--hidden-import".to_string()));
        assert_eq!(inv.bundle_flag_count(), 0);
    }
}
