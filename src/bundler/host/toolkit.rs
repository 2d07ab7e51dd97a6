//! GUI toolkit binding (tkinter) remediation.
//!
//! The converter GUI is built on tkinter, which many Python installs ship
//! without. [`ensure_toolkit`] walks a fixed chain of strategies until the
//! interpreter can import it:
//!
//! 1. probe the interpreter as is
//! 2. inside a virtual environment, link the system's compiled binding in
//! 3. install the distribution package
//! 4. on rpm-ostree systems, layer the package and apply it live

use super::{
    Host,
    package_manager::{PackageManager, SystemPackage},
    strategy::{self, StrategyOutcome},
};
use crate::bundler::{
    error::{Error, Result},
    utils::{fs, process},
};
use std::{
    fmt,
    path::{Path, PathBuf},
};

const IMPORT_PROBE: &str = "import tkinter";

const LAYOUT_QUERY: &str = "import sys, sysconfig\n\
print('%d.%d' % sys.version_info[:2])\n\
print(sys.prefix)\n\
print(sys.base_prefix)\n\
print(sysconfig.get_paths()['purelib'])";

const SYSTEM_LIB_DIRS: [&str; 3] = ["usr/lib", "usr/lib64", "usr/local/lib"];

const OSTREE_PACKAGE: &str = "python3-tkinter";

/// Remediation strategies, in the order they are tried.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToolkitStrategy {
    /// The interpreter already imports tkinter.
    ImportProbe,
    /// Symlink the system binding into the virtual environment.
    LinkSystemInstall,
    /// Install the distribution package.
    SystemPackage,
    /// Layer the package on an rpm-ostree system.
    ImmutableLayer,
}

impl ToolkitStrategy {
    /// Full chain.
    pub const CHAIN: [ToolkitStrategy; 4] = [
        ToolkitStrategy::ImportProbe,
        ToolkitStrategy::LinkSystemInstall,
        ToolkitStrategy::SystemPackage,
        ToolkitStrategy::ImmutableLayer,
    ];
}

impl fmt::Display for ToolkitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolkitStrategy::ImportProbe => "tkinter import probe",
            ToolkitStrategy::LinkSystemInstall => "link system tkinter into virtualenv",
            ToolkitStrategy::SystemPackage => "install tkinter system package",
            ToolkitStrategy::ImmutableLayer => "layer tkinter with rpm-ostree",
        })
    }
}

/// Interpreter facts needed to link a system binding.
#[derive(Clone, Debug, Eq, PartialEq)]
struct PythonLayout {
    version: String,
    prefix: PathBuf,
    base_prefix: PathBuf,
    site_packages: PathBuf,
}

impl PythonLayout {
    fn parse(stdout: &str) -> Option<Self> {
        let mut lines = stdout.lines().map(str::trim);
        Some(Self {
            version: lines.next()?.to_string(),
            prefix: PathBuf::from(lines.next()?),
            base_prefix: PathBuf::from(lines.next()?),
            site_packages: PathBuf::from(lines.next()?),
        })
    }

    fn is_virtualenv(&self) -> bool {
        self.prefix != self.base_prefix
    }
}

/// A system tkinter install found on disk.
#[derive(Clone, Debug, Eq, PartialEq)]
struct SystemToolkit {
    extension: PathBuf,
    package: Option<PathBuf>,
}

/// Makes tkinter importable by the host interpreter.
///
/// Returns the strategy that succeeded, or [`Error::RuntimeSupport`]
/// describing every attempt.
pub async fn ensure_toolkit(host: &Host) -> Result<ToolkitStrategy> {
    strategy::drive(&ToolkitStrategy::CHAIN, |s| attempt(host, *s))
        .await
        .copied()
        .map_err(|failure| Error::RuntimeSupport(failure.to_string()))
}

async fn attempt(host: &Host, strategy: ToolkitStrategy) -> StrategyOutcome {
    match strategy {
        ToolkitStrategy::ImportProbe => {
            if import_probe(host).await {
                StrategyOutcome::Satisfied
            } else {
                StrategyOutcome::Failed("`import tkinter` failed".into())
            }
        }
        ToolkitStrategy::LinkSystemInstall => link_system_install(host).await,
        ToolkitStrategy::SystemPackage => system_package(host).await,
        ToolkitStrategy::ImmutableLayer => immutable_layer(host).await,
    }
}

async fn import_probe(host: &Host) -> bool {
    let mut cmd = host.python_command();
    cmd.args(["-c", IMPORT_PROBE]);
    process::probe(&mut cmd).await
}

async fn python_layout(host: &Host) -> Option<PythonLayout> {
    let mut cmd = host.python_command();
    cmd.args(["-c", LAYOUT_QUERY]);
    let stdout = process::stdout_if_success(&mut cmd).await?;
    PythonLayout::parse(&stdout)
}

fn find_system_toolkit(root: &Path, version: &str) -> Result<Option<SystemToolkit>> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    for lib_dir in SYSTEM_LIB_DIRS {
        let pattern = format!(
            "{}/{}/python{}/lib-dynload/_tkinter*.so",
            escaped_root.trim_end_matches('/'),
            lib_dir,
            version
        );
        let Some(extension) = glob::glob(&pattern)?.filter_map(|entry| entry.ok()).next() else {
            continue;
        };
        let package = extension
            .parent()
            .and_then(Path::parent)
            .map(|stdlib| stdlib.join("tkinter"))
            .filter(|p| p.is_dir());
        return Ok(Some(SystemToolkit { extension, package }));
    }
    Ok(None)
}

async fn link_system_install(host: &Host) -> StrategyOutcome {
    let Some(layout) = python_layout(host).await else {
        return StrategyOutcome::Failed("could not query interpreter layout".into());
    };
    if !layout.is_virtualenv() {
        return StrategyOutcome::NotApplicable("interpreter is not in a virtual environment".into());
    }

    let found = match find_system_toolkit(host.root(), &layout.version) {
        Ok(Some(found)) => found,
        Ok(None) => {
            return StrategyOutcome::NotApplicable(format!(
                "no system tkinter for python {}",
                layout.version
            ));
        }
        Err(e) => return StrategyOutcome::Failed(e.to_string()),
    };

    if let Err(e) = link_into(&found, &layout.site_packages).await {
        return StrategyOutcome::Failed(e.to_string());
    }

    if import_probe(host).await {
        StrategyOutcome::Satisfied
    } else {
        StrategyOutcome::Failed("linked system tkinter but import still fails".into())
    }
}

async fn link_into(found: &SystemToolkit, site_packages: &Path) -> Result<()> {
    fs::create_dir_all(site_packages, false).await?;

    let links = std::iter::once(&found.extension).chain(found.package.as_ref());
    for target in links {
        let Some(name) = target.file_name() else {
            continue;
        };
        let link = site_packages.join(name);
        log::info!("Linking {} -> {}", link.display(), target.display());
        fs::replace_symlink(target, &link).await?;
    }
    Ok(())
}

async fn system_package(host: &Host) -> StrategyOutcome {
    if host.is_ostree_booted() {
        return StrategyOutcome::NotApplicable("image-based system".into());
    }
    let Some(pm) = PackageManager::detect(host) else {
        return StrategyOutcome::NotApplicable("no supported package manager".into());
    };
    if let Err(e) = pm.install(host, SystemPackage::Tkinter).await {
        return StrategyOutcome::Failed(e.to_string());
    }
    if import_probe(host).await {
        StrategyOutcome::Satisfied
    } else {
        StrategyOutcome::Failed(format!("installed via {} but import still fails", pm.binary()))
    }
}

async fn immutable_layer(host: &Host) -> StrategyOutcome {
    if !host.is_ostree_booted() {
        return StrategyOutcome::NotApplicable("not an rpm-ostree system".into());
    }
    let Some(rpm_ostree) = host.which("rpm-ostree") else {
        return StrategyOutcome::NotApplicable("rpm-ostree not found in PATH".into());
    };

    let mut install = host.privileged(&rpm_ostree);
    install.args(["install", "--idempotent", "--allow-inactive", OSTREE_PACKAGE]);
    match process::status(&mut install).await {
        Ok(status) if status.success() => {}
        Ok(status) => {
            return StrategyOutcome::Failed(format!("rpm-ostree install exited with {}", status));
        }
        Err(e) => return StrategyOutcome::Failed(e.to_string()),
    }

    let mut apply = host.privileged(&rpm_ostree);
    apply.args(["apply-live", "--allow-replacement"]);
    match process::status(&mut apply).await {
        Ok(status) if status.success() => {}
        Ok(status) => log::warn!("rpm-ostree apply-live exited with {}", status),
        Err(e) => log::warn!("{}", e),
    }

    if import_probe(host).await {
        StrategyOutcome::Satisfied
    } else {
        StrategyOutcome::Failed(format!(
            "{} is layered but not active; reboot and run the build again",
            OSTREE_PACKAGE
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interpreter_layout() {
        let layout = PythonLayout::parse(
            "3.12\n/home/u/venv\n/usr\n/home/u/venv/lib/python3.12/site-packages\n",
        )
        .unwrap();
        assert_eq!(layout.version, "3.12");
        assert!(layout.is_virtualenv());
        assert!(PythonLayout::parse("3.12\n/usr\n").is_none());
    }

    #[test]
    fn finds_system_binding_under_lib64() {
        let root = tempfile::tempdir().unwrap();
        let stdlib = root.path().join("usr/lib64/python3.12");
        std::fs::create_dir_all(stdlib.join("lib-dynload")).unwrap();
        std::fs::create_dir_all(stdlib.join("tkinter")).unwrap();
        let ext = stdlib.join("lib-dynload/_tkinter.cpython-312-x86_64-linux-gnu.so");
        std::fs::write(&ext, b"").unwrap();

        let found = find_system_toolkit(root.path(), "3.12").unwrap().unwrap();
        assert_eq!(found.extension, ext);
        assert_eq!(found.package, Some(stdlib.join("tkinter")));

        assert!(find_system_toolkit(root.path(), "3.11").unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn links_system_binding_into_virtualenv() {
        use crate::bundler::host::test_support::write_script;

        let root = tempfile::tempdir().unwrap();
        let dynload = root.path().join("usr/lib/python3.12/lib-dynload");
        std::fs::create_dir_all(&dynload).unwrap();
        std::fs::write(dynload.join("_tkinter.cpython-312-x86_64-linux-gnu.so"), b"").unwrap();

        let venv = tempfile::tempdir().unwrap();
        let site = venv.path().join("site-packages");
        let linked = site.join("_tkinter.cpython-312-x86_64-linux-gnu.so");
        let python = write_script(
            venv.path(),
            "python3",
            &format!(
                "if [ \"$2\" = \"import tkinter\" ]; then [ -L {linked} ]; exit $?; fi\n\
                 printf '3.12\\n{venv}\\n/usr\\n{site}\\n'",
                linked = linked.display(),
                venv = venv.path().display(),
                site = site.display(),
            ),
        );
        let bin = tempfile::tempdir().unwrap();

        let host = Host::new(&python)
            .with_root(root.path())
            .with_search_path(bin.path());
        let chosen = ensure_toolkit(&host).await.unwrap();
        assert_eq!(chosen, ToolkitStrategy::LinkSystemInstall);
        assert!(linked.exists());
    }

    /// Interpreter that imports tkinter only once `marker` exists and
    /// reports a non-virtualenv layout.
    #[cfg(unix)]
    fn python_gated_on(dir: &Path, marker: &Path) -> PathBuf {
        crate::bundler::host::test_support::write_script(
            dir,
            "python3",
            &format!(
                "if [ \"$2\" = \"import tkinter\" ]; then [ -f {marker} ]; exit $?; fi\n\
                 printf '3.12\\n/usr\\n/usr\\n/tmp\\n'",
                marker = marker.display(),
            ),
        )
    }

    #[cfg(unix)]
    fn logged_calls(log: &Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn installs_distribution_package_then_rechecks() {
        use crate::bundler::host::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("tk-installed");
        let log = dir.path().join("apt.log");
        let python = python_gated_on(dir.path(), &marker);

        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), "sudo", "exec \"$@\"");
        write_script(
            bin.path(),
            "apt-get",
            &format!(
                "printf '%s\\n' \"$*\" >> {log}\n: > {marker}",
                log = log.display(),
                marker = marker.display()
            ),
        );
        let root = tempfile::tempdir().unwrap();

        let host = Host::new(&python)
            .with_root(root.path())
            .with_search_path(bin.path());
        let chosen = ensure_toolkit(&host).await.unwrap();

        assert_eq!(chosen, ToolkitStrategy::SystemPackage);
        assert_eq!(logged_calls(&log), ["install -y python3-tk"]);
    }

    #[cfg(unix)]
    fn ostree_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("run")).unwrap();
        std::fs::write(root.path().join("run/ostree-booted"), b"").unwrap();
        root
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn layers_package_and_applies_live_on_ostree() {
        use crate::bundler::host::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("tk-live");
        let log = dir.path().join("rpm-ostree.log");
        let python = python_gated_on(dir.path(), &marker);

        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), "sudo", "exec \"$@\"");
        // apt-get is ignored on an image-based system
        write_script(bin.path(), "apt-get", "exit 1");
        write_script(
            bin.path(),
            "rpm-ostree",
            &format!(
                "printf '%s\\n' \"$*\" >> {log}\n\
                 if [ \"$1\" = \"apply-live\" ]; then : > {marker}; fi",
                log = log.display(),
                marker = marker.display()
            ),
        );
        let root = ostree_root();

        let host = Host::new(&python)
            .with_root(root.path())
            .with_search_path(bin.path());
        let chosen = ensure_toolkit(&host).await.unwrap();

        assert_eq!(chosen, ToolkitStrategy::ImmutableLayer);
        assert_eq!(
            logged_calls(&log),
            [
                "install --idempotent --allow-inactive python3-tkinter",
                "apply-live --allow-replacement",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn staged_but_inactive_layer_asks_for_reboot() {
        use crate::bundler::host::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let python = python_gated_on(dir.path(), &dir.path().join("never"));

        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), "sudo", "exec \"$@\"");
        write_script(
            bin.path(),
            "rpm-ostree",
            "if [ \"$1\" = \"apply-live\" ]; then exit 1; fi\nexit 0",
        );
        let root = ostree_root();

        let host = Host::new(&python)
            .with_root(root.path())
            .with_search_path(bin.path());
        let err = ensure_toolkit(&host).await.unwrap_err();

        let Error::RuntimeSupport(summary) = err else {
            panic!("unexpected error: {err}");
        };
        assert!(summary.contains("image-based system"));
        assert!(summary.contains("reboot"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exhausted_chain_is_runtime_support_error() {
        use crate::bundler::host::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let python = write_script(
            dir.path(),
            "python3",
            "if [ \"$2\" = \"import tkinter\" ]; then exit 1; fi\nprintf '3.12\\n/usr\\n/usr\\n/tmp\\n'",
        );
        let root = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();

        let host = Host::new(&python)
            .with_root(root.path())
            .with_search_path(bin.path());
        let err = ensure_toolkit(&host).await.unwrap_err();
        let Error::RuntimeSupport(summary) = err else {
            panic!("unexpected error: {err}");
        };
        assert!(summary.contains("not in a virtual environment"));
        assert!(summary.contains("no supported package manager"));
        assert!(summary.contains("not an rpm-ostree system"));
    }
}
