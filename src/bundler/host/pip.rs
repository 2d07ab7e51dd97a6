//! Python package checks and installs through `python -m pip`.

use super::Host;
use crate::bundler::{
    error::{Error, Result},
    utils::process,
};

/// Whether `package` is installed for the host interpreter.
pub async fn is_installed(host: &Host, package: &str) -> bool {
    let mut cmd = host.python_command();
    cmd.args(["-m", "pip", "show", package]);
    process::probe(&mut cmd).await
}

/// Installs `package` for the host interpreter.
pub async fn install(host: &Host, package: &str) -> Result<()> {
    log::info!("Installing {} with pip", package);
    let mut cmd = host.python_command();
    cmd.args(["-m", "pip", "install", package]);

    let status = process::status(&mut cmd)
        .await
        .map_err(|e| Error::DependencyInstall {
            package: package.to_string(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(Error::DependencyInstall {
            package: package.to_string(),
            reason: format!("pip exited with {}", status),
        });
    }
    Ok(())
}

/// Installs `package` unless already present.
///
/// Returns `true` when an install was performed.
pub async fn ensure(host: &Host, package: &str) -> Result<bool> {
    if is_installed(host, package).await {
        log::debug!("{} already installed", package);
        return Ok(false);
    }
    install(host, package).await?;
    Ok(true)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::bundler::host::test_support::write_script;

    #[tokio::test]
    async fn ensure_skips_install_when_show_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls");
        let python = write_script(
            dir.path(),
            "python3",
            &format!("echo \"$*\" >> {}\nexit 0", log.display()),
        );

        let host = Host::new(&python);
        assert!(!ensure(&host, "pyinstaller").await.unwrap());
        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls.trim(), "-m pip show pyinstaller");
    }

    #[tokio::test]
    async fn failed_install_is_dependency_error() {
        let dir = tempfile::tempdir().unwrap();
        let python = write_script(dir.path(), "python3", "exit 1");

        let host = Host::new(&python);
        let err = ensure(&host, "pyinstaller").await.unwrap_err();
        assert!(
            matches!(err, Error::DependencyInstall { ref package, .. } if package == "pyinstaller")
        );
    }
}
