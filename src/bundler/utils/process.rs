//! Thin wrappers over `tokio::process::Command`.
//!
//! Every external tool in the pipeline is an opaque blocking call: we only
//! look at its exit status (and occasionally its stdout).

use crate::bundler::error::{Error, Result};
use std::process::{ExitStatus, Output, Stdio};
use tokio::process::Command;

/// Renders a command line for logs and error messages.
pub fn describe(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a command with inherited stdio and returns its exit status.
///
/// Spawn failures become [`Error::CommandFailed`].
pub async fn status(cmd: &mut Command) -> Result<ExitStatus> {
    log::debug!("Running: {}", describe(cmd));
    cmd.status().await.map_err(|error| Error::CommandFailed {
        command: describe(cmd),
        error,
    })
}

/// Runs a command capturing stdout and stderr.
pub async fn output(cmd: &mut Command) -> Result<Output> {
    log::debug!("Running: {}", describe(cmd));
    cmd.stdin(Stdio::null())
        .output()
        .await
        .map_err(|error| Error::CommandFailed {
            command: describe(cmd),
            error,
        })
}

/// Runs a command silently and reports whether it exited 0.
///
/// A command that cannot be spawned counts as a failed probe.
pub async fn probe(cmd: &mut Command) -> bool {
    log::debug!("Probing: {}", describe(cmd));
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Runs a command capturing output and returns trimmed stdout on success.
pub async fn stdout_if_success(cmd: &mut Command) -> Option<String> {
    match output(cmd).await {
        Ok(out) if out.status.success() => {
            Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
        }
        _ => None,
    }
}
