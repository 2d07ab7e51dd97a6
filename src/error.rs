//! Top-level error types for the command line tool.
//!
//! Wraps pipeline errors and configuration problems, and maps each to
//! actionable recovery suggestions.

use crate::bundler::Error as PipelineError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the command line tool
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Project config could not be parsed
    #[error("invalid config {}: {error}", path.display())]
    Config {
        /// Config file path
        path: PathBuf,
        /// Parse error
        #[source]
        error: toml::de::Error,
    },

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] PipelineError),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A path given on the command line does not exist
    #[error("{what} not found: {}", path.display())]
    MissingPath {
        /// What the path was supposed to be
        what: &'static str,
        /// The path
        path: PathBuf,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Bundler(e) => pipeline_suggestions(e),
            BundlerError::Config { .. } => vec![
                "Fix the TOML syntax or remove the offending key".to_string(),
                "Run with --verbose to see which config file was loaded".to_string(),
            ],
            BundlerError::Cli(CliError::MissingPath { .. }) => {
                vec!["Check the path passed on the command line".to_string()]
            }
            BundlerError::Cli(_) => vec!["Run with --help for usage".to_string()],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether this error leaves the primary artifact intact
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BundlerError::Bundler(e) if !e.is_fatal())
    }
}

fn pipeline_suggestions(error: &PipelineError) -> Vec<String> {
    let lines: &[&str] = match error {
        PipelineError::MissingSource(_) => &[
            "Run from the directory containing rom_converter.py",
            "Or pass --project-dir / set `script` in romconv.toml",
        ],
        PipelineError::DependencyInstall { .. } => &[
            "Check network access and that pip works for the selected interpreter",
            "Select another interpreter with --python or ROMCONV_PYTHON",
        ],
        PipelineError::RuntimeSupport(_) => &[
            "Install the tkinter package for your distribution (python3-tk, python3-tkinter, tk)",
            "Or use a Python build that ships tkinter",
        ],
        PipelineError::Packaging(_) => &[
            "Rerun with --clean to discard stale PyInstaller state",
            "Run with --verbose to see the full PyInstaller output",
        ],
        PipelineError::ArtifactMissing(_) => &[
            "PyInstaller exited successfully but wrote nothing to dist/",
            "Rerun with --clean and --verbose and inspect the PyInstaller log",
        ],
        _ => &["Check the error message above for specific details"],
    };
    lines.iter().map(|line| line.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_points_at_project_dir() {
        let err = BundlerError::from(PipelineError::MissingSource("rom_converter.py".into()));
        assert!(
            err.recovery_suggestions()
                .iter()
                .any(|s| s.contains("--project-dir"))
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn secondary_packaging_errors_are_recoverable() {
        let err = BundlerError::from(PipelineError::FlatpakPackaging("no bundle".into()));
        assert!(err.is_recoverable());
    }
}
