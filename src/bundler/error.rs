//! Error types for the build pipeline.
//!
//! Every pipeline stage returns [`Error`]. Variants are split into two
//! severities through [`Error::is_fatal`]: fatal errors abort the run with a
//! non-zero exit code, advisory errors are reported and the run continues.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as DeriveError;

/// Result alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the build pipeline.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// The primary script does not exist.
    #[error("source script not found: {}", .0.display())]
    MissingSource(PathBuf),

    /// A required dependency could not be installed.
    #[error("failed to install `{package}`: {reason}")]
    DependencyInstall {
        /// Package that failed to install
        package: String,
        /// What went wrong
        reason: String,
    },

    /// Every remediation strategy for the GUI toolkit binding failed.
    #[error("GUI toolkit binding unavailable: {0}")]
    RuntimeSupport(String),

    /// The packaging tool reported failure.
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// The packager returned but the declared artifact is not on disk.
    #[error("expected artifact missing after packaging: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// AppImage packaging requested without a verified primary artifact.
    #[error("no verified primary artifact recorded for AppImage packaging")]
    AppImageSourceMissing,

    /// The AppImage helper did not produce its output.
    #[error("AppImage packaging failed: {0}")]
    AppImagePackaging(String),

    /// Flatpak packaging requested without a verified primary artifact.
    #[error("no verified primary artifact recorded for Flatpak packaging")]
    FlatpakSourceMissing,

    /// The Flatpak builder did not produce a bundle.
    #[error("Flatpak packaging failed: {0}")]
    FlatpakPackaging(String),

    /// An external command could not be spawned.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Command line that failed to spawn
        command: String,
        /// Underlying spawn error
        #[source]
        error: io::Error,
    },

    /// Filesystem operation failed on a known path.
    #[error("{context} ({}): {error}", path.display())]
    Fs {
        /// What was being done
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: io::Error,
    },

    /// Plain IO error.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Template rendering error.
    #[error(transparent)]
    Template(#[from] handlebars::RenderError),

    /// Image decode or encode error.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// HTTP error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Directory walk error.
    #[error(transparent)]
    Walkdir(#[from] walkdir::Error),

    /// Path prefix error.
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Glob pattern error.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Whether this error aborts the whole run.
    ///
    /// Secondary packaging failures are advisory: they are reported but
    /// never change the primary exit code.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::AppImageSourceMissing
                | Error::AppImagePackaging(_)
                | Error::FlatpakSourceMissing
                | Error::FlatpakPackaging(_)
        )
    }
}

/// Attach a message to an error or a missing value.
pub trait Context<T> {
    /// Wrap the failure with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the failure with a lazily built context.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attach the path being operated on to IO errors.
pub trait ErrorExt<T> {
    /// Convert an IO failure into [`Error::Fs`].
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secondary_packaging_errors_are_advisory() {
        assert!(!Error::AppImageSourceMissing.is_fatal());
        assert!(!Error::AppImagePackaging("no output".into()).is_fatal());
        assert!(!Error::FlatpakPackaging("no bundle".into()).is_fatal());
        assert!(Error::ArtifactMissing(PathBuf::from("dist/app")).is_fatal());
        assert!(Error::MissingSource(PathBuf::from("app.py")).is_fatal());
    }

    #[test]
    fn fs_context_keeps_path() {
        let err = std::fs::read("/definitely/not/here")
            .fs_context("reading config", "/definitely/not/here")
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here"));
        assert!(err.to_string().starts_with("reading config"));
    }
}
