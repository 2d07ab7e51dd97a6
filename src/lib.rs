//! Build orchestrator that freezes ROM Converter into distributable artifacts.
//!
//! This library drives PyInstaller to produce:
//! - a standalone executable or onedir bundle
//! - an AppImage wrapping it (Linux)
//! - a Flatpak bundle wrapping it (Linux)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
