//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation
//! and the runtime configuration derived from it.

use clap::Parser;
use std::path::PathBuf;

/// Build orchestrator for ROM Converter
#[derive(Parser, Debug)]
#[command(
    name = "romconv_bundler",
    version,
    about = "Freeze ROM Converter into a standalone executable",
    long_about = "Freezes rom_converter.py into a standalone executable with PyInstaller,
embedding chdman, maxcso and aes_keys.txt when they sit next to the script.
Optionally wraps the result into an AppImage and a Flatpak bundle.

Usage:
  romconv_bundler
  romconv_bundler --clean --download-tools
  romconv_bundler --onedir --appimage --flatpak

Exit code 0 = the primary artifact exists in dist/. AppImage and Flatpak
failures are reported but do not change the exit code."
)]
pub struct Args {
    /// Directory containing rom_converter.py
    ///
    /// `dist/`, `build/` and the spec file are created here.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Remove dist/, build/ and the spec file before building
    #[arg(long)]
    pub clean: bool,

    /// Fetch chdman and maxcso before building if they are missing
    #[arg(long)]
    pub download_tools: bool,

    /// Produce a directory bundle instead of a single file
    #[arg(long)]
    pub onedir: bool,

    /// Also package the result as an AppImage (Linux)
    #[arg(long)]
    pub appimage: bool,

    /// Also package the result as a Flatpak bundle (Linux)
    #[arg(long)]
    pub flatpak: bool,

    /// Python interpreter used for pip and PyInstaller
    #[arg(long, value_name = "PATH", env = "ROMCONV_PYTHON")]
    pub python: Option<PathBuf>,

    /// Project config file (default: <project-dir>/romconv.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show detailed progress
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.project_dir.is_dir() {
            return Err(format!(
                "Project directory does not exist: {}",
                self.project_dir.display()
            ));
        }

        if let Some(python) = &self.python
            && python.as_os_str().is_empty()
        {
            return Err("Python interpreter path cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print informational message if not in quiet mode
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        self.output.info(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print error message
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
