//! Build orchestration.
//!
//! This module provides the [`Bundler`] that runs the build pipeline and
//! the [`BuildReport`] it returns.
//!
//! # Overview
//!
//! The bundler:
//! 1. Checks that the script exists (nothing runs before this)
//! 2. Optionally removes previous outputs
//! 3. Installs PyInstaller and the optional runtime dependencies
//! 4. Optionally fetches the converter binaries
//! 5. Runs PyInstaller with the present assets and a timestamp hook
//! 6. Verifies the artifact exists and records its checksum
//! 7. Runs the requested AppImage/Flatpak tails, recording their outcome
//!
//! # Example
//!
//! ```no_run
//! use romconv_bundler::bundler::{Bundler, PackageType, RunOptions, SettingsBuilder};
//!
//! # async fn example() -> romconv_bundler::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .project_dir(".")
//!     .package_types(vec![PackageType::AppImage])
//!     .build()?;
//!
//! let report = Bundler::new(settings)
//!     .run(&RunOptions { clean: true, ..Default::default() })
//!     .await?;
//!
//! println!("Created: {} ({} bytes)", report.primary.path.display(), report.primary.size);
//! println!("SHA256: {}", report.primary.checksum);
//! for outcome in &report.secondary {
//!     if let Err(e) = &outcome.result {
//!         eprintln!("{} failed: {}", outcome.package_type, e);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum and size of artifacts
//! - [`hook`] - scoped runtime hook file
//! - [`orchestrator`] - the [`Bundler`] and its pipeline stages
//! - [`packager`] - PyInstaller argument assembly
//! - [`report`] - run results

pub mod checksum;
pub mod hook;
mod orchestrator;
pub mod packager;
mod report;

pub use orchestrator::{Bundler, RunOptions, RuntimeSupport};
pub use report::{BuildReport, BundledArtifact, SecondaryOutcome};
