//! Build pipeline for freezing ROM Converter into distributable artifacts.
//!
//! The entry point is [`Bundler`], which runs the linear pipeline:
//!
//! ```text
//! Preflight → [Clean] → EnsurePackagerInstalled → EnsureOptionalRuntimeSupport
//!   → [FetchConverters] → CollectOptionalAssets → Invoke → VerifyArtifact
//!   → [AppImage] → [Flatpak]
//! ```
//!
//! Stages up to `VerifyArtifact` are fatal on failure. The two secondary
//! packaging tails are advisory: their failures are recorded in the
//! [`BuildReport`] and never affect the primary result.
//!
//! # Example
//!
//! ```no_run
//! use romconv_bundler::bundler::{Bundler, RunOptions, SettingsBuilder};
//!
//! # async fn example() -> romconv_bundler::bundler::Result<()> {
//! let settings = SettingsBuilder::new().project_dir(".").build()?;
//! let report = Bundler::new(settings).run(&RunOptions::default()).await?;
//! println!("Created {}", report.primary.path.display());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod host;
pub mod platform;
pub mod settings;
pub mod tools;
pub mod utils;

pub use builder::{BuildReport, BundledArtifact, Bundler, RunOptions, SecondaryOutcome};
pub use error::{Error, Result};
pub use platform::PackageType;
pub use settings::{
    AppImageSettings, Arch, AssetKind, BuildMode, FlatpakSettings, OptionalAsset,
    PackageSettings, Settings, SettingsBuilder,
};
