//! Configuration structures for a build run.
//!
//! This module provides the immutable [`Settings`] consumed by every pipeline
//! stage, the [`SettingsBuilder`] that assembles it from defaults, the
//! project config file and CLI flags, and the per-format settings.

mod arch;
mod assets;
mod builder;
mod core;
mod linux;
mod package;

pub use arch::Arch;
pub use assets::{AES_KEYS, AssetKind, CHDMAN, MAXCSO, OptionalAsset, add_data_separator};
pub use builder::{DEFAULT_BUILD_TIME_ENV, DEFAULT_SCRIPT, SettingsBuilder};
pub use self::core::{BuildMode, Settings};
pub use linux::{APPIMAGETOOL_BASE_URL, AppImageSettings, FlatpakSettings};
pub use package::PackageSettings;
