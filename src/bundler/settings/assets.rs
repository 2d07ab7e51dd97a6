//! Optional files embedded into the frozen executable.

use std::path::{Path, PathBuf};

/// How PyInstaller should embed an asset.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Executable helper, passed with `--add-binary`.
    Binary,
    /// Plain data file, passed with `--add-data`.
    Data,
}

impl AssetKind {
    /// PyInstaller flag for this kind.
    pub fn flag(self) -> &'static str {
        match self {
            AssetKind::Binary => "--add-binary",
            AssetKind::Data => "--add-data",
        }
    }
}

/// An optional file that is bundled when present and skipped otherwise.
///
/// # Configuration
///
/// ```toml
/// [[assets]]
/// name = "chdman"
/// path = "tools/chdman"
/// kind = "binary"
/// ```
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
pub struct OptionalAsset {
    name: String,
    path: PathBuf,
    kind: AssetKind,
}

impl OptionalAsset {
    /// Creates an asset with a path relative to the project directory.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: AssetKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }

    /// A converter executable, named with the host's executable suffix.
    pub fn converter(name: &str) -> Self {
        let file = format!("{name}{}", std::env::consts::EXE_SUFFIX);
        Self::new(name, file, AssetKind::Binary)
    }

    /// The standard set: `chdman`, `maxcso` and the AES key file.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::converter(CHDMAN),
            Self::converter(MAXCSO),
            Self::new(AES_KEYS, "aes_keys.txt", AssetKind::Data),
        ]
    }

    /// Logical asset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the project directory (or absolute).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Embedding kind.
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Whether this asset is one of the converter executables.
    pub fn is_converter(&self) -> bool {
        self.kind == AssetKind::Binary && (self.name == CHDMAN || self.name == MAXCSO)
    }

    /// Resolves the asset against the project directory.
    pub fn resolve(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.path)
    }

    /// The two-element PyInstaller argument that embeds this asset at the
    /// bundle root.
    pub fn bundle_flag(&self, project_dir: &Path) -> [String; 2] {
        [
            self.kind.flag().to_string(),
            format!(
                "{}{}.",
                self.resolve(project_dir).display(),
                add_data_separator()
            ),
        ]
    }
}

/// Asset name of the CHD converter.
pub const CHDMAN: &str = "chdman";
/// Asset name of the CSO/ZSO converter.
pub const MAXCSO: &str = "maxcso";
/// Asset name of the key file.
pub const AES_KEYS: &str = "aes_keys.txt";

/// Separator between source and destination in `--add-data`/`--add-binary`.
pub fn add_data_separator() -> char {
    if cfg!(windows) { ';' } else { ':' }
}
