//! Scoped runtime hook carrying the build timestamp.

use crate::bundler::{
    Settings,
    error::{ErrorExt, Result},
};
use std::path::{Path, PathBuf};

/// File name of the generated hook, relative to the project dir.
pub const HOOK_FILE_NAME: &str = "_romconv_build_time_hook.py";

/// A PyInstaller runtime hook that exports the build timestamp.
///
/// The file exists for exactly as long as this guard lives; dropping it
/// removes the file whether the packager succeeded, failed or never ran.
#[derive(Debug)]
pub struct RuntimeHook {
    path: PathBuf,
}

impl RuntimeHook {
    /// Where the hook for `settings` is written.
    pub fn path_for(settings: &Settings) -> PathBuf {
        settings.project_dir().join(HOOK_FILE_NAME)
    }

    /// Hook source: sets the variable only when the environment has not.
    pub fn contents(env_var: &str, timestamp: i64) -> String {
        format!(
            "import os\nos.environ.setdefault({:?}, {:?})\n",
            env_var,
            timestamp.to_string()
        )
    }

    /// Writes the hook for `settings` and returns its guard.
    pub async fn create(settings: &Settings) -> Result<Self> {
        let path = Self::path_for(settings);
        let contents = Self::contents(settings.build_time_env(), settings.build_timestamp());
        tokio::fs::write(&path, contents)
            .await
            .fs_context("writing runtime hook", &path)?;
        log::debug!("Wrote runtime hook {}", path.display());
        Ok(Self { path })
    }

    /// Location of the hook file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RuntimeHook {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed runtime hook {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove runtime hook {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::SettingsBuilder;

    #[test]
    fn contents_use_setdefault() {
        assert_eq!(
            RuntimeHook::contents("ROM_CONVERTER_BUILD_TIME", 1_700_000_000),
            "import os\nos.environ.setdefault(\"ROM_CONVERTER_BUILD_TIME\", \"1700000000\")\n"
        );
    }

    #[tokio::test]
    async fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsBuilder::new()
            .project_dir(dir.path())
            .build_timestamp(42)
            .build()
            .unwrap();

        let hook = RuntimeHook::create(&settings).await.unwrap();
        let path = hook.path().to_path_buf();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"42\""));

        drop(hook);
        assert!(!path.exists());
    }
}
