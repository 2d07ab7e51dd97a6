//! File system utilities for bundling.
//!
//! Provides idempotent removal, file and directory copies with automatic
//! parent creation, and permission helpers.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(Error::Fs {
            context: "removing directory".into(),
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Removes the file if it exists.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing file".into(),
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Removes whatever is at `path`, file or directory, if anything.
pub async fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => remove_dir_all(path).await,
        Ok(_) => remove_file(path).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "inspecting path".into(),
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Creates a symlink at `dst` pointing to `src`, replacing whatever is there.
pub async fn replace_symlink(src: &Path, dst: &Path) -> Result<()> {
    if let Ok(meta) = fs::symlink_metadata(dst).await {
        if meta.is_dir() {
            remove_dir_all(dst).await?;
        } else {
            remove_file(dst).await?;
        }
    }

    let is_dir = src.is_dir();
    let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
    tokio::task::spawn_blocking(move || {
        if is_dir {
            symlink_dir(&src, &dst)
        } else {
            symlink_file(&src, &dst)
        }
        .fs_context("creating symlink", &dst)
    })
    .await
    .map_err(|e| Error::GenericError(format!("symlink task panicked: {}", e)))?
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", to)?;
    Ok(())
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Preserves symlinks on platforms that support them.
/// Fails if the source path is not a directory or doesn't exist.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{from:?} is not a Directory")));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Offload blocking work to dedicated thread pool
    tokio::task::spawn_blocking(move || -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }

        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())?;
                if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)?;
                } else {
                    symlink_file(&target, &dest_path)?;
                }
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(dest_path)?;
            } else {
                std::fs::copy(entry.path(), dest_path)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))?
}

/// Marks a file executable (`0o755`). No-op on Windows.
pub async fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .fs_context("setting executable permissions", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removal_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        remove_dir_all(&missing).await.unwrap();
        remove_file(&missing).await.unwrap();

        let present = dir.path().join("present");
        std::fs::create_dir_all(present.join("nested")).unwrap();
        remove_dir_all(&present).await.unwrap();
        assert!(!present.exists());
    }

    #[tokio::test]
    async fn copy_dir_preserves_layout() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("lib")).unwrap();
        std::fs::write(src.join("app"), b"bin").unwrap();
        std::fs::write(src.join("lib/libtk.so"), b"so").unwrap();

        let dst = dir.path().join("out/copy");
        copy_dir(&src, &dst).await.unwrap();

        assert_eq!(std::fs::read(dst.join("app")).unwrap(), b"bin");
        assert_eq!(std::fs::read(dst.join("lib/libtk.so")).unwrap(), b"so");
    }

    #[tokio::test]
    async fn copy_file_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(copy_file(dir.path(), &dir.path().join("x")).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn replace_symlink_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.txt");
        std::fs::write(&target, b"t").unwrap();
        let link = dir.path().join("link");
        std::fs::write(&link, b"stale").unwrap();

        replace_symlink(&target, &link).await.unwrap();
        assert_eq!(std::fs::read_link(&link).unwrap(), target);
    }
}
