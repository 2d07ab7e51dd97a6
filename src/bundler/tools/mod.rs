//! Converter binary fetching (`--download-tools`).
//!
//! Places `chdman` and `maxcso` next to the script so the asset collection
//! stage picks them up. Every failure here is advisory: the artifact simply
//! ships without that converter.

use crate::bundler::{
    OptionalAsset, Settings,
    host::{
        Host,
        package_manager::{PackageManager, SystemPackage},
    },
    settings::{CHDMAN, MAXCSO},
    utils::{fs, http, process},
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    io::Read,
    path::{Path, PathBuf},
};

const MAME_LATEST_RELEASE: &str = "https://api.github.com/repos/mamedev/mame/releases/latest";
const MAXCSO_LATEST_RELEASE: &str =
    "https://api.github.com/repos/unknownbrackets/maxcso/releases/latest";

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    tarball_url: String,
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

impl Release {
    fn asset(&self, matches: impl Fn(&str) -> bool) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| matches(&a.name))
    }
}

/// Makes `asset` available in the project directory.
///
/// Returns `Ok(None)` when it was already there and the destination path
/// when it was fetched.
pub async fn fetch_converter(
    asset: &OptionalAsset,
    settings: &Settings,
    host: &Host,
) -> Result<Option<PathBuf>> {
    let dest = asset.resolve(settings.project_dir());
    if dest.exists() {
        return Ok(None);
    }

    if let Some(found) = host.which(asset.name()) {
        log::info!("Copying {} from {}", asset.name(), found.display());
        fs::copy_file(&found, &dest).await?;
        fs::set_executable(&dest).await?;
        return Ok(Some(dest));
    }

    match asset.name() {
        CHDMAN => fetch_chdman(settings, host, &dest).await?,
        MAXCSO => fetch_maxcso(settings, host, &dest).await?,
        other => anyhow::bail!("don't know how to fetch {}", other),
    }

    if !dest.exists() {
        anyhow::bail!("{} was not produced", dest.display());
    }
    fs::set_executable(&dest).await?;
    Ok(Some(dest))
}

fn download_dir(settings: &Settings) -> PathBuf {
    settings.work_dir().join(".downloads")
}

async fn fetch_chdman(settings: &Settings, host: &Host, dest: &Path) -> Result<()> {
    if cfg!(windows) {
        return fetch_chdman_release(settings, host, dest).await;
    }

    let pm = PackageManager::detect(host).context("no supported package manager to install chdman")?;
    pm.install(host, SystemPackage::MameTools)
        .await
        .context("installing MAME tools")?;

    let installed = host
        .which(CHDMAN)
        .context("chdman still not in PATH after installing MAME tools")?;
    fs::copy_file(&installed, dest).await?;
    Ok(())
}

/// Extracts `chdman.exe` from the MAME release's self-extracting archive.
async fn fetch_chdman_release(settings: &Settings, host: &Host, dest: &Path) -> Result<()> {
    let seven_zip = host
        .which("7z")
        .or_else(|| host.which("7za"))
        .context("7-Zip is required to extract chdman from the MAME release")?;

    let release: Release = http::fetch_json(MAME_LATEST_RELEASE).await?;
    let archive = release
        .asset(|name| name.ends_with("_64bit.exe") || name.ends_with("_x64.exe"))
        .with_context(|| format!("no 64-bit Windows archive in MAME {}", release.tag_name))?;

    let downloads = download_dir(settings);
    fs::create_dir_all(&downloads, false).await?;
    let archive_path = downloads.join(&archive.name);
    let bytes = http::download(&archive.browser_download_url).await?;
    tokio::fs::write(&archive_path, bytes)
        .await
        .with_context(|| format!("writing {}", archive_path.display()))?;

    let out_dir = dest.parent().context("destination has no parent directory")?;
    let mut cmd = host.command(&seven_zip);
    cmd.arg("e")
        .arg(&archive_path)
        .arg(format!("-o{}", out_dir.display()))
        .arg("chdman.exe")
        .arg("-y");
    let status = process::status(&mut cmd).await?;
    if !status.success() {
        anyhow::bail!("7-Zip exited with {}", status);
    }

    fs::remove_file(&archive_path).await?;
    Ok(())
}

async fn fetch_maxcso(settings: &Settings, host: &Host, dest: &Path) -> Result<()> {
    let release: Release = http::fetch_json(MAXCSO_LATEST_RELEASE).await?;

    if cfg!(windows) {
        let archive = release
            .asset(|name| name.ends_with(".zip"))
            .with_context(|| format!("no zip archive in maxcso {}", release.tag_name))?;
        let bytes = http::download(&archive.browser_download_url).await?;
        let dest = dest.to_path_buf();
        return tokio::task::spawn_blocking(move || extract_from_zip(&bytes, "maxcso.exe", &dest))
            .await?;
    }

    let bytes = http::download(&release.tarball_url).await?;
    let src_root = download_dir(settings).join(format!("maxcso-{}", release.tag_name));
    fs::create_dir_all(&src_root, true).await?;

    let unpack_into = src_root.clone();
    tokio::task::spawn_blocking(move || unpack_tarball(&bytes, &unpack_into)).await??;
    let src_dir = find_makefile_dir(&src_root)?;

    log::info!("Building maxcso {} from source", release.tag_name);
    let make = host.which("make").context("make is required to build maxcso")?;
    let mut cmd = host.command(&make);
    cmd.current_dir(&src_dir);
    let status = process::status(&mut cmd).await?;
    if !status.success() {
        anyhow::bail!("make exited with {} (maxcso needs libuv, lz4 and zlib headers)", status);
    }

    fs::copy_file(&src_dir.join(MAXCSO), dest).await?;
    Ok(())
}

fn extract_from_zip(bytes: &[u8], file_name: &str, dest: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let matches = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n == file_name))
            .unwrap_or(false);
        if matches {
            let mut contents = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut contents)?;
            std::fs::write(dest, contents).with_context(|| format!("writing {}", dest.display()))?;
            return Ok(());
        }
    }
    anyhow::bail!("{} not found in archive", file_name)
}

fn unpack_tarball(bytes: &[u8], dest: &Path) -> Result<()> {
    let decoder = flate2::read::GzDecoder::new(bytes);
    tar::Archive::new(decoder)
        .unpack(dest)
        .with_context(|| format!("unpacking into {}", dest.display()))
}

/// GitHub tarballs wrap the tree in one `<owner>-<repo>-<sha>/` directory.
fn find_makefile_dir(root: &Path) -> Result<PathBuf> {
    if root.join("Makefile").is_file() {
        return Ok(root.to_path_buf());
    }
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.join("Makefile").is_file() {
            return Ok(path);
        }
    }
    anyhow::bail!("no Makefile under {}", root.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::SettingsBuilder;
    use std::io::Write;

    #[test]
    fn picks_release_asset_by_name() {
        let release: Release = serde_json::from_str(
            r#"{
                "tag_name": "mame0283",
                "tarball_url": "https://example.invalid/tarball",
                "assets": [
                    {"name": "mame0283b_64bit.exe", "browser_download_url": "https://example.invalid/a"},
                    {"name": "mame0283s.exe", "browser_download_url": "https://example.invalid/b"}
                ]
            }"#,
        )
        .unwrap();
        let asset = release.asset(|n| n.ends_with("_64bit.exe")).unwrap();
        assert_eq!(asset.browser_download_url, "https://example.invalid/a");
    }

    #[test]
    fn extracts_named_file_from_zip() {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("maxcso-v1.13.0/README.md", options).unwrap();
            writer.write_all(b"readme").unwrap();
            writer.start_file("maxcso-v1.13.0/maxcso.exe", options).unwrap();
            writer.write_all(b"MZ").unwrap();
            writer.finish().unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("maxcso.exe");
        extract_from_zip(buf.get_ref(), "maxcso.exe", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"MZ");

        assert!(extract_from_zip(buf.get_ref(), "chdman.exe", &dest).is_err());
    }

    #[test]
    fn finds_makefile_inside_tarball_wrapper() {
        let mut tar_bytes = Vec::new();
        {
            let encoder =
                flate2::write::GzEncoder::new(&mut tar_bytes, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let mut header = tar::Header::new_gnu();
            header.set_size(4);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "unknownbrackets-maxcso-abc123/Makefile", &b"all:"[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        unpack_tarball(&tar_bytes, dir.path()).unwrap();
        assert_eq!(
            find_makefile_dir(dir.path()).unwrap(),
            dir.path().join("unknownbrackets-maxcso-abc123")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn present_or_on_path_needs_no_download() {
        use crate::bundler::host::test_support::write_script;

        let project = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), CHDMAN, "exit 0");
        let settings = SettingsBuilder::new().project_dir(project.path()).build().unwrap();
        let host = Host::new("python3").with_search_path(bin.path());

        let chdman = OptionalAsset::converter(CHDMAN);
        let fetched = fetch_converter(&chdman, &settings, &host).await.unwrap();
        assert_eq!(fetched, Some(project.path().join(CHDMAN)));

        // second run finds it in place
        assert_eq!(fetch_converter(&chdman, &settings, &host).await.unwrap(), None);
    }
}
