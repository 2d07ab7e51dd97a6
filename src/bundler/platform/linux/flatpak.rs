//! Flatpak bundler - sandboxed single-file `.flatpak` bundles.
//!
//! The frozen executable is wrapped in a one-module manifest built on the
//! freedesktop runtime, exported to a local repo with `flatpak-builder`
//! and packed with `flatpak build-bundle`.

use super::{desktop::DesktopEntry, icon};
use crate::bundler::{
    BuildMode, BundledArtifact,
    error::{Error, ErrorExt, Result},
    host::{
        Host,
        package_manager::{PackageManager, SystemPackage},
    },
    settings::Settings,
    utils::{fs, process},
};
use regex::Regex;
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tokio::process::Command;

static APP_ID_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_-]*){2,}$")
});

/// Flatpak manifest (`flatpak-builder` JSON format).
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    app_id: String,
    runtime: String,
    runtime_version: String,
    sdk: String,
    command: String,
    finish_args: Vec<String>,
    modules: Vec<Module>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Module {
    name: String,
    buildsystem: &'static str,
    build_commands: Vec<String>,
    sources: Vec<Source>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Source {
    File { path: String },
    Dir { path: String, dest: String },
}

impl Manifest {
    /// Manifest installing the staged payload, desktop file and icon.
    pub fn new(settings: &Settings) -> Self {
        let flatpak = settings.flatpak();
        let product = settings.product_name();
        let exe = settings.executable_name();
        let app_id = &flatpak.app_id;

        let (mut build_commands, payload) = match settings.mode() {
            BuildMode::OneFile => (
                vec![format!("install -Dm755 {exe} /app/bin/{product}")],
                Source::File { path: exe.clone() },
            ),
            BuildMode::OneDir => (
                vec![
                    format!("mkdir -p /app/lib/{product} /app/bin"),
                    format!("cp -a {product}/. /app/lib/{product}/"),
                    format!("ln -s /app/lib/{product}/{exe} /app/bin/{product}"),
                ],
                Source::Dir {
                    path: product.to_string(),
                    dest: product.to_string(),
                },
            ),
        };
        build_commands.push(format!(
            "install -Dm644 {app_id}.desktop /app/share/applications/{app_id}.desktop"
        ));
        build_commands.push(format!(
            "install -Dm644 {app_id}.png /app/share/icons/hicolor/{size}x{size}/apps/{app_id}.png",
            size = icon::ICON_SIZE
        ));

        Self {
            app_id: app_id.clone(),
            runtime: flatpak.runtime.clone(),
            runtime_version: flatpak.runtime_version.clone(),
            sdk: flatpak.sdk.clone(),
            command: product.to_string(),
            finish_args: flatpak.finish_args.clone(),
            modules: vec![Module {
                name: product.to_lowercase(),
                buildsystem: "simple",
                build_commands,
                sources: vec![
                    payload,
                    Source::File {
                        path: format!("{app_id}.desktop"),
                    },
                    Source::File {
                        path: format!("{app_id}.png"),
                    },
                ],
            }],
        }
    }
}

/// Whether `app_id` is a valid reverse-DNS Flatpak id.
pub fn is_valid_app_id(app_id: &str) -> bool {
    match &*APP_ID_PATTERN {
        Ok(re) => app_id.len() <= 255 && re.is_match(app_id),
        Err(_) => false,
    }
}

/// Bundle the verified primary artifact as `dist/<product>.flatpak`.
///
/// # Returns
///
/// Path to the generated bundle.
pub async fn bundle_project(
    settings: &Settings,
    host: &Host,
    source: Option<&BundledArtifact>,
) -> Result<PathBuf> {
    let source = source.ok_or(Error::FlatpakSourceMissing)?;
    if !cfg!(target_os = "linux") {
        return Err(Error::FlatpakPackaging(
            "Flatpak bundles can only be built on Linux".into(),
        ));
    }
    let flatpak_settings = settings.flatpak();
    let app_id = flatpak_settings.app_id.as_str();
    if !is_valid_app_id(app_id) {
        return Err(Error::FlatpakPackaging(format!(
            "invalid app id {:?}: expected reverse-DNS form like io.github.user.App",
            app_id
        )));
    }

    log::info!("Building Flatpak {} for {}", app_id, settings.product_name());

    let builder = ensure_builder(host).await?;
    let flatpak = host
        .which("flatpak")
        .ok_or_else(|| Error::FlatpakPackaging("flatpak not found in PATH".into()))?;

    install_runtime(settings, host, &flatpak).await?;

    let staging = settings.work_dir().join("flatpak");
    let manifest_path = stage(settings, &staging, &source.path).await?;

    let repo = staging.join("repo");
    let build_dir = staging.join("build-dir");
    let mut build = host.command(&builder);
    build
        .arg("--user")
        .arg("--force-clean")
        .arg(format!("--state-dir={}", staging.join(".flatpak-builder").display()))
        .arg(format!("--repo={}", repo.display()))
        .arg(&build_dir)
        .arg(&manifest_path)
        .current_dir(&staging);
    run_step(&mut build, "flatpak-builder").await?;

    let output_dir = settings.output_dir();
    fs::create_dir_all(&output_dir, false).await?;
    let bundle_path = output_dir.join(format!("{}.flatpak", settings.product_name()));
    fs::remove_file(&bundle_path).await?;

    let mut bundle = host.command(&flatpak);
    bundle
        .arg("build-bundle")
        .arg(&repo)
        .arg(&bundle_path)
        .arg(app_id);
    run_step(&mut bundle, "flatpak build-bundle").await?;

    if !tokio::fs::try_exists(&bundle_path).await.unwrap_or(false) {
        return Err(Error::FlatpakPackaging(format!(
            "build finished but {} was not created",
            bundle_path.display()
        )));
    }

    log::info!("✓ Created Flatpak: {}", bundle_path.display());
    Ok(bundle_path)
}

/// `flatpak-builder` from PATH, installing it through the package manager if needed.
async fn ensure_builder(host: &Host) -> Result<PathBuf> {
    if let Some(path) = host.which("flatpak-builder") {
        return Ok(path);
    }

    let pm = PackageManager::detect(host).ok_or_else(|| {
        Error::FlatpakPackaging(
            "flatpak-builder not found and no package manager to install it".into(),
        )
    })?;
    pm.install(host, SystemPackage::FlatpakBuilder)
        .await
        .map_err(|e| Error::FlatpakPackaging(e.to_string()))?;

    host.which("flatpak-builder").ok_or_else(|| {
        Error::FlatpakPackaging("flatpak-builder still not in PATH after install".into())
    })
}

/// Adds the remote and installs runtime and SDK for the current user.
async fn install_runtime(settings: &Settings, host: &Host, flatpak: &Path) -> Result<()> {
    let fp = settings.flatpak();

    let mut remote = host.command(flatpak);
    remote
        .args(["remote-add", "--user", "--if-not-exists"])
        .arg(&fp.remote_name)
        .arg(&fp.remote_url);
    run_step(&mut remote, "flatpak remote-add").await?;

    let mut install = host.command(flatpak);
    install
        .args(["install", "--user", "-y", "--noninteractive"])
        .arg(&fp.remote_name)
        .arg(format!("{}//{}", fp.runtime, fp.runtime_version))
        .arg(format!("{}//{}", fp.sdk, fp.runtime_version));
    run_step(&mut install, "flatpak install").await
}

/// Writes manifest, desktop file, icon and payload into `staging`.
///
/// Returns the manifest path.
async fn stage(settings: &Settings, staging: &Path, payload: &Path) -> Result<PathBuf> {
    let app_id = &settings.flatpak().app_id;
    let product = settings.product_name();
    fs::create_dir_all(staging, false).await?;

    match settings.mode() {
        BuildMode::OneFile => {
            fs::copy_file(payload, &staging.join(settings.executable_name())).await?;
        }
        BuildMode::OneDir => {
            let dest = staging.join(product);
            fs::remove_dir_all(&dest).await?;
            fs::copy_dir(payload, &dest).await?;
        }
    }

    DesktopEntry::new(settings, product, app_id.as_str())
        .write(&staging.join(format!("{app_id}.desktop")))
        .await?;

    let configured = settings.icon_path().filter(|p| p.is_file());
    icon::write_png_icon(configured.as_deref(), &icon::png_path(staging, app_id)).await?;

    let manifest_path = staging.join(format!("{app_id}.json"));
    let manifest = serde_json::to_string_pretty(&Manifest::new(settings))?;
    tokio::fs::write(&manifest_path, manifest)
        .await
        .fs_context("writing Flatpak manifest", &manifest_path)?;
    Ok(manifest_path)
}

async fn run_step(cmd: &mut Command, what: &str) -> Result<()> {
    let status = process::status(cmd)
        .await
        .map_err(|e| Error::FlatpakPackaging(e.to_string()))?;
    if !status.success() {
        return Err(Error::FlatpakPackaging(format!("{} exited with {}", what, status)));
    }
    Ok(())
}
