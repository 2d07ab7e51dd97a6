//! AppImage bundler - portable Linux applications.

use super::{desktop::DesktopEntry, icon};
use crate::bundler::{
    BuildMode, BundledArtifact,
    error::{Error, ErrorExt, Result},
    host::{
        Host,
        strategy::{self, StrategyOutcome},
    },
    settings::Settings,
    utils::{fs, http, process},
};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tokio::{io::AsyncReadExt, process::Command};

const HELPER_NAME: &str = "appimagetool";

/// Type-2 AppImage magic at byte offset 8.
const APPIMAGE_MAGIC: &[u8; 3] = b"AI\x02";

/// How the helper gets executed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LaunchMode {
    /// Run the helper as is.
    Direct,
    /// Let the helper unpack itself instead of mounting via FUSE.
    ExtractAndRun,
    /// Run the helper on the host from inside a distrobox/toolbox container.
    Container,
}

impl LaunchMode {
    /// Modes in the order they are tried.
    pub const CHAIN: [LaunchMode; 3] = [
        LaunchMode::Direct,
        LaunchMode::ExtractAndRun,
        LaunchMode::Container,
    ];
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LaunchMode::Direct => "run appimagetool directly",
            LaunchMode::ExtractAndRun => "run appimagetool with --appimage-extract-and-run",
            LaunchMode::Container => "run appimagetool on the container host",
        })
    }
}

/// Bundle the verified primary artifact as an AppImage.
///
/// # Process
///
/// 1. Lays out `build/<product>.AppDir` (AppRun, payload, desktop file, icon)
/// 2. Finds `appimagetool` on PATH or downloads it into the tool cache
/// 3. Picks a launch mode that works on this host
/// 4. Runs the helper and checks that `dist/<product>-<arch>.AppImage` exists
///
/// # Returns
///
/// Path to the generated `.AppImage` file.
pub async fn bundle_project(
    settings: &Settings,
    host: &Host,
    source: Option<&BundledArtifact>,
) -> Result<PathBuf> {
    let source = source.ok_or(Error::AppImageSourceMissing)?;
    if !cfg!(target_os = "linux") {
        return Err(Error::AppImagePackaging(
            "AppImages can only be built on Linux".into(),
        ));
    }

    let arch = settings.binary_arch().appimage_name();
    log::info!("Building AppImage for {}", settings.product_name());
    log::debug!("Using architecture: {}", arch);

    let app_dir = build_app_dir(settings, &source.path).await?;
    let helper = locate_helper(settings, host, arch).await?;
    let mode = select_launch_mode(host, &helper).await?;

    let output_dir = settings.output_dir();
    fs::create_dir_all(&output_dir, false).await?;
    let appimage_path = output_dir.join(format!("{}-{}.AppImage", settings.product_name(), arch));
    fs::remove_file(&appimage_path).await?;

    let mut cmd = launch_command(host, &helper, mode)?;
    cmd.env("ARCH", arch)
        .env("VERSION", settings.version_string())
        .arg(&app_dir).arg(&appimage_path);

    let status = process::status(&mut cmd)
        .await
        .map_err(|e| Error::AppImagePackaging(e.to_string()))?;
    if !status.success() {
        return Err(Error::AppImagePackaging(format!(
            "{} exited with {}",
            HELPER_NAME, status
        )));
    }

    if !tokio::fs::try_exists(&appimage_path).await.unwrap_or(false) {
        return Err(Error::AppImagePackaging(format!(
            "{} finished but {} was not created",
            HELPER_NAME,
            appimage_path.display()
        )));
    }

    fs::set_executable(&appimage_path).await?;
    log::info!("✓ Created AppImage: {}", appimage_path.display());
    Ok(appimage_path)
}

/// Creates the AppDir tree for `source` and returns its path.
pub async fn build_app_dir(settings: &Settings, source: &Path) -> Result<PathBuf> {
    let product = settings.product_name();
    let app_dir = settings.work_dir().join(format!("{}.AppDir", product));
    fs::create_dir_all(&app_dir, true).await?;

    let exec_rel = match settings.mode() {
        BuildMode::OneFile => {
            let rel = format!("usr/bin/{}", product);
            let dst = app_dir.join(&rel);
            fs::copy_file(source, &dst).await?;
            fs::set_executable(&dst).await?;
            rel
        }
        BuildMode::OneDir => {
            let lib_rel = format!("usr/lib/{}", product);
            fs::copy_dir(source, &app_dir.join(&lib_rel)).await?;
            let rel = format!("{}/{}", lib_rel, settings.executable_name());
            fs::set_executable(&app_dir.join(&rel)).await?;
            rel
        }
    };

    let app_run = app_dir.join("AppRun");
    tokio::fs::write(&app_run, app_run_script(&exec_rel))
        .await
        .fs_context("writing AppRun", &app_run)?;
    fs::set_executable(&app_run).await?;

    DesktopEntry::new(settings, product, product)
        .write(&app_dir.join(format!("{}.desktop", product)))
        .await?;

    let icon_path = icon::png_path(&app_dir, product);
    let configured = settings.icon_path().filter(|p| p.is_file());
    let kind = icon::write_png_icon(configured.as_deref(), &icon_path).await?;
    log::debug!("AppImage icon: {:?}", kind);

    let icon_name = format!("{}.png", product);
    fs::replace_symlink(Path::new(&icon_name), &app_dir.join(".DirIcon")).await?;

    Ok(app_dir)
}

fn app_run_script(exec_rel: &str) -> String {
    format!(
        "#!/bin/sh\nHERE=\"$(dirname \"$(readlink -f \"$0\")\")\"\nexec \"$HERE/{}\" \"$@\"\n",
        exec_rel
    )
}

/// `appimagetool` from PATH, or a cached download.
async fn locate_helper(settings: &Settings, host: &Host, arch: &str) -> Result<PathBuf> {
    if let Some(path) = host.which(HELPER_NAME) {
        return Ok(path);
    }

    let tools_dir = settings.tool_cache_dir();
    let tool_name = format!("{}-{}.AppImage", HELPER_NAME, arch);
    let tool_path = tools_dir.join(&tool_name);

    if tokio::fs::try_exists(&tool_path).await.unwrap_or(false) {
        log::debug!("{} already cached at {}", HELPER_NAME, tool_path.display());
        return Ok(tool_path);
    }

    log::info!("Downloading {} for {}...", HELPER_NAME, arch);
    fs::create_dir_all(&tools_dir, false).await?;
    let url = format!(
        "{}/{}",
        settings.appimage().helper_base_url.trim_end_matches('/'),
        tool_name
    );
    let data = http::download(&url)
        .await
        .map_err(|e| Error::AppImagePackaging(format!("failed to download {}: {}", HELPER_NAME, e)))?;

    tokio::fs::write(&tool_path, data)
        .await
        .fs_context("writing appimagetool", &tool_path)?;
    fs::set_executable(&tool_path).await?;
    Ok(tool_path)
}

/// Whether `path` is a type-2 AppImage (needs FUSE to self-mount).
pub async fn is_appimage(path: &Path) -> bool {
    let Ok(mut file) = tokio::fs::File::open(path).await else {
        return false;
    };
    let mut header = [0u8; 11];
    match file.read_exact(&mut header).await {
        Ok(_) => &header[8..11] == APPIMAGE_MAGIC,
        Err(_) => false,
    }
}

/// Picks the first launch mode that works on this host.
pub async fn select_launch_mode(host: &Host, helper: &Path) -> Result<LaunchMode> {
    strategy::drive(&LaunchMode::CHAIN, |mode| try_mode(host, helper, *mode))
        .await
        .copied()
        .map_err(|failure| {
            Error::AppImagePackaging(format!("cannot run {}: {}", HELPER_NAME, failure))
        })
}

async fn try_mode(host: &Host, helper: &Path, mode: LaunchMode) -> StrategyOutcome {
    match mode {
        LaunchMode::Direct => {
            if !is_appimage(helper).await {
                StrategyOutcome::Satisfied
            } else if host.fuse_available() {
                StrategyOutcome::Satisfied
            } else {
                StrategyOutcome::NotApplicable("FUSE is not available".into())
            }
        }
        LaunchMode::ExtractAndRun => {
            let mut probe = host.command(helper);
            probe
                .env("APPIMAGE_EXTRACT_AND_RUN", "1")
                .args(["--appimage-extract-and-run", "--version"]);
            if process::probe(&mut probe).await {
                StrategyOutcome::Satisfied
            } else {
                StrategyOutcome::Failed("extract-and-run probe failed".into())
            }
        }
        LaunchMode::Container => match container_wrapper(host) {
            Some(_) => StrategyOutcome::Satisfied,
            None => StrategyOutcome::NotApplicable(
                "not inside a distrobox or toolbox container".into(),
            ),
        },
    }
}

/// Command prefix that runs a program on the container host.
fn container_wrapper(host: &Host) -> Option<Vec<PathBuf>> {
    if let Some(exec) = host.which("distrobox-host-exec") {
        return Some(vec![exec]);
    }
    if host.root().join("run/.toolboxenv").exists()
        && let Some(spawn) = host.which("flatpak-spawn")
    {
        return Some(vec![spawn, PathBuf::from("--host")]);
    }
    None
}

fn launch_command(host: &Host, helper: &Path, mode: LaunchMode) -> Result<Command> {
    Ok(match mode {
        LaunchMode::Direct => host.command(helper),
        LaunchMode::ExtractAndRun => {
            let mut cmd = host.command(helper);
            cmd.env("APPIMAGE_EXTRACT_AND_RUN", "1")
                .arg("--appimage-extract-and-run");
            cmd
        }
        LaunchMode::Container => {
            let wrapper = container_wrapper(host).ok_or_else(|| {
                Error::AppImagePackaging("container wrapper disappeared".into())
            })?;
            let mut cmd = host.command(&wrapper[0]);
            cmd.args(&wrapper[1..]).arg(helper);
            cmd
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::bundler::{
        PackageType, SettingsBuilder, host::test_support::write_script,
    };

    fn settings(dir: &Path, mode: BuildMode) -> Settings {
        SettingsBuilder::new()
            .project_dir(dir)
            .mode(mode)
            .build()
            .unwrap()
    }

    async fn primary(settings: &Settings) -> BundledArtifact {
        let path = settings.expected_artifact();
        match settings.mode() {
            BuildMode::OneFile => {
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(&path, b"frozen").unwrap();
            }
            BuildMode::OneDir => {
                std::fs::create_dir_all(path.join("_internal")).unwrap();
                std::fs::write(settings.expected_executable(), b"frozen").unwrap();
                std::fs::write(path.join("_internal/libpython.so"), b"lib").unwrap();
            }
        }
        BundledArtifact::describe(PackageType::Executable, &path)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn onefile_app_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path(), BuildMode::OneFile);
        let artifact = primary(&s).await;

        let app_dir = build_app_dir(&s, &artifact.path).await.unwrap();
        assert_eq!(app_dir, dir.path().join("build/ROM_Converter.AppDir"));
        assert!(app_dir.join("usr/bin/ROM_Converter").is_file());
        assert!(app_dir.join("ROM_Converter.desktop").is_file());
        assert!(app_dir.join("ROM_Converter.png").is_file());
        assert_eq!(
            std::fs::read_link(app_dir.join(".DirIcon")).unwrap(),
            PathBuf::from("ROM_Converter.png")
        );
        let app_run = std::fs::read_to_string(app_dir.join("AppRun")).unwrap();
        assert!(app_run.contains("\"$HERE/usr/bin/ROM_Converter\""));
    }

    #[tokio::test]
    async fn onedir_app_dir_copies_whole_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path(), BuildMode::OneDir);
        let artifact = primary(&s).await;

        let app_dir = build_app_dir(&s, &artifact.path).await.unwrap();
        assert!(app_dir.join("usr/lib/ROM_Converter/ROM_Converter").is_file());
        assert!(app_dir.join("usr/lib/ROM_Converter/_internal/libpython.so").is_file());
        let app_run = std::fs::read_to_string(app_dir.join("AppRun")).unwrap();
        assert!(app_run.contains("usr/lib/ROM_Converter/ROM_Converter"));
    }

    #[tokio::test]
    async fn detects_appimage_magic() {
        let dir = tempfile::tempdir().unwrap();
        let appimage = dir.path().join("tool.AppImage");
        std::fs::write(&appimage, b"\x7fELF\x02\x01\x01\x00AI\x02rest").unwrap();
        let script = write_script(dir.path(), "tool", "exit 0");

        assert!(is_appimage(&appimage).await);
        assert!(!is_appimage(&script).await);
        assert!(!is_appimage(&dir.path().join("missing")).await);
    }

    #[tokio::test]
    async fn falls_back_to_container_without_fuse() {
        let root = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        let helper = bin.path().join("appimagetool");
        // AppImage that fails the extract-and-run probe
        std::fs::write(&helper, b"\x7fELF\x02\x01\x01\x00AI\x02").unwrap();
        write_script(bin.path(), "distrobox-host-exec", "exit 0");

        let host = Host::new("python3")
            .with_root(root.path())
            .with_search_path(bin.path());
        assert_eq!(
            select_launch_mode(&host, &helper).await.unwrap(),
            LaunchMode::Container
        );
    }

    #[tokio::test]
    async fn helper_without_output_is_advisory_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), "appimagetool", "exit 0");
        let s = settings(dir.path(), BuildMode::OneFile);
        let artifact = primary(&s).await;

        let host = Host::new("python3").with_search_path(bin.path());
        let err = bundle_project(&s, &host, Some(&artifact)).await.unwrap_err();
        assert!(matches!(err, Error::AppImagePackaging(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn helper_output_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        let args_log = bin.path().join("args");
        write_script(
            bin.path(),
            "appimagetool",
            &format!("echo \"$ARCH $VERSION $*\" > {}\nprintf appimage > \"$2\"", args_log.display()),
        );
        let s = settings(dir.path(), BuildMode::OneFile);
        let artifact = primary(&s).await;

        let host = Host::new("python3").with_search_path(bin.path());
        let out = bundle_project(&s, &host, Some(&artifact)).await.unwrap();
        let arch = s.binary_arch().appimage_name();
        assert_eq!(
            out,
            dir.path().join(format!("dist/ROM_Converter-{arch}.AppImage"))
        );
        let logged = std::fs::read_to_string(&args_log).unwrap();
        assert!(logged.starts_with(&format!("{arch} 1.0.0 ")));
        assert!(logged.contains("ROM_Converter.AppDir"));
    }
}
