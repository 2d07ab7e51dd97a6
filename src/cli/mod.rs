//! Command line interface for the ROM Converter build orchestrator.
//!
//! Parses flags, layers them over `romconv.toml`, runs the pipeline and
//! turns the [`BuildReport`] into a human-readable summary and exit code.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::bundler::{
    BuildMode, BuildReport, Bundler, PackageType, RunOptions, SettingsBuilder,
};
use crate::error::{BundlerError, CliError, Result};
use crate::metadata;

/// Main CLI entry point
///
/// Returns the process exit code: 0 when the primary artifact was built
/// (secondary packaging failures included), 1 on any fatal failure.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(&args);
    let config = RuntimeConfig::from(&args);

    match execute(&args, &config).await {
        Ok(()) => Ok(0),
        Err(e) => {
            report_error(&config, &e)?;
            Ok(1)
        }
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.verbose { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .format_timestamp(None)
    .try_init();
}

async fn execute(args: &Args, config: &RuntimeConfig) -> Result<()> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let project_dir = std::path::absolute(&args.project_dir)?;
    let mut builder = SettingsBuilder::new().project_dir(&project_dir);
    if let Some(project_config) = metadata::load_config(&project_dir, args.config.as_deref())? {
        builder = project_config.apply(builder);
    }
    if let Some(python) = &args.python {
        builder = builder.python(python);
    }
    if args.onedir {
        builder = builder.mode(BuildMode::OneDir);
    }
    let package_types = requested_package_types(args);
    if !package_types.is_empty() && !cfg!(target_os = "linux") {
        config.warn("AppImage and Flatpak packaging only work on Linux; those steps will be reported as failed")?;
    }
    builder = builder.package_types(package_types);
    let settings = builder.build()?;

    config.progress(&format!(
        "Freezing {} as {} {} ({})",
        settings.script_path().display(),
        settings.product_name(),
        settings.version_string(),
        settings.mode().flag().trim_start_matches('-'),
    ))?;
    config.verbose_println(&format!("Interpreter: {}", settings.python().display()))?;

    let options = RunOptions {
        clean: args.clean,
        download_tools: args.download_tools,
    };
    let report = Bundler::new(settings).run(&options).await?;
    print_report(config, &report)
}

fn requested_package_types(args: &Args) -> Vec<PackageType> {
    let mut types = Vec::new();
    if args.appimage {
        types.push(PackageType::AppImage);
    }
    if args.flatpak {
        types.push(PackageType::Flatpak);
    }
    types
}

fn print_report(config: &RuntimeConfig, report: &BuildReport) -> Result<()> {
    config.verbose_println(&format!("GUI toolkit: {}", report.toolkit))?;
    if !report.resource_monitor {
        config.verbose_println("psutil unavailable, resource monitoring disabled in the artifact")?;
    }

    for tool in &report.fetched_tools {
        config.success(&format!("Fetched {tool}"))?;
    }
    for failure in &report.fetch_failures {
        config.warn(failure)?;
    }

    if report.bundled_assets.iter().any(|asset| asset.is_converter()) {
        let names: Vec<&str> = report.bundled_assets.iter().map(|a| a.name()).collect();
        config.info(&format!("Bundled {}", names.join(", ")))?;
    } else {
        config.info("No binaries bundled, will fetch at runtime")?;
    }

    config.section("Artifacts")?;
    for artifact in report.artifacts() {
        config.success(&format!(
            "{}: {}",
            artifact.package_type,
            artifact.path.display()
        ))?;
        config.indent(&format!("size:   {} bytes", artifact.size))?;
        config.indent(&format!("sha256: {}", artifact.checksum))?;
    }

    for failed in report.secondary_failures() {
        if let Err(e) = &failed.result {
            config.warn(&format!(
                "{} not created: {} (primary artifact unaffected)",
                failed.package_type, e
            ))?;
        }
    }

    Ok(())
}

fn report_error(config: &RuntimeConfig, error: &BundlerError) -> Result<()> {
    config.error(&error.to_string())?;
    for suggestion in error.recovery_suggestions() {
        config.indent(&format!("hint: {suggestion}"))?;
    }
    Ok(())
}
