use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::builders::hooks::{HookContext, IntegrationHost, LifecycleHook};
use crate::builders::html_patch::patch_output_dir;
use crate::builders::reporter::{ConsoleReporter, StatusReporter, export_report};
use crate::core::config::{
    ConfigManager, ConfigProvider, ExtractionStrategy, MarkerShuffleConfig, TransformMode,
    TransformSettings,
};
use crate::core::engine::transform_directory;
use crate::core::sink::LogFacade;

/// Command-line overrides for a single `run`.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub mode: Option<TransformMode>,
    pub dry_run: bool,
    pub seed: Option<u64>,
    pub lexical: bool,
    pub report: Option<PathBuf>,
    pub format: String,
}

impl RunOptions {
    /// Flags win over the config file; flags that were not given leave it alone.
    pub fn apply(&self, settings: &mut TransformSettings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if self.dry_run {
            settings.dry_run = true;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if self.lexical {
            settings.strategy = ExtractionStrategy::Lexical;
        }
    }
}

pub fn initialize_project(config_path: Option<PathBuf>) -> Result<()> {
    let config_manager = get_config_manager(config_path)?;
    if config_manager.initialize()? {
        println!(
            "✓ Wrote default configuration to {}",
            config_manager.get_config_path()?.display()
        );
    } else {
        println!("ℹ️  Configuration already exists, left untouched");
    }
    println!("Run 'marker-shuffle run' to shuffle marked components");
    Ok(())
}

pub fn validate_project(config_path: Option<PathBuf>) -> Result<()> {
    get_config_manager(config_path)?.validate_config()
}

pub fn export_config(config_path: Option<PathBuf>, file: &Path, format: &str) -> Result<()> {
    let config_manager = get_config_manager(config_path)?;
    config_manager.export_config(file, format)?;
    println!("✓ Exported configuration to {}", file.display());
    Ok(())
}

pub fn run_transform(config_path: Option<PathBuf>, options: &RunOptions, verbose: bool) -> Result<()> {
    let config_manager = get_config_manager(config_path)?;
    let mut config = config_manager.load_config()?;
    options.apply(&mut config.transform);

    let sink = LogFacade::default();
    let report = transform_directory(&config.transform, config_manager.project_root(), &sink);

    ConsoleReporter::new(verbose || config.global_settings.verbose).report_transform(&report)?;
    if let Some(report_path) = &options.report {
        export_report(&report, report_path, &options.format)
            .with_context(|| format!("Failed to export report to {}", report_path.display()))?;
        println!("✓ Report written to {}", report_path.display());
    }
    Ok(())
}

pub fn patch_pages(config_path: Option<PathBuf>, output_dir: &Path, verbose: bool) -> Result<()> {
    let config_manager = get_config_manager(config_path)?;
    let config = config_manager.load_config()?;
    if config.html_patches.is_empty() {
        println!("No HTML patch rules configured.");
        return Ok(());
    }

    let output_dir = config_manager.project_root().join(output_dir);
    let sink = LogFacade::default();
    let report = patch_output_dir(&output_dir, &config.html_patches, &sink);
    ConsoleReporter::new(verbose).report_patch(&report)
}

/// Runs the full build hook sequence, as a host build would.
pub fn run_build(config_path: Option<PathBuf>, output_dir: Option<PathBuf>) -> Result<()> {
    let config_manager = get_config_manager(config_path)?;
    let config = config_manager.load_config()?;
    let ctx = hook_context(&config_manager, &config, output_dir).with_detail("Command", "build");

    let sink = LogFacade::default();
    let mut host = IntegrationHost::from_config(&config, &sink);
    host.run_build(&ctx);
    Ok(())
}

/// Fires one hook. This is what a host build tool shells out to.
pub fn fire_hook(config_path: Option<PathBuf>, name: &str, output_dir: Option<PathBuf>) -> Result<()> {
    let hook: LifecycleHook = name.parse()?;
    let config_manager = get_config_manager(config_path)?;
    let config = config_manager.load_config()?;
    let ctx = hook_context(&config_manager, &config, output_dir);

    let sink = LogFacade::default();
    let mut host = IntegrationHost::from_config(&config, &sink);
    host.dispatch(hook, &ctx);
    Ok(())
}

fn hook_context(
    config_manager: &ConfigManager,
    config: &MarkerShuffleConfig,
    output_dir: Option<PathBuf>,
) -> HookContext {
    let root = config_manager.project_root().to_path_buf();
    let mut ctx = HookContext::new(root.clone())
        .with_detail("Project root", root.display())
        .with_detail("Components", config.transform.root_dir.display())
        .with_detail("Marker", &config.transform.marker);
    if let Some(output_dir) = output_dir {
        ctx = ctx.with_output_dir(root.join(output_dir));
    }
    ctx
}

// Helper function to create ConfigManager instance
fn get_config_manager(config_path: Option<PathBuf>) -> Result<ConfigManager> {
    let mut config_manager = ConfigManager::new()?;
    if let Some(path) = config_path {
        config_manager.set_config_path(path);
    }
    Ok(config_manager)
}
