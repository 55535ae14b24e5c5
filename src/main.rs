/// The Big IDEA:
/// A component can list items (an FAQ, a set of cards) in a container
/// and we want that order to change on every build, without any
/// client-side script. A marker comment in the source file opts a
/// component in, and at build time the direct children of the
/// container get shuffled in place. Everything else in the file
/// stays byte for byte the same.
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use marker_shuffle::core::config::TransformMode;
use marker_shuffle::utils::{self, RunOptions};

#[derive(Parser)]
#[command(name = "marker-shuffle")]
#[command(about = "Shuffle the children of marked component containers at build time")]
struct Cli {
    /// Use this configuration file instead of ./marker-shuffle.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Shuffle,
    Dump,
}

impl From<ModeArg> for TransformMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Shuffle => TransformMode::Shuffle,
            ModeArg::Dump => TransformMode::Dump,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Check the configuration for problems
    Validate,
    /// Shuffle (or dump) every marked component once
    Run {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Log what would change without writing any file
        #[arg(long)]
        dry_run: bool,
        /// Seed the shuffle for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
        /// Use the regex extractor instead of the markup scanner
        #[arg(long)]
        lexical: bool,
        /// Write a per-file report to this path
        #[arg(long)]
        report: Option<PathBuf>,
        /// Report format: json, yaml or toml
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Apply the configured HTML patches to a rendered output directory
    Patch { output_dir: PathBuf },
    /// Fire the whole build hook sequence
    Build {
        /// Rendered output directory, enables HTML patches at build:done
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fire a single lifecycle hook, e.g. build:setup
    Hook {
        name: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the configuration in another format
    Export {
        file: PathBuf,
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Init => utils::initialize_project(cli.config),
        Commands::Validate => utils::validate_project(cli.config),
        Commands::Run {
            mode,
            dry_run,
            seed,
            lexical,
            report,
            format,
        } => {
            let options = RunOptions {
                mode: mode.map(TransformMode::from),
                dry_run,
                seed,
                lexical,
                report,
                format,
            };
            utils::run_transform(cli.config, &options, cli.verbose)
        }
        Commands::Patch { output_dir } => utils::patch_pages(cli.config, &output_dir, cli.verbose),
        Commands::Build { out } => utils::run_build(cli.config, out),
        Commands::Hook { name, out } => utils::fire_hook(cli.config, &name, out),
        Commands::Export { file, format } => utils::export_config(cli.config, &file, &format),
    }
}
