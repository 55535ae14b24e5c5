use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::builders::html_patch::PatchReport;
use crate::core::config::serialize_as;

/// Where a single file ended up after one transform pass. Every variant is
/// terminal for that file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FileOutcome {
    SkippedNoMarker,
    SkippedNoContainer,
    SkippedEmptyContainer,
    SkippedNoChildren,
    Shuffled { children: usize, written: bool },
    Dumped { bytes: usize },
    Failed { error: String },
}

impl FileOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            FileOutcome::SkippedNoMarker
                | FileOutcome::SkippedNoContainer
                | FileOutcome::SkippedEmptyContainer
                | FileOutcome::SkippedNoChildren
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    pub outcome: FileOutcome,
}

/// Everything one transform pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformReport {
    pub root_dir: PathBuf,
    /// The components directory did not exist; nothing was examined.
    pub root_missing: bool,
    /// The pass stopped before looking at files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Directories the walk could not read. Files elsewhere were still
    /// processed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unreadable: Vec<String>,
    pub files: Vec<FileReport>,
}

impl TransformReport {
    pub fn new(root_dir: PathBuf) -> Self {
        Self {
            root_dir,
            ..Self::default()
        }
    }

    pub fn shuffled(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Shuffled { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
            .count()
    }

    pub fn outcome_of(&self, path: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| &f.outcome)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} files checked: {} shuffled, {} skipped, {} failed",
            self.files.len(),
            self.shuffled(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Writes a transform report in `json`, `yaml` or `toml`.
pub fn export_report(report: &TransformReport, file_path: &Path, format: &str) -> Result<()> {
    let content = serialize_as(report, format)?;
    std::fs::write(file_path, content).context("Failed to write report file")?;
    Ok(())
}

pub trait StatusReporter {
    fn report_transform(&self, report: &TransformReport) -> Result<()>;
    fn report_patch(&self, report: &PatchReport) -> Result<()>;
}

/// Prints reports to the console. This is what the CLI subcommands use.
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// One line per file, icon first.
    ///
    /// 🔀: shuffled (and written, unless a dry run)
    /// ⚪: skipped
    /// 📄: dumped
    /// 🔴: failed
    fn format_file(&self, file: &FileReport) -> String {
        match &file.outcome {
            FileOutcome::Shuffled { children, written } => format!(
                "🔀 {} ({} children{})",
                file.path,
                children,
                if *written { "" } else { ", dry run" }
            ),
            FileOutcome::Dumped { bytes } => format!("📄 {} ({} bytes)", file.path, bytes),
            FileOutcome::Failed { error } => format!("🔴 {} ({})", file.path, error),
            FileOutcome::SkippedNoMarker => format!("⚪ {} (no marker)", file.path),
            FileOutcome::SkippedNoContainer => format!("⚪ {} (no container)", file.path),
            FileOutcome::SkippedEmptyContainer => format!("⚪ {} (empty container)", file.path),
            FileOutcome::SkippedNoChildren => format!("⚪ {} (no children)", file.path),
        }
    }
}

impl StatusReporter for ConsoleReporter {
    fn report_transform(&self, report: &TransformReport) -> Result<()> {
        println!("📊 Marker Shuffle Report");
        println!("========================");

        if report.root_missing {
            println!("Components directory not found: {}", report.root_dir.display());
            return Ok(());
        }
        if let Some(error) = &report.error {
            println!("⚠️  {error}");
            return Ok(());
        }

        for file in &report.files {
            // Files without the marker are noise unless asked for.
            if matches!(file.outcome, FileOutcome::SkippedNoMarker) && !self.verbose {
                continue;
            }
            println!("{}", self.format_file(file));
        }
        for message in &report.unreadable {
            println!("🔴 {message}");
        }

        println!("\n📈 Summary:");
        println!("  Total files: {}", report.files.len());
        println!("  Shuffled: {}", report.shuffled());
        println!("  Skipped: {}", report.skipped());
        println!("  Failed: {}", report.failed());
        Ok(())
    }

    fn report_patch(&self, report: &PatchReport) -> Result<()> {
        println!("🩹 HTML Patch Report");
        println!("====================");
        if report.files.is_empty() {
            println!("No rendered pages matched any patch rule.");
            return Ok(());
        }
        for file in &report.files {
            println!(
                "  {} ({} tags updated{})",
                file.path,
                file.tags_updated,
                if file.injected { ", content injected" } else { "" }
            );
        }
        Ok(())
    }
}
