use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::html_patch::HtmlPatchRule;
use crate::builders::validator::{ConfigValidator, StandardValidator};

pub const CONFIG_FILE_NAME: &str = "marker-shuffle.toml";
pub const CONFIG_VERSION: &str = "1.0";
pub const DEFAULT_MARKER: &str = "<!-- SHUFFLE_DL_CHILDREN -->";

/// What the transform does with the files it discovers.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransformMode {
    /// Shuffle the child blocks of marked files and write them back.
    #[default]
    Shuffle,
    /// Log the content of every discovered file, write nothing.
    Dump,
}

/// How the container and its children are located inside a file.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionStrategy {
    /// Scan the markup into an element tree and use real child elements.
    #[default]
    Structural,
    /// Non-greedy, case-insensitive pattern matching on the raw text.
    Lexical,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TransformSettings {
    /// Directory to scan, relative to the project root unless absolute.
    pub root_dir: PathBuf,
    /// Allowed file extensions, with or without the leading dot.
    pub extensions: Vec<String>,
    pub marker: String,
    pub container_tag: String,
    pub child_tag: String,
    pub mode: TransformMode,
    pub strategy: ExtractionStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub dry_run: bool,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("src/components"),
            extensions: ["astro", "md", "mdx", "ts", "js"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            marker: DEFAULT_MARKER.to_string(),
            container_tag: "dl".to_string(),
            child_tag: "div".to_string(),
            mode: TransformMode::Shuffle,
            strategy: ExtractionStrategy::Structural,
            seed: None,
            dry_run: false,
        }
    }
}

impl TransformSettings {
    /// Checks a path's extension against the allow-list. Matching is exact,
    /// so `.ASTRO` is not an `.astro` file.
    pub fn accepts_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.') == ext)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalSettings {
    pub verbose: bool,
    /// Log every lifecycle hook invocation and its context.
    pub log_hooks: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            log_hooks: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MarkerShuffleConfig {
    pub version: String,
    pub transform: TransformSettings,
    pub html_patches: Vec<HtmlPatchRule>,
    pub global_settings: GlobalSettings,
}

impl Default for MarkerShuffleConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            transform: TransformSettings::default(),
            html_patches: Vec::new(),
            global_settings: GlobalSettings::default(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    project_root: PathBuf,
}

impl ConfigManager {
    /// Uses the current working directory as the project root.
    pub fn new() -> Result<Self> {
        let project_root =
            std::env::current_dir().context("Failed to resolve current directory")?;
        Ok(Self::new_at(project_root))
    }

    pub fn new_at(project_root: PathBuf) -> Self {
        let config_path = project_root.join(CONFIG_FILE_NAME);
        Self {
            config_path,
            project_root,
        }
    }

    /// Points the manager at a config file somewhere other than the project root.
    pub fn set_config_path(&mut self, config_path: PathBuf) {
        self.config_path = config_path;
    }

    /// Writes the default configuration unless a file already exists.
    /// Returns whether a file was created.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }

        let default_config = MarkerShuffleConfig::default();
        self.save_config(&default_config)?;
        Ok(true)
    }

    pub fn validate_config(&self) -> Result<()> {
        let config = self.load_config()?;
        let validator = StandardValidator::new(self.project_root.clone());
        let issues = validator.validate_config(&config)?;

        if issues.is_empty() {
            println!("✓ Configuration is valid.");
            Ok(())
        } else {
            println!("⚠️  Found issues in configuration:");
            for issue in issues {
                println!("  - {issue}");
            }
            anyhow::bail!("Configuration validation failed.");
        }
    }

    pub fn export_config(&self, file_path: &Path, format: &str) -> Result<()> {
        let config = self.load_config()?;
        let content = serialize_as(&config, format)?;
        fs::write(file_path, content).context("Failed to write export file")?;
        Ok(())
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<MarkerShuffleConfig>;
    fn save_config(&self, config: &MarkerShuffleConfig) -> Result<()>;
    fn get_config_path(&self) -> Result<PathBuf>;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<MarkerShuffleConfig> {
        if !self.config_path.exists() {
            return Ok(MarkerShuffleConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &MarkerShuffleConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }
}

/// Serializes any config or report in one of the supported export formats.
/// Unknown formats fall back to TOML.
pub fn serialize_as<T: Serialize>(value: &T, format: &str) -> Result<String> {
    let content = match format {
        "json" => serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?,
        "yaml" => serde_yaml::to_string(value).context("Failed to serialize to YAML")?,
        _ => toml::to_string_pretty(value).context("Failed to serialize to TOML")?,
    };
    Ok(content)
}
