use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::builders::html_patch::HtmlPatchRule;
use crate::core::config::{self, CONFIG_VERSION};

/// The `ConfigValidator` trait defines the public interface for validating the
/// marker shuffle configuration.
///
/// This trait allows for the implementation of different validation strategies,
/// such as a strict validator or a more permissive one, by adhering to a common
/// set of methods.
pub trait ConfigValidator {
    /// Performs a full validation of the `MarkerShuffleConfig` and returns
    /// a list of issues found.
    ///
    /// # Arguments
    /// * `config`: The `MarkerShuffleConfig` to be validated.
    ///
    /// # Returns
    /// A `Result<Vec<String>>` containing a vector of strings, where each string
    /// describes a specific validation issue.
    fn validate_config(&self, config: &config::MarkerShuffleConfig) -> Result<Vec<String>>;

    /// Validates a single `HtmlPatchRule` and returns a list of issues.
    fn validate_patch_rule(&self, rule: &HtmlPatchRule) -> Result<Vec<String>>;
}

/// The `StandardValidator` is a concrete implementation of `ConfigValidator`.
///
/// It checks that the transform settings can actually match something and
/// that the components directory exists under the project root.
pub struct StandardValidator {
    project_root: PathBuf,
}

impl StandardValidator {
    /// Creates a new instance of `StandardValidator`.
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Tag names must have the shape the markup scanner reads: a letter,
    /// then letters, digits, `-`, `_`, `:` or `.`.
    fn check_tag(&self, what: &str, tag: &str) -> Option<String> {
        let mut chars = tag.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
        if valid {
            None
        } else {
            Some(format!("Invalid {what} tag name: '{tag}'"))
        }
    }

    /// Flags extensions listed twice, e.g. `astro` and `.astro`.
    fn check_extensions(&self, extensions: &[String]) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        if extensions.is_empty() {
            warnings.push("No file extensions configured, nothing will be scanned".to_string());
        }
        for ext in extensions {
            let normalized = ext.trim_start_matches('.');
            if normalized.is_empty() {
                warnings.push("Empty file extension in list".to_string());
            } else if !seen.insert(normalized.to_string()) {
                warnings.push(format!("Duplicate file extension: {normalized}"));
            }
        }
        warnings
    }
}

impl ConfigValidator for StandardValidator {
    /// The main public method for validating the entire configuration.
    ///
    /// It orchestrates multiple checks, including:
    /// - Version compatibility.
    /// - Whether the components directory exists.
    /// - Marker, tag and extension sanity.
    /// - The validity of each HTML patch rule.
    fn validate_config(&self, config: &config::MarkerShuffleConfig) -> Result<Vec<String>> {
        let mut issues = Vec::new();
        let transform = &config.transform;

        if config.version != CONFIG_VERSION {
            issues.push(format!("Unsupported config version: {}", config.version));
        }

        let root = self.project_root.join(&transform.root_dir);
        if !root.is_dir() {
            issues.push(format!("Components directory not found: {}", root.display()));
        }

        if transform.marker.trim().is_empty() {
            issues.push("Marker is empty and would match every file".to_string());
        }

        issues.extend(self.check_tag("container", &transform.container_tag));
        issues.extend(self.check_tag("child", &transform.child_tag));
        if transform
            .container_tag
            .eq_ignore_ascii_case(&transform.child_tag)
        {
            issues.push(format!(
                "Container and child tag are both '{}'",
                transform.container_tag
            ));
        }

        issues.extend(self.check_extensions(&transform.extensions));

        for rule in &config.html_patches {
            issues.extend(self.validate_patch_rule(rule)?);
        }

        Ok(issues)
    }

    fn validate_patch_rule(&self, rule: &HtmlPatchRule) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        if rule.page.trim().is_empty() {
            issues.push("HTML patch rule has no page and will never apply".to_string());
        }
        issues.extend(self.check_tag("patch", &rule.tag));
        if rule.class.split_whitespace().count() > 1 {
            issues.push(format!(
                "HTML patch class must be a single class name: '{}'",
                rule.class
            ));
        }
        if rule.class.is_empty() && rule.inject.as_deref().is_none_or(str::is_empty) {
            issues.push(format!(
                "HTML patch rule for '{}' changes nothing",
                rule.page
            ));
        }

        Ok(issues)
    }
}
