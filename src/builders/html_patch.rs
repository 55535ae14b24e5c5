use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Range;
use std::path::Path;

use crate::builders::discovery::{discover_files, display_path};
use crate::builders::markup::{AttributeValue, Document};
use crate::core::error::TransformError;
use crate::core::sink::LogSink;

/// A post-render rewrite for one page.
///
/// Every start tag of kind `tag` on a matching page gets `class` added to its
/// class attribute, and `inject` (when set) is inserted right after `<body>`,
/// or at the start of the document when there is no body.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HtmlPatchRule {
    /// Substring of the page's path relative to the output directory.
    pub page: String,
    pub tag: String,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inject: Option<String>,
}

impl Default for HtmlPatchRule {
    fn default() -> Self {
        Self {
            page: String::new(),
            tag: "h1".to_string(),
            class: "modified-by-integration".to_string(),
            inject: None,
        }
    }
}

impl HtmlPatchRule {
    pub fn applies_to(&self, page_path: &str) -> bool {
        !self.page.is_empty() && page_path.contains(&self.page)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedHtml {
    pub html: String,
    pub tags_updated: usize,
    pub injected: bool,
}

/// Applies one rule to a rendered page.
///
/// Tags that already carry the class are left alone, as is a page that
/// already contains the injected markup, so patching twice changes nothing.
/// A class given as an `{expression}` is not touched.
pub fn patch_html(html: &str, rule: &HtmlPatchRule) -> PatchedHtml {
    let doc = Document::parse(html);
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut tags_updated = 0;

    if !rule.class.is_empty() {
        for element in doc.elements_named(&rule.tag) {
            let edit = match element.attribute("class") {
                None => {
                    let after_name = element.start_tag.start + 1 + element.name.len();
                    Some((after_name..after_name, format!(" class=\"{}\"", rule.class)))
                }
                Some(attr) => match &attr.value {
                    None => Some((attr.span.clone(), format!("class=\"{}\"", rule.class))),
                    Some(AttributeValue::Quoted(range)) => {
                        let current = &html[range.clone()];
                        if current.split_whitespace().any(|c| c == rule.class) {
                            None
                        } else if current.trim().is_empty() {
                            Some((range.clone(), rule.class.clone()))
                        } else {
                            Some((range.end..range.end, format!(" {}", rule.class)))
                        }
                    }
                    Some(AttributeValue::Unquoted(range)) => {
                        let current = &html[range.clone()];
                        if current == rule.class {
                            None
                        } else {
                            Some((range.clone(), format!("\"{} {}\"", current, rule.class)))
                        }
                    }
                    Some(AttributeValue::Expression(_)) => None,
                },
            };
            if let Some(edit) = edit {
                edits.push(edit);
                tags_updated += 1;
            }
        }
    }

    let mut injected = false;
    if let Some(inject) = rule.inject.as_deref()
        && !inject.is_empty()
        && !html.contains(inject)
    {
        let at = doc
            .elements_named("body")
            .next()
            .map_or(0, |body| body.start_tag.end);
        edits.push((at..at, inject.to_string()));
        injected = true;
    }

    PatchedHtml {
        html: apply_edits(html, edits),
        tags_updated,
        injected,
    }
}

/// Applies non-overlapping edits. Insertions at the same offset keep the
/// order they were pushed in.
fn apply_edits(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);

    let added: usize = edits.iter().map(|(_, text)| text.len()).sum();
    let mut out = String::with_capacity(source.len() + added);
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&source[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchedFile {
    pub path: String,
    pub tags_updated: usize,
    pub injected: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchReport {
    pub files: Vec<PatchedFile>,
}

/// Applies every matching rule to every rendered `.html` page under
/// `output_dir`. Per-page failures are logged and skipped.
pub fn patch_output_dir(
    output_dir: &Path,
    rules: &[HtmlPatchRule],
    sink: &dyn LogSink,
) -> PatchReport {
    let mut report = PatchReport::default();
    if rules.is_empty() {
        return report;
    }

    let found = match discover_files(output_dir, |p| {
        p.extension().is_some_and(|ext| ext == "html")
    }) {
        Ok(found) => found,
        Err(TransformError::MissingRootDirectory { .. }) => {
            sink.warn(&format!(
                "Output directory does not exist: {}",
                output_dir.display()
            ));
            return report;
        }
        Err(err) => {
            sink.error(&err.detail());
            return report;
        }
    };

    for err in &found.errors {
        sink.error(&err.detail());
    }

    for page in found.files {
        let display = display_path(output_dir, &page);
        let matching: Vec<&HtmlPatchRule> =
            rules.iter().filter(|r| r.applies_to(&display)).collect();
        if matching.is_empty() {
            continue;
        }

        let original = match fs::read_to_string(&page) {
            Ok(html) => html,
            Err(err) => {
                sink.error(&format!("Error reading page {display}: {err}"));
                continue;
            }
        };

        sink.info(&format!("Modifying HTML for {display}"));
        let mut html = original.clone();
        let mut file = PatchedFile {
            path: display.clone(),
            tags_updated: 0,
            injected: false,
        };
        for rule in matching {
            let patched = patch_html(&html, rule);
            file.tags_updated += patched.tags_updated;
            file.injected |= patched.injected;
            html = patched.html;
        }

        if html != original
            && let Err(err) = fs::write(&page, &html)
        {
            sink.error(&format!("Error writing page {display}: {err}"));
            continue;
        }
        report.files.push(file);
    }

    report
}
