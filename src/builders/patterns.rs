use regex::Regex;
use std::ops::Range;
use std::path::Path;

use crate::builders::markup::Document;
use crate::core::config::{ExtractionStrategy, TransformSettings};
use crate::core::error::TransformError;

/// The result of locating a container and its child blocks in a file.
///
/// All ranges are byte offsets into the content that was searched. Child
/// blocks include the whitespace around each child element, so putting them
/// back in any order keeps the file's formatting intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The whole container, start tag through end tag.
    pub container: Range<usize>,
    /// Child blocks in source order. Never empty.
    pub blocks: Vec<Range<usize>>,
}

impl Extraction {
    pub fn child_blocks<'a>(&self, content: &'a str) -> Vec<&'a str> {
        self.blocks.iter().map(|r| &content[r.clone()]).collect()
    }

    /// Rebuilds `content` with `blocks` written into the child slots in the
    /// order given. Every byte outside the child blocks is copied verbatim,
    /// including any text between children that belongs to no block.
    pub fn splice(&self, content: &str, blocks: &[&str]) -> String {
        debug_assert_eq!(blocks.len(), self.blocks.len());

        let mut out = String::with_capacity(content.len());
        let mut cursor = 0;
        for (slot, block) in self.blocks.iter().zip(blocks) {
            out.push_str(&content[cursor..slot.start]);
            out.push_str(block);
            cursor = slot.end;
        }
        out.push_str(&content[cursor..]);
        out
    }
}

/// Locates the container block and its direct children in a file's text.
///
/// `path` is only used to give errors context.
pub trait ChildExtractor {
    fn extract(&self, path: &Path, content: &str) -> Result<Extraction, TransformError>;
}

/// Builds the extractor the settings ask for.
pub fn extractor_for(settings: &TransformSettings) -> Result<Box<dyn ChildExtractor>, TransformError> {
    let extractor: Box<dyn ChildExtractor> = match settings.strategy {
        ExtractionStrategy::Structural => Box::new(StructuralExtractor::new(
            &settings.container_tag,
            &settings.child_tag,
        )),
        ExtractionStrategy::Lexical => Box::new(LexicalExtractor::new(
            &settings.container_tag,
            &settings.child_tag,
        )?),
    };
    Ok(extractor)
}

/// Pattern matching on raw text.
///
/// The container is the first non-greedy `<tag ...>...</tag>` match. Children
/// are every non-overlapping `\s*<child...</child>\s*` match inside it, left
/// to right. Nested elements of the child kind are not understood: the first
/// `</child>` ends a block.
pub struct LexicalExtractor {
    container_tag: String,
    child_tag: String,
    container: Regex,
    child: Regex,
}

impl LexicalExtractor {
    pub fn new(container_tag: &str, child_tag: &str) -> Result<Self, TransformError> {
        let container = compile(
            container_tag,
            format!(
                r"(?is)(<{t}[^>]*>)(.*?)(</{t}>)",
                t = regex::escape(container_tag)
            ),
        )?;
        let child = compile(
            child_tag,
            format!(r"(?is)\s*<{t}.*?</{t}>\s*", t = regex::escape(child_tag)),
        )?;

        Ok(Self {
            container_tag: container_tag.to_string(),
            child_tag: child_tag.to_string(),
            container,
            child,
        })
    }
}

fn compile(tag: &str, pattern: String) -> Result<Regex, TransformError> {
    Regex::new(&pattern).map_err(|source| TransformError::InvalidPattern {
        tag: tag.to_string(),
        source,
    })
}

impl ChildExtractor for LexicalExtractor {
    fn extract(&self, path: &Path, content: &str) -> Result<Extraction, TransformError> {
        let no_container = || TransformError::NoContainerFound {
            path: path.to_path_buf(),
            tag: self.container_tag.clone(),
        };

        let captures = self.container.captures(content).ok_or_else(no_container)?;
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(2)) else {
            return Err(no_container());
        };

        if inner.as_str().trim().is_empty() {
            return Err(TransformError::EmptyContainer {
                path: path.to_path_buf(),
                tag: self.container_tag.clone(),
            });
        }

        let offset = inner.start();
        let blocks: Vec<Range<usize>> = self
            .child
            .find_iter(inner.as_str())
            .map(|m| offset + m.start()..offset + m.end())
            .collect();

        if blocks.is_empty() {
            return Err(TransformError::NoChildrenFound {
                path: path.to_path_buf(),
                container: self.container_tag.clone(),
                child: self.child_tag.clone(),
            });
        }

        Ok(Extraction {
            container: whole.range(),
            blocks,
        })
    }
}

/// Works on the scanned element tree: the container is the first closed
/// element of its kind, children are its direct child elements of the child
/// kind. Nested markup inside a child stays inside that child.
pub struct StructuralExtractor {
    container_tag: String,
    child_tag: String,
}

impl StructuralExtractor {
    pub fn new(container_tag: &str, child_tag: &str) -> Self {
        Self {
            container_tag: container_tag.to_string(),
            child_tag: child_tag.to_string(),
        }
    }
}

impl ChildExtractor for StructuralExtractor {
    fn extract(&self, path: &Path, content: &str) -> Result<Extraction, TransformError> {
        let doc = Document::parse(content);

        let Some((container, inner)) = doc
            .first_closed(&self.container_tag)
            .and_then(|e| e.inner().map(|inner| (e, inner)))
        else {
            return Err(TransformError::NoContainerFound {
                path: path.to_path_buf(),
                tag: self.container_tag.clone(),
            });
        };

        if content[inner.clone()].trim().is_empty() {
            return Err(TransformError::EmptyContainer {
                path: path.to_path_buf(),
                tag: self.container_tag.clone(),
            });
        }

        // Widen each child over adjacent whitespace the same way the lexical
        // pattern does: leading whitespace not already taken by the previous
        // block, and all trailing whitespace.
        let mut floor = inner.start;
        let mut blocks = Vec::new();
        for child in doc
            .children(container)
            .filter(|e| e.is_named(&self.child_tag))
        {
            let span = child.span();
            let before = &content[floor..span.start];
            let start = floor + before.trim_end().len();
            let after = &content[span.end..inner.end];
            let end = span.end + (after.len() - after.trim_start().len());
            blocks.push(start..end);
            floor = end;
        }

        if blocks.is_empty() {
            return Err(TransformError::NoChildrenFound {
                path: path.to_path_buf(),
                container: self.container_tag.clone(),
                child: self.child_tag.clone(),
            });
        }

        Ok(Extraction {
            container: container.span(),
            blocks,
        })
    }
}
