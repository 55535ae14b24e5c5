use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while transforming a component tree.
///
/// None of these are fatal to a run. The engine catches each one at the
/// smallest scope it applies to (a single file or directory, or the root
/// directory check),
/// logs it and moves on.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("components directory does not exist: {}", path.display())]
    MissingRootDirectory { path: PathBuf },

    #[error("failed to list directory {}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("marker found in {}, but no <{tag}>...</{tag}> block detected", path.display())]
    NoContainerFound { path: PathBuf, tag: String },

    #[error("marker found in {}, but the <{tag}> block is empty", path.display())]
    EmptyContainer { path: PathBuf, tag: String },

    #[error("no <{child}> elements found inside <{container}> in {}", path.display())]
    NoChildrenFound {
        path: PathBuf,
        container: String,
        child: String,
    },

    #[error("invalid tag pattern `{tag}`")]
    InvalidPattern {
        tag: String,
        #[source]
        source: regex::Error,
    },
}

impl TransformError {
    /// The underlying I/O or regex message, if there is one, for log lines
    /// that need more than the top-level description.
    pub fn detail(&self) -> String {
        match self {
            TransformError::DirectoryRead { source, .. }
            | TransformError::FileRead { source, .. }
            | TransformError::FileWrite { source, .. } => format!("{self}: {source}"),
            TransformError::InvalidPattern { source, .. } => format!("{self}: {source}"),
            _ => self.to_string(),
        }
    }
}
