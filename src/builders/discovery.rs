use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::error::TransformError;

/// What one walk found.
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    /// Directories or entries that could not be read. The walk carried on
    /// past each of them.
    pub errors: Vec<TransformError>,
}

/// Collects every regular file under `root` that `accept` keeps.
///
/// Only a missing root fails the walk. Symlinks below the root are not
/// followed, so a link back up the tree cannot make the walk revisit files.
/// Sibling order is whatever the filesystem returns.
pub fn discover_files<F>(root: &Path, accept: F) -> Result<Discovered, TransformError>
where
    F: Fn(&Path) -> bool,
{
    if !root.is_dir() {
        return Err(TransformError::MissingRootDirectory {
            path: root.to_path_buf(),
        });
    }

    let mut found = Discovered::default();
    for result in WalkDir::new(root).follow_links(false) {
        match result {
            Ok(entry) => {
                if entry.file_type().is_file() && accept(entry.path()) {
                    found.files.push(entry.into_path());
                }
            }
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                found.errors.push(TransformError::DirectoryRead {
                    path,
                    source: err.into(),
                });
            }
        }
    }

    Ok(found)
}

/// `path` relative to `base` with `/` separators, for log lines and reports.
/// Paths outside `base` are shown as they are.
pub fn display_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}
