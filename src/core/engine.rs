use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::discovery::{discover_files, display_path};
use crate::builders::patterns::{ChildExtractor, extractor_for};
use crate::builders::reporter::{FileOutcome, FileReport, TransformReport};
use crate::builders::shuffle::shuffle;
use crate::core::config::{TransformMode, TransformSettings};
use crate::core::error::TransformError;
use crate::core::sink::LogSink;

/// Runs one transform pass over the configured components directory.
///
/// `base_dir` is the project root that relative settings are resolved
/// against. A configured seed makes the shuffle reproducible, otherwise the
/// random source is seeded from the OS. Nothing is returned as an error: every
/// failure ends up in the report and in the sink.
pub fn transform_directory(
    settings: &TransformSettings,
    base_dir: &Path,
    sink: &dyn LogSink,
) -> TransformReport {
    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    ShuffleEngine::new(settings, base_dir, sink, rng).run()
}

pub struct ShuffleEngine<'a, R: Rng> {
    settings: &'a TransformSettings,
    base_dir: PathBuf,
    sink: &'a dyn LogSink,
    rng: R,
}

impl<'a, R: Rng> ShuffleEngine<'a, R> {
    pub fn new(
        settings: &'a TransformSettings,
        base_dir: &Path,
        sink: &'a dyn LogSink,
        rng: R,
    ) -> Self {
        Self {
            settings,
            base_dir: base_dir.to_path_buf(),
            sink,
            rng,
        }
    }

    pub fn run(&mut self) -> TransformReport {
        let root = self.base_dir.join(&self.settings.root_dir);
        let mut report = TransformReport::new(root.clone());

        match self.settings.mode {
            TransformMode::Shuffle => self.sink.info(&format!(
                "Searching all components for marker: {}",
                self.settings.marker
            )),
            TransformMode::Dump => self.sink.info(&format!(
                "Reading all components in {} ...",
                display_path(&self.base_dir, &root)
            )),
        }

        let extractor = match extractor_for(self.settings) {
            Ok(extractor) => extractor,
            Err(err) => {
                self.sink.error(&err.detail());
                report.error = Some(err.detail());
                return report;
            }
        };

        let found = match discover_files(&root, |p| self.settings.accepts_extension(p)) {
            Ok(found) => found,
            Err(err @ TransformError::MissingRootDirectory { .. }) => {
                self.sink.warn(&err.to_string());
                report.root_missing = true;
                return report;
            }
            Err(err) => {
                let message = format!("Error while reading components directory: {}", err.detail());
                self.sink.error(&message);
                report.error = Some(message);
                return report;
            }
        };

        for err in &found.errors {
            let message = format!("Error while reading components directory: {}", err.detail());
            self.sink.error(&message);
            report.unreadable.push(message);
        }

        self.sink
            .info(&format!("Found {} component files.", found.files.len()));

        for path in found.files {
            let display = display_path(&self.base_dir, &path);
            let outcome = match self.settings.mode {
                TransformMode::Shuffle => self.shuffle_file(&path, &display, extractor.as_ref()),
                TransformMode::Dump => self.dump_file(&path, &display),
            };
            report.files.push(FileReport {
                path: display,
                outcome,
            });
        }

        self.sink.info(&report.summary_line());
        report
    }

    fn shuffle_file(
        &mut self,
        path: &Path,
        display: &str,
        extractor: &dyn ChildExtractor,
    ) -> FileOutcome {
        match self.try_shuffle_file(path, display, extractor) {
            Ok(outcome) => outcome,
            Err(err) => self.outcome_for(err),
        }
    }

    fn try_shuffle_file(
        &mut self,
        path: &Path,
        display: &str,
        extractor: &dyn ChildExtractor,
    ) -> Result<FileOutcome, TransformError> {
        let content = fs::read_to_string(path).map_err(|source| TransformError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        if !content.contains(&self.settings.marker) {
            self.sink
                .info(&format!("No marker found in checked file: {display} (skipped)"));
            return Ok(FileOutcome::SkippedNoMarker);
        }
        self.sink
            .info(&format!("Marker found. Processing: {display}"));

        let extraction = extractor.extract(path, &content)?;
        self.sink.debug(&format!(
            "Container <{}> spans bytes {}..{}",
            self.settings.container_tag, extraction.container.start, extraction.container.end
        ));
        let mut blocks = extraction.child_blocks(&content);
        let children = blocks.len();
        self.sink
            .info(&format!("Found {children} direct children to shuffle."));

        shuffle(&mut blocks, &mut self.rng);
        let updated = extraction.splice(&content, &blocks);

        if self.settings.dry_run {
            self.sink
                .info(&format!("Dry run, not writing: {display}"));
            return Ok(FileOutcome::Shuffled {
                children,
                written: false,
            });
        }

        fs::write(path, updated).map_err(|source| TransformError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        self.sink.info(&format!("File overwritten: {display}"));
        self.sink.debug(&format!(
            "Direct children inside <{}> of {display} have been randomized.",
            self.settings.container_tag
        ));

        Ok(FileOutcome::Shuffled {
            children,
            written: true,
        })
    }

    fn dump_file(&self, path: &Path, display: &str) -> FileOutcome {
        match fs::read_to_string(path) {
            Ok(content) => {
                self.sink
                    .info(&format!("=== Component: {display} ==="));
                self.sink.info(&format!("Contents:\n{content}\n"));
                FileOutcome::Dumped {
                    bytes: content.len(),
                }
            }
            Err(source) => self.outcome_for(TransformError::FileRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Logs a per-file error and maps it to the file's terminal outcome.
    fn outcome_for(&self, err: TransformError) -> FileOutcome {
        match err {
            TransformError::NoContainerFound { .. } => {
                self.sink.warn(&err.to_string());
                FileOutcome::SkippedNoContainer
            }
            TransformError::EmptyContainer { .. } => {
                self.sink.warn(&err.to_string());
                FileOutcome::SkippedEmptyContainer
            }
            TransformError::NoChildrenFound { .. } => {
                self.sink.warn(&err.to_string());
                FileOutcome::SkippedNoChildren
            }
            other => {
                let error = other.detail();
                self.sink.error(&error);
                FileOutcome::Failed { error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::MemorySink;
    use log::Level;
    use tempfile::tempdir;

    fn settings_with_seed(seed: u64) -> TransformSettings {
        TransformSettings {
            root_dir: PathBuf::from("components"),
            seed: Some(seed),
            ..TransformSettings::default()
        }
    }

    #[test]
    fn test_missing_root_is_reported_not_raised() {
        let dir = tempdir().unwrap();
        let sink = MemorySink::new();
        let report = transform_directory(&settings_with_seed(1), dir.path(), &sink);

        assert!(report.root_missing);
        assert!(report.files.is_empty());
        assert!(sink.contains(Level::Warn, "components directory does not exist"));
    }

    #[test]
    fn test_invalid_utf8_is_a_per_file_failure() {
        let dir = tempdir().unwrap();
        let components = dir.path().join("components");
        fs::create_dir_all(&components).unwrap();
        fs::write(components.join("bad.astro"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(components.join("good.astro"), "<p>no marker</p>").unwrap();

        let sink = MemorySink::new();
        let report = transform_directory(&settings_with_seed(1), dir.path(), &sink);

        assert_eq!(report.files.len(), 2);
        let bad = report
            .files
            .iter()
            .find(|f| f.path.ends_with("bad.astro"))
            .unwrap();
        assert!(matches!(bad.outcome, FileOutcome::Failed { .. }));
        let good = report
            .files
            .iter()
            .find(|f| f.path.ends_with("good.astro"))
            .unwrap();
        assert_eq!(good.outcome, FileOutcome::SkippedNoMarker);
        assert!(sink.contains(Level::Error, "bad.astro"));
    }

    #[test]
    fn test_dump_mode_logs_contents_without_writing() {
        let dir = tempdir().unwrap();
        let components = dir.path().join("components");
        fs::create_dir_all(&components).unwrap();
        let file = components.join("List.astro");
        let content = "<!-- SHUFFLE_DL_CHILDREN --><dl><div>1</div><div>2</div></dl>";
        fs::write(&file, content).unwrap();

        let settings = TransformSettings {
            mode: TransformMode::Dump,
            ..settings_with_seed(5)
        };
        let sink = MemorySink::new();
        let report = transform_directory(&settings, dir.path(), &sink);

        assert_eq!(
            report.files[0].outcome,
            FileOutcome::Dumped {
                bytes: content.len()
            }
        );
        assert!(sink.contains(Level::Info, "=== Component: components/List.astro ==="));
        assert!(sink.contains(Level::Info, content));
        assert_eq!(fs::read_to_string(&file).unwrap(), content);
    }

    #[test]
    fn test_dry_run_leaves_file_alone() {
        let dir = tempdir().unwrap();
        let components = dir.path().join("components");
        fs::create_dir_all(&components).unwrap();
        let file = components.join("List.astro");
        let content = "<!-- SHUFFLE_DL_CHILDREN --><dl><div>1</div><div>2</div><div>3</div></dl>";
        fs::write(&file, content).unwrap();

        let settings = TransformSettings {
            dry_run: true,
            ..settings_with_seed(11)
        };
        let sink = MemorySink::new();
        let report = transform_directory(&settings, dir.path(), &sink);

        assert_eq!(
            report.files[0].outcome,
            FileOutcome::Shuffled {
                children: 3,
                written: false
            }
        );
        assert_eq!(fs::read_to_string(&file).unwrap(), content);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_skips_only_that_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let components = dir.path().join("components");
        let locked = components.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("Hidden.astro"), "<p>x</p>").unwrap();
        let content = "<!-- SHUFFLE_DL_CHILDREN --><dl><div>1</div><div>2</div></dl>";
        fs::write(components.join("List.astro"), content).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let privileged = fs::read_dir(&locked).is_ok();
        let sink = MemorySink::new();
        let report = transform_directory(&settings_with_seed(2), dir.path(), &sink);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        assert!(report.error.is_none());
        assert_eq!(report.unreadable.len(), 1);
        assert!(sink.contains(Level::Error, "Error while reading components directory"));
        assert_eq!(report.files.len(), 1);
        assert_eq!(
            report.outcome_of("components/List.astro"),
            Some(&FileOutcome::Shuffled {
                children: 2,
                written: true
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_does_not_stop_later_files() {
        let dir = tempdir().unwrap();
        let components = dir.path().join("components");
        fs::create_dir_all(&components).unwrap();
        let content = "<!-- SHUFFLE_DL_CHILDREN --><dl><div>1</div><div>2</div><div>3</div></dl>";
        let locked = components.join("A.astro");
        fs::write(&locked, content).unwrap();
        fs::write(components.join("B.astro"), content).unwrap();

        let mut permissions = fs::metadata(&locked).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&locked, permissions).unwrap();
        if fs::OpenOptions::new().write(true).open(&locked).is_ok() {
            // Running privileged, read-only files stay writable.
            return;
        }

        let sink = MemorySink::new();
        let report = transform_directory(&settings_with_seed(8), dir.path(), &sink);

        assert!(matches!(
            report.outcome_of("components/A.astro"),
            Some(FileOutcome::Failed { error }) if error.contains("A.astro")
        ));
        assert_eq!(
            report.outcome_of("components/B.astro"),
            Some(&FileOutcome::Shuffled {
                children: 3,
                written: true
            })
        );
        assert_eq!(fs::read_to_string(&locked).unwrap(), content);
        assert!(sink.contains(Level::Error, "A.astro"));
        assert!(sink.contains(Level::Info, "2 files checked: 1 shuffled, 0 skipped, 1 failed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_back_to_root_processes_each_file_once() {
        let dir = tempdir().unwrap();
        let components = dir.path().join("components");
        fs::create_dir_all(components.join("cards")).unwrap();
        let content = "<!-- SHUFFLE_DL_CHILDREN --><dl><div>1</div><div>2</div></dl>";
        fs::write(components.join("cards/List.astro"), content).unwrap();
        std::os::unix::fs::symlink(&components, components.join("cards/back")).unwrap();

        let sink = MemorySink::new();
        let report = transform_directory(&settings_with_seed(4), dir.path(), &sink);

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.shuffled(), 1);
        assert!(report.unreadable.is_empty());
        assert_eq!(sink.messages_at(Level::Info).iter().filter(|m| m.starts_with("File overwritten")).count(), 1);
    }
}
