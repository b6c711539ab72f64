//! Whole-run driver
//!
//! Lists files from the Git index, processes each one and collects the
//! per-file results into a [`Summary`]. A failure on one file never stops
//! the run; only failing to list files at all is returned as an error.

use crate::decode::LegacyEncoding;
use crate::git_ops::GitOps;
use crate::normalize::NormalizeConfig;
use crate::processor::{FileProcessor, Mode, Outcome, SkipReason};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which files of the repository are processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileSelection {
    /// Every file in the index
    #[default]
    Tracked,
    /// Only files staged for the next commit
    Staged,
}

/// Options for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory the repository is discovered from
    pub root: PathBuf,
    pub selection: FileSelection,
    pub mode: Mode,
    /// Add rewritten files back to the index (write mode only)
    pub restage: bool,
    pub normalize: NormalizeConfig,
    pub legacy: Option<LegacyEncoding>,
}

impl RunOptions {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            selection: FileSelection::Tracked,
            mode: Mode::Write,
            restage: false,
            normalize: NormalizeConfig::default(),
            legacy: None,
        }
    }
}

/// What happened to a file that needs reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Rewritten, or needs rewriting in check mode
    Changed,
    /// Rewritten and added back to the index
    Restaged,
    Skipped(SkipReason),
    WriteFailed(String),
    /// Rewritten, but adding it back to the index failed
    RestageFailed(String),
}

/// A reportable per-file result; unchanged files produce none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Path relative to the working tree root
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Aggregated results of a run, reports in file-list order
#[derive(Debug, Clone)]
pub struct Summary {
    pub mode: Mode,
    pub unchanged: usize,
    pub changed: usize,
    pub skipped: usize,
    pub restaged: usize,
    pub failed: usize,
    pub reports: Vec<FileReport>,
}

impl Summary {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            unchanged: 0,
            changed: 0,
            skipped: 0,
            restaged: 0,
            failed: 0,
            reports: Vec::new(),
        }
    }

    fn report(&mut self, path: &Path, status: FileStatus) {
        self.reports.push(FileReport {
            path: path.to_path_buf(),
            status,
        });
    }

    /// Process exit code: 1 when check mode found changes or any file failed
    pub fn exit_code(&self) -> u8 {
        let pending = self.mode == Mode::Check && self.changed > 0;
        if pending || self.failed > 0 { 1 } else { 0 }
    }
}

/// Run the normalizer over the selected files of the repository at `options.root`
pub fn run(options: &RunOptions) -> Result<Summary> {
    let git = GitOps::discover(&options.root)?;
    let files = match options.selection {
        FileSelection::Tracked => git.tracked_files()?,
        FileSelection::Staged => git.staged_files()?,
    };

    let restage = options.restage && options.mode == Mode::Write;
    if options.restage && !restage {
        warn!("--restage has no effect in check mode");
    }

    let processor = FileProcessor::new(options.normalize, options.mode)
        .with_legacy_encoding(options.legacy);
    let mut summary = Summary::new(options.mode);

    for rel in &files {
        if rel.starts_with(".git") {
            continue;
        }
        let path = git.workdir().join(rel);

        match processor.process(&path) {
            Ok(Outcome::Unchanged) => summary.unchanged += 1,
            Ok(Outcome::Skipped(reason)) => {
                summary.skipped += 1;
                summary.report(rel, FileStatus::Skipped(reason));
            }
            Ok(Outcome::Changed) => {
                summary.changed += 1;
                if !restage {
                    summary.report(rel, FileStatus::Changed);
                    continue;
                }
                match git.restage(rel) {
                    Ok(()) => {
                        summary.restaged += 1;
                        summary.report(rel, FileStatus::Restaged);
                    }
                    Err(e) => {
                        warn!("{:#}", e);
                        summary.failed += 1;
                        summary.report(rel, FileStatus::RestageFailed(format!("{:#}", e)));
                    }
                }
            }
            Err(e) => {
                warn!("{}", e);
                summary.failed += 1;
                summary.report(rel, FileStatus::WriteFailed(e.source.to_string()));
            }
        }
    }

    info!(
        "{} files: {} changed, {} unchanged, {} skipped, {} failed",
        files.len(),
        summary.changed,
        summary.unchanged,
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        let mut summary = Summary::new(Mode::Write);
        summary.changed = 3;
        assert_eq!(summary.exit_code(), 0);

        summary.failed = 1;
        assert_eq!(summary.exit_code(), 1);

        let mut check = Summary::new(Mode::Check);
        assert_eq!(check.exit_code(), 0);
        check.skipped = 2;
        assert_eq!(check.exit_code(), 0);
        check.changed = 1;
        assert_eq!(check.exit_code(), 1);
    }

    #[test]
    fn test_default_options() {
        let options = RunOptions::new("/tmp/repo");
        assert_eq!(options.root, PathBuf::from("/tmp/repo"));
        assert_eq!(options.selection, FileSelection::Tracked);
        assert_eq!(options.mode, Mode::Write);
        assert!(!options.restage);
        assert!(options.legacy.is_none());
    }
}
