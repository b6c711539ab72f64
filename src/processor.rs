//! Per-file processing
//!
//! Reads one file, classifies it, decodes it, normalizes it and, when the
//! result differs from what is on disk, either reports it (check mode) or
//! atomically replaces the file (write mode).

use crate::classify::{SAMPLE_LEN, classify};
use crate::decode::{LegacyEncoding, SourceEncoding, decode};
use crate::normalize::{NormalizeConfig, normalize};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Whether changed files are rewritten or only reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Write,
}

/// Why a file was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Missing or could not be read
    Unreadable,
    /// Symlink, directory (e.g. a submodule) or other non-regular entry
    NotRegularFile,
    BinaryExtension,
    /// NUL byte in the head sample
    BinaryContent,
    /// Neither UTF-8 nor the fallback encoding
    Undecodable,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Unreadable => "unreadable",
            SkipReason::NotRegularFile => "not-a-file",
            SkipReason::BinaryExtension => "binary-extension",
            SkipReason::BinaryContent => "binary-content",
            SkipReason::Undecodable => "undecodable",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already normalized; nothing written
    Unchanged,
    /// Rewritten (write mode) or would be rewritten (check mode)
    Changed,
    Skipped(SkipReason),
}

/// A normalized form was computed but could not be written back
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Applies one run's configuration to individual files
#[derive(Debug, Clone)]
pub struct FileProcessor {
    config: NormalizeConfig,
    legacy: Option<LegacyEncoding>,
    mode: Mode,
}

impl FileProcessor {
    pub fn new(config: NormalizeConfig, mode: Mode) -> Self {
        Self {
            config,
            legacy: None,
            mode,
        }
    }

    /// Use `legacy` to decode files that are not valid UTF-8
    pub fn with_legacy_encoding(mut self, legacy: Option<LegacyEncoding>) -> Self {
        self.legacy = legacy;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Process a single file
    ///
    /// At most one read and one write happen. A write either replaces the
    /// whole file or leaves it untouched and returns [`WriteError`].
    pub fn process(&self, path: &Path) -> Result<Outcome, WriteError> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                debug!("cannot stat {}: {}", path.display(), e);
                return Ok(Outcome::Skipped(SkipReason::Unreadable));
            }
        };
        if !metadata.file_type().is_file() {
            return Ok(Outcome::Skipped(SkipReason::NotRegularFile));
        }

        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("cannot read {}: {}", path.display(), e);
                return Ok(Outcome::Skipped(SkipReason::Unreadable));
            }
        };

        let new_bytes = match self.render(path, &raw) {
            Ok(bytes) => bytes,
            Err(reason) => {
                debug!("skipping {} ({})", path.display(), reason);
                return Ok(Outcome::Skipped(reason));
            }
        };

        if new_bytes == raw {
            return Ok(Outcome::Unchanged);
        }

        if self.mode == Mode::Write {
            write_atomic(path, &new_bytes, metadata.permissions()).map_err(|source| {
                WriteError {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            debug!("rewrote {} ({} -> {} bytes)", path.display(), raw.len(), new_bytes.len());
        }
        Ok(Outcome::Changed)
    }

    /// Compute the normalized UTF-8 bytes for `raw`
    fn render(&self, path: &Path, raw: &[u8]) -> Result<Vec<u8>, SkipReason> {
        let class = classify(path, &raw[..raw.len().min(SAMPLE_LEN)]);
        if !class.is_text {
            return Err(if class.binary_by_extension {
                SkipReason::BinaryExtension
            } else {
                SkipReason::BinaryContent
            });
        }

        let decoded = decode(raw, self.legacy).map_err(|_| SkipReason::Undecodable)?;
        if let SourceEncoding::Recoded(enc) = decoded.source {
            debug!("decoded {} as {}", path.display(), enc.name());
        }

        let config = self
            .config
            .with_keep_tabs(self.config.keep_tabs || class.is_tab_sensitive);
        Ok(normalize(&decoded.text, &config).into_bytes())
    }
}

/// Process one file with no legacy fallback encoding
pub fn process(path: &Path, config: &NormalizeConfig, mode: Mode) -> Result<Outcome, WriteError> {
    FileProcessor::new(*config, mode).process(path)
}

/// Replace `path` with `contents` via a temporary file in the same directory
fn write_atomic(path: &Path, contents: &[u8], permissions: fs::Permissions) -> io::Result<()> {
    if permissions.readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "file is read-only",
        ));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_write_mode_rewrites() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"a\r\nb\t\nc  \n");

        let outcome = process(&path, &NormalizeConfig::default(), Mode::Write).unwrap();
        assert_eq!(outcome, Outcome::Changed);
        assert_eq!(fs::read(&path).unwrap(), b"a\nb\nc\n");
    }

    #[test]
    fn test_check_mode_never_writes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.txt", b"x  \r\n");

        let outcome = process(&path, &NormalizeConfig::default(), Mode::Check).unwrap();
        assert_eq!(outcome, Outcome::Changed);
        assert_eq!(fs::read(&path).unwrap(), b"x  \r\n");
    }

    #[test]
    fn test_unchanged_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ok.rs", b"fn main() {}\n");

        let outcome = process(&path, &NormalizeConfig::default(), Mode::Write).unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_bom_only_difference_is_a_change() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bom.txt", b"\xEF\xBB\xBFabc\n");

        let outcome = process(&path, &NormalizeConfig::default(), Mode::Write).unwrap();
        assert_eq!(outcome, Outcome::Changed);
        assert_eq!(fs::read(&path).unwrap(), b"abc\n");
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let outcome = process(
            &dir.path().join("gone.txt"),
            &NormalizeConfig::default(),
            Mode::Write,
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Unreadable));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let outcome = process(&dir.path().join("sub"), &NormalizeConfig::default(), Mode::Write)
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::NotRegularFile));
    }

    #[test]
    fn test_binary_skips() {
        let dir = TempDir::new().unwrap();
        let by_ext = write_file(&dir, "img.png", b"text \n");
        let by_content = write_file(&dir, "data.txt", b"ab\0cd  \n");
        let cfg = NormalizeConfig::default();

        assert_eq!(
            process(&by_ext, &cfg, Mode::Write).unwrap(),
            Outcome::Skipped(SkipReason::BinaryExtension)
        );
        assert_eq!(
            process(&by_content, &cfg, Mode::Write).unwrap(),
            Outcome::Skipped(SkipReason::BinaryContent)
        );
        assert_eq!(fs::read(&by_content).unwrap(), b"ab\0cd  \n");
    }

    #[test]
    fn test_undecodable_without_fallback() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "legacy.txt", b"\xcf\xf0\xe8\xe2\xe5\xf2\r\n");

        let outcome = process(&path, &NormalizeConfig::default(), Mode::Write).unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Undecodable));
        assert_eq!(fs::read(&path).unwrap(), b"\xcf\xf0\xe8\xe2\xe5\xf2\r\n");
    }

    #[test]
    fn test_recode_with_fallback() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "legacy.txt", b"\xcf\xf0\xe8\xe2\xe5\xf2\r\n");
        let processor = FileProcessor::new(NormalizeConfig::default(), Mode::Write)
            .with_legacy_encoding(Some(LegacyEncoding::from_label("cp1251").unwrap()));

        assert_eq!(processor.process(&path).unwrap(), Outcome::Changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Привет\n");
    }

    #[test]
    fn test_makefile_keeps_tabs() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "Makefile", b"all:\n\tcc\tmain.c  \n");
        let processor = FileProcessor::new(
            NormalizeConfig::default().with_tab_mode(crate::normalize::TabMode::All),
            Mode::Write,
        );

        assert_eq!(processor.process(&path).unwrap(), Outcome::Changed);
        assert_eq!(fs::read(&path).unwrap(), b"all:\n\tcc\tmain.c\n");
    }

    #[test]
    fn test_read_only_file_is_write_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ro.txt", b"x \n");
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let err = process(&path, &NormalizeConfig::default(), Mode::Write).unwrap_err();
        assert_eq!(err.path, path);
        assert_eq!(err.source.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(fs::read(&path).unwrap(), b"x \n");

        // Check mode does not attempt the write
        assert_eq!(
            process(&path, &NormalizeConfig::default(), Mode::Check).unwrap(),
            Outcome::Changed
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "run.sh", b"#!/bin/sh\r\necho hi\r\n");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(
            process(&path, &NormalizeConfig::default(), Mode::Write).unwrap(),
            Outcome::Changed
        );
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_not_followed() {
        let dir = TempDir::new().unwrap();
        let target = write_file(&dir, "target.txt", b"x  \n");
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(
            process(&link, &NormalizeConfig::default(), Mode::Write).unwrap(),
            Outcome::Skipped(SkipReason::NotRegularFile)
        );
        assert_eq!(fs::read(&target).unwrap(), b"x  \n");
    }
}
