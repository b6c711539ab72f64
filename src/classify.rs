//! File classification
//!
//! Decides from a path and a head sample whether a file is a text candidate
//! and whether its format depends on literal tab characters.

use std::path::Path;

/// Number of leading bytes inspected for NUL detection
pub const SAMPLE_LEN: usize = 8192;

const BINARY_EXTS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "pdf", "zip", "gz", "bz2", "xz", "7z", "rar", "jar",
    "war", "ear", "class", "exe", "dll", "pdb", "so", "dylib", "a", "o", "obj", "bin", "psd", "ai",
    "sketch", "blend", "fbx", "glb", "gltf", "otf", "ttf", "woff", "woff2", "eot", "wasm", "mp3",
    "mp4", "mov", "avi", "mkv", "webm", "iso",
];

const MAKEFILE_NAMES: &[&str] = &["Makefile", "makefile", "GNUmakefile"];
const MAKEFILE_EXTS: &[&str] = &["mk", "mak"];

/// Result of classifying a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The file may be decoded and normalized
    pub is_text: bool,
    /// The file's extension marks it as binary (only meaningful when `is_text` is false)
    pub binary_by_extension: bool,
    /// Literal tabs carry meaning and must never be rewritten
    pub is_tab_sensitive: bool,
}

/// Classify a file from its path and the first bytes of its content
///
/// Only the first [`SAMPLE_LEN`] bytes of `sample` are looked at.
pub fn classify(path: &Path, sample: &[u8]) -> Classification {
    let binary_by_extension = is_binary_extension(path);
    let head = &sample[..sample.len().min(SAMPLE_LEN)];
    let binary_by_content = head.contains(&0);

    Classification {
        is_text: !binary_by_extension && !binary_by_content,
        binary_by_extension,
        is_tab_sensitive: is_tab_sensitive(path),
    }
}

/// Check whether the extension is in the known binary set (case-insensitive)
pub fn is_binary_extension(path: &Path) -> bool {
    extension_in(path, BINARY_EXTS)
}

/// Check whether the path names a makefile-like build rule file
pub fn is_tab_sensitive(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| MAKEFILE_NAMES.contains(&n));

    name_matches || extension_in(path, MAKEFILE_EXTS)
}

fn extension_in(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| set.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}
