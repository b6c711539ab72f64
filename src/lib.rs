//! Git text-file normalizer
//!
//! Rewrites the text files tracked by a Git repository so that they are
//! UTF-8 without BOM, use LF line endings, carry no trailing whitespace, end
//! with a single newline and indent with spaces. Binary files and
//! makefile-like files (where tabs are syntax) are protected.
//!
//! # Architecture
//!
//! - `classify`: text/binary and tab-sensitivity decisions from path + head bytes
//! - `decode`: UTF-8 decoding with an optional legacy fallback encoding
//! - `normalize`: the pure text transformation
//! - `processor`: one file from disk to disk, atomically
//! - `git_ops` / `runner`: listing files from the index, re-staging, aggregating
//!
//! # Example
//!
//! ```no_run
//! use git_reformat::{Mode, RunOptions, run};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut options = RunOptions::new(".");
//!     options.mode = Mode::Check;
//!     let summary = run(&options)?;
//!     std::process::exit(summary.exit_code().into());
//! }
//! ```

pub mod classify;
pub mod decode;
pub mod git_ops;
pub mod normalize;
pub mod processor;
pub mod runner;

// Re-export commonly used types
pub use classify::{Classification, classify};
pub use decode::{DecodeError, Decoded, LegacyEncoding, SourceEncoding, decode};
pub use git_ops::GitOps;
pub use normalize::{DEFAULT_INDENT_SIZE, NormalizeConfig, TabMode, normalize};
pub use processor::{FileProcessor, Mode, Outcome, SkipReason, WriteError, process};
pub use runner::{FileReport, FileSelection, FileStatus, RunOptions, Summary, run};
