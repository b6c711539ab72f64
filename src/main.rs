//! git-reformat - Main Entry Point
//!
//! Parses options, sets up logging, runs the normalizer and maps the result
//! to an exit code. The actual implementation is in the `git_reformat` library.

use clap::{ArgAction, Parser};
use git_reformat::{
    DEFAULT_INDENT_SIZE, FileSelection, FileStatus, LegacyEncoding, Mode, NormalizeConfig,
    RunOptions, Summary, TabMode, run,
};
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_ENVIRONMENT: u8 = 2;

/// Normalize Git-tracked text files: UTF-8, LF newlines, no trailing
/// whitespace, one final newline, spaces for indentation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dry run; exit 1 if any file would change
    #[arg(long)]
    check: bool,

    /// Only process currently staged files
    #[arg(long)]
    staged: bool,

    /// Re-stage rewritten files (use with --staged in a pre-commit hook)
    #[arg(long)]
    restage: bool,

    /// Recode files that are not UTF-8 from ENC (e.g. cp1251)
    #[arg(long, value_name = "ENC")]
    recode_from: Option<String>,

    /// Replace every tab, not only those in indentation
    #[arg(long)]
    aggressive_tabs: bool,

    /// Leave all tabs alone
    #[arg(long, conflicts_with = "aggressive_tabs")]
    keep_tabs: bool,

    /// Number of spaces per tab
    #[arg(long, value_name = "N", default_value_t = DEFAULT_INDENT_SIZE as u16,
          value_parser = clap::value_parser!(u16).range(1..))]
    indent_size: u16,

    /// Directory inside the repository to run from
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Do not print skipped files
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn to_options(&self) -> anyhow::Result<RunOptions> {
        let legacy = self
            .recode_from
            .as_deref()
            .map(LegacyEncoding::from_label)
            .transpose()?;

        let tab_mode = if self.aggressive_tabs {
            TabMode::All
        } else {
            TabMode::Leading
        };

        let mut options = RunOptions::new(&self.root);
        options.selection = if self.staged {
            FileSelection::Staged
        } else {
            FileSelection::Tracked
        };
        options.mode = if self.check { Mode::Check } else { Mode::Write };
        options.restage = self.restage;
        options.legacy = legacy;
        options.normalize = NormalizeConfig::default()
            .with_indent_size(usize::from(self.indent_size))
            .with_convert_tabs(!self.keep_tabs)
            .with_tab_mode(tab_mode);
        Ok(options)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_reports(summary: &Summary, quiet: bool) {
    for report in &summary.reports {
        let path = report.path.display();
        match &report.status {
            FileStatus::Changed if summary.mode == Mode::Check => println!("NEEDS-FIX {}", path),
            FileStatus::Changed => println!("FIXED {}", path),
            FileStatus::Restaged => println!("FIXED {} (restaged)", path),
            FileStatus::Skipped(reason) => {
                if !quiet {
                    println!("SKIP ({}) {}", reason, path);
                }
            }
            FileStatus::WriteFailed(msg) => eprintln!("ERROR writing {}: {}", path, msg),
            FileStatus::RestageFailed(msg) => eprintln!("ERROR restaging {}: {}", path, msg),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = match args.to_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_ENVIRONMENT);
        }
    };

    match run(&options) {
        Ok(summary) => {
            print_reports(&summary, args.quiet);
            ExitCode::from(summary.exit_code())
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ENVIRONMENT)
        }
    }
}
