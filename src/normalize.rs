//! Text normalization
//!
//! A pure `&str -> String` transformation applied to every decoded text file:
//!
//! 1. CR-LF and lone CR become LF
//! 2. Tabs in indentation (or everywhere, in [`TabMode::All`]) become spaces
//! 3. Trailing spaces and tabs are removed from each line
//! 4. The text ends with a newline
//!
//! The transformation is idempotent. When tabs must be kept (makefiles) no
//! tab character is ever changed or removed.

/// Default number of spaces a tab expands to
pub const DEFAULT_INDENT_SIZE: usize = 4;

/// Which tabs get expanded to spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabMode {
    /// Only tabs in the leading whitespace run of a line
    #[default]
    Leading,
    /// Every tab in the line
    All,
}

/// Immutable normalization settings shared by all files of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeConfig {
    pub indent_size: usize,
    pub convert_tabs: bool,
    pub tab_mode: TabMode,
    pub keep_tabs: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            indent_size: DEFAULT_INDENT_SIZE,
            convert_tabs: true,
            tab_mode: TabMode::Leading,
            keep_tabs: false,
        }
    }
}

impl NormalizeConfig {
    pub fn with_indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = indent_size.max(1);
        self
    }

    pub fn with_convert_tabs(mut self, convert_tabs: bool) -> Self {
        self.convert_tabs = convert_tabs;
        self
    }

    pub fn with_tab_mode(mut self, tab_mode: TabMode) -> Self {
        self.tab_mode = tab_mode;
        self
    }

    /// Force tab preservation, overriding `convert_tabs` and `tab_mode`
    pub fn with_keep_tabs(mut self, keep_tabs: bool) -> Self {
        self.keep_tabs = keep_tabs;
        self
    }

    fn expands_tabs(&self) -> bool {
        self.convert_tabs && !self.keep_tabs
    }
}

/// Normalize `text` according to `config`
pub fn normalize(text: &str, config: &NormalizeConfig) -> String {
    let unified = unify_newlines(text);
    let indent = " ".repeat(config.indent_size.max(1));

    let mut out = String::with_capacity(unified.len() + 1);
    for (i, line) in unified.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line = if config.expands_tabs() {
            expand_tabs(line, config.tab_mode, &indent)
        } else {
            line.to_string()
        };
        out.push_str(trim_trailing(&line, config.keep_tabs));
    }

    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn unify_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn expand_tabs(line: &str, mode: TabMode, indent: &str) -> String {
    match mode {
        TabMode::All => line.replace('\t', indent),
        TabMode::Leading => {
            let split = line
                .find(|c: char| c != ' ' && c != '\t')
                .unwrap_or(line.len());
            let (leading, rest) = line.split_at(split);
            let mut expanded = leading.replace('\t', indent);
            expanded.push_str(rest);
            expanded
        }
    }
}

fn trim_trailing(line: &str, keep_tabs: bool) -> &str {
    if keep_tabs {
        line.trim_end_matches(' ')
    } else {
        line.trim_end_matches([' ', '\t'])
    }
}
