//! Line-oriented Kconfig scanner
//!
//! Only the directives needed for dependency solving are understood:
//!
//! - `config NAME` / `menuconfig NAME` open an option block
//! - `bool`, `tristate`, `string`, `hex`, `int`, `def_bool`, `def_tristate`
//!   set the option type (first one wins)
//! - `depends on EXPR` adds the identifiers of `EXPR`
//! - `select NAME` adds a selection
//! - `source "PATH"` parses another file into the same graph
//! - `help` blocks are skipped
//!
//! An option block lasts until the next declaration. Missing or unreadable
//! files are skipped, and a file reached twice through `source` is parsed
//! only once.

use super::{KconfigGraph, KconfigGraphBuilder, KconfigType};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Architecture whose `arch/<arch>/Kconfig` is used as entry point
pub const DEFAULT_ARCH: &str = "x86";

#[derive(Debug, Clone)]
struct LineMatchers {
    config: Regex,
    option_type: Regex,
    def_type: Regex,
    depends: Regex,
    select: Regex,
    source: Regex,
    help: Regex,
}

impl LineMatchers {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            config: Regex::new(r"^\s*(?:menu)?config\s+([A-Z0-9_]+)\s*(?:#.*)?$")?,
            option_type: Regex::new(r"^\s*(bool|tristate|string|hex|int)\b")?,
            def_type: Regex::new(r"^\s*def_(bool|tristate)\b")?,
            depends: Regex::new(r"^\s*depends\s+on\s+(.*)$")?,
            select: Regex::new(r"^\s*select\s+([A-Z0-9_]+)")?,
            source: Regex::new(r#"^\s*source\s+"?([^"]+?)"?\s*$"#)?,
            help: Regex::new(r"^\s*(?:---help---|help)\s*$")?,
        })
    }
}

/// Split a `depends on` expression into the option names it mentions
///
/// Operands of `&&` / `||` are kept when they are plain upper-case symbols
/// (parentheses stripped). Negated operands and negated groups, comparisons
/// and the tristate literals are dropped: they do not name an option that
/// must be enabled.
///
/// ```
/// use pacaller::kconfig::clean_dependency_expr;
///
/// assert_eq!(
///     clean_dependency_expr("NET && (INET || IPV6) && !COMPILE_TEST && m"),
///     vec!["NET", "INET", "IPV6"]
/// );
/// assert_eq!(clean_dependency_expr("NET && !(ARM || ARM64)"), vec!["NET"]);
/// ```
pub fn clean_dependency_expr(expr: &str) -> Vec<String> {
    let expr = expr.split('#').next().unwrap_or_default();
    let expr = strip_negated_groups(expr);

    expr.split("&&")
        .flat_map(|part| part.split("||"))
        .map(|token| token.trim().trim_matches(|c| c == '(' || c == ')').trim())
        .filter(|token| is_symbol(token))
        .map(str::to_string)
        .collect()
}

/// Blank out every `!( ... )` group, nested parentheses included
///
/// An unbalanced group runs to the end of the expression.
fn strip_negated_groups(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut chars = expr.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '!' {
            out.push(c);
            continue;
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next_if_eq(&'(').is_none() {
            out.push(c);
            continue;
        }

        let mut depth = 1usize;
        for inner in chars.by_ref() {
            match inner {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                break;
            }
        }
        out.push(' ');
    }
    out
}

fn is_symbol(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && token.chars().any(|c| c.is_ascii_uppercase())
}

/// Display width of a line's leading whitespace (tabs stop every 8 columns)
fn indentation(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 8 - width % 8,
            _ => break,
        }
    }
    width
}

/// Parses a kernel tree's Kconfig files into a [`KconfigGraph`]
#[derive(Debug, Clone)]
pub struct KconfigParser {
    kernel_dir: PathBuf,
    arch: String,
    matchers: LineMatchers,
}

impl KconfigParser {
    pub fn new(kernel_dir: impl Into<PathBuf>, arch: impl Into<String>) -> Result<Self> {
        Ok(Self {
            kernel_dir: kernel_dir.into(),
            arch: arch.into(),
            matchers: LineMatchers::new().context("Failed to compile Kconfig line patterns")?,
        })
    }

    pub fn kernel_dir(&self) -> &Path {
        &self.kernel_dir
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// `arch/<arch>/Kconfig` when present, the top-level `Kconfig` otherwise
    pub fn entry_point(&self) -> PathBuf {
        let arch_kconfig = self.kernel_dir.join("arch").join(&self.arch).join("Kconfig");
        if arch_kconfig.is_file() {
            arch_kconfig
        } else {
            self.kernel_dir.join("Kconfig")
        }
    }

    /// Parse the whole tree starting at [`entry_point`](Self::entry_point)
    pub fn parse(&self) -> KconfigGraph {
        self.parse_file(&self.entry_point())
    }

    /// Parse starting at an arbitrary file
    pub fn parse_file(&self, path: &Path) -> KconfigGraph {
        let mut builder = KconfigGraphBuilder::new();
        self.parse_into(path, &mut builder);
        let graph = builder.finish();

        tracing::info!(
            "Parsed {} Kconfig files ({} missing, {} unreadable), {} options",
            graph.stats.files_parsed,
            graph.stats.files_missing,
            graph.stats.files_failed,
            graph.option_count()
        );
        graph
    }

    /// Parse in-memory Kconfig text as if it were the file at `path`
    ///
    /// `source` directives in the text are resolved on disk.
    pub fn parse_str(&self, text: &str, path: &Path) -> KconfigGraph {
        let mut builder = KconfigGraphBuilder::new();
        builder.enter_file(path);
        builder.stats_mut().files_parsed += 1;
        self.scan(text, path, &mut builder);
        builder.finish()
    }

    fn parse_into(&self, path: &Path, builder: &mut KconfigGraphBuilder) {
        if !builder.enter_file(path) {
            tracing::debug!("Skipping already parsed Kconfig file: {}", path.display());
            builder.stats_mut().files_revisited += 1;
            return;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Kconfig file not found: {}", path.display());
                builder.stats_mut().files_missing += 1;
                return;
            }
            Err(e) => {
                tracing::warn!("Could not read Kconfig file {}: {}", path.display(), e);
                builder.stats_mut().files_failed += 1;
                return;
            }
        };

        builder.stats_mut().files_parsed += 1;
        let text = String::from_utf8_lossy(&bytes);
        self.scan(&text, path, builder);
    }

    fn scan(&self, text: &str, path: &Path, builder: &mut KconfigGraphBuilder) {
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let m = &self.matchers;

        let mut current: Option<String> = None;
        let mut help_indent: Option<usize> = None;

        for line in text.lines() {
            if let Some(indent) = help_indent {
                if line.trim().is_empty() || indentation(line) > indent {
                    continue;
                }
                help_indent = None;
            }

            if let Some(caps) = m.config.captures(line) {
                let name = &caps[1];
                builder.declare(name, path);
                current = Some(name.to_string());
                continue;
            }

            if let Some(caps) = m.source.captures(line) {
                let target = self.resolve_source(&caps[1], base_dir);
                self.parse_into(&target, builder);
                continue;
            }

            if m.help.is_match(line) {
                help_indent = Some(indentation(line));
                continue;
            }

            let Some(name) = current.as_deref() else {
                continue;
            };

            if let Some(caps) = m.option_type.captures(line).or_else(|| m.def_type.captures(line)) {
                if let Ok(option_type) = caps[1].parse::<KconfigType>() {
                    builder.set_type(name, option_type);
                }
            }

            if let Some(caps) = m.depends.captures(line) {
                let deps = clean_dependency_expr(&caps[1]);
                builder.add_dependencies(name, deps);
            }

            if let Some(caps) = m.select.captures(line) {
                builder.add_selection(name, &caps[1]);
            }
        }
    }

    /// Resolve a `source` argument
    ///
    /// Relative to the referencing file first, then to the kernel root, where
    /// upstream trees resolve it. `$(SRCARCH)` expands to the configured arch.
    fn resolve_source(&self, raw: &str, base_dir: &Path) -> PathBuf {
        let expanded = raw
            .trim()
            .replace("$(SRCARCH)", &self.arch)
            .replace("$SRCARCH", &self.arch);

        let local = base_dir.join(&expanded);
        if local.exists() {
            return local;
        }

        let rooted = self.kernel_dir.join(&expanded);
        if rooted.exists() {
            return rooted;
        }

        local
    }
}
