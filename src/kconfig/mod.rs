//! Kconfig option graph and required-option solving
//!
//! [`KconfigParser`] scans a kernel source tree's `Kconfig` files, following
//! `source` directives, and records for every option what it `depends on` and
//! what it `select`s. [`KconfigSolver`] then computes the set of options that
//! must be enabled for a set of targets.
//!
//! # Example
//!
//! ```
//! use pacaller::kconfig::{KconfigParser, KconfigSolver};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let parser = KconfigParser::new("/nonexistent", "x86")?;
//! let graph = parser.parse_str(
//!     "config A\n\tbool \"a\"\n\tdepends on B\nconfig B\n\tbool\n\tselect C\n",
//!     Path::new("Kconfig"),
//! );
//!
//! let result = KconfigSolver::new(&graph).resolve_dependencies(["A"], 100);
//! assert!(result.complete);
//! assert_eq!(result.required.len(), 3);
//! # Ok(())
//! # }
//! ```

mod parser;
mod solver;


pub use parser::{clean_dependency_expr, KconfigParser, DEFAULT_ARCH};
pub use solver::{KconfigSolver, SolverResult, DEFAULT_MAX_ITERATIONS};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Declared value type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KconfigType {
    Bool,
    Tristate,
    String,
    Hex,
    Int,
}

impl KconfigType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Tristate => "tristate",
            Self::String => "string",
            Self::Hex => "hex",
            Self::Int => "int",
        }
    }

    /// Whether the option can be switched on with `=y`
    pub fn is_switch(self) -> bool {
        matches!(self, Self::Bool | Self::Tristate)
    }
}

impl FromStr for KconfigType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "tristate" => Ok(Self::Tristate),
            "string" => Ok(Self::String),
            "hex" => Ok(Self::Hex),
            "int" => Ok(Self::Int),
            other => Err(format!("Unknown Kconfig type: {}", other)),
        }
    }
}

impl fmt::Display for KconfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `config` / `menuconfig` symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KconfigOption {
    pub name: String,
    /// First declared type, `None` if the option never declares one
    pub option_type: Option<KconfigType>,
    /// File of the first declaration
    pub file_path: PathBuf,
    /// `depends on` identifiers in source order (may repeat)
    pub dependencies: Vec<String>,
    /// `select` targets in source order
    pub selections: Vec<String>,
}

impl KconfigOption {
    pub fn new(name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            option_type: None,
            file_path: file_path.into(),
            dependencies: Vec::new(),
            selections: Vec::new(),
        }
    }
}

/// Outgoing edges of one option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphEntry {
    pub deps: BTreeSet<String>,
    pub selects: BTreeSet<String>,
}

/// File-level counters collected while parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub files_parsed: usize,
    pub files_missing: usize,
    pub files_failed: usize,
    /// `source` directives pointing at a file that was already parsed
    pub files_revisited: usize,
}

/// Options and dependency/selection edges of a parsed tree
#[derive(Debug, Clone, Default)]
pub struct KconfigGraph {
    pub options: BTreeMap<String, KconfigOption>,
    pub edges: BTreeMap<String, GraphEntry>,
    pub stats: ParseStats,
}

impl KconfigGraph {
    pub fn option(&self, name: &str) -> Option<&KconfigOption> {
        self.options.get(name)
    }

    pub fn entry(&self, name: &str) -> Option<&GraphEntry> {
        self.edges.get(name)
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Mutable state threaded through one (recursive) parse
#[derive(Debug, Default)]
pub(crate) struct KconfigGraphBuilder {
    graph: KconfigGraph,
    visited: HashSet<PathBuf>,
}

impl KconfigGraphBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `path` as entered; false when it was entered before
    pub(crate) fn enter_file(&mut self, path: &Path) -> bool {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.visited.insert(key)
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ParseStats {
        &mut self.graph.stats
    }

    /// Declare an option; a redeclaration keeps the first record
    pub(crate) fn declare(&mut self, name: &str, file_path: &Path) {
        self.graph
            .options
            .entry(name.to_string())
            .or_insert_with(|| KconfigOption::new(name, file_path));
        self.graph.edges.entry(name.to_string()).or_default();
    }

    pub(crate) fn set_type(&mut self, name: &str, option_type: KconfigType) {
        if let Some(option) = self.graph.options.get_mut(name) {
            if option.option_type.is_none() {
                option.option_type = Some(option_type);
            }
        }
    }

    pub(crate) fn add_dependencies(&mut self, name: &str, deps: Vec<String>) {
        let entry = self.graph.edges.entry(name.to_string()).or_default();
        entry.deps.extend(deps.iter().cloned());
        if let Some(option) = self.graph.options.get_mut(name) {
            option.dependencies.extend(deps);
        }
    }

    pub(crate) fn add_selection(&mut self, name: &str, selection: &str) {
        let entry = self.graph.edges.entry(name.to_string()).or_default();
        entry.selects.insert(selection.to_string());
        if let Some(option) = self.graph.options.get_mut(name) {
            option.selections.push(selection.to_string());
        }
    }

    pub(crate) fn finish(self) -> KconfigGraph {
        self.graph
    }
}
