//! Fixed-point closure over the Kconfig graph
//!
//! Starting from the targets, every `depends on` and every `select` edge of a
//! required option pulls its target into the required set, until nothing new
//! appears or the iteration budget runs out. The result only ever grows from
//! the initial targets.

use super::KconfigGraph;
use std::collections::{BTreeSet, VecDeque};

/// Default iteration budget
pub const DEFAULT_MAX_ITERATIONS: usize = 5000;

/// Required options for a set of targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverResult {
    pub required: BTreeSet<String>,
    /// Worklist items processed
    pub iterations: usize,
    /// False when the budget ran out before the closure was reached; the
    /// required set is then partial
    pub complete: bool,
}

impl SolverResult {
    /// Required names that no Kconfig file declares
    pub fn undeclared<'r>(&'r self, graph: &KconfigGraph) -> Vec<&'r str> {
        self.required
            .iter()
            .filter(|name| graph.option(name).is_none())
            .map(String::as_str)
            .collect()
    }

    /// `.config` fragment enabling the required switch options
    ///
    /// Options with a value type are listed as comments, undeclared names are
    /// left out.
    pub fn config_fragment(&self, graph: &KconfigGraph) -> String {
        let mut out = String::new();
        for name in &self.required {
            let Some(option_type) = graph.option(name).and_then(|o| o.option_type) else {
                continue;
            };
            if option_type.is_switch() {
                out.push_str(&format!("CONFIG_{}=y\n", name));
            } else {
                out.push_str(&format!("# CONFIG_{} needs a {} value\n", name, option_type));
            }
        }
        out
    }
}

/// Computes required-option sets over a parsed graph
#[derive(Debug, Clone, Copy)]
pub struct KconfigSolver<'g> {
    graph: &'g KconfigGraph,
}

impl<'g> KconfigSolver<'g> {
    pub fn new(graph: &'g KconfigGraph) -> Self {
        Self { graph }
    }

    /// Close `initial_targets` under dependencies and selections
    ///
    /// Names without a graph entry are kept in the result but contribute no
    /// edges. Hitting `max_iterations` is logged and reported through
    /// [`SolverResult::complete`].
    pub fn resolve_dependencies<I, S>(&self, initial_targets: I, max_iterations: usize) -> SolverResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut required = BTreeSet::new();
        let mut worklist = VecDeque::new();
        for target in initial_targets {
            let target = target.into();
            if required.insert(target.clone()) {
                worklist.push_back(target);
            }
        }

        let mut iterations = 0;
        while iterations < max_iterations {
            let Some(current) = worklist.pop_front() else {
                break;
            };
            iterations += 1;

            let Some(entry) = self.graph.entry(&current) else {
                continue;
            };

            for next in entry.deps.iter().chain(&entry.selects) {
                if required.insert(next.clone()) {
                    worklist.push_back(next.clone());
                }
            }
        }

        let complete = worklist.is_empty();
        if !complete {
            tracing::warn!(
                "Dependency resolution reached max iterations ({}). Result may be incomplete.",
                max_iterations
            );
        }

        SolverResult {
            required,
            iterations,
            complete,
        }
    }
}
