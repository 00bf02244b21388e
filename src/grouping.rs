//! Partition of resources into subsystem groups
//!
//! A resource belongs to the group of the first configured prefix its origin
//! file starts with, or to the default group when none matches. The prefix
//! list is small, so classification is a linear scan.

use crate::config::GeneratorConfig;
use crate::ir::{IntermediateRepresentation, Resource};

/// Resources sharing an origin prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsystemGroup {
    /// The matching prefix, or the default group name
    pub name: String,
    /// Member resource names in IR order
    pub resources: Vec<String>,
}

impl SubsystemGroup {
    /// Identifier usable as a file stem (`net/ipv4` becomes `net_ipv4`)
    pub fn sanitized_name(&self) -> String {
        self.name.replace('/', "_")
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Classifies resources by origin path prefix
#[derive(Debug, Clone)]
pub struct SubsystemGrouper {
    prefixes: Vec<String>,
    default_group: String,
}

impl SubsystemGrouper {
    pub fn new(prefixes: Vec<String>, default_group: impl Into<String>) -> Self {
        Self {
            prefixes,
            default_group: default_group.into(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.subsystem_prefixes.clone(), config.default_group.clone())
    }

    /// Group name for an origin file
    pub fn classify<'s>(&'s self, origin_file: &str) -> &'s str {
        self.prefixes
            .iter()
            .find(|prefix| origin_file.starts_with(prefix.as_str()))
            .map(String::as_str)
            .unwrap_or(&self.default_group)
    }

    /// Partition all resources of the IR
    ///
    /// Groups come back in prefix order with the default group last; groups
    /// without members are omitted.
    pub fn group(&self, ir: &IntermediateRepresentation) -> Vec<SubsystemGroup> {
        self.group_resources(ir.resources())
    }

    pub fn group_resources<'r, I>(&self, resources: I) -> Vec<SubsystemGroup>
    where
        I: IntoIterator<Item = &'r Resource>,
    {
        let mut buckets: Vec<SubsystemGroup> = self
            .prefixes
            .iter()
            .chain(std::iter::once(&self.default_group))
            .map(|name| SubsystemGroup {
                name: name.clone(),
                resources: Vec::new(),
            })
            .collect();
        let default_idx = self.prefixes.len();

        for resource in resources {
            let idx = self
                .prefixes
                .iter()
                .position(|prefix| resource.origin_file().starts_with(prefix.as_str()))
                .unwrap_or(default_idx);
            buckets[idx].resources.push(resource.name().to_string());
        }

        buckets.retain(|g| !g.is_empty());
        buckets
    }
}
