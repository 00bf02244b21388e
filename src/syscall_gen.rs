//! Syzlang specification generation
//!
//! One [`SpecificationUnit`] is produced per subsystem group that contains
//! at least one struct:
//!
//! 1. split the group into structs and other resources
//! 2. order the structs with [`DependencyResolver`]
//! 3. render each struct, fields in declaration order, types mapped through
//!    [`TypeMapper`]
//! 4. append the example syscalls whose trigger matches the group
//!
//! Blocks are joined with a blank line.

use crate::config::GeneratorConfig;
use crate::dependency_resolver::{CyclicEdge, DependencyResolver};
use crate::grouping::{SubsystemGroup, SubsystemGrouper};
use crate::ir::{IntermediateRepresentation, Struct};
use crate::templates;
use crate::type_mapper::TypeMapper;

/// A hand-picked syscall description attached to matching groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleSyscall {
    /// Substring of the group name that enables this example
    pub group_contains: &'static str,
    /// Struct that must be present in the IR
    pub required_struct: &'static str,
    pub syscall_name: &'static str,
    pub args: &'static str,
}

/// The fixed table of example syscalls
///
/// Not meant to generalise: each entry covers one well-known socket option
/// whose argument struct is commonly extracted.
pub const EXAMPLE_SYSCALLS: &[ExampleSyscall] = &[
    ExampleSyscall {
        group_contains: "sctp",
        required_struct: "sctp_sndrcvinfo",
        syscall_name: "setsockopt$sctp_info",
        args: "fd sock, level const[IPPROTO_SCTP], optname const[SCTP_SNDRCV], optval ptr[in, sctp_sndrcvinfo], optlen len[optval]",
    },
    ExampleSyscall {
        group_contains: "ipv4",
        required_struct: "ip_mreqn",
        syscall_name: "setsockopt$inet_mreqn",
        args: "fd sock, level const[IPPROTO_IP], optname const[IP_ADD_MEMBERSHIP], optval ptr[in, ip_mreqn], optlen len[optval]",
    },
    ExampleSyscall {
        group_contains: "ipv6",
        required_struct: "ipv6_mreq",
        syscall_name: "setsockopt$inet6_mreq",
        args: "fd sock, level const[IPPROTO_IPV6], optname const[IPV6_ADD_MEMBERSHIP], optval ptr[in, ipv6_mreq], optlen len[optval]",
    },
];

/// Generated specification text for one subsystem group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificationUnit {
    pub group: String,
    /// Destination file name (sanitized group name plus extension)
    pub file_name: String,
    /// Preamble, struct blocks, then example syscalls
    pub blocks: Vec<String>,
    /// Struct names in the order they were emitted
    pub struct_order: Vec<String>,
    /// Back-edges dropped while ordering the structs
    pub cycles: Vec<CyclicEdge>,
}

impl SpecificationUnit {
    /// Full text of the unit
    pub fn text(&self) -> String {
        self.blocks.join("\n\n")
    }
}

/// Renders specification units from the IR
#[derive(Debug, Clone)]
pub struct SpecificationEmitter {
    config: GeneratorConfig,
    grouper: SubsystemGrouper,
    type_mapper: TypeMapper,
}

impl SpecificationEmitter {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            config: config.clone(),
            grouper: SubsystemGrouper::from_config(config),
            type_mapper: TypeMapper::new(),
        }
    }

    /// Subsystem groups of the IR, as configured for this emitter
    pub fn groups(&self, ir: &IntermediateRepresentation) -> Vec<SubsystemGroup> {
        self.grouper.group(ir)
    }

    /// Emit one unit per group that has structs
    pub fn emit_all(&self, ir: &IntermediateRepresentation) -> Vec<SpecificationUnit> {
        self.groups(ir)
            .iter()
            .filter_map(|group| self.emit_group(ir, group))
            .collect()
    }

    /// Emit the unit for a single group, or `None` when it holds no struct
    pub fn emit_group(
        &self,
        ir: &IntermediateRepresentation,
        group: &SubsystemGroup,
    ) -> Option<SpecificationUnit> {
        tracing::info!("Processing subsystem: {}", group.name);

        let mut structs = Vec::new();
        let mut others = Vec::new();
        for name in &group.resources {
            match ir.get_struct(name) {
                Some(s) => structs.push(s),
                None if ir.get_resource(name).is_some() => others.push(name.as_str()),
                None => {}
            }
        }

        if structs.is_empty() {
            tracing::debug!("No structs to process for group {}. Skipping.", group.name);
            return None;
        }

        let resolution = DependencyResolver::new(structs, others).resolve();

        let mut blocks = vec![templates::SYZ_PREAMBLE.to_string()];
        let mut struct_order = Vec::with_capacity(resolution.order.len());
        for name in &resolution.order {
            if let Some(struct_def) = ir.get_struct(name) {
                blocks.push(self.render_struct(struct_def));
                struct_order.push(name.clone());
            }
        }

        for example in self.examples_for(ir, &group.name) {
            blocks.push(templates::syscall_line(example.syscall_name, example.args));
        }

        Some(SpecificationUnit {
            group: group.name.clone(),
            file_name: format!("{}{}", group.sanitized_name(), self.config.spec_extension),
            blocks,
            struct_order,
            cycles: resolution.cycles,
        })
    }

    /// Render a struct definition block, fields in declaration order
    pub fn render_struct(&self, struct_def: &Struct) -> String {
        let fields: Vec<String> = struct_def
            .fields
            .iter()
            .map(|f| templates::field_line(&f.name, &self.type_mapper.to_syz_type(&f.type_name)))
            .collect();

        templates::struct_block(&struct_def.name, &fields)
    }

    /// Example syscalls applicable to a group
    pub fn examples_for<'e>(
        &'e self,
        ir: &'e IntermediateRepresentation,
        group_name: &'e str,
    ) -> impl Iterator<Item = &'static ExampleSyscall> + 'e {
        EXAMPLE_SYSCALLS.iter().filter(move |example| {
            group_name.contains(example.group_contains)
                && ir.get_struct(example.required_struct).is_some()
                && self.config.is_target_syscall(example.syscall_name)
        })
    }
}
