//! Pacaller - fuzzing input generation for the Linux networking stack
//!
//! This library turns an intermediate representation of kernel types
//! (structs, typedefs and constants extracted from C sources) into
//! syzkaller-style syscall descriptions and JSON packet models, and computes
//! the Kconfig options a set of targets needs enabled.

pub mod cli;
pub mod config;
pub mod dependency_resolver;
pub mod error;
pub mod generate;
pub mod grouping;
pub mod ir;
pub mod kconfig;
pub mod loader;
pub mod mutation_library;
pub mod packet_model;
pub mod syscall_gen;
pub mod templates;
pub mod type_mapper;
