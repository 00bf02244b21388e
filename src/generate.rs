//! End-to-end fuzzing input generation
//!
//! Loads every IR file of a directory, then writes
//!
//! - `<output>/syscall_specs/<group>.syz`, one per subsystem group with structs
//! - `<output>/packet_models/<struct>.json`, one per header-like struct
//!
//! An empty IR is the only condition that aborts the run; everything else is
//! contained per file, per record or per artifact.

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::ir::IntermediateRepresentation;
use crate::loader;
use crate::packet_model::PacketModelBuilder;
use crate::syscall_gen::SpecificationEmitter;
use std::path::{Path, PathBuf};

pub const SYSCALL_SPEC_DIR: &str = "syscall_specs";
pub const PACKET_MODEL_DIR: &str = "packet_models";

/// What a generation run produced
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Resources in the IR after duplicate resolution
    pub resource_count: usize,
    pub spec_files: Vec<PathBuf>,
    pub model_files: Vec<PathBuf>,
    /// Groups without any struct, for which no specification was written
    pub skipped_groups: Vec<String>,
    /// Dependency back-edges dropped across all groups
    pub cycle_count: usize,
    /// Artifacts that could not be written
    pub failed_writes: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Loaded {} resources\nGenerated {} syscall specification(s) and {} packet model(s)",
            self.resource_count,
            self.spec_files.len(),
            self.model_files.len()
        );
        if !self.skipped_groups.is_empty() {
            out.push_str(&format!(
                "\nSkipped {} group(s) without structs: {}",
                self.skipped_groups.len(),
                self.skipped_groups.join(", ")
            ));
        }
        if self.cycle_count > 0 {
            out.push_str(&format!(
                "\n{} cyclic struct dependencies were broken",
                self.cycle_count
            ));
        }
        if !self.failed_writes.is_empty() {
            out.push_str(&format!("\n{} artifact(s) failed to write", self.failed_writes.len()));
        }
        out
    }
}

/// Drives the specification emitter and the packet model builder
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Load the IR from `ir_dir` and generate all artifacts under `output_dir`
    pub fn run(&self, ir_dir: &Path, output_dir: &Path) -> Result<GenerationReport> {
        tracing::info!("Loading all IR files from: {}", ir_dir.display());
        let records = loader::load_ir_dir(ir_dir)?;
        if records.is_empty() {
            return Err(GenerateError::NoInput(ir_dir.to_path_buf()));
        }

        let ir = IntermediateRepresentation::from_values(records);
        if ir.is_empty() {
            return Err(GenerateError::NoInput(ir_dir.to_path_buf()));
        }
        tracing::info!("Successfully loaded and parsed {} resource definitions.", ir.len());

        self.generate(&ir, output_dir)
    }

    /// Generate all artifacts for an already built IR
    pub fn generate(&self, ir: &IntermediateRepresentation, output_dir: &Path) -> Result<GenerationReport> {
        let spec_dir = output_dir.join(SYSCALL_SPEC_DIR);
        let model_dir = output_dir.join(PACKET_MODEL_DIR);
        loader::ensure_dir(&spec_dir)?;
        loader::ensure_dir(&model_dir)?;

        let mut report = GenerationReport {
            resource_count: ir.len(),
            ..Default::default()
        };

        tracing::info!("Starting Syscall Specification Generation...");
        let emitter = SpecificationEmitter::new(&self.config);
        for group in emitter.groups(ir) {
            let Some(unit) = emitter.emit_group(ir, &group) else {
                report.skipped_groups.push(group.name);
                continue;
            };
            report.cycle_count += unit.cycles.len();
            let path = spec_dir.join(&unit.file_name);
            match loader::write_file(&path, &unit.text()) {
                Ok(()) => {
                    tracing::info!("Generated spec file: {}", path.display());
                    report.spec_files.push(path);
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    report.failed_writes.push(path);
                }
            }
        }

        tracing::info!("Starting Packet Model Generation...");
        let builder = PacketModelBuilder::new(&self.config);
        for (file_name, model) in builder.build_all(ir) {
            let path = model_dir.join(file_name);
            let written = model
                .to_json_pretty()
                .map_err(GenerateError::from)
                .and_then(|json| loader::write_file(&path, &json));
            match written {
                Ok(()) => {
                    tracing::info!("Generated packet model file: {}", path.display());
                    report.model_files.push(path);
                }
                Err(e) => {
                    tracing::error!("Packet model {}: {}", path.display(), e);
                    report.failed_writes.push(path);
                }
            }
        }

        Ok(report)
    }
}
