//! CLI argument parsing for Pacaller

use crate::kconfig::{DEFAULT_ARCH, DEFAULT_MAX_ITERATIONS};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for the required Kconfig options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KconfigFormat {
    /// One option name per line (default)
    Text,
    /// JSON report for machine parsing
    Json,
    /// `.config` fragment enabling the switch options
    Config,
}

#[derive(Parser, Debug)]
#[command(name = "pacaller")]
#[command(version)]
#[command(about = "Fuzzing input generator for the Linux networking stack", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output (to stderr)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate syscall specifications and packet models from IR files
    Generate {
        /// Directory containing the IR `*.json` files
        #[arg(long = "ir-path", value_name = "DIR")]
        ir_path: PathBuf,

        /// Directory receiving `syscall_specs/` and `packet_models/`
        #[arg(long = "output-dir", value_name = "DIR", default_value = "generated_inputs")]
        output_dir: PathBuf,

        /// Generator configuration file (TOML)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Compute the Kconfig options required by a set of targets
    Kconfig {
        /// Root of the kernel source tree
        #[arg(long = "kernel-dir", value_name = "DIR")]
        kernel_dir: PathBuf,

        /// Option to enable (repeatable, without the `CONFIG_` prefix)
        #[arg(short, long = "target", value_name = "NAME", required = true)]
        targets: Vec<String>,

        /// Architecture whose `arch/<ARCH>/Kconfig` is the entry point
        #[arg(long, default_value_t = DEFAULT_ARCH.to_string())]
        arch: String,

        /// Solver iteration budget
        #[arg(long = "max-iterations", value_name = "N", default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,

        /// Output format
        #[arg(long = "format", value_enum, default_value = "text")]
        format: KconfigFormat,
    },
}
