use anyhow::{Context, Result};
use clap::Parser;
use pacaller::cli::{Cli, Command, KconfigFormat};
use pacaller::config::GeneratorConfig;
use pacaller::generate::Generator;
use pacaller::kconfig::{KconfigGraph, KconfigParser, KconfigSolver, SolverResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber
///
/// `RUST_LOG` wins over `default_level`; `--debug` adds a trace directive on top.
fn init_tracing(default_level: &str, debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let filter = if debug {
        filter.add_directive(tracing::Level::TRACE.into())
    } else {
        filter
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// JSON form of a solver run
#[derive(Debug, Serialize)]
struct KconfigReport<'a> {
    targets: &'a [String],
    required: Vec<&'a str>,
    undeclared: Vec<&'a str>,
    iterations: usize,
    complete: bool,
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let config = match path {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };

    if let Err(e) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", e);
    }
    Ok(config)
}

fn run_generate(ir_path: &Path, output_dir: &Path, config: GeneratorConfig) -> Result<()> {
    let report = Generator::new(config)
        .run(ir_path, output_dir)
        .with_context(|| format!("Generation from {} failed", ir_path.display()))?;

    println!("{}", report.summary());
    println!("Output written to {}", output_dir.display());
    Ok(())
}

fn print_kconfig_result(
    targets: &[String],
    graph: &KconfigGraph,
    result: &SolverResult,
    format: KconfigFormat,
) -> Result<()> {
    match format {
        KconfigFormat::Text => {
            for name in &result.required {
                println!("{}", name);
            }
            if !result.complete {
                eprintln!(
                    "warning: iteration budget exhausted after {} iterations, list may be incomplete",
                    result.iterations
                );
            }
        }
        KconfigFormat::Json => {
            let report = KconfigReport {
                targets,
                required: result.required.iter().map(String::as_str).collect(),
                undeclared: result.undeclared(graph),
                iterations: result.iterations,
                complete: result.complete,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        KconfigFormat::Config => {
            print!("{}", result.config_fragment(graph));
        }
    }
    Ok(())
}

fn run_kconfig(
    kernel_dir: PathBuf,
    targets: &[String],
    arch: String,
    max_iterations: usize,
    format: KconfigFormat,
) -> Result<()> {
    if !kernel_dir.is_dir() {
        anyhow::bail!("Kernel directory not found: {}", kernel_dir.display());
    }

    let parser = KconfigParser::new(kernel_dir, arch)?;
    let graph = parser.parse();
    tracing::debug!("Kconfig graph: {} options, {:?}", graph.option_count(), graph.stats);

    let result = KconfigSolver::new(&graph).resolve_dependencies(targets.iter().cloned(), max_iterations);
    tracing::info!(
        "Resolved {} required options in {} iterations",
        result.required.len(),
        result.iterations
    );

    print_kconfig_result(targets, &graph, &result, format)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Command::Generate {
            ir_path,
            output_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            init_tracing(&config.log_level, args.debug);
            run_generate(&ir_path, &output_dir, config)
        }
        Command::Kconfig {
            kernel_dir,
            targets,
            arch,
            max_iterations,
            format,
        } => {
            init_tracing("info", args.debug);
            run_kconfig(kernel_dir, &targets, arch, max_iterations, format)
        }
    }
}
