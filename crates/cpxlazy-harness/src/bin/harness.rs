//! CLI entrypoint for cpxlazy discovery diagnostics.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cpxlazy_abi::loader::{Loader, SystemLoader};
use cpxlazy_abi::resolver;
use cpxlazy_core::config::ShimConfig;
use cpxlazy_harness::report::{self, CandidateReport, DiscoveryReport, ProbeReport, VersionReport};

/// Discovery and probe diagnostics for cpxlazy.
#[derive(Debug, Parser)]
#[command(name = "cpxlazy-harness")]
#[command(about = "Inspect how cpxlazy finds and accepts the CPLEX library")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the candidate paths discovery would try, in order.
    Candidates {
        /// Override path (default: CPXLAZY_LIBRARY from the environment).
        #[arg(long)]
        library: Option<String>,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the version handshake against one library path.
    Probe {
        /// Library path or soname.
        path: String,
        /// Minimum version, dotted (12.6.0.0), encoded (12060000) or `any`.
        #[arg(long, default_value = "any")]
        min_version: String,
    },
    /// Probe the discovery candidates and report every outcome.
    Discover {
        /// Minimum version, dotted (12.6.0.0), encoded (12060000) or `any`.
        #[arg(long, default_value = "any")]
        min_version: String,
        /// Override path (default: CPXLAZY_LIBRARY from the environment).
        #[arg(long)]
        library: Option<String>,
        /// Keep probing after the first acceptance.
        #[arg(long)]
        all: bool,
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert a version between dotted and encoded forms.
    EncodeVersion {
        /// `12.6.0.0` or `12060000`.
        value: String,
    },
}

fn config_with(library: Option<String>) -> ShimConfig {
    let mut config = ShimConfig::from_env();
    if library.is_some() {
        config.override_path = library.filter(|p| !p.is_empty());
    }
    config
}

fn emit(body: &str, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        eprintln!("Wrote report to {}", path.display());
    } else {
        print!("{body}");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let loader: Arc<dyn Loader> = Arc::new(SystemLoader);

    match cli.command {
        Command::Candidates { library, output } => {
            let config = config_with(library);
            let report = CandidateReport::build(&config, resolver::expand_glob);
            emit(&report::to_json(&report)?, output)?;
        }
        Command::Probe { path, min_version } => {
            let minimum = report::parse_minimum(&min_version)?;
            let report = ProbeReport::run(&loader, &path, minimum);
            emit(&report::to_json(&report)?, None)?;
            if !report.accepted {
                std::process::exit(report.code);
            }
        }
        Command::Discover {
            min_version,
            library,
            all,
            output,
        } => {
            let minimum = report::parse_minimum(&min_version)?;
            let config = config_with(library);
            let candidates = resolver::platform_candidates(&config);
            eprintln!("Probing {} candidate(s)", candidates.len());
            let report = DiscoveryReport::run(&loader, &candidates, minimum, all);
            emit(&report::to_json(&report)?, output)?;
            if report.selected.is_none() {
                std::process::exit(report.code);
            }
        }
        Command::EncodeVersion { value } => {
            let report = VersionReport::from_input(&value)?;
            emit(&report::to_json(&report)?, None)?;
        }
    }

    Ok(())
}
