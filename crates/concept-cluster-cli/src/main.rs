//! Concept Cluster CLI
//!
//! Command-line front-end for the leaders clustering pipeline: partitions
//! word-occurrence vectors into cliques under a distance threshold, merges
//! clique centroids into K final clusters, and writes `word|||cluster_id`
//! records.
//!
//! The core receives an explicit configuration value; all flag handling and
//! logging setup lives here.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use concept_cluster_core::config::DEFAULT_SAMPLE_SIZE;
use concept_cluster_core::{run, LeadersConfig, RunPaths, SearchMode};

/// Leaders clustering of word-occurrence vectors.
#[derive(Parser)]
#[command(name = "concept-cluster")]
#[command(version)]
#[command(about = "Cluster word-occurrence vectors into semantic concept groups")]
struct Cli {
    /// Point file: bincode-encoded (dim, row-major floats) from the
    /// representation-extraction pipeline
    #[arg(short = 'p', long)]
    point_file: PathBuf,

    /// Vocabulary file: one token per line, parallel to the point rows
    #[arg(short = 'v', long)]
    vocab_file: PathBuf,

    /// Target number of final clusters (K)
    #[arg(short = 'k', long)]
    clusters: usize,

    /// Output directory for cluster records and artifacts
    #[arg(short = 'o', long)]
    output_path: PathBuf,

    /// Distance threshold tau; estimated from a sample when omitted
    #[arg(short = 't', long)]
    tau: Option<f32>,

    /// Prefix fraction of the input to process, in (0, 1]
    #[arg(short = 'c', long)]
    count: Option<f32>,

    /// Use approximate nearest-neighbor search (leader-window mode)
    /// instead of the exact first-fit scan
    #[arg(long)]
    fast: bool,

    /// Reuse a previously persisted index artifact instead of rebuilding
    /// (approximate mode; no staleness check is performed)
    #[arg(short = 'a', long)]
    ann: Option<PathBuf>,

    /// Serialize the merge-phase model next to the cluster records
    #[arg(long)]
    save_model: bool,

    /// Sample size for threshold estimation
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// Seed for the threshold-estimation sample
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Verbosity (repeat for more: info, debug, trace)
    #[arg(long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("clustering run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let mut config = LeadersConfig::new(cli.clusters)
        .with_sample_size(cli.sample_size)
        .with_seed(cli.seed);
    if let Some(tau) = cli.tau {
        config = config.with_tau(tau);
    }
    if let Some(ratio) = cli.count {
        config = config.with_subsample(ratio);
    }
    if cli.fast {
        config = config.with_mode(SearchMode::Approximate);
    }

    std::fs::create_dir_all(&cli.output_path)
        .with_context(|| format!("creating output directory {:?}", cli.output_path))?;

    let paths = RunPaths {
        point_file: cli.point_file.clone(),
        vocab_file: cli.vocab_file.clone(),
        output_dir: cli.output_path.clone(),
        index_artifact: cli.ann.clone(),
        save_model: cli.save_model,
    };

    let summary = run(&config, &paths)?;
    println!(
        "{} records across {} clusters ({} cliques, tau {:.6}) in {:.2?} -> {}",
        summary.records,
        summary.clusters,
        summary.cliques,
        summary.tau,
        summary.elapsed,
        summary.output_file.display()
    );
    if let Some(index_file) = &summary.index_file {
        println!("index artifact: {}", index_file.display());
    }
    if let Some(model_file) = &summary.model_file {
        println!("merge model: {}", model_file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_original_flag_set() {
        let cli = Cli::parse_from([
            "concept-cluster",
            "-p",
            "points.bin",
            "-v",
            "vocab.txt",
            "-k",
            "600",
            "-o",
            "out",
            "-t",
            "1.5",
            "--fast",
        ]);
        assert_eq!(cli.clusters, 600);
        assert_eq!(cli.tau, Some(1.5));
        assert!(cli.fast);
        assert!(cli.ann.is_none());
        assert_eq!(cli.sample_size, DEFAULT_SAMPLE_SIZE);
    }
}
