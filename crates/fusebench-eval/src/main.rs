//! Fusebench Evaluation Tool
//!
//! Compares retrieval methods (single retrievers and fusions of them) on
//! precomputed retriever runs against relevance judgments.
//!
//! # Data
//!
//! A data directory holds `queries.json` (judgments) and `runs.json`
//! (retriever output per source and query). An optional `methods.json`
//! lists the methods to compare; without it every source is evaluated alone
//! plus RRF and equal-weight fusion over all sources.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate the bundled sample data
//! cargo run -p fusebench-eval --release
//!
//! # Evaluate another dataset, ranking methods by MAP
//! cargo run -p fusebench-eval --release -- --data-dir path/to/data --primary-metric map
//!
//! # Output JSON for analysis
//! cargo run -p fusebench-eval --release -- --json
//!
//! # Write comparison_results.json and evaluation_report.md
//! cargo run -p fusebench-eval --release -- --output target/eval-report
//!
//! # Run RRF k ablation study
//! cargo run -p fusebench-eval --release -- --ablation --rrf-k-values 10,60,200
//! ```

mod config;
mod datasets;
mod report;
mod significance;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use config::{
    default_methods, load_methods, resolve_data_dir, rrf_sweep, validate_methods, MethodSpec,
    METHODS_FILENAME,
};
use datasets::{EvalDataset, SourceRuns};
use fusebench_core::config::{
    CANDIDATE_DEPTH_FACTOR, DEFAULT_COMPARISON_K, DEFAULT_K_VALUES, DEFAULT_RRF_K,
    DEFAULT_RRF_K_SWEEP,
};
use fusebench_core::evaluation::{compare, compare_cutoffs, PrimaryMetric};
use fusebench_core::search::{fuse_queries, FusedEntry, RankedList};
use indicatif::{ProgressBar, ProgressStyle};
use report::{print_report, write_outputs, EvalReport, RrfKResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Method name → query id → fused ranking
type MethodResults = BTreeMap<String, BTreeMap<String, Vec<FusedEntry>>>;

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "fusebench-eval", version)]
#[command(about = "Compare retrieval fusion methods on precomputed runs")]
struct Args {
    /// Directory containing queries.json and runs.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Method configuration file (default: <data-dir>/methods.json if present)
    #[arg(long)]
    methods: Option<PathBuf>,

    /// Metric cutoffs (comma-separated)
    #[arg(long, value_delimiter = ',')]
    k_values: Option<Vec<usize>>,

    /// Cutoff used for ranking, significance tests and ablation
    #[arg(short, long, default_value_t = DEFAULT_COMPARISON_K)]
    k: usize,

    /// Metric used to rank methods (recall, precision, f1, mrr, ndcg, map)
    #[arg(long, default_value = "ndcg")]
    primary_metric: PrimaryMetric,

    /// Candidates read from each source before fusion (default: 2 x largest cutoff)
    #[arg(long)]
    depth: Option<usize>,

    /// RRF k of the default hybrid method
    #[arg(long, default_value_t = DEFAULT_RRF_K)]
    rrf_k: u32,

    /// Run RRF k ablation study over all sources
    #[arg(long)]
    ablation: bool,

    /// RRF k values for ablation (comma-separated)
    #[arg(long, value_delimiter = ',')]
    rrf_k_values: Option<Vec<u32>>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Directory for comparison_results.json and evaluation_report.md
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

// =============================================================================
// Method Execution
// =============================================================================

/// Runs one method over every query any source covers.
///
/// Each source list is cut to `depth` candidates first. A source without a
/// list for a query counts as having retrieved nothing, so every method is
/// scored on the same queries. Single-source methods keep the source's own
/// ranking; fused methods go through the fusion engine.
fn run_method(
    spec: &MethodSpec,
    runs: &SourceRuns,
    top_k: usize,
    depth: usize,
) -> Result<BTreeMap<String, Vec<FusedEntry>>> {
    let query_ids: BTreeSet<&String> = runs.values().flat_map(|q| q.keys()).collect();

    let selected: SourceRuns = spec
        .sources
        .iter()
        .filter_map(|source| {
            runs.get(source).map(|queries| {
                let truncated = query_ids
                    .iter()
                    .map(|&query_id| {
                        let list = queries
                            .get(query_id)
                            .map(|list| list.head(depth))
                            .unwrap_or_else(RankedList::empty);
                        (query_id.clone(), list)
                    })
                    .collect();
                (source.clone(), truncated)
            })
        })
        .collect();

    match &spec.fusion {
        Some(fusion) => Ok(fuse_queries(&selected, fusion, top_k)?),
        None => {
            let (source, queries) = selected
                .iter()
                .next()
                .ok_or_else(|| anyhow!("Method '{}' has no source data", spec.name))?;
            queries
                .iter()
                .map(|(query_id, list)| -> Result<(String, Vec<FusedEntry>)> {
                    Ok((query_id.clone(), list.to_fused(source, top_k)?))
                })
                .collect()
        }
    }
}

fn run_methods(
    methods: &[MethodSpec],
    runs: &SourceRuns,
    top_k: usize,
    depth: usize,
    show_progress: bool,
) -> Result<MethodResults> {
    let pb = if show_progress {
        ProgressBar::new(methods.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}")?);

    let mut results = MethodResults::new();
    for spec in methods {
        pb.set_message(spec.name.clone());
        let fused = run_method(spec, runs, top_k, depth)?;
        info!("Ran method '{}' over {} queries", spec.name, fused.len());
        results.insert(spec.name.clone(), fused);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(results)
}

fn run_ablation(
    dataset: &EvalDataset,
    rrf_ks: &[u32],
    top_k: usize,
    depth: usize,
    k: usize,
    primary_metric: PrimaryMetric,
) -> Result<Vec<RrfKResult>> {
    let sweep = rrf_sweep(&dataset.sources(), rrf_ks);
    let specs: Vec<MethodSpec> = sweep.values().cloned().collect();
    let results = run_methods(&specs, &dataset.runs, top_k, depth, false)?;
    let comparison = compare(&results, &dataset.judgments, k, primary_metric)?;

    Ok(sweep
        .iter()
        .filter_map(|(&rrf_k, spec)| {
            comparison.methods.get(&spec.name).map(|summary| RrfKResult {
                rrf_k,
                metrics: summary.metrics,
                scored_queries: summary.scored_queries,
            })
        })
        .collect())
}

// =============================================================================
// Main
// =============================================================================

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let data_dir = resolve_data_dir(args.data_dir.clone())?;
    info!("Using data directory: {}", data_dir.display());
    let dataset = EvalDataset::load(&data_dir)?;

    let sources = dataset.sources();
    if sources.is_empty() {
        bail!("No retriever runs found in {}", data_dir.display());
    }

    let methods = match &args.methods {
        Some(path) => load_methods(path)?,
        None if data_dir.join(METHODS_FILENAME).is_file() => {
            load_methods(&data_dir.join(METHODS_FILENAME))?
        }
        None => default_methods(&sources, args.rrf_k),
    };
    validate_methods(&methods, &sources.iter().cloned().collect())?;

    let unretrieved = dataset.unretrieved_queries();
    if !unretrieved.is_empty() {
        warn!(
            "{} judged queries have no results in any source and are not scored",
            unretrieved.len()
        );
    }

    let cutoffs: BTreeSet<usize> = args
        .k_values
        .clone()
        .unwrap_or_else(|| DEFAULT_K_VALUES.to_vec())
        .into_iter()
        .chain(std::iter::once(args.k))
        .collect();
    let top_k = cutoffs.iter().copied().max().unwrap_or(args.k);
    let depth = args.depth.unwrap_or(top_k * CANDIDATE_DEPTH_FACTOR);
    if depth == 0 {
        bail!("Candidate depth must be at least 1");
    }

    let results = run_methods(&methods, &dataset.runs, top_k, depth, !args.json)?;

    let cutoffs: Vec<usize> = cutoffs.into_iter().collect();
    let reports = compare_cutoffs(&results, &dataset.judgments, &cutoffs, args.primary_metric)?;

    let comparisons = reports
        .get(&args.k)
        .map(significance::best_vs_rest)
        .unwrap_or_default();

    let ablation = if args.ablation {
        if sources.len() < 2 {
            warn!("RRF ablation needs at least two sources, skipping");
            None
        } else {
            info!("Running RRF ablation");
            let rrf_ks = args
                .rrf_k_values
                .clone()
                .unwrap_or_else(|| DEFAULT_RRF_K_SWEEP.to_vec());
            Some(run_ablation(
                &dataset,
                &rrf_ks,
                top_k,
                depth,
                args.k,
                args.primary_metric,
            )?)
        }
    } else {
        None
    };

    let report = EvalReport {
        dataset: dataset.info(),
        methods,
        primary_metric: args.primary_metric,
        comparison_k: args.k,
        top_k,
        depth,
        cutoffs: reports,
        comparisons,
        ablation,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(dir) = &args.output {
        let (json_path, markdown_path) = write_outputs(dir, &report)?;
        if !args.json {
            println!(
                "Reports written to {} and {}",
                json_path.display(),
                markdown_path.display()
            );
        }
    }

    Ok(())
}
