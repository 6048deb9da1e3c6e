//! Report rendering: terminal table, JSON and Markdown.

use crate::config::{MethodSpec, JSON_REPORT_FILENAME, MARKDOWN_REPORT_FILENAME};
use crate::datasets::DatasetInfo;
use crate::significance::Comparison;
use anyhow::{Context, Result};
use fusebench_core::evaluation::{ComparisonReport, MetricRecord, PrimaryMetric};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything one evaluation run produced.
#[derive(Debug, Serialize)]
pub struct EvalReport {
    /// Dataset summary
    pub dataset: DatasetInfo,
    /// Methods that were run
    pub methods: Vec<MethodSpec>,
    /// Metric used to rank methods
    pub primary_metric: PrimaryMetric,
    /// Cutoff used for ranking, significance tests and ablation
    pub comparison_k: usize,
    /// Fused entries kept per query
    pub top_k: usize,
    /// Candidates read from each source before fusion
    pub depth: usize,
    /// One comparison per cutoff
    pub cutoffs: BTreeMap<usize, ComparisonReport>,
    /// Best method against each other method at the ranking cutoff
    pub comparisons: Vec<Comparison>,
    /// RRF k sweep, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ablation: Option<Vec<RrfKResult>>,
}

/// Metrics of RRF fusion at one smoothing constant.
#[derive(Debug, Clone, Serialize)]
pub struct RrfKResult {
    /// Smoothing constant
    pub rrf_k: u32,
    /// Mean metrics at the ranking cutoff
    pub metrics: MetricRecord,
    /// Queries the means are over
    pub scored_queries: usize,
}

impl EvalReport {
    /// The comparison at the ranking cutoff.
    pub fn primary(&self) -> Option<&ComparisonReport> {
        self.cutoffs.get(&self.comparison_k)
    }
}

/// Column order used by every table.
const COLUMNS: [PrimaryMetric; 6] = PrimaryMetric::ALL;

// =============================================================================
// Terminal
// =============================================================================

pub fn print_report(report: &EvalReport) {
    println!("\n{}", "=".repeat(80));
    println!("RETRIEVAL FUSION EVALUATION");
    println!("{}", "=".repeat(80));
    println!(
        "\nDataset: {} ({} queries, {} qrels, sources: {})",
        report.dataset.name,
        report.dataset.num_queries,
        report.dataset.num_qrels,
        report.dataset.sources.join(", ")
    );
    println!(
        "Fused top-{} from {} candidates per source",
        report.top_k, report.depth
    );

    for (k, comparison) in &report.cutoffs {
        println!("\n{}", "-".repeat(80));
        println!("RESULTS @ k={}", k);
        println!(
            "{:<20} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "Method", "Recall", "Prec", "F1", "MRR", "NDCG", "MAP", "Queries"
        );
        for (_, name, summary) in comparison.ranked() {
            let m = &summary.metrics;
            println!(
                "{:<20} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8}",
                name,
                m.recall_at_k,
                m.precision_at_k,
                m.f1_at_k,
                m.mrr,
                m.ndcg_at_k,
                m.map_at_k,
                summary.scored_queries
            );
        }
    }

    if let Some(primary) = report.primary() {
        println!("\n{}", "-".repeat(80));
        println!(
            "RANKING ({})",
            primary.primary_metric.label(primary.k)
        );
        for (position, name, summary) in primary.ranked() {
            let marker = if position == 1 { " *" } else { "" };
            println!(
                "{:>3}. {:<20} {:.4}{}",
                position,
                name,
                primary.primary_metric.value(&summary.metrics),
                marker
            );
        }

        if !primary.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &primary.warnings {
                println!("  - {}", warning);
            }
        }
    }

    if !report.comparisons.is_empty() {
        println!("\n{}", "-".repeat(80));
        println!("STATISTICAL COMPARISONS (* = significant)");
        for c in &report.comparisons {
            let sig = if c.significant { "*" } else { "" };
            println!(
                "{} vs {} ({}, n={}): p={:.4}{} effect={:.3}",
                c.system_a, c.system_b, c.metric, c.num_pairs, c.p_value, sig, c.effect_size
            );
        }
    }

    if let Some(ablation) = &report.ablation {
        println!("\n{}", "-".repeat(80));
        println!(
            "RRF ABLATION ({})",
            report.primary_metric.label(report.comparison_k)
        );
        for r in ablation {
            println!(
                "  k={:<4} {:.4}",
                r.rrf_k,
                report.primary_metric.value(&r.metrics)
            );
        }
    }

    println!("{}\n", "=".repeat(80));
}

// =============================================================================
// Markdown
// =============================================================================

fn metric_header(k: usize) -> String {
    let labels: Vec<String> = COLUMNS.iter().map(|m| m.label(k)).collect();
    format!("| Method | {} | Queries |", labels.join(" | "))
}

fn metric_row(name: &str, metrics: &MetricRecord, queries: usize) -> String {
    let values: Vec<String> = COLUMNS
        .iter()
        .map(|m| format!("{:.4}", m.value(metrics)))
        .collect();
    format!("| {} | {} | {} |", name, values.join(" | "), queries)
}

/// Renders the report as Markdown.
pub fn render_markdown(report: &EvalReport) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "# Retrieval Fusion Evaluation Report\n");
    let _ = writeln!(
        out,
        "Dataset **{}**: {} queries, {} relevance judgments, sources: {}.\n",
        report.dataset.name,
        report.dataset.num_queries,
        report.dataset.num_qrels,
        report.dataset.sources.join(", ")
    );

    let _ = writeln!(out, "## Methods\n");
    for method in &report.methods {
        match &method.fusion {
            Some(config) => {
                let _ = writeln!(
                    out,
                    "- `{}`: {} over {}",
                    method.name,
                    config,
                    method.sources.join(", ")
                );
            }
            None => {
                let _ = writeln!(out, "- `{}`: {} alone", method.name, method.sources.join(", "));
            }
        }
    }

    for (k, comparison) in &report.cutoffs {
        let _ = writeln!(out, "\n## Results @ k={}\n", k);
        let _ = writeln!(out, "{}", metric_header(*k));
        let _ = writeln!(out, "|{}", "---|".repeat(COLUMNS.len() + 2));
        for (_, name, summary) in comparison.ranked() {
            let _ = writeln!(
                out,
                "{}",
                metric_row(name, &summary.metrics, summary.scored_queries)
            );
        }
    }

    if let Some(primary) = report.primary() {
        let _ = writeln!(out, "\n## Conclusion\n");
        let _ = writeln!(
            out,
            "Methods ranked by {}:\n",
            primary.primary_metric.label(primary.k)
        );
        for (position, name, summary) in primary.ranked() {
            let _ = writeln!(
                out,
                "{}. `{}` ({:.4})",
                position,
                name,
                primary.primary_metric.value(&summary.metrics)
            );
        }

        let _ = writeln!(out, "\n### Best Method per Metric\n");
        for metric in COLUMNS {
            let best = primary.methods.iter().max_by(|a, b| {
                metric
                    .value(&a.1.metrics)
                    .total_cmp(&metric.value(&b.1.metrics))
                    .then_with(|| b.0.cmp(a.0))
            });
            if let Some((name, summary)) = best {
                let _ = writeln!(
                    out,
                    "- **{}**: `{}` ({:.4})",
                    metric.label(primary.k),
                    name,
                    metric.value(&summary.metrics)
                );
            }
        }

        if !primary.warnings.is_empty() {
            let _ = writeln!(out, "\n### Warnings\n");
            for warning in &primary.warnings {
                let _ = writeln!(out, "- {}", warning);
            }
        }

        if let Some((best, summary)) = primary.best() {
            let label = primary.primary_metric.label(primary.k);
            let _ = writeln!(out, "\n### Per-Query Results (`{}`)\n", best);
            let _ = writeln!(out, "| Query | Text | {} |", label);
            let _ = writeln!(out, "|---|---|---|");
            for (query_id, record) in &summary.per_query {
                let text = report.dataset.queries.get(query_id).map_or("", String::as_str);
                let _ = writeln!(
                    out,
                    "| {} | {} | {:.4} |",
                    query_id,
                    text,
                    primary.primary_metric.value(record)
                );
            }
        }
    }

    if !report.comparisons.is_empty() {
        let _ = writeln!(out, "\n## Significance (paired t-test)\n");
        let _ = writeln!(
            out,
            "| Comparison | Metric | Pairs | p-value | Effect size | Significant |"
        );
        let _ = writeln!(out, "|---|---|---|---|---|---|");
        for c in &report.comparisons {
            let _ = writeln!(
                out,
                "| {} vs {} | {} | {} | {:.4} | {:.3} | {} |",
                c.system_a,
                c.system_b,
                c.metric,
                c.num_pairs,
                c.p_value,
                c.effect_size,
                if c.significant { "yes" } else { "no" }
            );
        }
    }

    if let Some(ablation) = &report.ablation {
        let _ = writeln!(out, "\n## RRF k Ablation\n");
        let header = metric_header(report.comparison_k).replacen("Method", "rrf_k", 1);
        let _ = writeln!(out, "{}", header);
        let _ = writeln!(out, "|{}", "---|".repeat(COLUMNS.len() + 2));
        for r in ablation {
            let _ = writeln!(
                out,
                "{}",
                metric_row(&r.rrf_k.to_string(), &r.metrics, r.scored_queries)
            );
        }
    }

    out
}

// =============================================================================
// Files
// =============================================================================

/// Writes `comparison_results.json` and `evaluation_report.md` into `dir`.
pub fn write_outputs(dir: &Path, report: &EvalReport) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir: {}", dir.display()))?;

    let json_path = dir.join(JSON_REPORT_FILENAME);
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!("Saved comparison results: {}", json_path.display());

    let markdown_path = dir.join(MARKDOWN_REPORT_FILENAME);
    std::fs::write(&markdown_path, render_markdown(report))
        .with_context(|| format!("Failed to write {}", markdown_path.display()))?;
    info!("Saved Markdown report: {}", markdown_path.display());

    Ok((json_path, markdown_path))
}
