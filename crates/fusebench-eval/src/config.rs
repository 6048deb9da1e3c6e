//! Path resolution and method configuration for the evaluation binary.
//!
//! Finds the data directory across environments:
//! - Custom: `--data-dir` flag or `$FUSEBENCH_DATA_DIR`
//! - Development: the crate's bundled `data/` directory

use anyhow::{anyhow, bail, Context, Result};
use fusebench_core::search::FusionConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Judgment file name inside the data directory
pub const QUERIES_FILENAME: &str = "queries.json";

/// Retriever runs file name inside the data directory
pub const RUNS_FILENAME: &str = "runs.json";

/// Optional method configuration file name inside the data directory
pub const METHODS_FILENAME: &str = "methods.json";

/// Environment variable for a custom data directory
pub const DATA_DIR_ENV: &str = "FUSEBENCH_DATA_DIR";

/// Report file names written by `--output`
pub const JSON_REPORT_FILENAME: &str = "comparison_results.json";
pub const MARKDOWN_REPORT_FILENAME: &str = "evaluation_report.md";

/// Finds the directory holding `queries.json` and `runs.json`.
///
/// Search order:
/// 1. `--data-dir` flag (must exist)
/// 2. `$FUSEBENCH_DATA_DIR` environment variable
/// 3. `data/` next to this crate's manifest (development)
pub fn resolve_data_dir(cli_dir: Option<PathBuf>) -> Result<PathBuf> {
    // 1. Explicit flag
    if let Some(dir) = cli_dir {
        if !dir.is_dir() {
            bail!("Data directory not found: {}", dir.display());
        }
        return Ok(dir);
    }

    // 2. Environment variable
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Ok(path);
        }
        tracing::warn!(
            "${} points to a missing directory: {}",
            DATA_DIR_ENV,
            path.display()
        );
    }

    // 3. Bundled sample data (development)
    let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
    if bundled.is_dir() {
        return Ok(bundled);
    }

    Err(anyhow!(
        "No data directory found.\n\
         Searched locations:\n\
         - --data-dir flag\n\
         - ${} environment variable\n\
         - {}",
        DATA_DIR_ENV,
        bundled.display()
    ))
}

/// One method to evaluate: a source on its own, or a fusion of sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSpec {
    /// Name shown in reports
    pub name: String,
    /// Sources (run names) the method reads
    pub sources: Vec<String>,
    /// Fusion strategy; `None` evaluates a single source as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion: Option<FusionConfig>,
}

impl MethodSpec {
    /// A single source evaluated on its own, named after the source.
    pub fn single(source: &str) -> Self {
        Self {
            name: source.to_string(),
            sources: vec![source.to_string()],
            fusion: None,
        }
    }

    /// A fusion of `sources` under `config`.
    pub fn fused(name: impl Into<String>, sources: &[String], config: FusionConfig) -> Self {
        Self {
            name: name.into(),
            sources: sources.to_vec(),
            fusion: Some(config),
        }
    }
}

/// Default methods: every source alone, plus RRF and equal-weight fusion over
/// all sources when there is more than one.
pub fn default_methods(sources: &[String], rrf_k: u32) -> Vec<MethodSpec> {
    let mut methods: Vec<MethodSpec> = sources.iter().map(|s| MethodSpec::single(s)).collect();

    if sources.len() > 1 {
        let weight = 1.0 / sources.len() as f64;
        methods.push(MethodSpec::fused(
            "hybrid_rrf",
            sources,
            FusionConfig::reciprocal_rank(rrf_k),
        ));
        methods.push(MethodSpec::fused(
            "hybrid_weighted",
            sources,
            FusionConfig::weighted(sources.iter().map(|s| (s.as_str(), weight))),
        ));
    }

    methods
}

/// Reads a method configuration file (JSON array of [`MethodSpec`]).
pub fn load_methods(path: &Path) -> Result<Vec<MethodSpec>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read method config: {}", path.display()))?;
    parse_methods(&text).with_context(|| format!("Invalid method config: {}", path.display()))
}

fn parse_methods(text: &str) -> Result<Vec<MethodSpec>> {
    Ok(serde_json::from_str(text)?)
}

/// Checks method names are unique, every method reads known sources, and
/// fusion configs are valid.
pub fn validate_methods(methods: &[MethodSpec], available: &BTreeSet<String>) -> Result<()> {
    if methods.is_empty() {
        bail!("No methods to evaluate");
    }

    let mut names = BTreeSet::new();
    for method in methods {
        if !names.insert(method.name.as_str()) {
            bail!("Duplicate method name: {}", method.name);
        }
        if method.sources.is_empty() {
            bail!("Method '{}' has no sources", method.name);
        }
        if let Some(missing) = method.sources.iter().find(|s| !available.contains(*s)) {
            bail!(
                "Method '{}' reads unknown source '{}' (available: {})",
                method.name,
                missing,
                available.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        match &method.fusion {
            None if method.sources.len() != 1 => bail!(
                "Method '{}' lists {} sources but no fusion config",
                method.name,
                method.sources.len()
            ),
            Some(config) => config
                .validate()
                .with_context(|| format!("Method '{}' has an invalid fusion config", method.name))?,
            None => {}
        }
    }

    Ok(())
}

/// RRF variants over the same sources, one per swept `rrf_k`.
pub fn rrf_sweep(sources: &[String], rrf_ks: &[u32]) -> BTreeMap<u32, MethodSpec> {
    rrf_ks
        .iter()
        .map(|&rrf_k| {
            (
                rrf_k,
                MethodSpec::fused(
                    format!("rrf_k{}", rrf_k),
                    sources,
                    FusionConfig::reciprocal_rank(rrf_k),
                ),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusebench_core::search::FusionMethod;

    fn sources(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn available(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_methods() {
        let methods = default_methods(&sources(&["dense", "sparse"]), 60);
        let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["dense", "sparse", "hybrid_rrf", "hybrid_weighted"]);
        assert_eq!(
            methods[3].fusion.as_ref().map(|c| c.method()),
            Some(FusionMethod::WeightedScore)
        );
        assert!(validate_methods(&methods, &available(&["dense", "sparse"])).is_ok());
    }

    #[test]
    fn test_default_methods_single_source_has_no_fusion() {
        let methods = default_methods(&sources(&["dense"]), 60);
        assert_eq!(methods, vec![MethodSpec::single("dense")]);
    }

    #[test]
    fn test_parse_methods() {
        let text = r#"[
            {"name": "dense", "sources": ["dense"]},
            {"name": "rrf", "sources": ["dense", "sparse"], "fusion": {"method": "rrf", "rrf_k": 30}},
            {"name": "w", "sources": ["dense", "sparse"],
             "fusion": {"method": "weighted", "weights": {"dense": 0.7, "sparse": 0.3}}}
        ]"#;
        let methods = parse_methods(text).unwrap();
        assert_eq!(methods.len(), 3);
        assert_eq!(methods[1].fusion, Some(FusionConfig::reciprocal_rank(30)));
        assert!(validate_methods(&methods, &available(&["dense", "sparse"])).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_source() {
        let methods = vec![MethodSpec::single("bm25")];
        let err = validate_methods(&methods, &available(&["dense"])).unwrap_err();
        assert!(err.to_string().contains("unknown source 'bm25'"));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let methods = vec![MethodSpec::single("dense"), MethodSpec::single("dense")];
        assert!(validate_methods(&methods, &available(&["dense"])).is_err());
    }

    #[test]
    fn test_validate_requires_fusion_for_multiple_sources() {
        let methods = vec![MethodSpec {
            name: "both".to_string(),
            sources: sources(&["dense", "sparse"]),
            fusion: None,
        }];
        assert!(validate_methods(&methods, &available(&["dense", "sparse"])).is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_fusion() {
        let methods = vec![MethodSpec::fused(
            "bad",
            &sources(&["dense"]),
            FusionConfig::reciprocal_rank(0),
        )];
        assert!(validate_methods(&methods, &available(&["dense"])).is_err());
    }

    #[test]
    fn test_resolve_explicit_dir() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_data_dir(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(resolved, dir.path());

        let missing = dir.path().join("nope");
        assert!(resolve_data_dir(Some(missing)).is_err());
    }

    #[test]
    fn test_rrf_sweep_names() {
        let sweep = rrf_sweep(&sources(&["a", "b"]), &[10, 60]);
        assert_eq!(sweep[&10].name, "rrf_k10");
        assert_eq!(sweep[&60].fusion, Some(FusionConfig::reciprocal_rank(60)));
    }
}
