//! CLI command implementations.
//!
//! `main.rs` parses arguments and installs logging; everything that does
//! work lives here so it can be tested without spawning the binary.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use typecorr_core::catalog::TypeCatalog;
use typecorr_core::config::{AnalysisConfig, CliOverrides, ResolvedConfig};
use typecorr_core::error::{TypecorrError, TypecorrResult};
use typecorr_core::merge::TypeMerger;
use typecorr_core::types::RuntimeType;
use typecorr_python::{analyze_package, PassOutcome};

/// Directory a package's config file and relative paths are resolved from.
fn project_dir(package_dir: &Path) -> PathBuf {
    match package_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn anchor(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

/// Resolve the effective configuration for analyzing `package_dir`.
///
/// Relative directories are taken relative to the package's parent.
pub fn resolve_config(package_dir: &Path, cli: &CliOverrides) -> TypecorrResult<AnalysisConfig> {
    let base = project_dir(package_dir);
    let resolved = ResolvedConfig::resolve(&base, cli)?;
    tracing::debug!(
        "trace folder {} ({:?})",
        resolved.trace_folder.value.display(),
        resolved.trace_folder.source
    );

    let mut config = resolved.into_config();
    config.trace_folder = anchor(&base, config.trace_folder);
    config.output_dir = anchor(&base, config.output_dir);
    config.map_dir = anchor(&base, config.map_dir);
    Ok(config)
}

/// Run one analysis pass over `package_dir`.
pub fn run_analyze(package_dir: &Path, cli: &CliOverrides) -> TypecorrResult<PassOutcome> {
    let config = resolve_config(package_dir, cli)?;
    analyze_package(package_dir, &config)
}

/// Human-readable pass summary: the totals line, suppressed trivial
/// entries, then failed files.
pub fn format_outcome(outcome: &PassOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", outcome.summary);
    for (raw, canonical) in &outcome.trivials {
        let _ = writeln!(out, "{}#{}", raw, canonical);
    }
    if !outcome.failures.is_empty() {
        let _ = writeln!(out, "Failed files ({}):", outcome.failures.len());
        for failure in &outcome.failures {
            let _ = writeln!(out, "  {}", failure.error);
        }
    }
    out
}

/// Render traced type expressions, merged with an optional documented type.
pub fn run_render(
    exprs: &[String],
    doc: Option<&str>,
    catalog: &TypeCatalog,
) -> TypecorrResult<String> {
    let traced = exprs
        .iter()
        .map(|expr| {
            RuntimeType::parse(expr)
                .map_err(|e| TypecorrError::invalid_args(format!("'{}': {}", expr, e)))
        })
        .collect::<TypecorrResult<Vec<_>>>()?;

    TypeMerger::with_catalog(catalog.clone())
        .combine(&traced, doc)
        .map_err(|e| TypecorrError::invalid_args(e.to_string()))
}
