//! Package pass controller.
//!
//! [`analyze_package`] runs one complete pass over a package:
//!
//! 1. load the known-type maps
//! 2. load the trace store
//! 3. parse every file's outline (failures recorded per file)
//! 4. build the symbol table
//! 5. walk each file into the pass state (failures recorded per file)
//! 6. freeze the state, ending the walk phase
//! 7. aggregate (an aggregation error aborts the pass)
//! 8. persist reports, correlation map, import map and docstring cache

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use typecorr_core::aggregate::{Aggregator, Report, Summary};
use typecorr_core::config::AnalysisConfig;
use typecorr_core::error::{TypecorrError, TypecorrResult};
use typecorr_core::merge::{DefaultSimplifier, TypeMerger};
use typecorr_core::sections::Sections;
use typecorr_core::state::PassState;
use typecorr_core::store;

use crate::docstring::NumpyDocstringParser;
use crate::files::{discover_package, SourceFile};
use crate::normalize::{DefaultTriviality, DocTypeNormalizer};
use crate::outline::{parse_outline, ModuleOutline};
use crate::symbols::PackageSymbols;
use crate::traces::TraceStore;
use crate::walker::{correlate_module, WalkContext};

/// A file whose parse or walk failed.
#[derive(Debug)]
pub struct FileFailure {
    pub file: String,
    pub error: TypecorrError,
}

/// Result of a completed pass.
#[derive(Debug)]
pub struct PassOutcome {
    pub package: String,
    pub summary: Summary,
    /// Suppressed trivial entries, `raw -> canonical`.
    pub trivials: IndexMap<String, String>,
    pub reports: Sections<Report>,
    pub failures: Vec<FileFailure>,
    /// Number of files walked successfully.
    pub files_analyzed: usize,
}

fn read_outline(file: &SourceFile) -> TypecorrResult<ModuleOutline> {
    let source = fs::read_to_string(&file.path).map_err(|e| TypecorrError::Analysis {
        file: file.rel_path.clone(),
        message: e.to_string(),
    })?;
    parse_outline(&source).map_err(|e| TypecorrError::Parse {
        file: file.rel_path.clone(),
        message: e.to_string(),
    })
}

/// Run one analysis pass over the package rooted at `root`.
pub fn analyze_package(root: &Path, config: &AnalysisConfig) -> TypecorrResult<PassOutcome> {
    let layout = discover_package(root, config.include_submodules)?;
    let package = layout.name.clone();
    tracing::info!("analyzing {} ({} files)", package, layout.files.len());

    let known = store::load_known_maps(&config.map_dir, &package)?;
    let simplifier = DefaultSimplifier::new(config.catalog.clone());
    let traces = TraceStore::load(&config.trace_folder, &package, &simplifier)?;

    let mut failures = Vec::new();
    let mut parsed: Vec<(&SourceFile, ModuleOutline)> = Vec::new();
    for file in &layout.files {
        match read_outline(file) {
            Ok(outline) => parsed.push((file, outline)),
            Err(error) => {
                tracing::error!("{}", error);
                failures.push(FileFailure {
                    file: file.rel_path.clone(),
                    error,
                });
            }
        }
    }

    let mut symbols = PackageSymbols::new(&package);
    for (file, outline) in &parsed {
        symbols.add_module(&file.module, file.is_package, outline);
    }

    let mut state = PassState::new();
    let ctx = WalkContext {
        symbols: &symbols,
        parser: &NumpyDocstringParser,
        traces: &traces,
    };
    let mut files_analyzed = 0;
    for (file, outline) in &parsed {
        tracing::debug!("analyzing {}", file.rel_path);
        match correlate_module(outline, file, &ctx, &mut state) {
            Ok(_) => files_analyzed += 1,
            Err(e) => {
                let error = TypecorrError::Analysis {
                    file: file.rel_path.clone(),
                    message: e.to_string(),
                };
                tracing::error!("{}", error);
                failures.push(FileFailure {
                    file: file.rel_path.clone(),
                    error,
                });
            }
        }
    }

    let results = state.freeze();

    let merger = TypeMerger::with_catalog(config.catalog.clone());
    let aggregator = Aggregator::new(
        &merger,
        &DocTypeNormalizer,
        &DefaultTriviality,
        config.report_options(),
    );
    let aggregation = aggregator.aggregate(&package, &results, &known)?;

    store::save_reports(&config.output_dir, &package, &aggregation.reports)?;
    store::save_fullmap(&config.output_dir, &package, results.fullmap())?;
    store::save_imports(&config.output_dir, &package, results.imports())?;
    store::save_docstrings(&config.output_dir, &package, results.docstrings())?;
    tracing::info!("wrote results to {}", config.output_dir.display());

    Ok(PassOutcome {
        package,
        summary: aggregation.summary,
        trivials: aggregation.trivials,
        reports: aggregation.reports,
        failures,
        files_analyzed,
    })
}
