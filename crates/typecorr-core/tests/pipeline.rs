//! Pipeline tests: pass state to aggregation to persisted outputs.

use std::fs;

use tempfile::TempDir;

use typecorr_core::aggregate::{Aggregator, RawTypeNormalizer, ReportOptions, TrivialityPredicate};
use typecorr_core::merge::TypeMerger;
use typecorr_core::sections::{DocMap, DocRecord, Section, Sections};
use typecorr_core::state::{ImportMap, PassState};
use typecorr_core::store;
use typecorr_core::types::RuntimeType;

/// Resolves builtin spellings and classes known to the import map.
struct SimpleNormalizer;

impl RawTypeNormalizer for SimpleNormalizer {
    fn normalize(&self, raw: &str, _: &str, imports: &ImportMap, _: bool) -> Option<String> {
        match raw {
            "int" | "bool" | "str" => Some(raw.to_string()),
            "array-like" => Some("ArrayLike".to_string()),
            _ => imports.get(raw).map(|module| format!("{}.{}", module, raw)),
        }
    }
}

struct BuiltinsAreTrivial;

impl TrivialityPredicate for BuiltinsAreTrivial {
    fn is_trivial(&self, raw: &str, _: &str, _: &ImportMap) -> bool {
        matches!(raw, "int" | "bool" | "str")
    }
}

fn record(params: &[(&str, &str)], returns: &[(&str, &str)]) -> DocRecord {
    let map = |entries: &[(&str, &str)]| -> DocMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };
    let mut record = DocRecord::undocumented();
    record.params = Some(map(params));
    if !returns.is_empty() {
        record.returns = Some(map(returns));
    }
    record
}

fn walked_state() -> PassState {
    let mut state = PassState::new();
    state.record_import("Estimator", "pkg.base");

    let fit = record(&[("X", "array-like"), ("y", "Estimator")], &[("self", "Estimator")]);
    state.count_occurrences(&fit);
    state.register_fullmap("pkg", "Estimator.fit", &fit);

    let score = record(&[("X", "array-like"), ("n", "int")], &[("0", "float"), ("1", "int")]);
    state.count_occurrences(&score);
    state.register_fullmap("pkg", "score", &score);

    state.associate_param_trace("array-like", RuntimeType::named("numpy.ndarray"));
    state.associate_param_trace("int", RuntimeType::named("int"));
    state
}

#[test]
fn aggregation_orders_and_classifies_lines() {
    let results = walked_state().freeze();
    let merger = TypeMerger::default();
    let aggregator = Aggregator::new(
        &merger,
        &SimpleNormalizer,
        &BuiltinsAreTrivial,
        ReportOptions::default(),
    );
    let aggregation = aggregator
        .aggregate("pkg", &results, &Sections::default())
        .unwrap();

    let params = &aggregation.reports.params;
    assert_eq!(params.lines[0].raw_type, "array-like");
    assert_eq!(params.lines[0].count, Some(2));
    assert_eq!(
        params.line("Estimator").unwrap().canonical,
        "pkg.base.Estimator"
    );
    assert!(params.line("int").unwrap().trivial);

    // 4 params, 3 returns
    assert_eq!(aggregation.summary.missed, 7);
    assert!(aggregation.trivials.is_empty());
}

#[test]
fn multi_valued_returns_become_tuples_in_fullmap() {
    let results = walked_state().freeze();
    assert_eq!(results.fullmap().returns["pkg.score"], "tuple[float,int]");
    assert_eq!(results.fullmap().returns["pkg.Estimator.fit"], "Estimator");
    assert_eq!(results.fullmap().params["pkg.Estimator.fit.X"], "array-like");
}

#[test]
fn outputs_survive_a_save_load_cycle() {
    let dir = TempDir::new().unwrap();
    let results = walked_state().freeze();
    let merger = TypeMerger::default();
    let options = ReportOptions {
        include_counts: false,
        dump_all: false,
    };
    let aggregation = Aggregator::new(&merger, &SimpleNormalizer, &BuiltinsAreTrivial, options)
        .aggregate("pkg", &results, &Sections::default())
        .unwrap();

    store::save_reports(dir.path(), "pkg", &aggregation.reports).unwrap();
    store::save_fullmap(dir.path(), "pkg", results.fullmap()).unwrap();

    let text = fs::read_to_string(store::report_path(dir.path(), "pkg", Section::Params)).unwrap();
    assert!(text.lines().any(|l| l == "#Estimator#pkg.base.Estimator"));
    assert!(!text.contains("#int#"));
    assert_eq!(aggregation.trivials["int"], "int");

    let loaded = store::load_fullmap(dir.path(), "pkg").unwrap();
    assert_eq!(&loaded, results.fullmap());
}
