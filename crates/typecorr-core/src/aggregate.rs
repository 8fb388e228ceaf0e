//! Frequency aggregation and classification.
//!
//! After the walk phase, every documented raw type string of the package is
//! visited per section in descending occurrence order and classified:
//!
//! - **mapped**: present in the known-type map; never normalized or merged
//! - **trivial**: judged low-value by a [`TrivialityPredicate`], and, when
//!   traces were recorded, merging them left the normalized phrase unchanged
//! - **missed**: everything else
//!
//! Unmapped strings are normalized through a [`RawTypeNormalizer`] and,
//! when traced runtime types were associated with the same string, merged
//! with them through the [`TypeMerger`]. A merge failure aborts the whole
//! aggregation.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::merge::{MergeError, TypeMerger, TypeSimplifier};
use crate::sections::{Section, Sections};
use crate::state::{ImportMap, PassResults};

/// Known-type map for one section: raw type string to canonical string.
pub type KnownMap = IndexMap<String, String>;

/// Errors raised during aggregation.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// Merging traced types for a raw type failed.
    #[error("merging traced types for {section} type '{raw_type}': {source}")]
    Merge {
        section: Section,
        raw_type: String,
        #[source]
        source: MergeError,
    },
}

impl AggregationError {
    /// The raw type string being aggregated when the failure occurred.
    pub fn raw_type(&self) -> &str {
        match self {
            AggregationError::Merge { raw_type, .. } => raw_type,
        }
    }
}

/// Result type for aggregation.
pub type AggregationResult<T> = Result<T, AggregationError>;

/// Resolves a raw documented phrase to a canonical type string.
pub trait RawTypeNormalizer {
    /// `None` when the phrase cannot be resolved.
    fn normalize(&self, raw: &str, module: &str, imports: &ImportMap, is_param: bool)
        -> Option<String>;
}

/// Decides whether a raw type is too simple to be worth reviewing.
pub trait TrivialityPredicate {
    fn is_trivial(&self, raw: &str, module: &str, imports: &ImportMap) -> bool;
}

/// Report formatting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Emit occurrence counts in report lines.
    pub include_counts: bool,
    /// Emit trivial entries (prefixed `@`) instead of suppressing them.
    pub dump_all: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            include_counts: true,
            dump_all: true,
        }
    }
}

/// One line of a per-section report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub trivial: bool,
    /// `None` when counts are disabled.
    pub count: Option<usize>,
    pub raw_type: String,
    pub canonical: String,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.trivial {
            write!(f, "@")?;
        }
        if let Some(count) = self.count {
            write!(f, "{}", count)?;
        }
        write!(f, "#{}#{}", self.raw_type, self.canonical)
    }
}

/// Report lines of one section, most frequent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// The report as text, one newline-terminated line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line for `raw_type`.
    pub fn line(&self, raw_type: &str) -> Option<&ReportLine> {
        self.lines.iter().find(|l| l.raw_type == raw_type)
    }
}

/// Occurrence totals across all sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub trivial: usize,
    pub mapped: usize,
    pub missed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trivial: {}, Mapped: {}, Missed: {}",
            self.trivial, self.mapped, self.missed
        )
    }
}

/// Output of one aggregation.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub reports: Sections<Report>,
    pub summary: Summary,
    /// Suppressed trivial entries (`raw -> canonical`), compact mode only.
    pub trivials: IndexMap<String, String>,
}

/// Classifies and reports every raw type of a package pass.
pub struct Aggregator<'a, S: TypeSimplifier, N: RawTypeNormalizer, T: TrivialityPredicate> {
    merger: &'a TypeMerger<S>,
    normalizer: &'a N,
    triviality: &'a T,
    options: ReportOptions,
}

impl<'a, S, N, T> Aggregator<'a, S, N, T>
where
    S: TypeSimplifier,
    N: RawTypeNormalizer,
    T: TrivialityPredicate,
{
    pub fn new(
        merger: &'a TypeMerger<S>,
        normalizer: &'a N,
        triviality: &'a T,
        options: ReportOptions,
    ) -> Self {
        Aggregator {
            merger,
            normalizer,
            triviality,
            options,
        }
    }

    /// Aggregate the frozen results of a pass over `package`.
    pub fn aggregate(
        &self,
        package: &str,
        results: &PassResults,
        known: &Sections<KnownMap>,
    ) -> AggregationResult<Aggregation> {
        tracing::info!("Analyzing and normalizing types...");
        let mut out = Aggregation::default();

        for (section, counter) in results.counters().iter() {
            let known = known.get(section);
            let report = out.reports.get_mut(section);

            for (raw, count) in counter.most_common() {
                if known.contains_key(raw) {
                    out.summary.mapped += count;
                    continue;
                }

                let resolved = self.resolve(package, section, raw, results)?;
                let trivial = resolved.traces_agree
                    && self.triviality.is_trivial(raw, package, results.imports());
                let canonical = resolved.canonical;

                if trivial && !self.options.dump_all {
                    out.trivials.insert(raw.to_string(), canonical);
                    out.summary.trivial += count;
                } else {
                    out.summary.missed += count;
                    report.lines.push(ReportLine {
                        trivial,
                        count: self.options.include_counts.then_some(count),
                        raw_type: raw.to_string(),
                        canonical,
                    });
                }
            }
        }

        tracing::info!("{}", out.summary);
        Ok(out)
    }

    /// Normalize `raw` and merge it with any traced types recorded for it.
    fn resolve(
        &self,
        package: &str,
        section: Section,
        raw: &str,
        results: &PassResults,
    ) -> AggregationResult<Resolved> {
        let normalized = self.normalizer.normalize(
            raw,
            package,
            results.imports(),
            section == Section::Params,
        );
        let Some(traced) = results.traced_types(section, raw) else {
            return Ok(Resolved {
                canonical: normalized.unwrap_or_else(|| raw.to_string()),
                traces_agree: true,
            });
        };

        let canonical = self
            .merger
            .combine(traced, normalized.as_deref())
            .map_err(|source| AggregationError::Merge {
                section,
                raw_type: raw.to_string(),
                source,
            })?;
        let traces_agree = normalized.as_deref() == Some(canonical.as_str());
        if !traces_agree {
            tracing::debug!("{} type '{}': traces widen it to '{}'", section, raw, canonical);
        }
        Ok(Resolved {
            canonical,
            traces_agree,
        })
    }
}

/// Canonical string for one raw type.
struct Resolved {
    canonical: String,
    /// False when traced types disagree with the documented phrase.
    traces_agree: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{DocMap, DocRecord};
    use crate::state::PassState;
    use crate::types::RuntimeType;
    use std::cell::RefCell;

    /// Normalizes a fixed table and records every call.
    #[derive(Default)]
    struct TableNormalizer {
        table: IndexMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl TableNormalizer {
        fn with(entries: &[(&str, &str)]) -> Self {
            TableNormalizer {
                table: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl RawTypeNormalizer for TableNormalizer {
        fn normalize(&self, raw: &str, _: &str, _: &ImportMap, _: bool) -> Option<String> {
            self.calls.borrow_mut().push(raw.to_string());
            self.table.get(raw).cloned()
        }
    }

    struct TrivialNames(&'static [&'static str]);

    impl TrivialityPredicate for TrivialNames {
        fn is_trivial(&self, raw: &str, _: &str, _: &ImportMap) -> bool {
            self.0.contains(&raw)
        }
    }

    fn params(entries: &[(&str, &str)]) -> DocRecord {
        let map: DocMap = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut record = DocRecord::undocumented();
        record.params = Some(map);
        record
    }

    fn run(
        state: PassState,
        known: Sections<KnownMap>,
        normalizer: &TableNormalizer,
        trivial: &TrivialNames,
        options: ReportOptions,
    ) -> Aggregation {
        let merger = TypeMerger::default();
        let aggregator = Aggregator::new(&merger, normalizer, trivial, options);
        aggregator
            .aggregate("pkg", &state.freeze(), &known)
            .unwrap()
    }

    #[test]
    fn known_types_short_circuit_normalization() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("a", "array-like"), ("b", "str")]));
        let mut known = Sections::<KnownMap>::default();
        known
            .params
            .insert("array-like".to_string(), "ArrayLike".to_string());
        let normalizer = TableNormalizer::with(&[("str", "str")]);

        let agg = run(state, known, &normalizer, &TrivialNames(&[]), ReportOptions::default());

        assert_eq!(agg.summary.mapped, 1);
        assert_eq!(agg.summary.missed, 1);
        assert_eq!(*normalizer.calls.borrow(), vec!["str".to_string()]);
        assert!(agg.reports.params.line("array-like").is_none());
    }

    #[test]
    fn lines_are_most_common_first() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("a", "str")]));
        state.count_occurrences(&params(&[("a", "int"), ("b", "int")]));
        let normalizer = TableNormalizer::default();

        let agg = run(
            state,
            Sections::default(),
            &normalizer,
            &TrivialNames(&[]),
            ReportOptions::default(),
        );

        assert_eq!(agg.reports.params.render(), "2#int#int\n1#str#str\n");
    }

    #[test]
    fn trivial_suppressed_in_compact_mode() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("a", "bool"), ("b", "array-like")]));
        let normalizer = TableNormalizer::with(&[("bool", "bool"), ("array-like", "ArrayLike")]);
        let options = ReportOptions {
            include_counts: true,
            dump_all: false,
        };

        let agg = run(state, Sections::default(), &normalizer, &TrivialNames(&["bool"]), options);

        assert!(agg.reports.params.line("bool").is_none());
        assert_eq!(agg.trivials.get("bool").map(String::as_str), Some("bool"));
        assert_eq!(agg.summary.trivial, 1);
        assert_eq!(agg.summary.missed, 1);
    }

    #[test]
    fn disagreeing_traces_are_never_trivial() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("flag", "bool")]));
        state.associate_param_trace("bool", RuntimeType::named("int"));
        let normalizer = TableNormalizer::with(&[("bool", "bool")]);
        let options = ReportOptions {
            include_counts: true,
            dump_all: false,
        };

        let agg = run(state, Sections::default(), &normalizer, &TrivialNames(&["bool"]), options);

        assert!(agg.trivials.is_empty());
        assert_eq!(agg.summary.trivial, 0);
        assert_eq!(agg.summary.missed, 1);
        assert_eq!(agg.reports.params.render(), "1#bool#int|bool\n");
    }

    #[test]
    fn agreeing_traces_stay_trivial() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("flag", "bool")]));
        state.associate_param_trace("bool", RuntimeType::named("bool"));
        let normalizer = TableNormalizer::with(&[("bool", "bool")]);
        let options = ReportOptions {
            include_counts: true,
            dump_all: false,
        };

        let agg = run(state, Sections::default(), &normalizer, &TrivialNames(&["bool"]), options);

        assert_eq!(agg.trivials.get("bool").map(String::as_str), Some("bool"));
        assert_eq!(agg.summary.trivial, 1);
        assert!(agg.reports.params.is_empty());
    }

    #[test]
    fn trivial_marked_in_full_dump_mode() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("a", "bool")]));
        let normalizer = TableNormalizer::with(&[("bool", "bool")]);

        let agg = run(
            state,
            Sections::default(),
            &normalizer,
            &TrivialNames(&["bool"]),
            ReportOptions::default(),
        );

        assert_eq!(agg.reports.params.render(), "@1#bool#bool\n");
        assert_eq!(agg.summary.trivial, 0);
        assert_eq!(agg.summary.missed, 1);
        assert!(agg.trivials.is_empty());
    }

    #[test]
    fn counts_can_be_omitted() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("a", "str")]));
        let options = ReportOptions {
            include_counts: false,
            dump_all: true,
        };

        let agg = run(
            state,
            Sections::default(),
            &TableNormalizer::default(),
            &TrivialNames(&["str"]),
            options,
        );

        assert_eq!(agg.reports.params.render(), "@#str#str\n");
    }

    #[test]
    fn traced_types_are_merged_with_normalized_phrase() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("copy", "bool, default=True")]));
        state.associate_param_trace("bool, default=True", RuntimeType::named("bool"));
        let normalizer = TableNormalizer::with(&[("bool, default=True", "bool")]);

        let agg = run(
            state,
            Sections::default(),
            &normalizer,
            &TrivialNames(&[]),
            ReportOptions::default(),
        );

        assert_eq!(
            agg.reports.params.render(),
            "1#bool, default=True#bool\n"
        );
    }

    #[test]
    fn traced_types_synthesize_unresolved_phrase() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("n", "number of things")]));
        state.associate_param_trace("number of things", RuntimeType::named("int"));
        state.associate_param_trace("number of things", RuntimeType::none());

        let agg = run(
            state,
            Sections::default(),
            &TableNormalizer::default(),
            &TrivialNames(&[]),
            ReportOptions::default(),
        );

        assert_eq!(
            agg.reports.params.render(),
            "1#number of things#Int\n"
        );
    }

    #[test]
    fn unresolved_phrase_without_traces_is_kept_raw() {
        let mut state = PassState::new();
        state.count_occurrences(&params(&[("x", "some object")]));

        let agg = run(
            state,
            Sections::default(),
            &TableNormalizer::default(),
            &TrivialNames(&[]),
            ReportOptions::default(),
        );

        assert_eq!(agg.reports.params.render(), "1#some object#some object\n");
    }

    #[test]
    fn summary_display() {
        let summary = Summary {
            trivial: 3,
            mapped: 2,
            missed: 1,
        };
        assert_eq!(summary.to_string(), "Trivial: 3, Mapped: 2, Missed: 1");
    }
}
