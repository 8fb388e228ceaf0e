//! Pass-scoped accumulation state.
//!
//! A [`PassState`] is created when a package pass starts and is threaded by
//! `&mut` through the walk of every module. When the walk phase ends it is
//! consumed by [`PassState::freeze`], which yields read-only
//! [`PassResults`] for aggregation and persistence. Aggregation can only
//! start from frozen results, so no trace association can be added after
//! the merge pipeline has begun reading them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::counter::FrequencyCounter;
use crate::sections::{DocMap, DocRecord, Section, Sections};
use crate::types::RuntimeType;

/// Package-wide index from symbol address to documented type, per section.
pub type FullMap = Sections<IndexMap<String, String>>;

/// Class name to defining module name.
pub type ImportMap = IndexMap<String, String>;

/// Documented type string to the set of runtime types traced for it.
pub type TraceMultimap = IndexMap<String, Vec<RuntimeType>>;

/// Raw documentation sections of one module, keyed by symbol address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDocs {
    /// `address.param -> type`
    pub params: IndexMap<String, String>,
    /// `address -> (name|ordinal -> type)`
    pub returns: IndexMap<String, DocMap>,
    /// `Class.attr -> type`
    pub attrs: IndexMap<String, String>,
}

/// Docstring cache for a whole package, keyed by module name.
pub type DocstringCache = IndexMap<String, ModuleDocs>;

/// Mutable state accumulated during the walk phase of one pass.
#[derive(Debug, Default)]
pub struct PassState {
    counters: Sections<FrequencyCounter>,
    fullmap: FullMap,
    imports: ImportMap,
    docstrings: DocstringCache,
    traced_params: TraceMultimap,
    traced_returns: TraceMultimap,
}

impl PassState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every documented type string of `record` once.
    pub fn count_occurrences(&mut self, record: &DocRecord) {
        for (section, docs) in record.iter() {
            if let Some(docs) = docs {
                let counter = self.counters.get_mut(section);
                for raw in docs.values() {
                    counter.increment(raw);
                }
            }
        }
    }

    /// Propagate `record` into the full-map under `<module>.<address>`.
    ///
    /// Params and attrs are keyed per entry name. A single documented return
    /// is stored as-is; several become `tuple[T1,T2,...]`.
    pub fn register_fullmap(&mut self, module: &str, address: &str, record: &DocRecord) {
        let context = format!("{}.{}", module, address);
        for section in [Section::Params, Section::Attrs] {
            if let Some(docs) = record.get(section) {
                let target = self.fullmap.get_mut(section);
                for (name, ty) in docs {
                    target.insert(format!("{}.{}", context, name), ty.clone());
                }
            }
        }
        if let Some(ret) = record.return_type() {
            self.fullmap.returns.insert(context, ret);
        }
    }

    /// Remember which module defines `class`.
    pub fn record_import(&mut self, class: &str, module: &str) {
        self.imports.insert(class.to_string(), module.to_string());
    }

    pub fn imports(&self) -> &ImportMap {
        &self.imports
    }

    /// The docstring cache entry for `module`, created on first use.
    pub fn module_docs_mut(&mut self, module: &str) -> &mut ModuleDocs {
        self.docstrings.entry(module.to_string()).or_default()
    }

    /// Associate a documented parameter type with a traced annotation.
    pub fn associate_param_trace(&mut self, raw: &str, traced: RuntimeType) {
        insert_unique(&mut self.traced_params, raw, traced);
    }

    /// Associate a documented return type with a traced return annotation.
    pub fn associate_return_trace(&mut self, raw: &str, traced: RuntimeType) {
        insert_unique(&mut self.traced_returns, raw, traced);
    }

    pub fn counters(&self) -> &Sections<FrequencyCounter> {
        &self.counters
    }

    pub fn fullmap(&self) -> &FullMap {
        &self.fullmap
    }

    /// End the walk phase.
    pub fn freeze(self) -> PassResults {
        PassResults {
            counters: self.counters,
            fullmap: self.fullmap,
            imports: self.imports,
            docstrings: self.docstrings,
            traced_params: self.traced_params,
            traced_returns: self.traced_returns,
        }
    }
}

fn insert_unique(map: &mut TraceMultimap, raw: &str, traced: RuntimeType) {
    let set = map.entry(raw.to_string()).or_default();
    if !set.contains(&traced) {
        set.push(traced);
    }
}

/// Read-only results of a completed walk phase.
#[derive(Debug, Default)]
pub struct PassResults {
    counters: Sections<FrequencyCounter>,
    fullmap: FullMap,
    imports: ImportMap,
    docstrings: DocstringCache,
    traced_params: TraceMultimap,
    traced_returns: TraceMultimap,
}

impl PassResults {
    pub fn counters(&self) -> &Sections<FrequencyCounter> {
        &self.counters
    }

    pub fn fullmap(&self) -> &FullMap {
        &self.fullmap
    }

    pub fn imports(&self) -> &ImportMap {
        &self.imports
    }

    pub fn docstrings(&self) -> &DocstringCache {
        &self.docstrings
    }

    /// Traced runtime types associated with `raw` in `section`.
    ///
    /// Only params and returns carry trace associations.
    pub fn traced_types(&self, section: Section, raw: &str) -> Option<&[RuntimeType]> {
        let map = match section {
            Section::Params => &self.traced_params,
            Section::Returns => &self.traced_returns,
            Section::Attrs => return None,
        };
        map.get(raw).map(Vec::as_slice)
    }
}
