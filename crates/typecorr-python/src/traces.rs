//! Traced call signatures.
//!
//! The tracing subsystem writes one JSON file per package,
//! `<trace_folder>/<package>.json`, holding an array of records:
//!
//! ```json
//! [
//!   {
//!     "module": "pkg",
//!     "class": "Scaler",
//!     "function": "__init__",
//!     "params": { "self": null, "copy": "bool" },
//!     "returns": null
//!   }
//! ]
//! ```
//!
//! `class` is omitted for top-level functions. A `null` or absent
//! annotation means nothing was observed. Repeated records for one symbol
//! are merged: every observed type of a parameter is reduced to one type
//! with a [`TypeSimplifier`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use typecorr_core::merge::TypeSimplifier;
use typecorr_core::types::RuntimeType;

/// Errors raised while loading traces.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error reading traces at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid trace file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for trace loading.
pub type TraceResult<T> = Result<T, TraceError>;

#[derive(Debug, Deserialize)]
struct TraceRecord {
    module: String,
    #[serde(default)]
    class: Option<String>,
    function: String,
    #[serde(default)]
    params: IndexMap<String, Option<String>>,
    #[serde(default)]
    returns: Option<String>,
}

/// Observed signature of one function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Parameter annotations in call order; `None` when nothing was observed.
    pub parameters: IndexMap<String, Option<RuntimeType>>,
    pub return_annotation: Option<RuntimeType>,
}

impl Signature {
    /// The observed annotation of parameter `name`, if any.
    pub fn parameter(&self, name: &str) -> Option<&RuntimeType> {
        self.parameters.get(name).and_then(Option::as_ref)
    }
}

#[derive(Debug, Default)]
struct Observed {
    parameters: IndexMap<String, Vec<RuntimeType>>,
    returns: Vec<RuntimeType>,
}

fn signature_key(module: &str, class: Option<&str>, function: &str) -> String {
    match class {
        Some(class) => format!("{}:{}.{}", module, class, function),
        None => format!("{}:{}", module, function),
    }
}

/// Traced signatures of one package.
#[derive(Debug, Default)]
pub struct TraceStore {
    signatures: IndexMap<String, Signature>,
}

impl TraceStore {
    /// Load `<trace_folder>/<package>.json`. A missing file gives an empty
    /// store.
    pub fn load(
        trace_folder: &Path,
        package: &str,
        simplifier: &impl TypeSimplifier,
    ) -> TraceResult<Self> {
        let path = trace_folder.join(format!("{}.json", package));
        if !path.exists() {
            tracing::info!("no traces at {}", path.display());
            return Ok(TraceStore::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| TraceError::Io {
            path: path.clone(),
            source,
        })?;
        let store = Self::from_json(&content, simplifier)
            .map_err(|source| TraceError::Json { path: path.clone(), source })?;
        tracing::info!("loaded {} traced signatures from {}", store.len(), path.display());
        Ok(store)
    }

    /// Build a store from the JSON text of a trace file.
    pub fn from_json(content: &str, simplifier: &impl TypeSimplifier) -> serde_json::Result<Self> {
        let records: Vec<TraceRecord> = serde_json::from_str(content)?;

        let mut observed: IndexMap<String, Observed> = IndexMap::new();
        for record in &records {
            let key = signature_key(&record.module, record.class.as_deref(), &record.function);
            let entry = observed.entry(key.clone()).or_default();
            for (name, expr) in &record.params {
                let types = entry.parameters.entry(name.clone()).or_default();
                types.extend(parse_annotation(&key, expr.as_deref()));
            }
            entry
                .returns
                .extend(parse_annotation(&key, record.returns.as_deref()));
        }

        let signatures = observed
            .into_iter()
            .map(|(key, obs)| {
                let parameters = obs
                    .parameters
                    .into_iter()
                    .map(|(name, types)| (name, simplifier.simplify(&types)))
                    .collect();
                let signature = Signature {
                    parameters,
                    return_annotation: simplifier.simplify(&obs.returns),
                };
                (key, signature)
            })
            .collect();
        Ok(TraceStore { signatures })
    }

    /// The traced signature of `function` (a method when `class` is given).
    pub fn signature_for(
        &self,
        module: &str,
        class: Option<&str>,
        function: &str,
    ) -> Option<&Signature> {
        self.signatures
            .get(&signature_key(module, class, function))
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Parse one annotation; unparseable expressions count as not observed.
fn parse_annotation(key: &str, expr: Option<&str>) -> Option<RuntimeType> {
    let expr = expr?.trim();
    if expr.is_empty() {
        return None;
    }
    match RuntimeType::parse(expr) {
        Ok(ty) => Some(ty),
        Err(e) => {
            tracing::warn!("{}: ignoring traced annotation '{}': {}", key, expr, e);
            None
        }
    }
}
