//! Merging traced runtime types with documented type strings.
//!
//! A symbol's traced types are first reduced by a [`TypeSimplifier`], then
//! rendered and combined with the documented string:
//!
//! - **Single type**: `rendered`, or `rendered|documented` when they differ.
//! - **Union**: members rendered, redundant members dropped (`Float`
//!   absorbs `Int`, `int`, `float` and `None`; `Int` absorbs `int` and
//!   `None`; otherwise only `None` is dropped), the documented string
//!   appended, and the de-duplicated set joined with `|` in sorted order.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::catalog::{RenderContext, TypeCatalog, FLOAT, INT};
use crate::render::TypeRenderer;
use crate::types::RuntimeType;

/// Errors raised while merging types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// No traced types were supplied.
    #[error("no traced types to merge")]
    EmptyTraceSet,
}

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Reduces a set of observed runtime types to one representative type.
pub trait TypeSimplifier {
    /// Returns `None` when `observed` is empty.
    fn simplify(&self, observed: &[RuntimeType]) -> Option<RuntimeType>;
}

/// Flattening, de-duplicating simplifier with numeric-width collapsing.
///
/// When more than one type survives de-duplication, numeric members are
/// widened: any floating member pulls every integer and floating member
/// into one float-family representative; otherwise integer members collapse
/// into one int-family representative. The representative takes the
/// position of the first numeric member.
#[derive(Debug, Clone, Default)]
pub struct DefaultSimplifier {
    catalog: TypeCatalog,
}

impl DefaultSimplifier {
    pub fn new(catalog: TypeCatalog) -> Self {
        DefaultSimplifier { catalog }
    }

    fn is_int(&self, ty: &RuntimeType) -> bool {
        match ty {
            RuntimeType::Named { name } => {
                name == "int" || name == "builtins.int" || self.catalog.is_int_family(name)
            }
            _ => false,
        }
    }

    fn is_float(&self, ty: &RuntimeType) -> bool {
        match ty {
            RuntimeType::Named { name } => {
                name == "float" || name == "builtins.float" || self.catalog.is_float_family(name)
            }
            _ => false,
        }
    }

    /// The 64-bit member of a family, else its first member.
    fn representative(family: &[String], fallback: &str) -> RuntimeType {
        let is_wide = |n: &&String| {
            let leaf = n.rsplit('.').next().unwrap_or(n.as_str());
            leaf.ends_with("64") && !leaf.starts_with('u')
        };
        let name = family
            .iter()
            .find(is_wide)
            .or_else(|| family.first())
            .map(String::as_str)
            .unwrap_or(fallback);
        RuntimeType::named(name)
    }

    /// Replace members matching `pred` with `rep`, placed at the first match.
    fn collapse(
        members: Vec<RuntimeType>,
        rep: RuntimeType,
        pred: impl Fn(&RuntimeType) -> bool,
    ) -> Vec<RuntimeType> {
        let mut out = Vec::with_capacity(members.len());
        let mut placed = false;
        for m in members {
            if pred(&m) {
                if !placed {
                    out.push(rep.clone());
                    placed = true;
                }
            } else {
                out.push(m);
            }
        }
        out
    }
}

impl TypeSimplifier for DefaultSimplifier {
    fn simplify(&self, observed: &[RuntimeType]) -> Option<RuntimeType> {
        if observed.is_empty() {
            return None;
        }

        let mut members = match RuntimeType::union(observed.to_vec()) {
            RuntimeType::Union { members } => members,
            single => return Some(single),
        };

        if members.iter().any(|m| self.is_float(m)) {
            let rep = Self::representative(&self.catalog.float_family, "float");
            members = Self::collapse(members, rep, |m| self.is_int(m) || self.is_float(m));
        } else if members.iter().any(|m| self.is_int(m)) {
            let rep = Self::representative(&self.catalog.int_family, "int");
            members = Self::collapse(members, rep, |m| self.is_int(m));
        }

        Some(RuntimeType::union(members))
    }
}

/// Combines traced types with an optional documented type string.
#[derive(Debug, Clone)]
pub struct TypeMerger<S: TypeSimplifier = DefaultSimplifier> {
    renderer: TypeRenderer,
    simplifier: S,
}

impl TypeMerger<DefaultSimplifier> {
    /// A merger using the default simplifier over `catalog`.
    pub fn with_catalog(catalog: TypeCatalog) -> Self {
        TypeMerger {
            renderer: TypeRenderer::new(catalog.clone()),
            simplifier: DefaultSimplifier::new(catalog),
        }
    }
}

impl Default for TypeMerger<DefaultSimplifier> {
    fn default() -> Self {
        TypeMerger::with_catalog(TypeCatalog::default())
    }
}

impl<S: TypeSimplifier> TypeMerger<S> {
    pub fn new(renderer: TypeRenderer, simplifier: S) -> Self {
        TypeMerger {
            renderer,
            simplifier,
        }
    }

    pub fn renderer(&self) -> &TypeRenderer {
        &self.renderer
    }

    /// Merge `traced` with `doc_type` into one canonical string.
    pub fn combine(&self, traced: &[RuntimeType], doc_type: Option<&str>) -> MergeResult<String> {
        let simplified = self
            .simplifier
            .simplify(traced)
            .ok_or(MergeError::EmptyTraceSet)?;
        let ctx = RenderContext::from_doc(doc_type);

        if !simplified.is_union() {
            let rendered = self.renderer.render(&simplified, ctx);
            return Ok(match doc_type {
                Some(doc) if doc != rendered => format!("{}|{}", rendered, doc),
                _ => rendered,
            });
        }

        let mut components: Vec<String> = simplified
            .members()
            .iter()
            .map(|m| self.renderer.render(m, ctx))
            .collect();

        let absorbed: &[&str] = if components.iter().any(|c| c == FLOAT) {
            &[INT, "int", "float", "None"]
        } else if components.iter().any(|c| c == INT) {
            &["int", "None"]
        } else {
            &["None"]
        };
        components.retain(|c| !absorbed.contains(&c.as_str()));

        if let Some(doc) = doc_type {
            components.push(doc.to_string());
        }

        let unique: BTreeSet<String> = components.into_iter().collect();
        if unique.is_empty() {
            return Ok("None".to_string());
        }
        Ok(unique.into_iter().collect::<Vec<_>>().join("|"))
    }
}
