//! Correlation walker.
//!
//! Walks one module outline, gives every class, function, method and
//! parameter a dotted address, resolves the documentation and traced
//! signature that apply to it, and records the results into the
//! pass-scoped [`PassState`].
//!
//! Addresses are the context stack joined with `.`, relative to the
//! module's public namespace: `Scaler`, `Scaler.fit`, `Scaler.fit.X`.
//! Private helpers (`_name`) are not descended into and never receive an
//! address. Names with a leading double underscore, dunders and mangled
//! names alike, are walked.
//!
//! # Constructors
//!
//! An `__init__` without a parameters section of its own takes the owning
//! class's record verbatim. When the class has no documentation either, the
//! constructor gets no record at all.

use indexmap::IndexMap;
use thiserror::Error;

use typecorr_core::error::TypecorrError;
use typecorr_core::sections::DocRecord;
use typecorr_core::state::PassState;

use crate::docstring::DocstringParser;
use crate::files::SourceFile;
use crate::outline::{ClassDef, FunctionDef, ModuleOutline, Param};
use crate::symbols::{ObjectResolver, Symbol, SymbolTable};
use crate::traces::{Signature, TraceStore};
use crate::visitor::{walk_module, VisitResult, Visitor};

/// Errors raised by the walker itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalkError {
    /// The context stack was not empty when the walk finished.
    ///
    /// Only reachable when a visit is cut short without its matching
    /// `leave_*` call.
    #[error("unbalanced context stack: {depth} frames left")]
    UnbalancedContext { depth: usize },
}

/// Result type for walks.
pub type WalkResult<T> = Result<T, WalkError>;

/// Documentation records of one module, keyed by address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutput {
    pub records: IndexMap<String, DocRecord>,
    /// Addresses that could not be resolved to a live object.
    pub unresolved: Vec<String>,
}

/// Collaborators shared by the walks of one pass.
pub struct WalkContext<'a, T: SymbolTable, P: DocstringParser> {
    pub symbols: &'a T,
    pub parser: &'a P,
    pub traces: &'a TraceStore,
}

#[derive(Debug)]
enum Frame<'a> {
    Class {
        name: &'a str,
        symbol: Option<&'a Symbol>,
    },
    Function {
        address: String,
        trace: Option<&'a Signature>,
    },
    /// A private helper that was not descended into.
    Skipped,
}

/// What a function definition is nested in.
#[derive(Debug, Clone, Copy)]
enum Enclosing<'a> {
    Module,
    Class {
        name: &'a str,
        symbol: Option<&'a Symbol>,
    },
    /// A function or a skipped helper.
    Other,
}

/// `_helper` is private; `__init__` and `__helper` are not.
fn is_private_name(name: &str) -> bool {
    name.starts_with('_') && !name.starts_with("__")
}

/// Visitor that correlates documentation and traces for one module.
pub struct CorrelationWalker<'a, 's, T: SymbolTable, P: DocstringParser> {
    file: &'a SourceFile,
    resolver: ObjectResolver<'a, T>,
    parser: &'a P,
    traces: &'a TraceStore,
    state: &'s mut PassState,
    records: IndexMap<String, DocRecord>,
    unresolved: Vec<String>,
    context: Vec<&'a str>,
    frames: Vec<Frame<'a>>,
}

impl<'a, 's, T: SymbolTable, P: DocstringParser> CorrelationWalker<'a, 's, T, P> {
    pub fn new(file: &'a SourceFile, ctx: &WalkContext<'a, T, P>, state: &'s mut PassState) -> Self {
        CorrelationWalker {
            file,
            resolver: ObjectResolver::new(ctx.symbols),
            parser: ctx.parser,
            traces: ctx.traces,
            state,
            records: IndexMap::new(),
            unresolved: Vec::new(),
            context: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Finish the walk and hand back the module's records.
    pub fn finish(self) -> WalkResult<WalkOutput> {
        if !self.frames.is_empty() || !self.context.is_empty() {
            return Err(WalkError::UnbalancedContext {
                depth: self.frames.len().max(self.context.len()),
            });
        }
        Ok(WalkOutput {
            records: self.records,
            unresolved: self.unresolved,
        })
    }

    fn namespace(&self) -> &'a str {
        &self.file.namespace
    }

    fn address(&self) -> String {
        self.context.join(".")
    }

    fn parse_doc(&self, doc: Option<&str>) -> DocRecord {
        doc.map(|d| self.parser.parse(d))
            .unwrap_or_else(DocRecord::undocumented)
    }

    fn report_unresolved(&mut self, address: String) {
        let err = TypecorrError::resolution(&self.file.rel_path, &address);
        tracing::warn!("{}", err);
        self.unresolved.push(address);
    }

    fn enclosing(&self) -> Enclosing<'a> {
        match self.frames.last() {
            None => Enclosing::Module,
            Some(Frame::Class { name, symbol }) => Enclosing::Class {
                name: *name,
                symbol: *symbol,
            },
            Some(_) => Enclosing::Other,
        }
    }

    /// Resolve a top-level name: the public namespace (with submodule
    /// fallback on the file stem), then the defining module itself.
    fn resolve_top_level(&self, name: &str) -> Option<&'a Symbol> {
        self.resolver
            .resolve(&self.file.namespace, self.file.stem(), name)
            .or_else(|| {
                if self.file.module != self.file.namespace {
                    self.resolver.resolve(&self.file.module, self.file.stem(), name)
                } else {
                    None
                }
            })
    }

    fn signature(&self, class: Option<&str>, name: &str) -> Option<&'a Signature> {
        self.traces
            .signature_for(&self.file.namespace, class, name)
            .or_else(|| self.traces.signature_for(&self.file.module, class, name))
    }

    /// Count and register a record, and store it under `address`.
    fn register(&mut self, address: String, record: DocRecord) {
        let namespace = self.namespace();
        self.state.count_occurrences(&record);
        self.state.register_fullmap(namespace, &address, &record);
        self.records.insert(address, record);
    }

    /// Record for an `__init__` that documents no parameters itself.
    fn constructor_fallback(&mut self, address: String) {
        let namespace = self.namespace();
        let class_address = self.context[..self.context.len() - 1].join(".");
        match self.records.get(&class_address) {
            Some(class_record) if !class_record.is_undocumented() => {
                let record = class_record.clone();
                self.state.register_fullmap(namespace, &address, &record);
                self.records.insert(address, record);
            }
            _ => {
                tracing::debug!("{}: no documentation for {}", self.file.rel_path, address);
            }
        }
    }
}

impl<'a, 's, T: SymbolTable, P: DocstringParser> Visitor<'a> for CorrelationWalker<'a, 's, T, P> {
    fn visit_module(&mut self, _node: &'a ModuleOutline) -> VisitResult {
        tracing::debug!("walking {} as {}", self.file.rel_path, self.file.namespace);
        VisitResult::Continue
    }

    fn visit_class_def(&mut self, node: &'a ClassDef) -> VisitResult {
        let namespace = self.namespace();
        let symbol = match self.frames.last() {
            None => {
                self.state.record_import(&node.name, namespace);
                let symbol = self.resolve_top_level(&node.name);
                if symbol.is_none() {
                    self.report_unresolved(node.name.clone());
                }
                symbol
            }
            Some(Frame::Class {
                symbol: Some(parent),
                ..
            }) => self
                .resolver
                .member(*parent, &node.name)
                .filter(|s| matches!(s, Symbol::Class { .. })),
            Some(_) => None,
        };

        self.context.push(&node.name);
        let address = self.address();
        let record = self.parse_doc(symbol.and_then(|s| self.resolver.class_doc(s)));

        if let Some(attrs) = &record.attrs {
            let docs = self.state.module_docs_mut(&self.file.namespace);
            for (attr, ty) in attrs {
                docs.attrs.insert(format!("{}.{}", address, attr), ty.clone());
            }
        }
        self.register(address, record);

        self.frames.push(Frame::Class {
            name: &node.name,
            symbol,
        });
        VisitResult::Continue
    }

    fn leave_class_def(&mut self, _node: &'a ClassDef) {
        self.frames.pop();
        self.context.pop();
    }

    fn visit_function_def(&mut self, node: &'a FunctionDef) -> VisitResult {
        if is_private_name(&node.name) {
            self.frames.push(Frame::Skipped);
            return VisitResult::SkipChildren;
        }

        let (doc, trace, is_method) = match self.enclosing() {
            Enclosing::Module => {
                let symbol = self.resolve_top_level(&node.name);
                if symbol.is_none() {
                    self.report_unresolved(node.name.clone());
                }
                (
                    symbol.and_then(Symbol::own_doc),
                    self.signature(None, &node.name),
                    false,
                )
            }
            // the class itself was reported, or sits where nothing resolves
            Enclosing::Class { symbol: None, .. } => (None, None, true),
            Enclosing::Class {
                name,
                symbol: Some(cls),
            } => match self.resolver.member(cls, &node.name) {
                Some(_) => (
                    self.resolver.member_doc(cls, &node.name),
                    self.signature(Some(name), &node.name),
                    true,
                ),
                None => {
                    let address = format!("{}.{}", self.address(), node.name);
                    self.report_unresolved(address);
                    (None, None, true)
                }
            },
            Enclosing::Other => (None, None, false),
        };

        self.context.push(&node.name);
        let address = self.address();
        let record = self.parse_doc(doc);

        if node.name == "__init__" && is_method && record.params.is_none() {
            self.constructor_fallback(address.clone());
        } else {
            self.register(address.clone(), record);
        }

        self.frames.push(Frame::Function { address, trace });
        VisitResult::Continue
    }

    fn leave_function_def(&mut self, _node: &'a FunctionDef) {
        let Some(Frame::Function { address, trace }) = self.frames.pop() else {
            return;
        };
        self.context.pop();

        let Some(record) = self.records.get(&address) else {
            return;
        };
        if let Some(returns) = &record.returns {
            self.state
                .module_docs_mut(&self.file.namespace)
                .returns
                .insert(address.clone(), returns.clone());
        }
        // multi-valued returns stay uncorrelated with traced tuples
        if let (Some(raw), Some(observed)) = (
            record.single_return(),
            trace.and_then(|sig| sig.return_annotation.as_ref()),
        ) {
            self.state.associate_return_trace(raw, observed.clone());
        }
    }

    fn visit_param(&mut self, node: &'a Param) -> VisitResult {
        let Some(Frame::Function { address, trace }) = self.frames.last() else {
            return VisitResult::Continue;
        };
        let Some(ptype) = self
            .records
            .get(address)
            .and_then(|r| r.params.as_ref())
            .and_then(|params| params.get(&node.name))
        else {
            return VisitResult::Continue;
        };

        self.state
            .module_docs_mut(&self.file.namespace)
            .params
            .insert(format!("{}.{}", address, node.name), ptype.clone());
        if let Some(observed) = trace.and_then(|sig| sig.parameter(&node.name)) {
            self.state.associate_param_trace(ptype, observed.clone());
        }
        VisitResult::Continue
    }
}

/// Walk `outline` of `file`, recording into `state`.
pub fn correlate_module<'a, T: SymbolTable, P: DocstringParser>(
    outline: &'a ModuleOutline,
    file: &'a SourceFile,
    ctx: &WalkContext<'a, T, P>,
    state: &mut PassState,
) -> WalkResult<WalkOutput> {
    let mut walker = CorrelationWalker::new(file, ctx, state);
    walk_module(&mut walker, outline);
    walker.finish()
}
