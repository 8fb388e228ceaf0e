//! Python front end for typecorr.
//!
//! This crate turns a Python package on disk into the pass-scoped state the
//! core engine aggregates:
//! - Package discovery and module naming ([`files`])
//! - Source outlines via tree-sitter-python ([`outline`]) and a visitor over
//!   them ([`visitor`])
//! - Numpydoc docstring parsing ([`docstring`])
//! - A package symbol table with re-export and submodule fallback
//!   ([`symbols`])
//! - Traced signatures ([`traces`])
//! - The correlation walker ([`walker`])
//! - Docstring-phrase normalization and triviality ([`normalize`])
//! - The pass controller ([`analysis`])

pub mod analysis;
pub mod docstring;
pub mod error_bridges;
pub mod files;
pub mod normalize;
pub mod outline;
pub mod phrase;
pub mod symbols;
pub mod traces;
pub mod visitor;
pub mod walker;

pub use analysis::{analyze_package, FileFailure, PassOutcome};
