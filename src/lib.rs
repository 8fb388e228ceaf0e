//! typecorr: correlate documented Python types with traced runtime types.
//!
//! Walks a Python package, pairs every numpydoc-documented parameter,
//! return and attribute type with the runtime types observed for the same
//! symbol by a tracer, and reports how each documented phrase should be
//! written as a type annotation.

// Engine - re-exported from typecorr-core
pub use typecorr_core::aggregate;
pub use typecorr_core::config;
pub use typecorr_core::error;
pub use typecorr_core::merge;
pub use typecorr_core::sections;
pub use typecorr_core::store;
pub use typecorr_core::types;

// Python front end
pub use typecorr_python as python;

// Front door
pub mod cli;
pub mod output;
