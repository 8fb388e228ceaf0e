//! Core infrastructure for typecorr.
//!
//! This crate provides the language-agnostic half of the type correlation
//! engine:
//! - Error types and exit codes
//! - The sectioned data model (params / returns / attrs)
//! - A tagged runtime type representation and its expression parser
//! - The recognized-type catalog, renderer, simplifier and merger
//! - Frequency counters and pass-scoped state
//! - The frequency aggregator and classifier
//! - Configuration and persistence of map, report and correlation files

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod counter;
pub mod error;
pub mod merge;
pub mod render;
pub mod sections;
pub mod state;
pub mod store;
pub mod types;
