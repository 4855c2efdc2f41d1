//! Source analysis: masking scanner, function indexer and complexity metrics.
//!
//! This module provides the structural facts every detector consumes:
//! - `scanner`: line records with comments and literals masked out
//! - `structure`: function boundaries recovered by brace matching
//! - `complexity`: per-function metrics and unit-level annotations

pub mod complexity;
pub mod scanner;
pub mod structure;
pub mod text;

pub use complexity::{analyze_functions, summarize, ComplexityMetrics, UnitSummary};
pub use scanner::{scan, SourceLine, FILLER};
pub use structure::{index_functions, FunctionBoundary, StructureIndex};
