//! Powercheck - safety-critical C coding standard checker.
//!
//! Powercheck scores a C translation unit against NASA Power of Ten,
//! MISRA-like and JPL-like rules. Analysis is lexical: the source is masked
//! so comments and literals cannot trigger rules, function boundaries are
//! recovered from brace structure, and a set of independent detectors emit
//! violations that are then scored.
//!
//! # Architecture
//!
//! - `analysis`: Source masking, function indexing and complexity metrics
//! - `rules`: Immutable rule registry built from the built-in table
//! - `detect`: Detectors, the runner and inline suppressions
//! - `score`: Capped per-rule deductions and compliance levels
//! - `engine`: The scan, detect, suppress and score pipeline
//! - `training`: Labelled training-record projection of a report
//! - `config`: YAML configuration schema
//! - `report`: Output formatting (pretty, JSON, training)
//!
//! # Example
//!
//! ```
//! use powercheck::{analyze, RuleRegistry};
//!
//! let registry = RuleRegistry::builtin().unwrap();
//! let report = analyze("int add(int a, int b) {\n    return a + b;\n}\n", &registry).unwrap();
//! assert_eq!(report.score, 100);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod engine;
pub mod report;
pub mod rules;
pub mod score;
pub mod training;

pub use analysis::{ComplexityMetrics, FunctionBoundary, SourceLine, UnitSummary};
pub use config::Config;
pub use detect::{AnalysisWarning, DetectionResult, Detector, Runner, Violation, WarningKind};
pub use engine::{analyze, AnalysisError, AnalysisStatus, ComplianceReport, Engine, EngineSettings};
pub use rules::{RegistryError, Rule, RuleOverride, RuleRegistry, Severity, Standard};
pub use score::{ComplianceLevel, ComplianceScore};
pub use training::TrainingRecord;
