//! Rule detectors for C translation units.
//!
//! Every detector implements [`Detector`] and is run by the [`Runner`]. The
//! suppression filter in [`suppress`] is applied afterwards by the engine.

mod assignments;
mod declarations;
mod flow;
mod functions;
mod loops;
mod memory;
mod pointers;
mod preprocessor;
mod runner;
mod style;
pub mod suppress;
mod types;

pub use assignments::AssignmentDetector;
pub use declarations::DeclarationDetector;
pub use flow::{GotoDetector, RecursionDetector};
pub use functions::FunctionDetector;
pub use loops::LoopBoundDetector;
pub use memory::MemoryDetector;
pub use pointers::PointerDepthDetector;
pub use preprocessor::PreprocessorDetector;
pub use runner::{default_detectors, sort_result, Detector, DetectorLimits, Runner};
pub use style::StyleDetector;
pub use suppress::{filter_suppressed, parse_suppressions, SuppressedViolation, Suppression, SuppressionType};
pub use types::{AnalysisWarning, DetectionResult, Violation, WarningKind};
