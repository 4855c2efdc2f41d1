//! Built-in rule table.
//!
//! Rules are plain data. Adding a rule means adding a row here and a detector
//! that emits its id; nothing else branches on rule ids.

use super::{Severity, Standard};

/// Rule ids emitted by the built-in detectors.
pub mod ids {
    pub const GOTO: &str = "NASA-GOTO";
    pub const RECURSION: &str = "NASA-RECURSION";
    pub const LOOP_BOUND: &str = "NASA-LOOP-BOUND";
    pub const DYNAMIC_MEMORY: &str = "NASA-DYNAMIC-MEMORY";
    pub const FUNCTION_LENGTH: &str = "NASA-FUNCTION-LENGTH";
    pub const DECLARATION_SCOPE: &str = "NASA-DECLARATION-SCOPE";
    pub const POINTER_DEPTH: &str = "NASA-POINTER-DEPTH";
    pub const DEFINE_CONSTANT: &str = "NASA-DEFINE-CONSTANT";
    pub const FUNCTION_MACRO: &str = "NASA-FUNCTION-MACRO";
    pub const PARAMETER_COUNT: &str = "JPL-PARAMETER-COUNT";
    pub const SHORT_IDENTIFIER: &str = "JPL-SHORT-IDENTIFIER";
    pub const HEADER_COMMENT: &str = "JPL-HEADER-COMMENT";
    pub const ERROR_HANDLING: &str = "JPL-ERROR-HANDLING";
    pub const SINGLE_EXIT: &str = "MISRA-SINGLE-EXIT";
    pub const ASSIGN_IN_CONDITION: &str = "MISRA-ASSIGN-IN-CONDITION";
    pub const CHAINED_ASSIGNMENT: &str = "MISRA-CHAINED-ASSIGNMENT";
    pub const BASIC_TYPES: &str = "MISRA-BASIC-TYPES";
}

/// One row of the built-in table.
pub struct RuleEntry {
    pub id: &'static str,
    pub standard: Standard,
    pub title: &'static str,
    pub severity: Severity,
    pub suggestion: &'static str,
    pub enabled: bool,
}

pub static BUILTIN_RULES: &[RuleEntry] = &[
    RuleEntry {
        id: ids::GOTO,
        standard: Standard::Nasa,
        title: "Avoid complex flow control (goto, setjmp, longjmp)",
        severity: Severity::Critical,
        suggestion: "Replace goto and non-local jumps with structured control flow",
        enabled: true,
    },
    RuleEntry {
        id: ids::RECURSION,
        standard: Standard::Nasa,
        title: "No direct recursion",
        severity: Severity::Critical,
        suggestion: "Use an iterative approach with an explicit bound instead of recursion",
        enabled: true,
    },
    RuleEntry {
        id: ids::LOOP_BOUND,
        standard: Standard::Nasa,
        title: "Loops must have a fixed upper bound",
        severity: Severity::Major,
        suggestion: "Compare the loop counter against a literal or #define'd upper bound",
        enabled: true,
    },
    RuleEntry {
        id: ids::DYNAMIC_MEMORY,
        standard: Standard::Nasa,
        title: "No dynamic memory allocation",
        severity: Severity::Critical,
        suggestion: "Use static or stack allocation sized at compile time",
        enabled: true,
    },
    RuleEntry {
        id: ids::FUNCTION_LENGTH,
        standard: Standard::Nasa,
        title: "Functions must fit on a single page",
        severity: Severity::Minor,
        suggestion: "Break the function into smaller functions",
        enabled: true,
    },
    RuleEntry {
        id: ids::DECLARATION_SCOPE,
        standard: Standard::Nasa,
        title: "Declare variables at the top of their scope",
        severity: Severity::Advisory,
        suggestion: "Move all variable declarations to the beginning of the function",
        enabled: true,
    },
    RuleEntry {
        id: ids::POINTER_DEPTH,
        standard: Standard::Nasa,
        title: "Limit pointer dereferencing to two levels",
        severity: Severity::Major,
        suggestion: "Introduce intermediate variables to keep indirection at two levels or fewer",
        enabled: true,
    },
    RuleEntry {
        id: ids::DEFINE_CONSTANT,
        standard: Standard::Nasa,
        title: "Prefer typed constants over object-like macros",
        severity: Severity::Advisory,
        suggestion: "Use a const declaration instead of #define",
        enabled: true,
    },
    RuleEntry {
        id: ids::FUNCTION_MACRO,
        standard: Standard::Nasa,
        title: "No function-like macros",
        severity: Severity::Minor,
        suggestion: "Replace the macro with a static inline function",
        enabled: true,
    },
    RuleEntry {
        id: ids::PARAMETER_COUNT,
        standard: Standard::Jpl,
        title: "Limit the number of function parameters",
        severity: Severity::Major,
        suggestion: "Group related parameters into a structure",
        enabled: true,
    },
    RuleEntry {
        id: ids::SHORT_IDENTIFIER,
        standard: Standard::Jpl,
        title: "Use descriptive variable names",
        severity: Severity::Advisory,
        suggestion: "Use descriptive names of at least three characters",
        enabled: false,
    },
    RuleEntry {
        id: ids::HEADER_COMMENT,
        standard: Standard::Jpl,
        title: "Document every function with a header comment",
        severity: Severity::Advisory,
        suggestion: "Add a header comment explaining purpose and parameters",
        enabled: false,
    },
    RuleEntry {
        id: ids::ERROR_HANDLING,
        standard: Standard::Jpl,
        title: "Void functions should report failures",
        severity: Severity::Advisory,
        suggestion: "Return a status code or route failures through an error handler",
        enabled: false,
    },
    RuleEntry {
        id: ids::SINGLE_EXIT,
        standard: Standard::Misra,
        title: "A function should have a single point of exit",
        severity: Severity::Minor,
        suggestion: "Use a single return point with a result variable",
        enabled: true,
    },
    RuleEntry {
        id: ids::ASSIGN_IN_CONDITION,
        standard: Standard::Misra,
        title: "No assignment in controlling expressions",
        severity: Severity::Minor,
        suggestion: "Separate the assignment from the condition check",
        enabled: true,
    },
    RuleEntry {
        id: ids::CHAINED_ASSIGNMENT,
        standard: Standard::Misra,
        title: "One assignment per statement line",
        severity: Severity::Advisory,
        suggestion: "Put each assignment on its own line",
        enabled: true,
    },
    RuleEntry {
        id: ids::BASIC_TYPES,
        standard: Standard::Misra,
        title: "Use fixed-width integer types",
        severity: Severity::Advisory,
        suggestion: "Use explicit integer types from <stdint.h>",
        enabled: false,
    },
];
