//! End-to-end scenarios for the analysis engine.
//!
//! Each test feeds a small C unit through `analyze` with the built-in
//! registry and checks the resulting report.

use std::sync::Arc;
use std::thread;

use powercheck::analysis::{index_functions, scan};
use powercheck::rules::ids;
use powercheck::{analyze, AnalysisStatus, ComplianceLevel, ComplianceReport, RuleRegistry, WarningKind};

fn registry() -> RuleRegistry {
    RuleRegistry::builtin().unwrap()
}

fn count(report: &ComplianceReport, rule_id: &str) -> usize {
    report.violations.iter().filter(|v| v.rule_id == rule_id).count()
}

#[test]
fn test_clean_snippet() {
    let report = analyze("#include <stdint.h>\n\nint main(void) {\n    return 0;\n}\n", &registry()).unwrap();

    assert!(report.violations.is_empty(), "unexpected: {:?}", report.violations);
    assert_eq!(report.score, 100);
    assert_eq!(report.level, ComplianceLevel::FullyCompliant);
    assert_eq!(report.status, AnalysisStatus::Complete);
    assert_eq!(report.metrics.len(), 1);
    assert_eq!(report.metrics[0].function_name, "main");
}

#[test]
fn test_goto_scenario() {
    let registry = registry();
    let source = "int main(void) {\n    goto cleanup;\ncleanup:\n    return 0;\n}\n";
    let report = analyze(source, &registry).unwrap();

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].rule_id, ids::GOTO);
    assert_eq!(report.violations[0].line, 2);
    assert_eq!(report.violations[0].snippet, "goto cleanup;");

    let penalty = registry.get(ids::GOTO).unwrap().penalty;
    assert_eq!(report.score, 100 - penalty);
    assert_eq!(report.level, ComplianceLevel::MinorIssues);
}

#[test]
fn test_chained_assignment_scenario() {
    let source = "void reset(void) {\n    int a;\n    int b;\n    int c;\n    a = b = c = 0;\n}\n";
    let report = analyze(source, &registry()).unwrap();

    assert_eq!(count(&report, ids::CHAINED_ASSIGNMENT), 1);
    let v = report
        .violations
        .iter()
        .find(|v| v.rule_id == ids::CHAINED_ASSIGNMENT)
        .unwrap();
    assert_eq!(v.line, 5);
    assert_eq!(v.snippet, "a = b = c = 0;");
}

#[test]
fn test_two_assignments_on_one_statement_line() {
    let source = "void reset(void) {\n    int a;\n    int b;\n    a = 1; b = 2;\n}\n";
    let report = analyze(source, &registry()).unwrap();

    assert_eq!(count(&report, ids::CHAINED_ASSIGNMENT), 1);
    assert_eq!(report.violations[0].line, 4);
}

#[test]
fn test_declaration_in_nested_block_after_statement() {
    let source = "void step(int x) {\n    x++;\n    if (x > 0) {\n        int tmp = x;\n        x = tmp;\n    }\n}\n";
    let report = analyze(source, &registry()).unwrap();

    assert_eq!(count(&report, ids::DECLARATION_SCOPE), 1);
    let v = report
        .violations
        .iter()
        .find(|v| v.rule_id == ids::DECLARATION_SCOPE)
        .unwrap();
    assert_eq!(v.line, 4);
}

#[test]
fn test_jump_hidden_in_macro() {
    let source = "#define BAIL goto cleanup\nvoid run(void) {\n    BAIL;\ncleanup:\n    ;\n}\n";
    let report = analyze(source, &registry()).unwrap();

    assert_eq!(count(&report, ids::GOTO), 1);
    let v = report.violations.iter().find(|v| v.rule_id == ids::GOTO).unwrap();
    assert_eq!(v.line, 1);
}

#[test]
fn test_recursive_function_scenario() {
    let source = "int fact(int n) { if (n<=1) return 1; return n*fact(n-1); }\n";
    let report = analyze(source, &registry()).unwrap();

    assert_eq!(count(&report, ids::RECURSION), 1);
    let v = report.violations.iter().find(|v| v.rule_id == ids::RECURSION).unwrap();
    assert!(v.message.contains("`fact`"));
    assert_eq!(v.line, 1);
}

#[test]
fn test_mutual_recursion_is_only_a_warning() {
    let source = "int is_odd(int n);\n\
int is_even(int n) {\n    if (n == 0) { return 1; }\n    return is_odd(n - 1);\n}\n\
int is_odd(int n) {\n    if (n == 0) { return 0; }\n    return is_even(n - 1);\n}\n";
    let report = analyze(source, &registry()).unwrap();

    assert_eq!(count(&report, ids::RECURSION), 0);
    assert_eq!(report.status, AnalysisStatus::BestEffort);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::PossibleIndirectRecursion && w.message.contains("is_even, is_odd")));
}

#[test]
fn test_function_boundary_for_add() {
    let lines = scan("int add(int a, int b) {\n    return a + b;\n}\n");
    let index = index_functions(&lines);

    assert_eq!(index.functions.len(), 1);
    let f = &index.functions[0];
    assert_eq!(f.name, "add");
    assert_eq!(f.parameter_count, 2);
    assert_eq!(f.start_line, 1);
    assert_eq!(f.end_line, 3);
    assert!(f.well_formed);
    assert!(index.warnings.is_empty());
}

#[test]
fn test_for_loop_bound_policy() {
    let registry = registry();
    let literal = "void f(int *v) {\n    int i;\n    for (i = 0; i < 100; i++) {\n        v[i] = 0;\n    }\n}\n";
    assert_eq!(count(&analyze(literal, &registry).unwrap(), ids::LOOP_BOUND), 0);

    let undefined = "void f(int *v) {\n    int i;\n    for (i = 0; i < LIMIT; i++) {\n        v[i] = 0;\n    }\n}\n";
    let report = analyze(undefined, &registry).unwrap();
    assert_eq!(count(&report, ids::LOOP_BOUND), 1);
    assert_eq!(report.violations[0].line, 3);

    let defined = format!("#define LIMIT 64\n{}", undefined);
    assert_eq!(count(&analyze(&defined, &registry).unwrap(), ids::LOOP_BOUND), 0);

    // A define after the loop does not bound it.
    let late = format!("{}#define LIMIT 64\n", undefined);
    assert_eq!(count(&analyze(&late, &registry).unwrap(), ids::LOOP_BOUND), 1);
}

#[test]
fn test_idempotent_masking() {
    let source = "int add(int a, int b) {\n    int sum = a + b;\n    return sum;\n}\n";
    for line in scan(source) {
        assert_eq!(line.masked_text, line.raw_text);
    }
}

#[test]
fn test_comments_and_strings_do_not_trigger_rules() {
    let source = "/* goto is banned; malloc too */\n\
void log_it(void) {\n    // while (1) { goto retry; }\n    puts(\"goto fail; free(x)\");\n}\n";
    let report = analyze(source, &registry()).unwrap();
    assert!(report.violations.is_empty(), "unexpected: {:?}", report.violations);
    assert_eq!(report.score, 100);
}

#[test]
fn test_monotonic_scoring_on_source() {
    let registry = registry();
    let mut body = String::new();
    let mut previous = 100;
    for n in 1..=6 {
        body.push_str(&format!("    goto l{};\nl{}:\n", n, n));
        let source = format!("void f(void) {{\n{}    ;\n}}\n", body);
        let report = analyze(&source, &registry).unwrap();
        assert_eq!(count(&report, ids::GOTO), n);
        assert!(report.score <= previous);
        assert!(report.score >= 100 - 3 * 15);
        previous = report.score;
    }
    assert_eq!(previous, 55);
}

#[test]
fn test_determinism_across_threads() {
    let registry = Arc::new(registry());
    let source: Arc<str> = Arc::from(
        "#include <stdlib.h>\nint f(int a, int b, int c) {\n    char *p = malloc(a);\n    while (1) { a = b = c; }\n    return 0;\n}\n",
    );
    let expected = analyze(&*source, &registry).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let source = Arc::clone(&source);
            thread::spawn(move || analyze(&*source, &registry).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    assert_eq!(analyze(&*source, &registry).unwrap(), expected);
}
