//! Output formatting for powercheck results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: the full report for programmatic consumption
//! - Training: one labelled record per file for corpus building

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::analysis::{ComplexityMetrics, UnitSummary};
use crate::detect::{AnalysisWarning, SuppressedViolation, SuppressionType, Violation};
use crate::engine::ComplianceReport;
use crate::rules::{RuleRegistry, Severity};
use crate::score::ComplianceLevel;
use crate::training::TrainingRecord;

/// One analyzed file and its report.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: String,
    pub source: String,
    pub report: ComplianceReport,
}

/// Invocation details shown alongside the per-file reports.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub path: &'a str,
    pub config: Option<&'a str>,
    pub threshold: u32,
    pub show_suppressed: bool,
}

/// True when every file meets the threshold.
pub fn all_passed(files: &[FileReport], threshold: u32) -> bool {
    files.iter().all(|f| f.report.passes(threshold))
}

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub threshold: u32,
    pub passed: bool,
    pub files_checked: usize,
    pub files: Vec<JsonFileReport>,
}

/// JSON report for a single file.
#[derive(Serialize, Deserialize)]
pub struct JsonFileReport {
    pub path: String,
    pub score: u32,
    pub level: String,
    pub status: String,
    pub passed: bool,
    pub violations: Vec<JsonViolation>,
    pub warnings: Vec<AnalysisWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedViolation>,
    pub suppressed_count: usize,
    pub breakdown: Vec<BreakdownEntry>,
    pub metrics: Vec<ComplexityMetrics>,
    pub summary: UnitSummary,
}

/// JSON violation, joined with its rule's metadata.
#[derive(Serialize, Deserialize)]
pub struct JsonViolation {
    pub rule_id: String,
    pub title: String,
    pub severity: String,
    pub line: usize,
    pub message: String,
    pub snippet: String,
    pub suggestion: String,
}

/// Breakdown entry for score details.
#[derive(Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub rule_id: String,
    pub points: u32,
    pub violations: u32,
}

/// Build the JSON report for a batch of files.
pub fn json_report(ctx: &ReportContext<'_>, files: &[FileReport], registry: &RuleRegistry) -> JsonReport {
    let entries = files
        .iter()
        .map(|f| {
            let report = &f.report;
            JsonFileReport {
                path: f.path.clone(),
                score: report.score,
                level: report.level.as_str().to_string(),
                status: report.status.as_str().to_string(),
                passed: report.passes(ctx.threshold),
                violations: report
                    .violations
                    .iter()
                    .map(|v| violation_to_json(v, registry))
                    .collect(),
                warnings: report.warnings.clone(),
                suppressed: report.suppressed.clone(),
                suppressed_count: report.suppressed.len(),
                breakdown: report
                    .deductions
                    .iter()
                    .map(|d| BreakdownEntry {
                        rule_id: d.rule_id.clone(),
                        points: d.points,
                        violations: d.occurrences,
                    })
                    .collect(),
                metrics: report.metrics.clone(),
                summary: report.summary.clone(),
            }
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: ctx.path.to_string(),
        config: ctx.config.map(str::to_string),
        threshold: ctx.threshold,
        passed: all_passed(files, ctx.threshold),
        files_checked: files.len(),
        files: entries,
    }
}

/// Write results in JSON format.
pub fn write_json(ctx: &ReportContext<'_>, files: &[FileReport], registry: &RuleRegistry) -> anyhow::Result<()> {
    let report = json_report(ctx, files, registry);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn violation_to_json(v: &Violation, registry: &RuleRegistry) -> JsonViolation {
    let rule = registry.get(&v.rule_id);
    JsonViolation {
        rule_id: v.rule_id.clone(),
        title: rule.map(|r| r.title.clone()).unwrap_or_else(|| v.rule_id.clone()),
        severity: severity_of(v, registry).as_str().to_string(),
        line: v.line,
        message: v.message.clone(),
        snippet: v.snippet.clone(),
        suggestion: rule.map(|r| r.suggestion.clone()).unwrap_or_default(),
    }
}

fn severity_of(v: &Violation, registry: &RuleRegistry) -> Severity {
    registry
        .get(&v.rule_id)
        .map(|r| r.severity)
        .unwrap_or(Severity::Advisory)
}

// =============================================================================
// Training Format
// =============================================================================

/// Project every file into a training record.
pub fn training_records(files: &[FileReport], registry: &RuleRegistry) -> Vec<TrainingRecord> {
    files
        .iter()
        .map(|f| TrainingRecord::from_report(&f.report, &f.source, registry))
        .collect()
}

/// Write training records as a JSON array.
pub fn write_training(files: &[FileReport], registry: &RuleRegistry) -> anyhow::Result<()> {
    let records = training_records(files, registry);
    let json = serde_json::to_string_pretty(&records)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format to stdout.
pub fn write_pretty(ctx: &ReportContext<'_>, files: &[FileReport], registry: &RuleRegistry) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_pretty(&mut out, ctx, files, registry)?;
    out.flush()?;
    Ok(())
}

/// Render the pretty format into any writer.
pub fn render_pretty<W: Write>(
    out: &mut W,
    ctx: &ReportContext<'_>,
    files: &[FileReport],
    registry: &RuleRegistry,
) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(out, "  {} v{}", "powercheck".cyan().bold(), env!("CARGO_PKG_VERSION"))?;
    writeln!(out)?;

    writeln!(out, "  {}{}", "Checking: ".dimmed(), ctx.path)?;
    writeln!(out, "  {}{}", "Config:   ".dimmed(), ctx.config.unwrap_or("(defaults)"))?;
    let enabled = registry.iter().filter(|r| r.enabled).count();
    writeln!(out, "  {}{} enabled", "Rules:    ".dimmed(), enabled)?;
    writeln!(out)?;

    for file in files {
        write_file(out, ctx, file, registry)?;
    }

    if files.len() > 1 {
        write_batch_totals(out, ctx, files)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_file<W: Write>(
    out: &mut W,
    ctx: &ReportContext<'_>,
    file: &FileReport,
    registry: &RuleRegistry,
) -> io::Result<()> {
    let report = &file.report;

    writeln!(out, "  {}", file.path.blue().bold())?;
    write_result_summary(out, report, ctx.threshold)?;
    writeln!(out)?;

    if !report.violations.is_empty() {
        write_violations(out, report, registry)?;
        write_severity_counts(out, report, registry)?;
        writeln!(out)?;
    }

    if !report.metrics.is_empty() {
        write_metrics(out, &report.metrics)?;
        writeln!(out)?;
    }

    if !report.warnings.is_empty() {
        write_warnings(out, &report.warnings)?;
        writeln!(out)?;
    }

    if !report.suppressed.is_empty() {
        write_suppressed_summary(out, &report.suppressed, ctx.show_suppressed)?;
        writeln!(out)?;
    }

    if !report.deductions.is_empty() {
        write_breakdown(out, report)?;
        writeln!(out)?;
    }

    let advice = recommendations(report, registry);
    if !advice.is_empty() {
        writeln!(out, "  {}", "Recommendations:".bold())?;
        for (i, line) in advice.iter().enumerate() {
            writeln!(out, "    {}. {}", i + 1, line)?;
        }
        writeln!(out)?;
    }

    write_final_status(out, report, ctx.threshold)?;
    writeln!(out)
}

fn write_result_summary<W: Write>(out: &mut W, report: &ComplianceReport, threshold: u32) -> io::Result<()> {
    if report.passes(threshold) {
        write!(out, "  {}", "✓ PASS".green())?;
    } else {
        write!(out, "  {}", "✗ FAIL".red())?;
    }

    write!(out, "  Score: ")?;
    write_colored_score(out, report.score)?;
    write!(out, "  Level: ")?;
    write_colored_level(out, report.level)?;

    if !report.suppressed.is_empty() {
        write!(out, "  {}", format!("({} suppressed)", report.suppressed.len()).dimmed())?;
    }
    if !report.is_complete() {
        write!(out, "  {}", "[best effort]".yellow())?;
    }

    writeln!(out)
}

fn write_colored_score<W: Write>(out: &mut W, s: u32) -> io::Result<()> {
    let text = s.to_string();
    match ComplianceLevel::from_score(s) {
        ComplianceLevel::FullyCompliant => write!(out, "{}", text.green().bold()),
        ComplianceLevel::MinorIssues => write!(out, "{}", text.green()),
        ComplianceLevel::ModerateIssues => write!(out, "{}", text.yellow()),
        ComplianceLevel::MajorIssues => write!(out, "{}", text.yellow().bold()),
        ComplianceLevel::NonCompliant => write!(out, "{}", text.red()),
    }
}

fn write_colored_level<W: Write>(out: &mut W, level: ComplianceLevel) -> io::Result<()> {
    let label = level.label();
    match level {
        ComplianceLevel::FullyCompliant => write!(out, "{}", label.green().bold()),
        ComplianceLevel::MinorIssues => write!(out, "{}", label.green()),
        ComplianceLevel::ModerateIssues => write!(out, "{}", label.yellow()),
        ComplianceLevel::MajorIssues => write!(out, "{}", label.yellow().bold()),
        ComplianceLevel::NonCompliant => write!(out, "{}", label.red()),
    }
}

/// Violations grouped by severity, most severe first; line order within a group.
fn write_violations<W: Write>(out: &mut W, report: &ComplianceReport, registry: &RuleRegistry) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Violations".bold(), report.violations.len())?;
    writeln!(out)?;

    for severity in Severity::descending() {
        for v in report
            .violations
            .iter()
            .filter(|v| severity_of(v, registry) == severity)
        {
            write_severity_tag(out, severity)?;
            write!(out, "   {:<24}", v.rule_id.dimmed())?;
            writeln!(out, "{}", format!("line {}", v.line).dimmed())?;

            // Message on next line, indented
            writeln!(out, "            {}", v.message)?;
            if !v.snippet.is_empty() {
                writeln!(out, "            {}", format!("| {}", v.snippet).dimmed())?;
            }
            if let Some(rule) = registry.get(&v.rule_id) {
                writeln!(out, "            {}", format!("fix: {}", rule.suggestion).cyan())?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_severity_tag<W: Write>(out: &mut W, severity: Severity) -> io::Result<()> {
    match severity {
        Severity::Critical => write!(out, "    {} ", "CRIT ".red().bold()),
        Severity::Major => write!(out, "    {} ", "MAJOR".red()),
        Severity::Minor => write!(out, "    {} ", "MINOR".yellow()),
        Severity::Advisory => write!(out, "    {} ", "ADVIS".blue()),
    }
}

fn write_severity_counts<W: Write>(out: &mut W, report: &ComplianceReport, registry: &RuleRegistry) -> io::Result<()> {
    let counts: Vec<String> = Severity::descending()
        .iter()
        .map(|s| format!("{} {}", s, report.count_by_severity(registry, *s)))
        .collect();
    writeln!(out, "  {}", format!("By severity: {}", counts.join(", ")).dimmed())
}

fn write_metrics<W: Write>(out: &mut W, metrics: &[ComplexityMetrics]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Functions".bold(), metrics.len())?;
    writeln!(
        out,
        "    {}",
        format!(
            "{:<24} {:>6} {:>10} {:>8} {:>6} {:>7}",
            "name", "line", "cyclomatic", "nesting", "lines", "params"
        )
        .dimmed()
    )?;
    for m in metrics {
        writeln!(
            out,
            "    {:<24} {:>6} {:>10} {:>8} {:>6} {:>7}",
            m.function_name, m.start_line, m.cyclomatic_estimate, m.nesting_depth, m.line_count, m.parameter_count
        )?;
    }
    Ok(())
}

fn write_warnings<W: Write>(out: &mut W, warnings: &[AnalysisWarning]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Warnings".yellow(), warnings.len())?;
    for w in warnings {
        writeln!(
            out,
            "    {:<28}{} {}",
            w.kind.as_str().dimmed(),
            format!("line {}", w.line).dimmed(),
            w.message
        )?;
    }
    Ok(())
}

fn write_breakdown<W: Write>(out: &mut W, report: &ComplianceReport) -> io::Result<()> {
    writeln!(out, "  {}", "Breakdown:".bold())?;

    // Sort rules by points descending
    let mut deductions: Vec<_> = report.deductions.iter().collect();
    deductions.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.rule_id.cmp(&b.rule_id)));

    for d in deductions {
        let plural = if d.occurrences != 1 { "s" } else { "" };
        writeln!(
            out,
            "    {:<24} {:>3} pts ({} violation{})",
            d.rule_id, d.points, d.occurrences, plural
        )?;
    }
    Ok(())
}

fn write_final_status<W: Write>(out: &mut W, report: &ComplianceReport, threshold: u32) -> io::Result<()> {
    write!(out, "  {}", format!("Threshold: {}", threshold).dimmed())?;
    write!(out, "  Score: ")?;
    write_colored_score(out, report.score)?;
    write!(out, "  ")?;

    if report.passes(threshold) {
        write!(out, "{}", "PASSED".green())?;
    } else {
        write!(out, "{}", "FAILED".red())?;
    }
    writeln!(out)
}

fn write_suppressed_summary<W: Write>(
    out: &mut W,
    suppressed: &[SuppressedViolation],
    show_details: bool,
) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Suppressed".dimmed(), suppressed.len())?;

    if !show_details {
        writeln!(out, "    {}", "(use --show-suppressed to see details)".dimmed())?;
        return Ok(());
    }

    writeln!(out)?;
    for sv in suppressed {
        let v = &sv.violation;
        let s = &sv.suppression;

        write!(out, "    {:<24}", v.rule_id.dimmed())?;
        if s.suppression_type == SuppressionType::File {
            write!(out, "{}", "(file)".dimmed())?;
        } else {
            write!(out, "{}", format!("line {}", v.line).dimmed())?;
        }
        writeln!(out)?;

        if !s.reason.is_empty() {
            writeln!(out, "            {}", format!("reason: {:?}", s.reason).dimmed())?;
        }
    }
    Ok(())
}

fn write_batch_totals<W: Write>(out: &mut W, ctx: &ReportContext<'_>, files: &[FileReport]) -> io::Result<()> {
    let passed = files.iter().filter(|f| f.report.passes(ctx.threshold)).count();
    let failed = files.len() - passed;
    write!(out, "  {} checked, ", format!("{} files", files.len()).bold())?;
    write!(out, "{} ", passed.to_string().green())?;
    write!(out, "passed, ")?;
    if failed > 0 {
        write!(out, "{} ", failed.to_string().red())?;
    } else {
        write!(out, "{} ", failed)?;
    }
    writeln!(out, "failed")
}

/// Ordered remediation advice for a report.
pub fn recommendations(report: &ComplianceReport, registry: &RuleRegistry) -> Vec<String> {
    let mut advice = Vec::new();

    for (severity, lead) in [
        (Severity::Critical, "Address critical violations first"),
        (Severity::Major, "Fix major violations next"),
    ] {
        let mut rules: Vec<&str> = report
            .violations
            .iter()
            .filter(|v| severity_of(v, registry) == severity)
            .map(|v| v.rule_id.as_str())
            .collect();
        rules.sort_unstable();
        rules.dedup();
        if !rules.is_empty() {
            advice.push(format!("{}: {}", lead, rules.join(", ")));
        }
    }

    let lesser = report.count_by_severity(registry, Severity::Minor)
        + report.count_by_severity(registry, Severity::Advisory);
    if lesser > 0 {
        advice.push(format!("Review the remaining {} minor and advisory findings", lesser));
    }

    if !report.is_complete() {
        advice.push("Analysis was best effort; check the warnings before trusting the score".to_string());
    }

    advice
}
