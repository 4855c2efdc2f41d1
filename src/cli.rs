//! Command-line interface for powercheck.

use clap::{Parser, Subcommand};
use globset::GlobSet;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{self, Config};
use crate::engine::Engine;
use crate::report::{self, FileReport, ReportContext};
use crate::rules::{RuleRegistry, Standard};
use crate::score::MAX_SCORE;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default configuration file names to search for.
const DEFAULT_CONFIG_NAMES: &[&str] = &["powercheck.yaml", ".powercheck.yaml"];

/// File extensions checked when walking a directory.
const C_EXTENSIONS: &[&str] = &["c", "h"];

/// Configuration written by `powercheck init` when no template is named.
pub const DEFAULT_TEMPLATE: &str = include_str!("templates/powercheck.yaml");

/// Safety-critical C coding standard checker.
///
/// Powercheck scores C translation units against NASA Power of Ten,
/// MISRA-like and JPL-like rules. Each file starts at 100 and loses points
/// per violation; files below the threshold fail the check.
#[derive(Parser)]
#[command(name = "powercheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check C sources for rule violations
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// List the rules in the registry
    Rules(RulesArgs),
    /// Create a powercheck configuration from a template
    Init(InitArgs),
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or training
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Minimum acceptable score (exit non-zero if any file scores lower)
    #[arg(short, long)]
    pub threshold: Option<u32>,

    /// Only apply the rules of one standard: nasa, misra, or jpl
    #[arg(short, long)]
    pub standard: Option<String>,

    /// Show suppressed violations in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the rules command.
#[derive(Parser)]
pub struct RulesArgs {
    /// Only list the rules of one standard: nasa, misra, or jpl
    #[arg(short, long)]
    pub standard: Option<String>,

    /// Print the registry as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "powercheck.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Available configuration templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

/// All available templates.
static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "Power of Ten, MISRA and JPL rules; style rules off; pass at 75",
        content: DEFAULT_TEMPLATE,
    },
    Template {
        name: "strict",
        description: "Every rule in force, shorter functions, pass at 90",
        content: include_str!("templates/strict.yaml"),
    },
];

/// Discover a configuration file in the current directory.
fn discover_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn parse_standard(value: Option<&str>) -> Result<Option<Standard>, String> {
    value.map(str::parse::<Standard>).transpose()
}

/// Collect C sources under `root`, skipping hidden and vendored directories
/// and anything matched by `excluded`.
pub fn collect_files(root: &Path, excluded: &GlobSet) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            if e.file_type().is_dir() && (name == "vendor" || name == "third_party") {
                return false;
            }
            let relative = e.path().strip_prefix(root).unwrap_or(e.path());
            !excluded.is_match(relative) && !excluded.is_match(e.path())
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if C_EXTENSIONS.contains(&ext) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Read and analyze one file.
fn check_file(engine: &Engine, path: &Path, display: String) -> anyhow::Result<FileReport> {
    let bytes = std::fs::read(path).map_err(|e| anyhow::anyhow!("cannot read {}: {}", display, e))?;
    let report = engine
        .analyze(&bytes)
        .map_err(|e| anyhow::anyhow!("{}: {}", display, e))?;
    Ok(FileReport {
        path: display,
        source: String::from_utf8_lossy(&bytes).into_owned(),
        report,
    })
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    // Validate format
    if !matches!(args.format.as_str(), "pretty" | "json" | "training") {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'training'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let standard = match parse_standard(args.standard.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}, must be 'nasa', 'misra', or 'jpl'", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Discover configuration if not specified; defaults apply when none exists
    let config_path = args.config.clone().or_else(discover_config);
    let config = match &config_path {
        Some(path) => match Config::parse_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error parsing config {}: {}", path.display(), e);
                return Ok(EXIT_ERROR);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    let threshold = args.threshold.unwrap_or(config.min_score);
    if threshold > MAX_SCORE {
        eprintln!("Error: threshold must be between 0 and {}, got {}", MAX_SCORE, threshold);
        return Ok(EXIT_ERROR);
    }

    let mut registry = config.build_registry(&RuleRegistry::builtin()?)?;
    if let Some(standard) = standard {
        registry = registry.restricted_to(standard);
    }

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = if abs_path.is_dir() {
        collect_files(&abs_path, &config.excluded_matcher()?)?
    } else {
        vec![abs_path.clone()]
    };

    if files.is_empty() {
        eprintln!("Warning: no C files to check");
        return Ok(EXIT_SUCCESS);
    }

    let engine = Engine::new(registry, config.engine_settings());
    let checked: anyhow::Result<Vec<FileReport>> = files
        .par_iter()
        .map(|path| {
            let display = if abs_path.is_dir() {
                path.strip_prefix(&abs_path).unwrap_or(path).display().to_string()
            } else {
                args.path.display().to_string()
            };
            check_file(&engine, path, display)
        })
        .collect();

    let mut reports = match checked {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    reports.sort_by(|a, b| a.path.cmp(&b.path));

    let passed = reports.iter().filter(|r| r.report.passes(threshold)).count();
    tracing::info!(
        files = reports.len(),
        passed,
        failed = reports.len() - passed,
        threshold,
        "check finished"
    );

    // Output results
    let path_str = args.path.to_string_lossy().to_string();
    let config_str = config_path.as_ref().map(|p| p.to_string_lossy().to_string());
    let ctx = ReportContext {
        path: &path_str,
        config: config_str.as_deref(),
        threshold,
        show_suppressed: args.show_suppressed,
    };
    let registry = engine.registry();

    match args.format.as_str() {
        "json" => report::write_json(&ctx, &reports, registry)?,
        "training" => report::write_training(&reports, registry)?,
        _ => report::write_pretty(&ctx, &reports, registry)?,
    }

    // Return appropriate exit code
    if report::all_passed(&reports, threshold) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the rules command.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let standard = match parse_standard(args.standard.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}, must be 'nasa', 'misra', or 'jpl'", e);
            return Ok(EXIT_ERROR);
        }
    };

    let registry = RuleRegistry::builtin()?;
    let rules: Vec<_> = match standard {
        Some(s) => registry.by_standard(s).collect(),
        None => registry.iter().collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(EXIT_SUCCESS);
    }

    println!(
        "  {:<26} {:<9} {:<10} {:>7}  {:<8} {}",
        "ID", "STANDARD", "SEVERITY", "PENALTY", "ENABLED", "TITLE"
    );
    for rule in rules {
        println!(
            "  {:<26} {:<9} {:<10} {:>7}  {:<8} {}",
            rule.id,
            rule.standard.as_str(),
            rule.severity.as_str(),
            rule.penalty,
            if rule.enabled { "yes" } else { "no" },
            rule.title
        );
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // List mode
    if args.list {
        return list_templates();
    }

    // Find template
    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'powercheck init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    // Check if output already exists
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite it or --output to choose another path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    // Success message
    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune limits and rules", args.output.display());
    println!("  2. Run: powercheck check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// List available templates.
fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "default" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  powercheck init --template <name>");

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_templates_validate() {
        for template in TEMPLATES {
            let config = Config::parse_str(template.content).unwrap();
            config::validate(&config).unwrap();
        }
    }

    #[test]
    fn test_parse_standard() {
        assert_eq!(parse_standard(None), Ok(None));
        assert_eq!(parse_standard(Some("MISRA")), Ok(Some(Standard::Misra)));
        assert!(parse_standard(Some("iso")).is_err());
    }

    #[test]
    fn test_collect_files_skips_hidden_vendor_and_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/gen")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("vendor")).unwrap();
        fs::write(root.join("src/main.c"), "int main(void) { return 0; }\n").unwrap();
        fs::write(root.join("src/util.h"), "int util(void);\n").unwrap();
        fs::write(root.join("src/notes.txt"), "not c\n").unwrap();
        fs::write(root.join("src/gen/table.c"), "int t;\n").unwrap();
        fs::write(root.join(".git/hook.c"), "int h;\n").unwrap();
        fs::write(root.join("vendor/lib.c"), "int l;\n").unwrap();

        let config = Config {
            excluded_paths: vec!["src/gen/**".to_string()],
            ..Default::default()
        };
        let files = collect_files(root, &config.excluded_matcher().unwrap()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["src/main.c", "src/util.h"]);
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("powercheck.yaml");

        let args = InitArgs {
            output: output.clone(),
            template: "default".to_string(),
            list: false,
            force: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert_eq!(fs::read_to_string(&output).unwrap(), DEFAULT_TEMPLATE);
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);

        let forced = InitArgs {
            template: "strict".to_string(),
            force: true,
            ..args
        };
        assert_eq!(run_init(&forced).unwrap(), EXIT_SUCCESS);
        assert!(fs::read_to_string(&output).unwrap().contains("min_score: 90"));
    }

    #[test]
    fn test_check_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("clean.c"), "int main(void) {\n    return 0;\n}\n").unwrap();
        fs::write(
            root.join("bad.c"),
            "#include <stdlib.h>\nvoid f(void) {\n    char *p = malloc(4);\n    goto end;\nend:\n    free(p);\n}\n",
        )
        .unwrap();
        let config = root.join("powercheck.yaml");
        fs::write(&config, "min_score: 75\n").unwrap();

        let mut args = CheckArgs {
            path: root.join("clean.c"),
            config: Some(config.clone()),
            format: "json".to_string(),
            threshold: None,
            standard: None,
            show_suppressed: false,
        };
        assert_eq!(run_check(&args).unwrap(), EXIT_SUCCESS);

        args.path = root.to_path_buf();
        assert_eq!(run_check(&args).unwrap(), EXIT_FAILED);

        args.threshold = Some(0);
        assert_eq!(run_check(&args).unwrap(), EXIT_SUCCESS);

        args.threshold = None;
        args.standard = Some("misra".to_string());
        assert_eq!(run_check(&args).unwrap(), EXIT_SUCCESS);

        args.format = "xml".to_string();
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);

        args.format = "json".to_string();
        args.threshold = Some(101);
        assert_eq!(run_check(&args).unwrap(), EXIT_ERROR);
    }
}
