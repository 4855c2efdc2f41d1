//! Configuration file schema for powercheck.
//!
//! A configuration tunes the scoring policy, detector limits and rule set,
//! and lists paths to leave out of directory scans. Every key is optional.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::detect::DetectorLimits;
use crate::engine::EngineSettings;
use crate::rules::{RegistryError, RuleOverride, RuleRegistry};
use crate::score::{ScoringPolicy, DEFAULT_MAX_OCCURRENCES, MAX_SCORE};

/// Default pass threshold for `powercheck check`.
pub const DEFAULT_MIN_SCORE: u32 = 75;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// Minimum score a unit needs to pass
    #[serde(default = "default_min_score")]
    pub min_score: u32,
    /// Occurrences of one rule counted toward the score
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: u32,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Honour `powercheck:ignore` comments
    #[serde(default = "default_true")]
    pub suppressions: bool,
    /// Glob patterns for paths to exclude from directory scans (e.g., "**/vendor/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleOverride>,
}

/// Numeric detector limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_parameters")]
    pub max_parameters: usize,
    #[serde(default = "default_max_function_lines")]
    pub max_function_lines: usize,
}

fn default_version() -> String {
    "1".to_string()
}

fn default_min_score() -> u32 {
    DEFAULT_MIN_SCORE
}

fn default_max_occurrences() -> u32 {
    DEFAULT_MAX_OCCURRENCES
}

fn default_true() -> bool {
    true
}

fn default_max_parameters() -> usize {
    DetectorLimits::default().max_parameters
}

fn default_max_function_lines() -> usize {
    DetectorLimits::default().max_function_lines
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_parameters: default_max_parameters(),
            max_function_lines: default_max_function_lines(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            min_score: default_min_score(),
            max_occurrences: default_max_occurrences(),
            limits: LimitsConfig::default(),
            suppressions: true,
            excluded_paths: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. An empty document yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Engine settings derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            limits: DetectorLimits {
                max_parameters: self.limits.max_parameters,
                max_function_lines: self.limits.max_function_lines,
            },
            scoring: ScoringPolicy {
                max_occurrences: self.max_occurrences,
            },
            suppressions: self.suppressions,
        }
    }

    /// Apply this configuration's rule overrides to `base`.
    pub fn build_registry(&self, base: &RuleRegistry) -> Result<RuleRegistry, RegistryError> {
        base.with_overrides(&self.rules)
    }

    /// Compile `excluded_paths` into one matcher.
    /// Uses globset, which supports `**` for recursive directory matching.
    pub fn excluded_matcher(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }
        self.excluded_matcher()
            .map(|set| set.is_match(path))
            .unwrap_or(false)
    }
}

/// Validate a configuration.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.min_score > MAX_SCORE {
        anyhow::bail!("min_score must be between 0 and {}, got {}", MAX_SCORE, config.min_score);
    }
    if config.max_occurrences == 0 {
        anyhow::bail!("max_occurrences must be at least 1");
    }
    if config.limits.max_parameters == 0 {
        anyhow::bail!("limits.max_parameters must be at least 1");
    }
    if config.limits.max_function_lines == 0 {
        anyhow::bail!("limits.max_function_lines must be at least 1");
    }

    for pattern in &config.excluded_paths {
        Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    for rule in &config.rules {
        if rule.max_occurrences == Some(0) {
            anyhow::bail!("rule {}: max_occurrences must be at least 1", rule.id);
        }
    }

    // Unknown or repeated rule ids.
    let base = RuleRegistry::builtin()?;
    config.build_registry(&base)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ids, Severity};

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1"
min_score: 80
max_occurrences: 5
limits:
  max_parameters: 4
suppressions: false
excluded_paths:
  - "**/vendor/**"
rules:
  - id: JPL-SHORT-IDENTIFIER
    enabled: true
    severity: minor
  - id: NASA-GOTO
    penalty: 20
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.min_score, 80);
        assert_eq!(config.limits.max_parameters, 4);
        assert_eq!(config.limits.max_function_lines, 50);
        assert!(!config.suppressions);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].severity, Some(Severity::Minor));
        validate(&config).unwrap();

        let settings = config.engine_settings();
        assert_eq!(settings.scoring.max_occurrences, 5);
        assert_eq!(settings.limits.max_parameters, 4);

        let registry = config.build_registry(&RuleRegistry::builtin().unwrap()).unwrap();
        assert!(registry.is_enabled(ids::SHORT_IDENTIFIER));
        assert_eq!(registry.get(ids::GOTO).unwrap().penalty, 20);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.min_score, DEFAULT_MIN_SCORE);
        validate(&config).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            min_score: 101,
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        let config = Config {
            max_occurrences: 0,
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        let config = Config {
            excluded_paths: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        let config = Config::parse_str("rules:\n  - id: NASA-UNKNOWN\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("NASA-UNKNOWN"));
    }

    #[test]
    fn test_is_path_excluded() {
        let config = Config {
            excluded_paths: vec!["**/vendor/**".to_string(), "**/*_gen.c".to_string()],
            ..Default::default()
        };
        assert!(config.is_path_excluded(Path::new("src/vendor/lib/x.c")));
        assert!(config.is_path_excluded(Path::new("src/table_gen.c")));
        assert!(!config.is_path_excluded(Path::new("src/main.c")));
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse_str(crate::cli::DEFAULT_TEMPLATE).unwrap();
        validate(&config).unwrap();
    }
}
