//! Rule definitions and the immutable rule registry.
//!
//! The registry is built once, from the static table in [`catalog`] plus any
//! overrides loaded from configuration, and is read-only afterwards. It is
//! shared by reference across every analysis, including parallel ones.

pub mod catalog;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::ids;

/// Errors raised while building a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),
    #[error("rule id must not be empty")]
    EmptyRuleId,
    #[error("unknown rule id in override: {0}")]
    UnknownRule(String),
    #[error("rule {0} is overridden more than once")]
    DuplicateOverride(String),
}

/// Rule family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Standard {
    Nasa,
    Misra,
    Jpl,
}

impl Standard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Standard::Nasa => "NASA",
            Standard::Misra => "MISRA",
            Standard::Jpl => "JPL",
        }
    }

    pub fn all() -> [Standard; 3] {
        [Standard::Nasa, Standard::Misra, Standard::Jpl]
    }
}

impl std::fmt::Display for Standard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Standard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nasa" => Ok(Standard::Nasa),
            "misra" => Ok(Standard::Misra),
            "jpl" => Ok(Standard::Jpl),
            _ => Err(format!("unknown standard: {}", s)),
        }
    }
}

/// Ordinal severity: advisory < minor < major < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Advisory,
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Advisory => "advisory",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }

    /// Score deduction used when a rule does not set its own penalty.
    pub fn default_penalty(&self) -> u32 {
        match self {
            Severity::Advisory => 2,
            Severity::Minor => 5,
            Severity::Major => 10,
            Severity::Critical => 15,
        }
    }

    /// Most severe first, for grouped output.
    pub fn descending() -> [Severity; 4] {
        [Severity::Critical, Severity::Major, Severity::Minor, Severity::Advisory]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "advisory" => Ok(Severity::Advisory),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// A single rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub standard: Standard,
    pub title: String,
    pub severity: Severity,
    pub penalty: u32,
    pub suggestion: String,
    pub enabled: bool,
    /// Per-rule cap on counted occurrences; falls back to the scoring policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<u32>,
}

impl Rule {
    fn from_entry(entry: &catalog::RuleEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            standard: entry.standard,
            title: entry.title.to_string(),
            severity: entry.severity,
            penalty: entry.severity.default_penalty(),
            suggestion: entry.suggestion.to_string(),
            enabled: entry.enabled,
            max_occurrences: None,
        }
    }
}

/// Configuration-supplied adjustments to one rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOverride {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub penalty: Option<u32>,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
}

/// Immutable, ordered collection of rules keyed by id.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    /// Build a registry, rejecting empty or repeated ids.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(RegistryError::EmptyRuleId);
            }
            if index.insert(rule.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateRule(rule.id.clone()));
            }
        }
        Ok(Self { rules, index })
    }

    /// The built-in rule set.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(catalog::BUILTIN_RULES.iter().map(Rule::from_entry).collect())
    }

    /// Return a new registry with the given overrides applied.
    ///
    /// A severity override without an explicit penalty also moves the
    /// penalty to the new severity's default.
    pub fn with_overrides(&self, overrides: &[RuleOverride]) -> Result<Self, RegistryError> {
        let mut rules = self.rules.clone();
        let mut seen = HashSet::new();

        for o in overrides {
            let Some(&i) = self.index.get(&o.id) else {
                return Err(RegistryError::UnknownRule(o.id.clone()));
            };
            if !seen.insert(o.id.as_str()) {
                return Err(RegistryError::DuplicateOverride(o.id.clone()));
            }

            let rule = &mut rules[i];
            if let Some(enabled) = o.enabled {
                rule.enabled = enabled;
            }
            if let Some(severity) = o.severity {
                rule.severity = severity;
                rule.penalty = severity.default_penalty();
            }
            if let Some(penalty) = o.penalty {
                rule.penalty = penalty;
            }
            if o.max_occurrences.is_some() {
                rule.max_occurrences = o.max_occurrences;
            }
        }

        Self::new(rules)
    }

    /// Return a new registry in which only one standard's rules stay enabled.
    pub fn restricted_to(&self, standard: Standard) -> Self {
        let rules = self
            .rules
            .iter()
            .cloned()
            .map(|mut r| {
                r.enabled = r.enabled && r.standard == standard;
                r
            })
            .collect();
        Self {
            rules,
            index: self.index.clone(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    /// True when `id` names a registered, enabled rule.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.get(id).map(|r| r.enabled).unwrap_or(false)
    }

    pub fn by_standard(&self, standard: Standard) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.standard == standard)
    }

    /// Rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
