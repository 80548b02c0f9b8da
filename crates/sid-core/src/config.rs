use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SidError;

/// Alignment strategy selector exposed to callers.
///
/// # Example
/// ```
/// use sid_core::config::StrategyKind;
/// let kind: StrategyKind = "banded".parse().unwrap();
/// assert_eq!(kind, StrategyKind::Banded);
/// assert!(kind.needs_width());
/// assert!("sakoe".parse::<StrategyKind>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Full DTW, every cell visited.
    #[default]
    Exact,
    /// Diagonal band, half-width `max(width, 2·|N−M|) / 2`.
    Banded,
    /// Second band, half-width `max(width / 2, |N−M|)`.
    Beam,
}

impl StrategyKind {
    /// Every selectable strategy, in display order.
    pub const ALL: [Self; 3] = [Self::Exact, Self::Banded, Self::Beam];

    /// Lowercase name used in config files, CLI flags and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Banded => "banded",
            Self::Beam => "beam",
        }
    }

    /// `true` for strategies that require a pruning width.
    #[must_use]
    pub fn needs_width(self) -> bool {
        !matches!(self, Self::Exact)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "full" | "none" => Ok(Self::Exact),
            "banded" | "band" | "pruning" => Ok(Self::Banded),
            "beam" => Ok(Self::Beam),
            other => Err(SidError::InvalidConfig(format!(
                "unknown strategy '{other}' (expected exact, banded or beam)"
            ))),
        }
    }
}

/// What the batch evaluator does when one sample fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing sample (in sample order) and return its error.
    AbortOnFirstError,
    /// Keep going, record the failure in the report and exclude the sample
    /// from the totals.
    #[default]
    SkipAndRecord,
}

impl FromStr for FailurePolicy {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "abort" | "abort_on_first_error" => Ok(Self::AbortOnFirstError),
            "skip" | "skip_and_record" => Ok(Self::SkipAndRecord),
            other => Err(SidError::InvalidConfig(format!(
                "unknown failure policy '{other}' (expected abort or skip)"
            ))),
        }
    }
}

/// Configuration complète d'un run de matching.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use sid_core::config::{MatchConfig, StrategyKind};
/// let config = MatchConfig::default();
/// assert_eq!(config.strategy, StrategyKind::Exact);
/// assert!(config.width.is_none());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MatchConfig {
    // === Matching ===
    /// Alignment strategy used for every comparison.
    pub strategy: StrategyKind,
    /// Pruning width for banded/beam. Validated when the strategy is built.
    pub width: Option<i64>,
    /// Reduce over templates in parallel inside one identification.
    pub parallel_templates: bool,

    // === Évaluation ===
    /// Classify test samples in parallel.
    pub parallel_samples: bool,
    /// Worker threads for the rayon pool. 0 = rayon default.
    pub threads: usize,
    /// Behaviour when a test sample fails.
    pub failure_policy: FailurePolicy,

    // === Chemins ===
    /// Training store root (batch layout).
    pub train_dir: Option<PathBuf>,
    /// Test store root (batch layout).
    pub test_dir: Option<PathBuf>,
    /// Single-template database directory (`<label>.txt`).
    pub database_dir: Option<PathBuf>,
    /// Text report written after an evaluation.
    pub report_path: Option<PathBuf>,
    /// JSON report written after an evaluation.
    pub json_report_path: Option<PathBuf>,
}

/// Upper bound for the `threads` setting.
pub const MAX_THREADS: usize = 256;

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Exact,
            width: None,
            parallel_templates: false,
            parallel_samples: true,
            threads: 0,
            failure_policy: FailurePolicy::SkipAndRecord,
            train_dir: None,
            test_dir: None,
            database_dir: None,
            report_path: None,
            json_report_path: None,
        }
    }
}

impl MatchConfig {
    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization.
    pub fn clamp_all(&mut self) {
        self.threads = self.threads.min(MAX_THREADS);
    }
}

/// Structure TOML intermédiaire, toutes sections optionnelles.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    matching: Option<MatchingSection>,
    evaluation: Option<EvaluationSection>,
    paths: Option<PathsSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MatchingSection {
    strategy: Option<StrategyKind>,
    width: Option<i64>,
    parallel_templates: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluationSection {
    parallel: Option<bool>,
    threads: Option<usize>,
    failure_policy: Option<FailurePolicy>,
    report: Option<PathBuf>,
    json_report: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PathsSection {
    train: Option<PathBuf>,
    test: Option<PathBuf>,
    database: Option<PathBuf>,
}

/// Parse a TOML document and merge it over the defaults.
///
/// # Errors
/// Returns an error if the document is not valid TOML or has unknown keys.
///
/// # Example
/// ```
/// use sid_core::config::{parse_config, StrategyKind};
/// let config = parse_config("[matching]\nstrategy = \"beam\"\nwidth = 40\n").unwrap();
/// assert_eq!(config.strategy, StrategyKind::Beam);
/// assert_eq!(config.width, Some(40));
/// ```
pub fn parse_config(content: &str) -> Result<MatchConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = MatchConfig::default();

    if let Some(m) = file.matching {
        if let Some(v) = m.strategy {
            config.strategy = v;
        }
        if let Some(v) = m.width {
            config.width = Some(v);
        }
        if let Some(v) = m.parallel_templates {
            config.parallel_templates = v;
        }
    }

    if let Some(e) = file.evaluation {
        if let Some(v) = e.parallel {
            config.parallel_samples = v;
        }
        if let Some(v) = e.threads {
            config.threads = v;
        }
        if let Some(v) = e.failure_policy {
            config.failure_policy = v;
        }
        if let Some(v) = e.report {
            config.report_path = Some(v);
        }
        if let Some(v) = e.json_report {
            config.json_report_path = Some(v);
        }
    }

    if let Some(p) = file.paths {
        if let Some(v) = p.train {
            config.train_dir = Some(v);
        }
        if let Some(v) = p.test {
            config.test_dir = Some(v);
        }
        if let Some(v) = p.database {
            config.database_dir = Some(v);
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use sid_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<MatchConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::debug!("Configuration chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.strategy, StrategyKind::Exact);
        assert!(config.parallel_samples);
        assert_eq!(config.failure_policy, FailurePolicy::SkipAndRecord);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let doc = r#"
[evaluation]
threads = 100000
failure_policy = "abort_on_first_error"

[paths]
train = "data/train"
"#;
        let config = parse_config(doc).unwrap();
        assert_eq!(config.threads, MAX_THREADS);
        assert_eq!(config.failure_policy, FailurePolicy::AbortOnFirstError);
        assert_eq!(config.train_dir.as_deref(), Some(Path::new("data/train")));
        assert!(config.test_dir.is_none());
        assert_eq!(config.strategy, StrategyKind::Exact);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse_config("[matching]\nbandwidth = 3\n").is_err());
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speakerid.toml");
        std::fs::write(&path, "[matching]\nstrategy = \"banded\"\nwidth = 12\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.strategy, StrategyKind::Banded);
        assert_eq!(config.width, Some(12));
    }

    #[test]
    fn shipped_default_config_parses() {
        let config = parse_config(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.strategy, StrategyKind::Exact);
        assert_eq!(config.report_path.as_deref(), Some(Path::new("result.txt")));
    }

    #[test]
    fn policy_aliases() {
        assert_eq!(
            "abort".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::AbortOnFirstError
        );
        assert_eq!(
            "skip-and-record".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::SkipAndRecord
        );
    }
}
