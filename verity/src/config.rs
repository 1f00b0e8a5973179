use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{Result, VerityError};

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse an enumerated env var strictly: an unrecognised value is a
/// configuration error rather than a silent fallback.
fn parse_env_strict<T>(var: &str, default: T) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => val
            .trim()
            .parse()
            .map_err(|e| VerityError::Config(format!("{var}: {e}"))),
        _ => Ok(default),
    }
}

/// How permissive statement recognition is. Higher levels widen the
/// lexicons and patterns, which only changes how many candidates are
/// generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for SensitivityLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown sensitivity level: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
    Markdown,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

/// Options for one analysis run. Passed explicitly to every operation;
/// nothing in the pipeline reads process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub sensitivity_level: SensitivityLevel,
    pub enable_triple_verification: bool,
    pub generate_forensic_hash: bool,
    /// Numeric values closer than this are not treated as conflicting.
    pub numeric_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sensitivity_level: SensitivityLevel::default(),
            enable_triple_verification: true,
            generate_forensic_hash: true,
            numeric_tolerance: 0.0,
        }
    }
}

impl AnalysisConfig {
    pub fn with_sensitivity(mut self, level: SensitivityLevel) -> Self {
        self.sensitivity_level = level;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.numeric_tolerance.is_finite() || self.numeric_tolerance < 0.0 {
            return Err(VerityError::Config(format!(
                "numeric tolerance must be a finite, non-negative number (got {})",
                self.numeric_tolerance
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Build configuration from `VERITY_*` environment variables.
    ///
    /// Booleans and the numeric tolerance fall back to their defaults with a
    /// warning; the sensitivity level and output format must be recognised.
    pub fn from_env() -> Result<Self> {
        let defaults = AnalysisConfig::default();
        let analysis = AnalysisConfig {
            sensitivity_level: parse_env_strict("VERITY_SENSITIVITY", defaults.sensitivity_level)?,
            enable_triple_verification: parse_env_or(
                "VERITY_TRIPLE_VERIFICATION",
                defaults.enable_triple_verification,
            ),
            generate_forensic_hash: parse_env_or(
                "VERITY_FORENSIC_HASH",
                defaults.generate_forensic_hash,
            ),
            numeric_tolerance: parse_env_or("VERITY_NUMERIC_TOLERANCE", defaults.numeric_tolerance),
        };
        analysis.validate()?;

        let output = OutputConfig {
            format: parse_env_strict("VERITY_OUTPUT_FORMAT", OutputFormat::default())?,
        };

        Ok(Self { analysis, output })
    }
}
