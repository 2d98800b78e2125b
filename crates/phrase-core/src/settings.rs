//! Decoder settings loaded from TOML.
//!
//! - `parse_settings_toml(toml_content)` parses and validates a full settings file
//! - `defaults()` returns `&'static Settings` built from the embedded defaults
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Get or initialize the embedded default settings.
pub fn defaults() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub search: SearchSettings,
    pub batch: BatchSettings,
}

/// Per-sentence search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SearchSettings {
    pub beam_size: BeamSize,
    pub distortion_limit: usize,
    pub distortion_weight: f64,
    pub max_candidates_per_span: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        defaults().search
    }
}

/// How many hypotheses each stack group keeps before it is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BeamSizeRepr")]
pub enum BeamSize {
    Bounded(NonZeroUsize),
    /// No pruning: search is exhaustive over recombination classes.
    Unbounded,
}

impl BeamSize {
    /// Bounded beam of `n` hypotheses. Returns `None` for zero.
    pub fn bounded(n: usize) -> Option<Self> {
        NonZeroUsize::new(n).map(Self::Bounded)
    }

    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some(n.get()),
            Self::Unbounded => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BeamSizeRepr {
    Count(i64),
    Keyword(String),
}

impl TryFrom<BeamSizeRepr> for BeamSize {
    type Error = String;

    fn try_from(repr: BeamSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            BeamSizeRepr::Count(n) => usize::try_from(n)
                .ok()
                .and_then(BeamSize::bounded)
                .ok_or_else(|| format!("beam_size must be positive, got {n}")),
            BeamSizeRepr::Keyword(k) if k == "unbounded" => Ok(BeamSize::Unbounded),
            BeamSizeRepr::Keyword(k) => Err(format!(
                "beam_size must be a positive integer or \"unbounded\", got \"{k}\""
            )),
        }
    }
}

/// Multi-sentence decoding parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    pub workers: usize,
    pub timeout_ms: u64,
    pub on_failure: FailurePolicy,
    pub failure_marker: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        defaults().batch.clone()
    }
}

/// What a sentence without a full-coverage translation turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Emit an empty line.
    Empty,
    /// Emit the best hypothesis of the deepest reachable stack group.
    Partial,
    /// Emit `failure_marker`.
    Marker,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

/// Read and validate a settings file.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path)?;
    parse_settings_toml(&content)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive_usize!(search.max_candidates_per_span);

    let weight = s.search.distortion_weight;
    if !weight.is_finite() || weight > 0.0 {
        return Err(SettingsError::InvalidValue {
            field: "search.distortion_weight".to_string(),
            reason: "must be finite and non-positive".to_string(),
        });
    }

    if s.batch.on_failure == FailurePolicy::Marker && s.batch.failure_marker.is_empty() {
        return Err(SettingsError::InvalidValue {
            field: "batch.failure_marker".to_string(),
            reason: "must be non-empty when on_failure = \"marker\"".to_string(),
        });
    }

    Ok(())
}
