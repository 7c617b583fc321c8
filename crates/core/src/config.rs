//! Highlight engine configuration.
//!
//! Configuration can be loaded from a TOML file, environment variables, or
//! created programmatically with the `with_*` builders.

use crate::error::ConfigError;
use crate::grouping::LINE_TOLERANCE;
use crate::highlight::HighlightType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for matching, grouping and the density guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Max top-edge difference (layout units) for spans to share a line
    pub line_tolerance: f32,
    /// Ceiling on highlighted fraction for keyword matches
    pub keyword_density_ceiling: f64,
    /// Ceiling on highlighted fraction for semantic matches
    pub semantic_density_ceiling: f64,
    /// Similarity threshold forwarded to the semantic service
    pub semantic_threshold: f32,
    pub highlight_type: HighlightType,
    /// Query terms shorter than this are not highlighted on their own
    pub min_term_chars: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            line_tolerance: LINE_TOLERANCE,
            keyword_density_ceiling: 0.5,
            semantic_density_ceiling: 0.9,
            semantic_threshold: 0.5,
            highlight_type: HighlightType::Both,
            min_term_chars: 3,
        }
    }
}

impl HighlightConfig {
    pub fn with_line_tolerance(mut self, tolerance: f32) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    pub fn with_density_ceilings(mut self, keyword: f64, semantic: f64) -> Self {
        self.keyword_density_ceiling = keyword;
        self.semantic_density_ceiling = semantic;
        self
    }

    pub fn with_semantic_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold = threshold;
        self
    }

    pub fn with_highlight_type(mut self, highlight_type: HighlightType) -> Self {
        self.highlight_type = highlight_type;
        self
    }

    /// Density ceiling for a matching mode. `Both` may return semantic
    /// phrases, so it gets the semantic ceiling.
    pub fn density_ceiling(&self, mode: HighlightType) -> f64 {
        match mode {
            HighlightType::Keyword => self.keyword_density_ceiling,
            HighlightType::Semantic | HighlightType::Both => self.semantic_density_ceiling,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SEEKMARK_LINE_TOLERANCE`
    /// - `SEEKMARK_KEYWORD_DENSITY`
    /// - `SEEKMARK_SEMANTIC_DENSITY`
    /// - `SEEKMARK_SEMANTIC_THRESHOLD`
    /// - `SEEKMARK_HIGHLIGHT_TYPE` (`keyword`, `semantic` or `both`)
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = env_parse("SEEKMARK_LINE_TOLERANCE")? {
            config.line_tolerance = value;
        }
        if let Some(value) = env_parse("SEEKMARK_KEYWORD_DENSITY")? {
            config.keyword_density_ceiling = value;
        }
        if let Some(value) = env_parse("SEEKMARK_SEMANTIC_DENSITY")? {
            config.semantic_density_ceiling = value;
        }
        if let Some(value) = env_parse("SEEKMARK_SEMANTIC_THRESHOLD")? {
            config.semantic_threshold = value;
        }
        if let Ok(value) = std::env::var("SEEKMARK_HIGHLIGHT_TYPE") {
            config.highlight_type = HighlightType::parse(&value).ok_or_else(|| {
                ConfigError::InvalidValue("SEEKMARK_HIGHLIGHT_TYPE".to_string())
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file. Missing keys keep their defaults.
    ///
    /// ```toml
    /// line_tolerance = 5.0
    /// keyword_density_ceiling = 0.5
    /// semantic_density_ceiling = 0.9
    /// highlight_type = "semantic"
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.line_tolerance.is_finite() && self.line_tolerance >= 0.0) {
            return Err(ConfigError::InvalidValue("line_tolerance".to_string()));
        }
        for (key, ceiling) in [
            ("keyword_density_ceiling", self.keyword_density_ceiling),
            ("semantic_density_ceiling", self.semantic_density_ceiling),
        ] {
            if !(0.0..=1.0).contains(&ceiling) {
                return Err(ConfigError::InvalidValue(key.to_string()));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(None),
    }
}
