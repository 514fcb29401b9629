//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Scene Evaluation Configuration
///
/// Controls how hierarchy passes are scheduled and the numeric tolerances
/// used when inverting world matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Evaluate independent subtrees on the rayon thread pool
    pub parallel_evaluation: bool,
    /// Smallest depth level worth splitting across threads
    pub parallel_min_level_width: usize,
    /// Singular-value cutoff for pseudo-inverting singular world matrices
    pub inversion_epsilon: f32,
    /// Half-size of the bounds reported for objects without geometry
    pub default_bounds_half_size: f32,
    /// `env_logger` filter applied by [`crate::foundation::logging::init_from_config`]
    pub log_filter: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            parallel_evaluation: true,
            parallel_min_level_width: 64,
            inversion_epsilon: 1e-6,
            default_bounds_half_size: 1.0,
            log_filter: "info".to_string(),
        }
    }
}

impl Config for SceneConfig {}

impl SceneConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel level evaluation
    pub fn with_parallel_evaluation(mut self, enabled: bool) -> Self {
        self.parallel_evaluation = enabled;
        self
    }

    /// Set the minimum level width for parallel evaluation
    pub fn with_parallel_min_level_width(mut self, width: usize) -> Self {
        self.parallel_min_level_width = width;
        self
    }

    /// Set the inversion epsilon
    pub fn with_inversion_epsilon(mut self, epsilon: f32) -> Self {
        self.inversion_epsilon = epsilon;
        self
    }

    /// Set the fallback bounds half-size
    pub fn with_default_bounds_half_size(mut self, half_size: f32) -> Self {
        self.default_bounds_half_size = half_size;
        self
    }

    /// Set the log filter
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.parallel_min_level_width == 0 {
            return Err("Parallel minimum level width must be at least 1".to_string());
        }

        if !(self.inversion_epsilon.is_finite() && self.inversion_epsilon > 0.0) {
            return Err(format!("Inversion epsilon must be positive, got {}", self.inversion_epsilon));
        }

        if !(self.default_bounds_half_size.is_finite() && self.default_bounds_half_size >= 0.0) {
            return Err(format!(
                "Default bounds half-size must be non-negative, got {}",
                self.default_bounds_half_size
            ));
        }

        Ok(())
    }

    /// Load from file and validate
    pub fn load_validated(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(SceneConfig::new().with_parallel_min_level_width(0).validate().is_err());
        assert!(SceneConfig::new().with_inversion_epsilon(0.0).validate().is_err());
        assert!(SceneConfig::new().with_default_bounds_half_size(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_save_and_load_toml_and_ron() {
        let config = SceneConfig::new()
            .with_parallel_evaluation(false)
            .with_parallel_min_level_width(8)
            .with_log_filter("scene_object=debug");

        for ext in ["toml", "ron"] {
            let path = std::env::temp_dir().join(format!("scene_object_config_test_{}.{ext}", std::process::id()));
            let path = path.to_string_lossy().into_owned();

            config.save_to_file(&path).unwrap();
            let loaded = SceneConfig::load_validated(&path).unwrap();
            std::fs::remove_file(&path).unwrap();

            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = SceneConfig::default().save_to_file("scene.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: SceneConfig = toml::from_str("parallel_evaluation = false").unwrap();
        assert!(!config.parallel_evaluation);
        assert_eq!(config.parallel_min_level_width, 64);
    }
}
