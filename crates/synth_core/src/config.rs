//! Run configuration loaded from JSON.
//!
//! ```json
//! {
//!   "tile_size": 3,
//!   "allow_upside_down": false,
//!   "use_modulo_coords_top_and_bottom": false,
//!   "seed": 42,
//!   "resolve_mode": "greedy",
//!   "enlarge_at_once": 8
//! }
//! ```
//!
//! Every field is optional; missing fields take the defaults shown above
//! (except `seed`, which defaults to a random seed per run).

use crate::generator::ResolveMode;
use crate::sample::SampleConfig;
use crate::sparse_grid::DEFAULT_ENLARGE_AT_ONCE;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Errors raised while loading or validating a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// Malformed JSON or wrong field types
    Json(serde_json::Error),
    /// Values that parse but are not usable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Training and generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Tile edge length in blocks
    pub tile_size: u32,
    pub allow_upside_down: bool,
    pub use_modulo_coords_top_and_bottom: bool,
    /// Generation seed; random when absent
    pub seed: Option<u64>,
    pub resolve_mode: ResolveMode,
    /// Extra slots per sparse grid growth step
    pub enlarge_at_once: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            tile_size: 3,
            allow_upside_down: false,
            use_modulo_coords_top_and_bottom: false,
            seed: None,
            resolve_mode: ResolveMode::Greedy,
            enlarge_at_once: DEFAULT_ENLARGE_AT_ONCE,
        }
    }
}

impl SynthConfig {
    /// Reject values that cannot be used.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tile_size < 1 {
            return Err(ConfigError::Invalid(format!(
                "tile_size must be at least 1, got {}",
                self.tile_size
            )));
        }
        if self.enlarge_at_once < 1 {
            return Err(ConfigError::Invalid(
                "enlarge_at_once must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SynthConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: SynthConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        self.validate()?;
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Training switches for sample extraction.
    pub fn sample_config(&self) -> SampleConfig {
        SampleConfig {
            tile_size: self.tile_size,
            allow_upside_down: self.allow_upside_down,
            use_modulo_coords_top_and_bottom: self.use_modulo_coords_top_and_bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = SynthConfig::from_json("{}").unwrap();
        assert_eq!(config, SynthConfig::default());
        assert_eq!(config.tile_size, 3);
        assert_eq!(config.resolve_mode, ResolveMode::Greedy);
    }

    #[test]
    fn test_partial_document() {
        let config =
            SynthConfig::from_json(r#"{"tile_size": 4, "seed": 99, "resolve_mode": "strict"}"#)
                .unwrap();
        assert_eq!(config.tile_size, 4);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.resolve_mode, ResolveMode::Strict);
        assert!(!config.allow_upside_down);
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let err = SynthConfig::from_json(r#"{"tile_size": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SynthConfig::from_json(r#"{"enlarge_at_once": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SynthConfig::from_json(r#"{"tile_size": "big"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            SynthConfig::from_json(r#"{"resolve_mode": "backtracking"}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("synth.json");
        let config = SynthConfig {
            tile_size: 2,
            allow_upside_down: true,
            seed: Some(12345),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SynthConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = SynthConfig::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_sample_config_mirrors_switches() {
        let config = SynthConfig {
            tile_size: 5,
            use_modulo_coords_top_and_bottom: true,
            ..Default::default()
        };
        let sample = config.sample_config();
        assert_eq!(sample.tile_size, 5);
        assert!(sample.use_modulo_coords_top_and_bottom);
        assert!(!sample.allow_upside_down);
    }
}
