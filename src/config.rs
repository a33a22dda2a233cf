//! Pipeline configuration, TOML-loadable with per-section defaults.
//! Every knob has a working default so the pipeline runs with no file at
//! all; a partial file overrides only the sections it names.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub analysis: AnalysisConfig,
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub languages: LanguageConfig,
}

/// Frame admission and analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum interval between admitted frames, in milliseconds.
    /// Balances overlay responsiveness against translation load.
    pub min_frame_interval_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_frame_interval_ms: 800,
        }
    }
}

/// Remote translation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    /// Whole-request timeout; a hung call degrades like any remote failure.
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.example.com/translate".to_string(),
            timeout_ms: 8000,
        }
    }
}

/// Translation-result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 512,
            ttl_secs: 600,
        }
    }
}

/// Initial translation direction; updatable at runtime via the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub source: String,
    pub target: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            source: "es".to_string(),
            target: "en".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn min_frame_interval(&self) -> Duration {
        Duration::from_millis(self.analysis.min_frame_interval_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String, std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "failed to read {path}: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.analysis.min_frame_interval_ms, 800);
        assert_eq!(config.remote.timeout_ms, 8000);
        assert_eq!(config.cache.capacity, 512);
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.languages.source, "es");
        assert_eq!(config.languages.target, "en");
        assert_eq!(config.min_frame_interval(), Duration::from_millis(800));
    }

    #[test]
    fn partial_file_overrides_only_named_sections() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[analysis]\nmin_frame_interval_ms = 1200\n\n[languages]\nsource = \"ja\"\ntarget = \"en\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.analysis.min_frame_interval_ms, 1200);
        assert_eq!(config.languages.source, "ja");
        // Untouched sections keep defaults.
        assert_eq!(config.remote.timeout_ms, 8000);
        assert_eq!(config.cache.capacity, 512);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/lingolens.toml")).is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not toml at all {{{{").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
