//! Cache configuration with precedence: defaults < config file < environment
use crate::errors::{Error, RecoveryHint, Result, SerializationOp};
use crate::format::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_COMPRESSION_THRESHOLD};
use crate::mode::CacheMode;
use kiln_core::{
    CONFIG_FILE_NAME, KILN_CACHE_COMPRESSION_LEVEL_VAR, KILN_CACHE_DIR_VAR,
    KILN_CACHE_ENABLED_VAR, KILN_CACHE_VAR,
};
use kiln_utils::xdg::XdgPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration of the cache store
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Whether caching is enabled at all
    pub enabled: bool,
    pub mode: CacheMode,
    /// Base directory for cache storage
    pub base_dir: PathBuf,
    /// zstd level used for large entries
    pub compression_level: i32,
    /// Entries below this payload size are stored uncompressed
    pub compression_threshold: usize,
    /// Where the effective values came from
    pub source: ConfigSource,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CacheMode::ReadWrite,
            base_dir: XdgPaths::cache_dir(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            source: ConfigSource::Default,
        }
    }
}

impl CacheConfig {
    /// Mode after applying the `enabled` switch
    pub fn effective_mode(&self) -> CacheMode {
        if self.enabled {
            self.mode
        } else {
            CacheMode::Off
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
}

/// The `cache` section of the config file; absent keys keep earlier values
#[derive(Debug, Default, Deserialize)]
struct FileCacheSection {
    enabled: Option<bool>,
    mode: Option<String>,
    base_dir: Option<PathBuf>,
    compression_level: Option<i32>,
    compression_threshold: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    cache: Option<FileCacheSection>,
}

/// Configuration loader that handles precedence
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Load configuration from the default config file location and the environment
    pub fn load() -> Result<CacheConfig> {
        Self::load_from(&XdgPaths::config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load configuration using an explicit config file path
    pub fn load_from(config_path: &Path) -> Result<CacheConfig> {
        let mut config = CacheConfig::default();
        Self::apply_config_file(&mut config, config_path)?;
        Self::apply_env(&mut config);
        Ok(config)
    }

    fn apply_config_file(config: &mut CacheConfig, config_path: &Path) -> Result<()> {
        if !config_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| Error::Io {
            path: config_path.to_path_buf(),
            operation: "read config file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: config_path.to_path_buf(),
            },
        })?;

        let file_config: FileConfig =
            serde_json::from_str(&content).map_err(|e| Error::Serialization {
                key: config_path.display().to_string(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Check config file syntax".to_string(),
                },
            })?;

        let Some(section) = file_config.cache else {
            return Ok(());
        };

        if let Some(enabled) = section.enabled {
            config.enabled = enabled;
        }
        if let Some(mode) = section.mode {
            config.mode = CacheMode::from(mode);
        }
        if let Some(base_dir) = section.base_dir {
            config.base_dir = base_dir;
        }
        if let Some(level) = section.compression_level {
            config.compression_level = level;
        }
        if let Some(threshold) = section.compression_threshold {
            config.compression_threshold = threshold;
        }
        config.source = ConfigSource::ConfigFile(config_path.to_path_buf());

        Ok(())
    }

    fn apply_env(config: &mut CacheConfig) {
        let mut from_env = false;

        if let Ok(mode) = std::env::var(KILN_CACHE_VAR) {
            config.mode = CacheMode::from(mode);
            from_env = true;
        }

        // Explicit enabled/disabled setting takes precedence over the mode
        if let Ok(enabled) = std::env::var(KILN_CACHE_ENABLED_VAR) {
            config.enabled = enabled.eq_ignore_ascii_case("true") || enabled == "1";
            from_env = true;
        }

        if let Ok(dir) = std::env::var(KILN_CACHE_DIR_VAR) {
            config.base_dir = PathBuf::from(dir);
            from_env = true;
        }

        if let Ok(level) = std::env::var(KILN_CACHE_COMPRESSION_LEVEL_VAR) {
            match level.parse::<i32>() {
                Ok(level) => {
                    config.compression_level = level;
                    from_env = true;
                }
                Err(_) => tracing::warn!(
                    "Ignoring invalid {}={}",
                    KILN_CACHE_COMPRESSION_LEVEL_VAR,
                    level
                ),
            }
        }

        if from_env {
            config.source = ConfigSource::EnvironmentVariable(format!("{KILN_CACHE_VAR}*"));
        }
    }
}
