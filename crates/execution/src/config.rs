//! Engine configuration

use kiln_cache::{CacheConfig, CacheConfigLoader};
use kiln_core::HISTORY_DIR_NAME;
use kiln_utils::xdg::XdgPaths;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    /// Where previous execution records are kept
    pub history_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            history_dir: XdgPaths::state_dir().join(HISTORY_DIR_NAME),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with the config file and environment
    pub fn load() -> kiln_cache::Result<Self> {
        Ok(Self {
            cache: CacheConfigLoader::load()?,
            ..Self::default()
        })
    }

    /// Keep cache and history below a single directory
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            cache: CacheConfig::default().with_base_dir(dir.join("cache")),
            history_dir: dir.join(HISTORY_DIR_NAME),
        }
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_history_dir(mut self, history_dir: impl Into<PathBuf>) -> Self {
        self.history_dir = history_dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_cache::CacheMode;
    use kiln_core::{KILN_CACHE_DIR_VAR, KILN_CACHE_VAR};
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_load_uses_xdg_and_environment() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path().join("config"));
        std::env::set_var("XDG_STATE_HOME", dir.path().join("state"));
        std::env::set_var(KILN_CACHE_VAR, "off");
        std::env::set_var(KILN_CACHE_DIR_VAR, dir.path().join("objects"));

        let config = EngineConfig::load();

        for var in ["XDG_CONFIG_HOME", "XDG_STATE_HOME", KILN_CACHE_VAR, KILN_CACHE_DIR_VAR] {
            std::env::remove_var(var);
        }

        let config = config.unwrap();
        assert_eq!(config.history_dir, dir.path().join("state/kiln/history"));
        assert_eq!(config.cache.base_dir, dir.path().join("objects"));
        assert_eq!(config.cache.effective_mode(), CacheMode::Off);
    }

    #[test]
    fn test_rooted_at() {
        let config = EngineConfig::rooted_at(Path::new("/tmp/build"));
        assert_eq!(config.cache.base_dir, PathBuf::from("/tmp/build/cache"));
        assert_eq!(config.history_dir, PathBuf::from("/tmp/build/history"));
    }
}
