use kiln_core::APP_DIR_NAME;
use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for kiln
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/kiln or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join(APP_DIR_NAME)
    }

    /// Get XDG_STATE_HOME/kiln or fallback
    pub fn state_dir() -> PathBuf {
        env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".local/state"))
                    .unwrap_or_else(|| PathBuf::from(".local/state"))
            })
            .join(APP_DIR_NAME)
    }

    /// Get XDG_CACHE_HOME/kiln or fallback
    pub fn cache_dir() -> PathBuf {
        env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".cache"))
                    .unwrap_or_else(|| PathBuf::from(".cache"))
            })
            .join(APP_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cache_dir_respects_xdg() {
        let original = env::var("XDG_CACHE_HOME").ok();
        env::set_var("XDG_CACHE_HOME", "/tmp/xdg-cache-test");

        assert_eq!(
            XdgPaths::cache_dir(),
            PathBuf::from("/tmp/xdg-cache-test").join("kiln")
        );

        match original {
            Some(value) => env::set_var("XDG_CACHE_HOME", value),
            None => env::remove_var("XDG_CACHE_HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_state_dir_ends_with_app_name() {
        assert!(XdgPaths::state_dir().ends_with("kiln"));
        assert!(XdgPaths::config_dir().ends_with("kiln"));
    }
}
