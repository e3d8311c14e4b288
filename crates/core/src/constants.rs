/// Constants used throughout the kiln codebase
// Environment variable names
pub const KILN_CACHE_VAR: &str = "KILN_CACHE";
pub const KILN_CACHE_ENABLED_VAR: &str = "KILN_CACHE_ENABLED";
pub const KILN_CACHE_DIR_VAR: &str = "KILN_CACHE_DIR";
pub const KILN_CACHE_COMPRESSION_LEVEL_VAR: &str = "KILN_CACHE_COMPRESSION_LEVEL";

// Directory and file names below the XDG roots
pub const APP_DIR_NAME: &str = "kiln";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const HISTORY_DIR_NAME: &str = "history";

/// Size in bytes of every fingerprint digest (SHA-256)
pub const FINGERPRINT_LEN: usize = 32;
