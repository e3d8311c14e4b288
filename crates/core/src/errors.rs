use std::path::PathBuf;

/// Result type alias for kiln operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kiln operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A declared input could not be read while fingerprinting it
    #[error("input '{input}' is unreadable at '{path}': {source}")]
    UnreadableInput {
        input: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed values that cannot be parsed back into domain types
    #[error("invalid {kind} '{value}': {message}")]
    InvalidValue {
        kind: &'static str,
        value: String,
        message: String,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create an unreadable input error
    #[must_use]
    pub fn unreadable_input(
        input: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::UnreadableInput {
            input: input.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid value error
    #[must_use]
    pub fn invalid_value(
        kind: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::InvalidValue {
            kind,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Whether this error means an input could not be read
    #[must_use]
    pub fn is_unreadable_input(&self) -> bool {
        matches!(self, Error::UnreadableInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_input_display() {
        let err = Error::unreadable_input(
            "src",
            "/missing/file.c",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.is_unreadable_input());
        let msg = err.to_string();
        assert!(msg.contains("'src'"));
        assert!(msg.contains("/missing/file.c"));
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json { .. }));
    }
}
