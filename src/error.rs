//! Error types for dev server preview.
//!
//! This module defines all error types used throughout the crate.
//!
//! Most runtime failure in this crate is deliberately NOT an error: a port
//! that refuses a connection is a negative probe outcome, a missing project
//! root is an empty detection result, and a detached surface turns sends
//! into no-ops. [`enum@Error`] covers the conditions the host must act on —
//! invalid configuration, a watcher that cannot be installed, and malformed
//! wire data.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devserver_preview::{Result, DetectionConfig};
//!
//! fn example() -> Result<()> {
//!     let config = DetectionConfig::new().with_timeout_ms(2000);
//!     config.validate()?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Watching | [`Error::Watch`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Url`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when detection or preview configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Watching Errors
    // ========================================================================
    /// File watcher error.
    ///
    /// Returned when the filesystem watcher cannot be created or a watch
    /// root cannot be registered.
    #[error("Watch error: {message}")]
    Watch {
        /// Description of the watcher failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP client error.
    ///
    /// Returned only when the probe client cannot be constructed; probe
    /// requests themselves never surface as errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a watcher error.
    #[inline]
    pub fn watch(message: impl Into<String>) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a configuration error.
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry; configuration errors
    /// require a config change first.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Watch { .. } | Self::Io(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::config("empty port list");
        assert_eq!(err.to_string(), "Configuration error: empty port list");
    }

    #[test]
    fn test_watch_error_display() {
        let err = Error::watch("root does not exist");
        assert_eq!(err.to_string(), "Watch error: root does not exist");
    }

    #[test]
    fn test_is_config() {
        let config_err = Error::config("test");
        let watch_err = Error::watch("test");

        assert!(config_err.is_config());
        assert!(!watch_err.is_config());
    }

    #[test]
    fn test_is_recoverable() {
        let watch_err = Error::watch("test");
        let config_err = Error::config("test");

        assert!(watch_err.is_recoverable());
        assert!(!config_err.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
