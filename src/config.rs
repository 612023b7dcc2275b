//! Detection and preview configuration.
//!
//! Provides immutable, builder-style configuration for the two core
//! components. [`DetectionConfig`] feeds the detection engine (candidate
//! ports, probe timeout, marker table); [`PreviewConfig`] feeds the
//! preview controller (auto-start, viewport, refresh debounce).
//!
//! # Example
//!
//! ```ignore
//! use devserver_preview::{DetectionConfig, PreviewConfig, Viewport};
//!
//! let detection = DetectionConfig::new()
//!     .with_ports([3000, 5173])
//!     .with_timeout_ms(1000);
//!
//! let preview = PreviewConfig::new()
//!     .with_default_viewport(Viewport::Mobile)
//!     .with_refresh_delay_ms(500);
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::detect::infer::{MarkerRule, default_markers};
use crate::error::{Error, Result};
use crate::preview::state::Viewport;

// ============================================================================
// Constants
// ============================================================================

/// Default candidate ports, in scan order.
pub const DEFAULT_PORTS: [u16; 12] = [
    3000, 3001, 5173, 5174, 8080, 8081, 4200, 5000, 8000, 9000, 1234, 4000,
];

/// Default per-probe timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default debounce window for file-change refreshes in milliseconds.
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 300;

// ============================================================================
// DetectionConfig
// ============================================================================

/// Immutable detection engine configuration.
///
/// Controls which ports are scanned, how long each probe may take, and
/// which marker files identify each server family.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Candidate ports, probed in this order.
    pub ports: Vec<u16>,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Advisory retry count. Carried for hosts that re-scan on failure;
    /// the engine itself does not retry individual probes.
    pub retries: u32,

    /// Probe `https://localhost` instead of `http://localhost`.
    pub https: bool,

    /// Family marker table, evaluated in order.
    pub markers: Vec<MarkerRule>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: 1,
            https: false,
            markers: default_markers(),
        }
    }
}

// ============================================================================
// DetectionConfig - Builder Methods
// ============================================================================

impl DetectionConfig {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the candidate port list.
    #[inline]
    #[must_use]
    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    /// Sets the per-probe timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the advisory retry count.
    #[inline]
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Probes over https instead of http.
    #[inline]
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.https = true;
        self
    }

    /// Replaces the marker table.
    #[inline]
    #[must_use]
    pub fn with_markers(mut self, markers: Vec<MarkerRule>) -> Self {
        self.markers = markers;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty port list, a port of zero,
    /// or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.ports.is_empty() {
            return Err(Error::config("Candidate port list must not be empty"));
        }
        if self.ports.contains(&0) {
            return Err(Error::config("Candidate ports must be positive"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config("Probe timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// PreviewConfig
// ============================================================================

/// Preview controller configuration.
///
/// `show_toolbar` is carried for the host's rendering layer; the
/// controller itself never consults it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Detect and attach a server as soon as the surface appears.
    pub auto_start: bool,

    /// Viewport the panel starts in.
    pub default_viewport: Viewport,

    /// Debounce window for file-change-driven refreshes, in milliseconds.
    pub refresh_delay_ms: u64,

    /// Render the preview toolbar (host concern).
    pub show_toolbar: bool,

    /// Refresh the preview when watched files change.
    pub auto_sync: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            default_viewport: Viewport::Desktop,
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
            show_toolbar: true,
            auto_sync: true,
        }
    }
}

// ============================================================================
// PreviewConfig - Builder Methods
// ============================================================================

impl PreviewConfig {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables automatic detection on surface attach.
    #[inline]
    #[must_use]
    pub fn without_auto_start(mut self) -> Self {
        self.auto_start = false;
        self
    }

    /// Sets the initial viewport.
    #[inline]
    #[must_use]
    pub fn with_default_viewport(mut self, viewport: Viewport) -> Self {
        self.default_viewport = viewport;
        self
    }

    /// Sets the file-change debounce window in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_refresh_delay_ms(mut self, refresh_delay_ms: u64) -> Self {
        self.refresh_delay_ms = refresh_delay_ms;
        self
    }

    /// Hides the preview toolbar.
    #[inline]
    #[must_use]
    pub fn without_toolbar(mut self) -> Self {
        self.show_toolbar = false;
        self
    }

    /// Disables file-change-driven refresh.
    #[inline]
    #[must_use]
    pub fn without_auto_sync(mut self) -> Self {
        self.auto_sync = false;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_defaults() {
        let config = DetectionConfig::new();
        assert_eq!(config.ports, DEFAULT_PORTS.to_vec());
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.retries, 1);
        assert!(!config.https);
        assert!(!config.markers.is_empty());
    }

    #[test]
    fn test_detection_builder_chain() {
        let config = DetectionConfig::new()
            .with_ports([8080, 8081])
            .with_timeout_ms(500)
            .with_retries(3)
            .with_https();

        assert_eq!(config.ports, vec![8080, 8081]);
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.retries, 3);
        assert!(config.https);
    }

    #[test]
    fn test_validate_ok() {
        assert!(DetectionConfig::new().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_ports() {
        let config = DetectionConfig::new().with_ports([]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_port() {
        let config = DetectionConfig::new().with_ports([3000, 0]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = DetectionConfig::new().with_timeout_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preview_defaults() {
        let config = PreviewConfig::new();
        assert!(config.auto_start);
        assert_eq!(config.default_viewport, Viewport::Desktop);
        assert_eq!(config.refresh_delay_ms, DEFAULT_REFRESH_DELAY_MS);
        assert!(config.show_toolbar);
        assert!(config.auto_sync);
    }

    #[test]
    fn test_preview_builder_chain() {
        let config = PreviewConfig::new()
            .without_auto_start()
            .with_default_viewport(Viewport::Mobile)
            .with_refresh_delay_ms(1000)
            .without_toolbar()
            .without_auto_sync();

        assert!(!config.auto_start);
        assert_eq!(config.default_viewport, Viewport::Mobile);
        assert_eq!(config.refresh_delay_ms, 1000);
        assert!(!config.show_toolbar);
        assert!(!config.auto_sync);
    }
}
