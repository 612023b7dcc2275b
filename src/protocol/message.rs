//! Preview protocol message types.
//!
//! One envelope, `{ "type": ..., "payload": ... }`, covers everything the
//! controller and the rendering surface say to each other. `type` values
//! are kebab-case; payload keys are camelCase, matching the JS side of
//! the surface.
//!
//! # Wire Examples
//!
//! ```json
//! { "type": "init",
//!   "payload": { "url": "http://localhost:5173/", "viewport": "desktop", "title": "Vite" } }
//! ```
//!
//! ```json
//! { "type": "refresh" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::preview::state::{Viewport, ViewportDimensions};
use crate::preview::surface::ChangeType;

// ============================================================================
// PreviewMessage
// ============================================================================

/// A message exchanged between the controller and the preview surface.
///
/// The `type`/`payload` set below is the whole wire contract; unknown
/// types fail deserialization and are dropped by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum PreviewMessage {
    /// Attach the surface to a server (controller → surface).
    Init {
        /// Full preview URL, e.g. `http://localhost:5173/`.
        url: String,
        /// Viewport the surface should present.
        viewport: Viewport,
        /// Display title derived from the server family.
        title: String,
    },

    /// Point the surface at a different URL without re-detection
    /// (controller → surface).
    UrlChange {
        /// New URL to load.
        url: String,
    },

    /// Switch the presented viewport (both directions).
    ViewportChange {
        /// Target viewport mode.
        viewport: Viewport,
        /// Pixel dimensions for the mode.
        dimensions: ViewportDimensions,
    },

    /// Reload the current page (controller → surface). No payload.
    Refresh,

    /// The surface finished (re)loading its shell and can accept messages
    /// (surface → controller). No payload.
    Ready,

    /// The surface hit an error (surface → controller).
    Error {
        /// Human-readable description.
        message: String,
    },

    /// Liveness handshake (both directions).
    HealthCheck {
        /// `true` in controller replies; surfaces ping with `false`.
        healthy: bool,
    },

    /// A watched file changed (internal).
    #[serde(rename_all = "camelCase")]
    FileChanged {
        /// Path of the changed file.
        file_path: String,
        /// What happened to it.
        change_type: ChangeType,
    },
}

// ============================================================================
// PreviewMessage - Constructors
// ============================================================================

impl PreviewMessage {
    /// Creates an `init` message.
    #[inline]
    #[must_use]
    pub fn init(url: impl Into<String>, viewport: Viewport, title: impl Into<String>) -> Self {
        Self::Init {
            url: url.into(),
            viewport,
            title: title.into(),
        }
    }

    /// Creates a `url-change` message.
    #[inline]
    #[must_use]
    pub fn url_change(url: impl Into<String>) -> Self {
        Self::UrlChange { url: url.into() }
    }

    /// Creates a `viewport-change` message with the mode's static
    /// dimensions.
    #[inline]
    #[must_use]
    pub fn viewport_change(viewport: Viewport) -> Self {
        Self::ViewportChange {
            viewport,
            dimensions: viewport.dimensions(),
        }
    }

    /// Creates the healthy `health-check` reply.
    #[inline]
    #[must_use]
    pub const fn healthy() -> Self {
        Self::HealthCheck { healthy: true }
    }
}

// ============================================================================
// PreviewMessage - Accessors
// ============================================================================

impl PreviewMessage {
    /// Returns the wire `type` string for this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::UrlChange { .. } => "url-change",
            Self::ViewportChange { .. } => "viewport-change",
            Self::Refresh => "refresh",
            Self::Ready => "ready",
            Self::Error { .. } => "error",
            Self::HealthCheck { .. } => "health-check",
            Self::FileChanged { .. } => "file-changed",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_init_wire_shape() {
        let message = PreviewMessage::init("http://localhost:5173/", Viewport::Desktop, "Vite");
        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(
            value,
            json!({
                "type": "init",
                "payload": {
                    "url": "http://localhost:5173/",
                    "viewport": "desktop",
                    "title": "Vite"
                }
            })
        );
    }

    #[test]
    fn test_refresh_has_no_payload() {
        let value = serde_json::to_value(&PreviewMessage::Refresh).expect("serialize");
        assert_eq!(value, json!({ "type": "refresh" }));
    }

    #[test]
    fn test_viewport_change_carries_dimensions() {
        let message = PreviewMessage::viewport_change(Viewport::Mobile);
        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(value["type"], "viewport-change");
        assert_eq!(value["payload"]["viewport"], "mobile");
        assert_eq!(value["payload"]["dimensions"]["width"], 375);
        assert_eq!(value["payload"]["dimensions"]["height"], 812);
    }

    #[test]
    fn test_file_changed_uses_camel_case_keys() {
        let message = PreviewMessage::FileChanged {
            file_path: "src/App.tsx".to_string(),
            change_type: ChangeType::Changed,
        };
        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(value["payload"]["filePath"], "src/App.tsx");
        assert_eq!(value["payload"]["changeType"], "changed");
    }

    #[test]
    fn test_inbound_ready_parses() {
        let message: PreviewMessage =
            serde_json::from_value(json!({ "type": "ready" })).expect("deserialize");
        assert_eq!(message, PreviewMessage::Ready);
    }

    #[test]
    fn test_inbound_error_parses() {
        let message: PreviewMessage = serde_json::from_value(json!({
            "type": "error",
            "payload": { "message": "net::ERR_CONNECTION_REFUSED" }
        }))
        .expect("deserialize");

        assert_eq!(
            message,
            PreviewMessage::Error {
                message: "net::ERR_CONNECTION_REFUSED".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<PreviewMessage, _> =
            serde_json::from_value(json!({ "type": "telemetry", "payload": {} }));
        assert!(result.is_err());
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        let messages = [
            PreviewMessage::init("http://localhost:3000/", Viewport::Tablet, "Next.js"),
            PreviewMessage::url_change("http://localhost:3000/about"),
            PreviewMessage::viewport_change(Viewport::Desktop),
            PreviewMessage::Refresh,
            PreviewMessage::Ready,
            PreviewMessage::Error {
                message: "boom".to_string(),
            },
            PreviewMessage::healthy(),
            PreviewMessage::FileChanged {
                file_path: "index.html".to_string(),
                change_type: ChangeType::Created,
            },
        ];

        for message in messages {
            let raw = serde_json::to_string(&message).expect("serialize");
            let back: PreviewMessage = serde_json::from_str(&raw).expect("deserialize");
            assert_eq!(back, message);
            assert!(raw.contains(message.kind()));
        }
    }
}
