//! Preview panel state and viewport presets.
//!
//! [`PreviewPanelState`] is the controller's view of one preview surface.
//! Only the controller mutates it; hosts read snapshots. The panel moves
//! through `Empty → Detecting → Live ⇄ Loading → Error` shapes, all
//! expressed by this one struct.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::server::DevServer;

// ============================================================================
// Viewport
// ============================================================================

/// Preview viewport mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    /// 1920×1080.
    #[default]
    Desktop,
    /// 768×1024.
    Tablet,
    /// 375×812.
    Mobile,
}

impl Viewport {
    /// Returns the wire identifier for this mode.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }

    /// Returns the pixel dimensions for this mode.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> ViewportDimensions {
        let (width, height) = match self {
            Self::Desktop => (1920, 1080),
            Self::Tablet => (768, 1024),
            Self::Mobile => (375, 812),
        };
        ViewportDimensions {
            mode: *self,
            width,
            height,
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ViewportDimensions
// ============================================================================

/// Pixel dimensions for a viewport mode.
///
/// Display data only; nothing validates against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportDimensions {
    /// The mode these dimensions belong to.
    pub mode: Viewport,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

// ============================================================================
// PreviewPanelState
// ============================================================================

/// Current state of one preview panel.
///
/// Created in the Empty shape when the surface is first resolved; reset
/// to it by `stop_preview()`; destroyed with the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPanelState {
    /// The attached server, if any.
    pub server: Option<DevServer>,

    /// Current viewport mode.
    pub viewport: Viewport,

    /// A detection or initial load is in progress.
    pub is_loading: bool,

    /// Last user-facing error, cleared by the next successful start.
    pub last_error: Option<String>,

    /// How many refreshes this panel has issued. Monotonic until reset.
    pub refresh_count: u64,

    /// When the panel last refreshed.
    pub last_refresh: Option<DateTime<Utc>>,
}

impl PreviewPanelState {
    /// Creates the Empty shape: no server, not loading, no error.
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self {
            server: None,
            viewport,
            is_loading: false,
            last_error: None,
            refresh_count: 0,
            last_refresh: None,
        }
    }

    /// Returns `true` if a server is attached and nothing is loading or
    /// failed.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.server.is_some() && !self.is_loading && self.last_error.is_none()
    }

    /// Returns `true` if the panel is in the Empty shape.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.server.is_none() && !self.is_loading && self.last_error.is_none()
    }
}

impl Default for PreviewPanelState {
    fn default() -> Self {
        Self::new(Viewport::Desktop)
    }
}

// ============================================================================
// Tests
// ============================================================================
