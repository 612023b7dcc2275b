//! Preview surface synchronization.
//!
//! This module keeps one rendering surface in lockstep with a detected
//! dev server: the [`controller`] consumes detection results and file
//! changes and speaks the preview protocol; [`state`] is its observable
//! output; [`surface`] holds the narrow traits the host implements.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`controller`] | Lifecycle state machine and debounced refresh |
//! | [`state`] | Panel state and viewport presets |
//! | [`surface`] | Host seams: rendering surface, change watcher |

// ============================================================================
// Submodules
// ============================================================================

/// Lifecycle state machine and debounced refresh.
pub mod controller;

/// Panel state and viewport presets.
pub mod state;

/// Host seams: rendering surface and change watcher traits.
pub mod surface;

// ============================================================================
// Re-exports
// ============================================================================

pub use controller::{LOADING_SETTLE, PreviewController};
pub use state::{PreviewPanelState, Viewport, ViewportDimensions};
pub use surface::{
    ChangeHandler, ChangeType, ChangeWatcher, FileChangeEvent, NoopSurface, PreviewSurface,
};
