//! Host-facing seams: the rendering surface and the change notifier.
//!
//! The controller never talks to a real embedded browser or filesystem.
//! It drives anything that implements [`PreviewSurface`] and listens to
//! anything that implements [`ChangeWatcher`], so the core stays testable
//! with plain structs.
//!
//! # Design
//!
//! Both traits are intentionally minimal and object-safe. The surface
//! only needs to deliver a message (and say whether it could); the
//! watcher only needs to hand change events to a registered handler.
//! Lifecycle, sandboxing, and rendering stay with the host.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::protocol::PreviewMessage;

// ============================================================================
// ChangeType
// ============================================================================

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// The file appeared.
    Created,
    /// The file's contents changed.
    Changed,
    /// The file went away.
    Deleted,
}

// ============================================================================
// FileChangeEvent
// ============================================================================

/// One filesystem change, as delivered by a [`ChangeWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    /// Path of the changed file.
    pub path: PathBuf,

    /// What happened to it.
    pub change_type: ChangeType,
}

impl FileChangeEvent {
    /// Creates a change event.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, change_type: ChangeType) -> Self {
        Self {
            path: path.into(),
            change_type,
        }
    }
}

// ============================================================================
// PreviewSurface
// ============================================================================

/// The sandboxed rendering target the controller drives.
///
/// `send` returns `false` when the message could not be delivered (surface
/// disposed, serialization refused by the host, ...). The controller
/// treats a `false` as a silent no-op, never an error.
pub trait PreviewSurface: Send + Sync {
    /// Delivers one protocol message to the surface.
    fn send(&self, message: &PreviewMessage) -> bool;
}

impl fmt::Debug for dyn PreviewSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewSurface").finish_non_exhaustive()
    }
}

// ============================================================================
// ChangeWatcher
// ============================================================================

/// Handler invoked for every file change a watcher observes.
pub type ChangeHandler = Box<dyn Fn(FileChangeEvent) + Send + Sync>;

/// A source of file-change events.
///
/// Implemented by [`crate::watch::FsWatcher`] for hosts without their own
/// notifier; hosts that already watch the workspace implement this over
/// their notifier instead.
pub trait ChangeWatcher: Send + Sync {
    /// Registers a handler for subsequent change events.
    fn on_change(&self, handler: ChangeHandler);
}

// ============================================================================
// NoopSurface
// ============================================================================

/// A surface that accepts and discards every message.
///
/// Useful for headless hosts and tests that only care about controller
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSurface;

impl PreviewSurface for NoopSurface {
    fn send(&self, _message: &PreviewMessage) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_serde() {
        assert_eq!(
            serde_json::to_string(&ChangeType::Created).expect("serialize"),
            "\"created\""
        );
        let back: ChangeType = serde_json::from_str("\"deleted\"").expect("deserialize");
        assert_eq!(back, ChangeType::Deleted);
    }

    #[test]
    fn test_file_change_event_new() {
        let event = FileChangeEvent::new("src/main.ts", ChangeType::Changed);
        assert_eq!(event.path, PathBuf::from("src/main.ts"));
        assert_eq!(event.change_type, ChangeType::Changed);
    }

    #[test]
    fn test_noop_surface_accepts_everything() {
        let surface = NoopSurface;
        assert!(surface.send(&PreviewMessage::Refresh));
    }

    #[test]
    fn test_surface_is_object_safe() {
        let surface: Box<dyn PreviewSurface> = Box::new(NoopSurface);
        assert!(surface.send(&PreviewMessage::Ready));
        let rendered = format!("{surface:?}");
        assert!(rendered.contains("PreviewSurface"));
    }
}
