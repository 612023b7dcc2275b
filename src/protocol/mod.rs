//! Preview protocol message types.
//!
//! This module defines the wire contract between the controller and the
//! host-supplied rendering surface.
//!
//! # Protocol Overview
//!
//! | `type` | Direction | Payload |
//! |--------|-----------|---------|
//! | `init` | → surface | `{ url, viewport, title }` |
//! | `url-change` | → surface | `{ url }` |
//! | `viewport-change` | ↔ | `{ viewport, dimensions }` |
//! | `refresh` | → surface | none |
//! | `ready` | surface → | none |
//! | `error` | surface → | `{ message }` |
//! | `health-check` | ↔ | `{ healthy }` |
//! | `file-changed` | internal | `{ filePath, changeType }` |

// ============================================================================
// Submodules
// ============================================================================

/// The message envelope and payload types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::PreviewMessage;
