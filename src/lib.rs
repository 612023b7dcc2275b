//! Dev server detection and live preview synchronization.
//!
//! This library finds the local dev server serving the project under
//! active development — no manual configuration — and keeps a preview
//! surface synchronized with it: URL, viewport, and file-change-driven
//! refreshes.
//!
//! # Architecture
//!
//! Two cooperating components:
//!
//! - **Detection engine**: probes a configured list of candidate ports
//!   concurrently, infers the server family from project marker files
//!   (falling back to response headers), and caches the merged result for
//!   a short window.
//! - **Preview controller**: owns one rendering surface, drives it
//!   through a small typed message protocol, and debounces file-change
//!   events into refreshes.
//!
//! The host supplies the rendering surface and (optionally) its own
//! change notifier behind two narrow traits, so the core runs without an
//! embedded browser.
//!
//! # Quick Start
//!
//! ```no_run
//! use devserver_preview::{
//!     DetectionConfig, DetectionEngine, PreviewConfig, PreviewController,
//! };
//!
//! #[tokio::main]
//! async fn main() -> devserver_preview::Result<()> {
//!     let engine = DetectionEngine::new(
//!         DetectionConfig::new(),
//!         Some("/work/my-app".into()),
//!     )?;
//!
//!     // Scan all candidate ports (cached for 5s).
//!     let result = engine.detect_servers().await;
//!     for server in &result.servers {
//!         println!("{server} -> {}", server.preview_url()?);
//!     }
//!
//!     // Drive a preview surface from the same engine.
//!     let controller = PreviewController::new(engine, PreviewConfig::new());
//!     controller.auto_detect_and_start().await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`detect`] | Port scanning, type inference, result caching |
//! | [`preview`] | Surface controller, panel state, host traits |
//! | [`protocol`] | The `{ type, payload }` wire contract |
//! | [`config`] | Detection and preview configuration |
//! | [`watch`] | Bundled notify-backed change watcher |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! # Failure Model
//!
//! Nothing in the scan path raises: dead ports, a missing workspace, or a
//! detached surface all degrade to negative results or silent no-ops. The
//! [`enum@Error`] type covers host-actionable conditions only —
//! configuration mistakes and watcher setup failures.

// ============================================================================
// Modules
// ============================================================================

/// Detection and preview configuration.
pub mod config;

/// Dev server detection: probing, inference, caching.
pub mod detect;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Preview surface synchronization.
pub mod preview;

/// Preview protocol message types.
pub mod protocol;

/// Bundled filesystem change watcher.
pub mod watch;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{DEFAULT_PORTS, DEFAULT_REFRESH_DELAY_MS, DEFAULT_TIMEOUT_MS};
pub use config::{DetectionConfig, PreviewConfig};

// Detection types
pub use detect::{
    CACHE_TTL, DetectionEngine, DetectionResult, DevServer, HealthProbe, HttpProber, MarkerRule,
    ProbeOutcome, QUICK_PORTS, ServerType,
};

// Preview types
pub use preview::{
    ChangeType, ChangeWatcher, FileChangeEvent, NoopSurface, PreviewController, PreviewPanelState,
    PreviewSurface, Viewport, ViewportDimensions,
};

// Protocol types
pub use protocol::PreviewMessage;

// Watcher
pub use watch::FsWatcher;

// Error types
pub use error::{Error, Result};
