//! Preview synchronization controller.
//!
//! Owns the lifecycle of one preview surface: consumes detection output
//! and file-change events, and drives the surface through the typed
//! message protocol. One controller per surface.
//!
//! # State Machine
//!
//! `Empty → Detecting → Live ⇄ Loading → Error → Empty`, all expressed
//! through [`PreviewPanelState`] and mutated only here.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use devserver_preview::{
//!     DetectionConfig, DetectionEngine, PreviewConfig, PreviewController,
//! };
//!
//! # async fn example(surface: Arc<dyn devserver_preview::PreviewSurface>) -> devserver_preview::Result<()> {
//! let engine = DetectionEngine::new(DetectionConfig::new(), Some("/work/app".into()))?;
//! let controller = PreviewController::new(engine, PreviewConfig::new());
//!
//! controller.attach_surface(surface);       // auto-start kicks in here
//! controller.change_url("http://localhost:5173/docs");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::PreviewConfig;
use crate::detect::engine::DetectionEngine;
use crate::detect::server::DevServer;
use crate::protocol::PreviewMessage;

use super::state::{PreviewPanelState, Viewport};
use super::surface::{ChangeWatcher, FileChangeEvent, PreviewSurface};

// ============================================================================
// Constants
// ============================================================================

/// How long after `init` the panel stays in the Loading shape.
///
/// Models "the surface has had time to begin loading" without requiring a
/// load acknowledgment from the surface.
pub const LOADING_SETTLE: Duration = Duration::from_millis(500);

/// User-facing message when quick detection misses.
const NO_SERVER_MESSAGE: &str =
    "No dev server detected on common ports. Start your dev server and retry.";

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the controller.
struct ControllerInner {
    /// Unique identifier for this panel, for log correlation.
    uuid: Uuid,

    /// Controller configuration.
    config: PreviewConfig,

    /// Detection engine feeding this panel.
    engine: DetectionEngine,

    /// The attached rendering surface, when one exists.
    surface: Mutex<Option<Arc<dyn PreviewSurface>>>,

    /// Panel state, mutated only by controller methods.
    state: Mutex<PreviewPanelState>,

    /// Pending debounced-refresh timer. Replaced (and the old one
    /// aborted) on every new file-change event.
    debounce: Mutex<Option<JoinHandle<()>>>,

    /// Pending loading-settle timer for the most recent `init`.
    settle: Mutex<Option<JoinHandle<()>>>,
}

// ============================================================================
// PreviewController
// ============================================================================

/// Drives one preview surface from detection results and change events.
///
/// Cheap to clone; clones share the same panel.
#[derive(Clone)]
pub struct PreviewController {
    /// Shared inner state.
    inner: Arc<ControllerInner>,
}

impl fmt::Debug for PreviewController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewController")
            .field("uuid", &self.inner.uuid)
            .field("state", &*self.inner.state.lock())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PreviewController - Constructor
// ============================================================================

impl PreviewController {
    /// Creates a controller with no surface attached.
    ///
    /// Sends are no-ops until [`attach_surface`](Self::attach_surface).
    #[must_use]
    pub fn new(engine: DetectionEngine, config: PreviewConfig) -> Self {
        let uuid = Uuid::new_v4();
        let state = PreviewPanelState::new(config.default_viewport);

        debug!(uuid = %uuid, "Preview controller created");

        Self {
            inner: Arc::new(ControllerInner {
                uuid,
                config,
                engine,
                surface: Mutex::new(None),
                state: Mutex::new(state),
                debounce: Mutex::new(None),
                settle: Mutex::new(None),
            }),
        }
    }

    /// Returns this panel's unique identifier.
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> &Uuid {
        &self.inner.uuid
    }
}

// ============================================================================
// PreviewController - Surface Lifecycle
// ============================================================================

impl PreviewController {
    /// Attaches the rendering surface.
    ///
    /// When `auto_start` is configured, detection starts immediately on a
    /// background task. Must be called from within a tokio runtime.
    pub fn attach_surface(&self, surface: Arc<dyn PreviewSurface>) {
        *self.inner.surface.lock() = Some(surface);
        info!(uuid = %self.inner.uuid, "Surface attached");

        if self.inner.config.auto_start {
            let controller = self.clone();
            tokio::spawn(async move {
                controller.auto_detect_and_start().await;
            });
        }
    }

    /// Detaches the surface; subsequent sends become no-ops.
    ///
    /// Pending timers are cancelled, since nothing can receive their
    /// output.
    pub fn detach_surface(&self) {
        self.abort_timers();
        *self.inner.surface.lock() = None;
        debug!(uuid = %self.inner.uuid, "Surface detached");
    }

    /// Wires a change watcher into this controller.
    ///
    /// Watcher callbacks may arrive on any thread; events are moved onto
    /// the runtime this method was called from. Must be called from
    /// within a tokio runtime.
    pub fn attach_watcher(&self, watcher: &dyn ChangeWatcher) {
        let controller = self.clone();
        let handle = tokio::runtime::Handle::current();

        watcher.on_change(Box::new(move |event| {
            let controller = controller.clone();
            handle.spawn(async move {
                controller.handle_file_change(event);
            });
        }));

        debug!(uuid = %self.inner.uuid, "Change watcher attached");
    }

    /// Returns the localhost origins the host should allow on the
    /// surface, one per candidate port.
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        let config = self.inner.engine.config();
        let scheme = if config.https { "https" } else { "http" };
        config
            .ports
            .iter()
            .map(|port| format!("{scheme}://localhost:{port}"))
            .collect()
    }

    /// Returns a snapshot of the panel state.
    #[must_use]
    pub fn state(&self) -> PreviewPanelState {
        self.inner.state.lock().clone()
    }
}

// ============================================================================
// PreviewController - Preview Lifecycle
// ============================================================================

impl PreviewController {
    /// Quick-detects a server and starts the preview on a hit.
    ///
    /// On a miss the panel lands in the Error shape with a user-facing
    /// message. Never propagates a failure.
    pub async fn auto_detect_and_start(&self) {
        {
            let mut state = self.inner.state.lock();
            state.is_loading = true;
            state.last_error = None;
        }
        debug!(uuid = %self.inner.uuid, "Auto-detection started");

        match self.inner.engine.quick_detect().await {
            Some(server) => self.start_preview(server),
            None => {
                let mut state = self.inner.state.lock();
                state.last_error = Some(NO_SERVER_MESSAGE.to_string());
                state.is_loading = false;
                info!(uuid = %self.inner.uuid, "Auto-detection found no server");
            }
        }
    }

    /// Attaches a server and initializes the surface.
    ///
    /// Clears any previous error. The panel stays in the Loading shape
    /// for [`LOADING_SETTLE`], then settles to Live.
    pub fn start_preview(&self, server: DevServer) {
        // A malformed base path degrades to the server root rather than
        // failing the start.
        let url = server
            .preview_url()
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("http://localhost:{}/", server.port));
        let title = server.title().to_string();

        let viewport = {
            let mut state = self.inner.state.lock();
            state.server = Some(server);
            state.is_loading = true;
            state.last_error = None;
            state.viewport
        };

        info!(uuid = %self.inner.uuid, %url, "Preview started");
        self.send(&PreviewMessage::init(url, viewport, title));

        let controller = self.clone();
        let settle = tokio::spawn(async move {
            sleep(LOADING_SETTLE).await;
            controller.inner.state.lock().is_loading = false;
        });
        if let Some(old) = self.inner.settle.lock().replace(settle) {
            old.abort();
        }
    }

    /// Detaches the server and resets the panel to the Empty shape.
    pub fn stop_preview(&self) {
        self.abort_timers();
        *self.inner.state.lock() = PreviewPanelState::new(self.inner.config.default_viewport);
        info!(uuid = %self.inner.uuid, "Preview stopped");
    }

    /// Reloads the preview. No-op without an attached server.
    ///
    /// Returns `false` when nothing was sent.
    pub fn refresh(&self) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.server.is_none() {
                trace!(uuid = %self.inner.uuid, "Refresh ignored: no server attached");
                return false;
            }
            state.refresh_count += 1;
            state.last_refresh = Some(Utc::now());
        }

        debug!(uuid = %self.inner.uuid, "Refreshing preview");
        self.send(&PreviewMessage::Refresh)
    }

    /// Switches the viewport and informs the surface.
    pub fn change_viewport(&self, viewport: Viewport) -> bool {
        self.inner.state.lock().viewport = viewport;
        debug!(uuid = %self.inner.uuid, %viewport, "Viewport changed");
        self.send(&PreviewMessage::viewport_change(viewport))
    }

    /// Points the surface at a different URL without touching the
    /// attached server.
    pub fn change_url(&self, url: impl Into<String>) -> bool {
        self.send(&PreviewMessage::url_change(url))
    }
}

// ============================================================================
// PreviewController - Event Handling
// ============================================================================

impl PreviewController {
    /// Debounces a file-change event into at most one refresh per quiet
    /// period.
    ///
    /// No-op unless auto-sync is enabled and a server is attached. Each
    /// event cancels the previously scheduled refresh; only the timer
    /// that survives uncancelled fires.
    pub fn handle_file_change(&self, event: FileChangeEvent) {
        if !self.inner.config.auto_sync {
            return;
        }
        if self.inner.state.lock().server.is_none() {
            return;
        }

        trace!(
            uuid = %self.inner.uuid,
            path = %event.path.display(),
            change = ?event.change_type,
            "File change queued"
        );

        let delay = Duration::from_millis(self.inner.config.refresh_delay_ms);
        let controller = self.clone();
        let timer = tokio::spawn(async move {
            sleep(delay).await;
            controller.refresh();
        });

        if let Some(old) = self.inner.debounce.lock().replace(timer) {
            old.abort();
        }
    }

    /// Dispatches a message sent by the surface.
    ///
    /// `ready` replays the init for surface reloads; `error` records the
    /// message; `health-check` gets a healthy reply; `viewport-change`
    /// applies the requested mode. Anything else is logged and dropped.
    pub fn handle_surface_message(&self, message: PreviewMessage) {
        match message {
            PreviewMessage::Ready => {
                let server = self.inner.state.lock().server.clone();
                if let Some(server) = server {
                    debug!(uuid = %self.inner.uuid, "Surface ready; replaying init");
                    self.start_preview(server);
                }
            }

            PreviewMessage::Error { message } => {
                warn!(uuid = %self.inner.uuid, error = %message, "Surface reported error");
                self.inner.state.lock().last_error = Some(message);
            }

            PreviewMessage::HealthCheck { .. } => {
                self.send(&PreviewMessage::healthy());
            }

            PreviewMessage::ViewportChange { viewport, .. } => {
                self.change_viewport(viewport);
            }

            other => {
                debug!(
                    uuid = %self.inner.uuid,
                    kind = other.kind(),
                    "Ignoring non-inbound message from surface"
                );
            }
        }
    }

    /// Reacts to the surface becoming visible or hidden.
    ///
    /// Becoming visible with a server attached refreshes the preview so
    /// it catches up on anything missed while hidden.
    pub fn handle_visibility_change(&self, visible: bool) {
        if visible && self.inner.state.lock().server.is_some() {
            debug!(uuid = %self.inner.uuid, "Surface visible again; refreshing");
            self.refresh();
        }
    }
}

// ============================================================================
// PreviewController - Internal
// ============================================================================

impl PreviewController {
    /// Delivers a message to the surface, if one is attached.
    fn send(&self, message: &PreviewMessage) -> bool {
        let surface = self.inner.surface.lock().clone();
        match surface {
            Some(surface) => {
                let delivered = surface.send(message);
                if !delivered {
                    debug!(
                        uuid = %self.inner.uuid,
                        kind = message.kind(),
                        "Surface rejected message"
                    );
                }
                delivered
            }
            None => {
                trace!(
                    uuid = %self.inner.uuid,
                    kind = message.kind(),
                    "No surface attached; dropping message"
                );
                false
            }
        }
    }

    /// Aborts any pending debounce and settle timers.
    fn abort_timers(&self) {
        if let Some(timer) = self.inner.debounce.lock().take() {
            timer.abort();
        }
        if let Some(timer) = self.inner.settle.lock().take() {
            timer.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
