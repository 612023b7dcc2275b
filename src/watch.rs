//! Filesystem change watching.
//!
//! [`FsWatcher`] is the bundled [`ChangeWatcher`] implementation for
//! hosts that don't bring their own notifier. It turns raw `notify`
//! events into [`FileChangeEvent`]s and fans them out to every registered
//! handler. Debouncing is NOT done here — the preview controller owns the
//! debounce window so bursts coalesce regardless of where events come
//! from.
//!
//! Watcher callbacks arrive on notify's own thread; pair this with
//! [`PreviewController::attach_watcher`](crate::PreviewController::attach_watcher),
//! which moves events onto the runtime.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::preview::surface::{ChangeHandler, ChangeType, ChangeWatcher, FileChangeEvent};

// ============================================================================
// FsWatcher
// ============================================================================

/// Recursive filesystem watcher over one project root.
///
/// Dropping the watcher stops the watch.
///
/// # Example
///
/// ```ignore
/// use devserver_preview::FsWatcher;
///
/// # fn example(controller: &devserver_preview::PreviewController) -> devserver_preview::Result<()> {
/// let watcher = FsWatcher::new("/work/app")?;
/// controller.attach_watcher(&watcher);
/// # Ok(())
/// # }
/// ```
pub struct FsWatcher {
    /// Registered change handlers, invoked on the watcher thread.
    handlers: Arc<Mutex<Vec<ChangeHandler>>>,

    /// Underlying watcher; kept alive for the watch to continue.
    _watcher: RecommendedWatcher,

    /// Root being watched.
    root: PathBuf,
}

impl FsWatcher {
    /// Starts watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] when the root is not a directory or the
    /// platform watcher cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::watch(format!(
                "Watch root is not a directory: {}",
                root.display()
            )));
        }

        let handlers: Arc<Mutex<Vec<ChangeHandler>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&handlers);

        let mut watcher =
            notify::recommended_watcher(move |outcome: notify::Result<notify::Event>| {
                match outcome {
                    Ok(event) => dispatch(&sink, &event),
                    Err(e) => warn!(error = %e, "Filesystem watcher error"),
                }
            })
            .map_err(|e| Error::watch(e.to_string()))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| Error::watch(e.to_string()))?;

        info!(root = %root.display(), "Filesystem watch started");

        Ok(Self {
            handlers,
            _watcher: watcher,
            root,
        })
    }

    /// Returns the watched root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChangeWatcher for FsWatcher {
    fn on_change(&self, handler: ChangeHandler) {
        self.handlers.lock().push(handler);
    }
}

// ============================================================================
// Event Translation
// ============================================================================

/// Fans one notify event out to every handler, one call per path.
fn dispatch(handlers: &Mutex<Vec<ChangeHandler>>, event: &notify::Event) {
    let Some(change_type) = classify(&event.kind) else {
        return;
    };

    for path in &event.paths {
        let change = FileChangeEvent::new(path.clone(), change_type);
        for handler in handlers.lock().iter() {
            handler(change.clone());
        }
    }
}

/// Maps a notify event kind onto the wire change types.
///
/// Access and metadata-only events don't affect the preview and are
/// dropped.
const fn classify(kind: &EventKind) -> Option<ChangeType> {
    match kind {
        EventKind::Create(_) => Some(ChangeType::Created),
        EventKind::Modify(_) => Some(ChangeType::Changed),
        EventKind::Remove(_) => Some(ChangeType::Deleted),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
