//! Dev server detection engine.
//!
//! Orchestrates the health prober and the type inferrer across the
//! configured candidate ports, merges probe results into a ranked
//! [`DetectionResult`], and caches that result for a short window so
//! repeated UI-driven calls don't rescan the network.
//!
//! # Scan Model
//!
//! - [`DetectionEngine::detect_servers`] probes every configured port
//!   **concurrently** with all-settle semantics: one slow or dead port
//!   never blocks or aborts the batch.
//! - [`DetectionEngine::quick_detect`] probes a short priority list
//!   **sequentially** and short-circuits on the first healthy hit; used
//!   for low-latency auto-start.
//! - [`DetectionEngine::refresh`] drops the cache and forces a real scan.
//!
//! The engine never returns an error from a scan: a missing project root,
//! an unreachable network, or a fully dead port list all degrade to an
//! empty result.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::error::Result;

use super::infer::{infer_from_markers, sniff_from_headers};
use super::probe::{HealthProbe, HttpProber, ProbeOutcome};
use super::server::{DevServer, ServerType};

// ============================================================================
// Constants
// ============================================================================

/// How long a scan result stays fresh.
pub const CACHE_TTL: Duration = Duration::from_millis(5000);

/// Quick-detect priority ports, probed sequentially in this order.
pub const QUICK_PORTS: [u16; 4] = [3000, 5173, 8080, 4000];

// ============================================================================
// DetectionResult
// ============================================================================

/// Output of one scan cycle.
///
/// Immutable once constructed. `servers` contains only healthy servers,
/// HMR-capable first, scan order preserved within each group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Healthy servers found, HMR-capable first.
    pub servers: Vec<DevServer>,

    /// Every port that was probed, in scan order.
    pub scanned_ports: Vec<u16>,

    /// Wall-clock duration of the scan in milliseconds.
    pub duration_ms: u64,

    /// When the scan finished.
    pub timestamp: DateTime<Utc>,
}

impl DetectionResult {
    /// Creates the empty result used when detection cannot run.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            servers: Vec::new(),
            scanned_ports: Vec::new(),
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    /// Returns the best server, if any.
    ///
    /// The HMR-first ordering makes this the first entry.
    #[inline]
    #[must_use]
    pub fn best(&self) -> Option<&DevServer> {
        self.servers.first()
    }
}

// ============================================================================
// Types
// ============================================================================

/// One cached scan with its freshness stamp.
struct CachedScan {
    /// The cached result.
    result: DetectionResult,
    /// When the scan was stored (monotonic).
    scanned_at: Instant,
}

/// Internal shared state for the engine.
struct EngineInner {
    /// Scan configuration.
    config: DetectionConfig,

    /// Project root for marker-file inference. Absent when the host has
    /// no workspace open.
    project_root: Option<PathBuf>,

    /// Probe implementation (HTTP in production, scripted in tests).
    prober: Arc<dyn HealthProbe>,

    /// Single cached `(result, stamp)` pair.
    cache: Mutex<Option<CachedScan>>,
}

// ============================================================================
// DetectionEngine
// ============================================================================

/// Concurrent localhost dev server scanner with a TTL cache.
///
/// # Example
///
/// ```ignore
/// use devserver_preview::{DetectionConfig, DetectionEngine};
///
/// # async fn example() -> devserver_preview::Result<()> {
/// let engine = DetectionEngine::new(DetectionConfig::new(), Some("/work/app".into()))?;
///
/// let result = engine.detect_servers().await;
/// for server in &result.servers {
///     println!("{server} ({})", server.title());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DetectionEngine {
    /// Shared inner state.
    inner: Arc<EngineInner>,
}

impl fmt::Debug for DetectionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionEngine")
            .field("ports", &self.inner.config.ports)
            .field("project_root", &self.inner.project_root)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DetectionEngine - Constructors
// ============================================================================

impl DetectionEngine {
    /// Creates an engine with the default HTTP prober.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for an invalid configuration, or
    /// [`crate::Error::Http`] if the probe client cannot be built.
    pub fn new(config: DetectionConfig, project_root: Option<PathBuf>) -> Result<Self> {
        config.validate()?;
        let prober = Arc::new(HttpProber::new(config.timeout_ms, config.https)?);
        Ok(Self::assemble(config, project_root, prober))
    }

    /// Creates an engine with an injected prober.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for an invalid configuration.
    pub fn with_prober(
        config: DetectionConfig,
        project_root: Option<PathBuf>,
        prober: Arc<dyn HealthProbe>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, project_root, prober))
    }

    fn assemble(
        config: DetectionConfig,
        project_root: Option<PathBuf>,
        prober: Arc<dyn HealthProbe>,
    ) -> Self {
        debug!(
            ports = config.ports.len(),
            timeout_ms = config.timeout_ms,
            root = ?project_root,
            "Detection engine created"
        );

        Self {
            inner: Arc::new(EngineInner {
                config,
                project_root,
                prober,
                cache: Mutex::new(None),
            }),
        }
    }
}

// ============================================================================
// DetectionEngine - Public API
// ============================================================================

impl DetectionEngine {
    /// Scans the configured ports, or returns the cached result when it is
    /// younger than [`CACHE_TTL`].
    ///
    /// Never fails: all probe failures degrade to "no server at this
    /// port", and a missing project root degrades to an empty result.
    pub async fn detect_servers(&self) -> DetectionResult {
        if let Some(cached) = self.fresh_cached() {
            debug!(servers = cached.servers.len(), "Detection cache hit");
            return cached;
        }

        let result = self.scan().await;

        *self.inner.cache.lock() = Some(CachedScan {
            result: result.clone(),
            scanned_at: Instant::now(),
        });

        result
    }

    /// Probes the quick-detect priority ports sequentially and returns the
    /// first healthy server, or `None` when every priority port misses.
    ///
    /// Later ports are never probed once a hit is found.
    pub async fn quick_detect(&self) -> Option<DevServer> {
        let hinted = self.hinted_type();

        for port in QUICK_PORTS {
            let outcome = self.inner.prober.probe(port).await;
            if outcome.healthy {
                let server = self.to_server(&outcome, hinted);
                info!(%server, "Quick-detect hit");
                return Some(server);
            }
        }

        debug!("Quick-detect found no server");
        None
    }

    /// Clears the cache unconditionally, then scans.
    pub async fn refresh(&self) -> DetectionResult {
        debug!("Forced detection refresh");
        *self.inner.cache.lock() = None;
        self.detect_servers().await
    }

    /// Returns the cached result without scanning, even when stale.
    #[must_use]
    pub fn last_result(&self) -> Option<DetectionResult> {
        self.inner.cache.lock().as_ref().map(|c| c.result.clone())
    }

    /// Returns the scan configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DetectionConfig {
        &self.inner.config
    }
}

// ============================================================================
// DetectionEngine - Internal
// ============================================================================

impl DetectionEngine {
    /// Returns the cached result if it is younger than the TTL.
    fn fresh_cached(&self) -> Option<DetectionResult> {
        let cache = self.inner.cache.lock();
        cache
            .as_ref()
            .filter(|c| c.scanned_at.elapsed() < CACHE_TTL)
            .map(|c| c.result.clone())
    }

    /// Runs marker-file inference once against the project root.
    fn hinted_type(&self) -> Option<ServerType> {
        self.inner
            .project_root
            .as_deref()
            .and_then(|root| infer_from_markers(root, &self.inner.config.markers))
    }

    /// Runs one full scan cycle.
    async fn scan(&self) -> DetectionResult {
        let started = std::time::Instant::now();

        if self.inner.project_root.is_none() {
            debug!("No project root; detection degrades to an empty result");
            return DetectionResult::empty();
        }

        let hinted = self.hinted_type();
        let ports = self.inner.config.ports.clone();

        // All-settle fan-out: every probe resolves, success or failure.
        let outcomes = join_all(ports.iter().map(|&port| self.inner.prober.probe(port))).await;

        let mut servers: Vec<DevServer> = outcomes
            .iter()
            .filter(|outcome| outcome.healthy)
            .map(|outcome| self.to_server(outcome, hinted))
            .collect();

        // HMR-capable first; stable, so scan order survives within groups.
        servers.sort_by_key(|server| !server.hmr);

        let result = DetectionResult {
            servers,
            scanned_ports: ports,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };

        info!(
            servers = result.servers.len(),
            scanned = result.scanned_ports.len(),
            duration_ms = result.duration_ms,
            "Scan complete"
        );

        result
    }

    /// Converts a healthy probe into a server record.
    ///
    /// The configuration-file hint always wins over header sniffing.
    fn to_server(&self, outcome: &ProbeOutcome, hinted: Option<ServerType>) -> DevServer {
        let server_type = hinted.unwrap_or_else(|| sniff_from_headers(outcome));
        DevServer::new(server_type, outcome.port)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use rustc_hash::FxHashMap;
    use tempfile::TempDir;

    /// Scripted prober: healthy on listed ports, refused everywhere else.
    /// Records every probed port in call order.
    struct MockProbe {
        outcomes: FxHashMap<u16, ProbeOutcome>,
        calls: Mutex<Vec<u16>>,
    }

    impl MockProbe {
        fn new(outcomes: impl IntoIterator<Item = ProbeOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: outcomes.into_iter().map(|o| (o.port, o)).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn healthy(port: u16, server_header: Option<&str>) -> ProbeOutcome {
            ProbeOutcome {
                port,
                healthy: true,
                status: Some(200),
                latency_ms: 3,
                server_header: server_header.map(|s| s.to_string()),
                powered_by: None,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn calls(&self) -> Vec<u16> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl HealthProbe for MockProbe {
        async fn probe(&self, port: u16) -> ProbeOutcome {
            self.calls.lock().push(port);
            self.outcomes
                .get(&port)
                .cloned()
                .unwrap_or_else(|| ProbeOutcome::unhealthy(port))
        }
    }

    fn engine_with(
        ports: &[u16],
        root: Option<PathBuf>,
        prober: Arc<MockProbe>,
    ) -> DetectionEngine {
        let config = DetectionConfig::new().with_ports(ports.iter().copied());
        DetectionEngine::with_prober(config, root, prober).expect("build engine")
    }

    fn empty_root() -> TempDir {
        TempDir::new().expect("create project root")
    }

    #[tokio::test]
    async fn test_all_settle_scanning() {
        let root = empty_root();
        let ports = [3000, 3001, 5173, 8080, 9000];
        let prober = MockProbe::new([]);
        let engine = engine_with(&ports, Some(root.path().into()), prober.clone());

        let result = engine.detect_servers().await;

        assert_eq!(result.scanned_ports, ports.to_vec());
        assert!(result.servers.is_empty());
        assert_eq!(prober.call_count(), ports.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_coherence_within_ttl() {
        let root = empty_root();
        let prober = MockProbe::new([MockProbe::healthy(5173, Some("vite"))]);
        let engine = engine_with(&[5173, 8080], Some(root.path().into()), prober.clone());

        let first = engine.detect_servers().await;
        let probes_after_first = prober.call_count();

        tokio::time::sleep(Duration::from_millis(4000)).await;
        let second = engine.detect_servers().await;

        assert_eq!(first, second);
        assert_eq!(prober.call_count(), probes_after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_after_ttl() {
        let root = empty_root();
        let prober = MockProbe::new([]);
        let engine = engine_with(&[3000], Some(root.path().into()), prober.clone());

        engine.detect_servers().await;
        tokio::time::sleep(Duration::from_millis(5001)).await;
        engine.detect_servers().await;

        assert_eq!(prober.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_forces_rescan() {
        let root = empty_root();
        let prober = MockProbe::new([]);
        let engine = engine_with(&[3000], Some(root.path().into()), prober.clone());

        engine.detect_servers().await;
        engine.refresh().await;

        assert_eq!(prober.call_count(), 2);
    }

    #[tokio::test]
    async fn test_hmr_capable_servers_sort_first() {
        let root = empty_root();
        let prober = MockProbe::new([
            MockProbe::healthy(8000, Some("nginx")),
            MockProbe::healthy(5173, Some("vite")),
            MockProbe::healthy(9000, None),
            MockProbe::healthy(8080, Some("webpack-dev-server")),
        ]);
        let ports = [8000, 5173, 9000, 8080];
        let engine = engine_with(&ports, Some(root.path().into()), prober);

        let result = engine.detect_servers().await;
        let order: Vec<(ServerType, u16)> =
            result.servers.iter().map(DevServer::identity).collect();

        // HMR group in scan order, then the rest in scan order.
        assert_eq!(
            order,
            vec![
                (ServerType::Vite, 5173),
                (ServerType::Webpack, 8080),
                (ServerType::Custom, 8000),
                (ServerType::Custom, 9000),
            ]
        );
    }

    #[tokio::test]
    async fn test_quick_detect_short_circuits() {
        let root = empty_root();
        let prober = MockProbe::new([MockProbe::healthy(8080, None)]);
        let engine = engine_with(&[3000], Some(root.path().into()), prober.clone());

        let hit = engine.quick_detect().await.expect("expected a hit");

        assert_eq!(hit.port, 8080);
        assert_eq!(prober.calls(), vec![3000, 5173, 8080]);
    }

    #[tokio::test]
    async fn test_quick_detect_miss_probes_all_priority_ports() {
        let root = empty_root();
        let prober = MockProbe::new([]);
        let engine = engine_with(&[3000], Some(root.path().into()), prober.clone());

        assert!(engine.quick_detect().await.is_none());
        assert_eq!(prober.calls(), QUICK_PORTS.to_vec());
    }

    #[tokio::test]
    async fn test_marker_hint_beats_response_headers() {
        let root = empty_root();
        std::fs::write(root.path().join("vite.config.ts"), "export default {}")
            .expect("write marker");

        let prober = MockProbe::new([
            MockProbe::healthy(8080, Some("webpack-dev-server")),
            MockProbe::healthy(3000, Some("nginx")),
        ]);
        let engine = engine_with(&[8080, 3000], Some(root.path().into()), prober);

        let result = engine.detect_servers().await;

        assert_eq!(result.servers.len(), 2);
        for server in &result.servers {
            assert_eq!(server.server_type, ServerType::Vite);
        }
    }

    #[tokio::test]
    async fn test_no_project_root_degrades_to_empty() {
        let prober = MockProbe::new([MockProbe::healthy(3000, None)]);
        let engine = engine_with(&[3000], None, prober.clone());

        let result = engine.detect_servers().await;

        assert!(result.servers.is_empty());
        assert!(result.scanned_ports.is_empty());
        assert_eq!(prober.call_count(), 0);
    }

    #[tokio::test]
    async fn test_last_result_reflects_cache() {
        let root = empty_root();
        let prober = MockProbe::new([]);
        let engine = engine_with(&[3000], Some(root.path().into()), prober);

        assert!(engine.last_result().is_none());
        let result = engine.detect_servers().await;
        assert_eq!(engine.last_result(), Some(result));
    }

    #[test]
    fn test_empty_result_shape() {
        let result = DetectionResult::empty();
        assert!(result.servers.is_empty());
        assert!(result.scanned_ports.is_empty());
        assert_eq!(result.duration_ms, 0);
        assert!(result.best().is_none());
    }

    mod sort_stability {
        use super::*;

        use proptest::prelude::*;

        proptest! {
            /// The HMR-first sort partitions without reordering within
            /// either group.
            #[test]
            fn hmr_sort_is_a_stable_partition(flags in proptest::collection::vec(any::<bool>(), 0..32)) {
                let mut servers: Vec<DevServer> = flags
                    .iter()
                    .enumerate()
                    .map(|(i, &hmr)| {
                        let ty = if hmr { ServerType::Vite } else { ServerType::Custom };
                        DevServer::new(ty, 1024 + i as u16)
                    })
                    .collect();
                let original: Vec<u16> = servers.iter().map(|s| s.port).collect();

                servers.sort_by_key(|server| !server.hmr);

                let split = servers.iter().take_while(|s| s.hmr).count();
                prop_assert!(servers[split..].iter().all(|s| !s.hmr));

                let hmr_ports: Vec<u16> = servers[..split].iter().map(|s| s.port).collect();
                let rest_ports: Vec<u16> = servers[split..].iter().map(|s| s.port).collect();
                let expected_hmr: Vec<u16> = original
                    .iter()
                    .zip(&flags)
                    .filter(|&(_, &hmr)| hmr)
                    .map(|(&p, _)| p)
                    .collect();
                let expected_rest: Vec<u16> = original
                    .iter()
                    .zip(&flags)
                    .filter(|&(_, &hmr)| !hmr)
                    .map(|(&p, _)| p)
                    .collect();

                prop_assert_eq!(hmr_ports, expected_hmr);
                prop_assert_eq!(rest_ports, expected_rest);
            }
        }
    }
}
