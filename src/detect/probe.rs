//! Bounded-time health probes against localhost ports.
//!
//! A probe is one GET request to `http://localhost:{port}/` raced against
//! a timer. Whichever settles first wins. A probe never fails as an error:
//! timeouts, refused connections, and unexpected statuses all collapse
//! into a negative [`ProbeOutcome`], so one dead port can never poison a
//! scan.
//!
//! # Healthy
//!
//! Healthy is defined strictly as status `200` or `304`. Redirects, auth
//! walls, and 5xx responses are a listener, but not a usable preview
//! target.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;

// ============================================================================
// ProbeOutcome
// ============================================================================

/// Result of one port probe.
///
/// Always produced, never an error. Unhealthy outcomes record zero
/// latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Port that was probed.
    pub port: u16,

    /// Whether the port answered with status 200 or 304.
    pub healthy: bool,

    /// HTTP status code, when a response arrived at all.
    pub status: Option<u16>,

    /// Round-trip latency in milliseconds (zero when unhealthy).
    pub latency_ms: u64,

    /// `Server` response header, for type sniffing.
    pub server_header: Option<String>,

    /// `X-Powered-By` response header, for type sniffing.
    pub powered_by: Option<String>,
}

impl ProbeOutcome {
    /// Creates a negative outcome for a port that did not answer.
    #[inline]
    #[must_use]
    pub const fn unhealthy(port: u16) -> Self {
        Self {
            port,
            healthy: false,
            status: None,
            latency_ms: 0,
            server_header: None,
            powered_by: None,
        }
    }

    /// Creates a negative outcome that still carries the response status.
    #[inline]
    #[must_use]
    pub const fn rejected(port: u16, status: u16) -> Self {
        Self {
            port,
            healthy: false,
            status: Some(status),
            latency_ms: 0,
            server_header: None,
            powered_by: None,
        }
    }
}

// ============================================================================
// HealthProbe Trait
// ============================================================================

/// A bounded-time liveness check for one localhost port.
///
/// The trait seam exists so the detection engine can be exercised without
/// a network: tests inject a scripted prober, production uses
/// [`HttpProber`].
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probes one port. Always resolves; never panics, never errors.
    async fn probe(&self, port: u16) -> ProbeOutcome;
}

// ============================================================================
// HttpProber
// ============================================================================

/// Default prober issuing real HTTP GETs against localhost.
pub struct HttpProber {
    /// Shared HTTP client.
    client: reqwest::Client,
    /// Per-probe timeout.
    timeout: Duration,
    /// Probe `https://localhost` instead of `http://localhost`.
    https: bool,
}

impl HttpProber {
    /// Creates a prober with the given per-probe timeout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_ms: u64, https: bool) -> Result<Self> {
        // Proxies must not intercept loopback probes.
        let client = reqwest::Client::builder().no_proxy().build()?;

        Ok(Self {
            client,
            timeout: Duration::from_millis(timeout_ms),
            https,
        })
    }

    /// Returns the probe URL for a port.
    #[inline]
    #[must_use]
    pub fn probe_url(&self, port: u16) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{scheme}://localhost:{port}/")
    }
}

#[async_trait]
impl HealthProbe for HttpProber {
    async fn probe(&self, port: u16) -> ProbeOutcome {
        let url = self.probe_url(port);
        let started = std::time::Instant::now();

        // Race the response against the timer; whichever settles first wins.
        let response = match timeout(self.timeout, self.client.get(&url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                trace!(port, error = %e, "Probe request failed");
                return ProbeOutcome::unhealthy(port);
            }
            Err(_) => {
                trace!(port, timeout_ms = self.timeout.as_millis() as u64, "Probe timed out");
                return ProbeOutcome::unhealthy(port);
            }
        };

        let status = response.status().as_u16();
        if status != 200 && status != 304 {
            debug!(port, status, "Port answered with non-preview status");
            return ProbeOutcome::rejected(port, status);
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };

        let outcome = ProbeOutcome {
            port,
            healthy: true,
            status: Some(status),
            latency_ms: started.elapsed().as_millis() as u64,
            server_header: header("server"),
            powered_by: header("x-powered-by"),
        };

        debug!(port, status, latency_ms = outcome.latency_ms, "Port is healthy");
        outcome
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Binds a localhost listener that answers every connection with a
    /// canned HTTP response, and returns its port.
    async fn spawn_http_stub(response: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let port = listener.local_addr().expect("stub addr").port();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        port
    }

    /// Finds a port with nothing listening on it.
    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind probe listener");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_probe_healthy_200() {
        let port = spawn_http_stub(
            "HTTP/1.1 200 OK\r\nServer: vite\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT_MS, false).expect("build prober");
        let outcome = prober.probe(port).await;

        assert!(outcome.healthy);
        assert_eq!(outcome.status, Some(200));
        assert_eq!(outcome.server_header.as_deref(), Some("vite"));
    }

    #[tokio::test]
    async fn test_probe_unhealthy_on_refused_connection() {
        let port = free_port().await;

        let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT_MS, false).expect("build prober");
        let outcome = prober.probe(port).await;

        assert!(!outcome.healthy);
        assert_eq!(outcome.status, None);
        assert_eq!(outcome.latency_ms, 0);
    }

    #[tokio::test]
    async fn test_probe_rejects_server_error_status() {
        let port = spawn_http_stub(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let prober = HttpProber::new(DEFAULT_PROBE_TIMEOUT_MS, false).expect("build prober");
        let outcome = prober.probe(port).await;

        assert!(!outcome.healthy);
        assert_eq!(outcome.status, Some(500));
        assert_eq!(outcome.latency_ms, 0);
    }

    #[tokio::test]
    async fn test_probe_times_out_on_silent_listener() {
        // Listener accepts but never responds.
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind silent listener");
        let port = listener.local_addr().expect("addr").port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let prober = HttpProber::new(100, false).expect("build prober");
        let outcome = prober.probe(port).await;

        assert!(!outcome.healthy);
        assert_eq!(outcome.latency_ms, 0);
    }

    #[tokio::test]
    async fn test_probe_url_scheme() {
        let http = HttpProber::new(100, false).expect("build prober");
        let https = HttpProber::new(100, true).expect("build prober");

        assert_eq!(http.probe_url(3000), "http://localhost:3000/");
        assert_eq!(https.probe_url(3000), "https://localhost:3000/");
    }

    #[test]
    fn test_unhealthy_outcome_shape() {
        let outcome = ProbeOutcome::unhealthy(9999);
        assert!(!outcome.healthy);
        assert_eq!(outcome.port, 9999);
        assert_eq!(outcome.latency_ms, 0);
        assert!(outcome.server_header.is_none());
    }
}
