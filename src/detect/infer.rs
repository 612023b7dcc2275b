//! Server family inference.
//!
//! Two strategies, in order of trust:
//!
//! 1. **Marker files** — a fixed priority list of configuration files that
//!    identify a family (`vite.config.ts`, `angular.json`, ...). The first
//!    family whose marker exists under the project root wins and scanning
//!    stops. The shared marker `package.json` additionally requires a
//!    script value containing a family-specific substring before it
//!    counts.
//! 2. **Header sniffing** — when no marker matched, the `Server` /
//!    `X-Powered-By` headers of the probe response are matched against the
//!    two known signatures (`vite`, `webpack`); everything else is
//!    [`ServerType::Custom`].
//!
//! Marker inference runs once per scan against the project root; header
//! sniffing runs per healthy probe.

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;

use tracing::{debug, trace};

use super::probe::ProbeOutcome;
use super::server::ServerType;

// ============================================================================
// MarkerRule
// ============================================================================

/// One family's identifying files.
///
/// Rules are evaluated in list order; the first satisfied rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRule {
    /// Family this rule identifies.
    pub server_type: ServerType,

    /// File names that identify the family by existence.
    pub files: Vec<String>,

    /// For shared markers (`package.json`): substrings that must appear in
    /// at least one script value. Empty means existence alone is enough.
    pub script_hints: Vec<String>,
}

impl MarkerRule {
    /// Creates an existence-only rule.
    fn files(server_type: ServerType, files: &[&str]) -> Self {
        Self {
            server_type,
            files: files.iter().map(|f| (*f).to_string()).collect(),
            script_hints: Vec::new(),
        }
    }

    /// Creates a script-checked `package.json` rule.
    fn scripts(server_type: ServerType, hints: &[&str]) -> Self {
        Self {
            server_type,
            files: vec!["package.json".to_string()],
            script_hints: hints.iter().map(|h| (*h).to_string()).collect(),
        }
    }
}

/// Returns the default marker table in priority order.
#[must_use]
pub fn default_markers() -> Vec<MarkerRule> {
    vec![
        MarkerRule::files(
            ServerType::Vite,
            &["vite.config.ts", "vite.config.js", "vite.config.mjs"],
        ),
        MarkerRule::files(
            ServerType::Next,
            &["next.config.js", "next.config.ts", "next.config.mjs"],
        ),
        MarkerRule::files(ServerType::Nuxt, &["nuxt.config.ts", "nuxt.config.js"]),
        MarkerRule::scripts(ServerType::ReactScripts, &["react-scripts"]),
        MarkerRule::scripts(ServerType::Parcel, &["parcel"]),
        MarkerRule::files(ServerType::Vue, &["vue.config.js"]),
        MarkerRule::files(ServerType::Angular, &["angular.json"]),
        MarkerRule::files(ServerType::Svelte, &["svelte.config.js"]),
        MarkerRule::files(ServerType::Astro, &["astro.config.mjs", "astro.config.ts"]),
        MarkerRule::files(ServerType::Remix, &["remix.config.js"]),
        MarkerRule::files(ServerType::Gatsby, &["gatsby-config.js"]),
        MarkerRule::files(ServerType::Parcel, &[".parcelrc"]),
        MarkerRule::files(ServerType::Webpack, &["webpack.config.js"]),
    ]
}

// ============================================================================
// Marker Inference
// ============================================================================

/// Infers the server family from marker files under `root`.
///
/// Returns `None` when no rule matches; probe-time header sniffing takes
/// over in that case. Unreadable or malformed files never fail the call —
/// they simply don't match.
#[must_use]
pub fn infer_from_markers(root: &Path, markers: &[MarkerRule]) -> Option<ServerType> {
    for rule in markers {
        for file in &rule.files {
            let path = root.join(file);
            if !path.is_file() {
                continue;
            }

            if rule.script_hints.is_empty() {
                debug!(server_type = %rule.server_type, marker = %file, "Marker file matched");
                return Some(rule.server_type);
            }

            if script_matches(&path, &rule.script_hints) {
                debug!(
                    server_type = %rule.server_type,
                    marker = %file,
                    "Script-checked marker matched"
                );
                return Some(rule.server_type);
            }
        }
    }

    trace!(root = %root.display(), "No marker file matched");
    None
}

/// Returns `true` if any script value in the package manifest contains one
/// of the hints.
fn script_matches(manifest: &Path, hints: &[String]) -> bool {
    let Ok(raw) = std::fs::read_to_string(manifest) else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return false;
    };
    let Some(scripts) = value.get("scripts").and_then(|s| s.as_object()) else {
        return false;
    };

    scripts
        .values()
        .filter_map(|v| v.as_str())
        .any(|script| hints.iter().any(|hint| script.contains(hint.as_str())))
}

// ============================================================================
// Header Sniffing
// ============================================================================

/// Infers the server family from probe response headers.
///
/// Matches the two known signatures case-insensitively over the `Server`
/// and `X-Powered-By` headers; anything else is [`ServerType::Custom`].
#[must_use]
pub fn sniff_from_headers(outcome: &ProbeOutcome) -> ServerType {
    let mut haystack = String::new();
    if let Some(server) = &outcome.server_header {
        haystack.push_str(&server.to_ascii_lowercase());
    }
    if let Some(powered_by) = &outcome.powered_by {
        haystack.push(' ');
        haystack.push_str(&powered_by.to_ascii_lowercase());
    }

    if haystack.contains("vite") {
        ServerType::Vite
    } else if haystack.contains("webpack") {
        ServerType::Webpack
    } else {
        ServerType::Custom
    }
}

// ============================================================================
// Tests
// ============================================================================
