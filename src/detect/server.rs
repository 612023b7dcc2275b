//! Detected dev server records and the known server family table.
//!
//! A [`DevServer`] is ephemeral: it exists only as long as probes keep
//! succeeding and is never persisted. Identity is `(server_type, port)`.
//!
//! # Server Families
//!
//! | Family | Identifier | HMR |
//! |--------|------------|-----|
//! | Vite | `vite` | yes |
//! | Next.js | `next` | yes |
//! | Nuxt | `nuxt` | yes |
//! | Create React App | `react-scripts` | no |
//! | Parcel | `parcel` | no |
//! | Vue CLI | `vue` | no |
//! | Angular | `angular` | no |
//! | SvelteKit | `svelte` | yes |
//! | Astro | `astro` | yes |
//! | Remix | `remix` | yes |
//! | Gatsby | `gatsby` | no |
//! | webpack Dev Server | `webpack` | yes |
//! | Custom | `custom` | no |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// ServerType
// ============================================================================

/// Known dev server families.
///
/// The set is closed: anything that responds on a candidate port but does
/// not match a known family is [`ServerType::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerType {
    /// Vite dev server.
    Vite,
    /// Next.js dev server.
    Next,
    /// Nuxt dev server.
    Nuxt,
    /// Create React App (`react-scripts start`).
    ReactScripts,
    /// Parcel dev server.
    Parcel,
    /// Vue CLI (`vue-cli-service serve`).
    Vue,
    /// Angular CLI (`ng serve`).
    Angular,
    /// SvelteKit dev server.
    Svelte,
    /// Astro dev server.
    Astro,
    /// Remix dev server.
    Remix,
    /// Gatsby develop server.
    Gatsby,
    /// webpack-dev-server.
    Webpack,
    /// Unrecognized server.
    Custom,
}

impl ServerType {
    /// Returns the raw identifier for this family.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vite => "vite",
            Self::Next => "next",
            Self::Nuxt => "nuxt",
            Self::ReactScripts => "react-scripts",
            Self::Parcel => "parcel",
            Self::Vue => "vue",
            Self::Angular => "angular",
            Self::Svelte => "svelte",
            Self::Astro => "astro",
            Self::Remix => "remix",
            Self::Gatsby => "gatsby",
            Self::Webpack => "webpack",
            Self::Custom => "custom",
        }
    }

    /// Returns the display title for this family.
    ///
    /// Families without a curated title pass their raw identifier through.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Vite => "Vite",
            Self::Next => "Next.js",
            Self::Nuxt => "Nuxt",
            Self::ReactScripts => "Create React App",
            Self::Parcel => "Parcel",
            Self::Vue => "Vue CLI",
            Self::Angular => "Angular",
            Self::Svelte => "SvelteKit",
            Self::Astro => "Astro",
            Self::Remix => "Remix",
            Self::Gatsby => "Gatsby",
            Self::Webpack => "webpack Dev Server",
            Self::Custom => "custom",
        }
    }

    /// Returns `true` if this family supports hot-module replacement.
    ///
    /// HMR-capable servers sort before full-reload servers in detection
    /// results.
    #[inline]
    #[must_use]
    pub const fn supports_hmr(&self) -> bool {
        matches!(
            self,
            Self::Vite
                | Self::Next
                | Self::Nuxt
                | Self::Svelte
                | Self::Astro
                | Self::Remix
                | Self::Webpack
        )
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DevServer
// ============================================================================

/// A detected running dev server.
///
/// Built from a successful probe; never persisted. Two records describe
/// the same server when `(server_type, port)` match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevServer {
    /// Server family.
    #[serde(rename = "type")]
    pub server_type: ServerType,

    /// Listening port.
    pub port: u16,

    /// Base path, default `/`.
    pub path: String,

    /// Whether the family supports hot-module replacement.
    pub hmr: bool,

    /// Timestamp of the last successful probe.
    pub last_seen: DateTime<Utc>,

    /// Whether the last probe succeeded.
    pub healthy: bool,

    /// Process ID, when the host knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl DevServer {
    /// Creates a healthy server record seen now.
    #[must_use]
    pub fn new(server_type: ServerType, port: u16) -> Self {
        Self {
            server_type,
            port,
            path: "/".to_string(),
            hmr: server_type.supports_hmr(),
            last_seen: Utc::now(),
            healthy: true,
            pid: None,
        }
    }

    /// Returns the `(type, port)` identity pair.
    #[inline]
    #[must_use]
    pub fn identity(&self) -> (ServerType, u16) {
        (self.server_type, self.port)
    }

    /// Computes the preview URL: `http://localhost:{port}{path}`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Url`] when the base path does not form a
    /// valid URL.
    pub fn preview_url(&self) -> crate::Result<Url> {
        let root = Url::parse(&format!("http://localhost:{}", self.port))?;
        Ok(root.join(&self.path)?)
    }

    /// Returns the display title for this server.
    #[inline]
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.server_type.label()
    }
}

impl fmt::Display for DevServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on :{}", self.server_type, self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================
