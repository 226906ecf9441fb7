use std::fs;
use std::path::{Path, PathBuf};

use pxdash_core::dashboard::DashboardConfig;

/// Configuration for the datasets dashboard binary
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub dashboard: DashboardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Env-driven defaults; every variable is optional
        Self {
            dashboard: DashboardConfig::from_env(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file (path via PXDASH_CONFIG or ./pxdash.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("PXDASH_CONFIG").unwrap_or_else(|_| "pxdash.toml".into());
        Self::load_from(Path::new(&path), Self::default())
    }

    /// Overlay the TOML file at `path` onto `base`. Missing or malformed files
    /// leave `base` untouched.
    pub fn load_from(path: &Path, base: AppConfig) -> Self {
        if !path.exists() {
            tracing::info!(target: "datasets_dashboard", path = %path.display(), "No TOML config found; using defaults/env");
            return base;
        }
        match fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<AppToml>(&s) {
                Ok(t) => t.overlay(base),
                Err(e) => {
                    tracing::warn!(target: "datasets_dashboard", error = %e, "Failed to parse TOML; using defaults");
                    base
                }
            },
            Err(e) => {
                tracing::warn!(target: "datasets_dashboard", error = %e, "Failed to read TOML; using defaults");
                base
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AppToml {
    pub server: Option<ServerToml>,
    pub data: Option<DataToml>,
}

impl AppToml {
    fn overlay(self, mut base: AppConfig) -> AppConfig {
        if let Some(s) = self.server {
            s.apply(&mut base.dashboard);
        }
        if let Some(d) = self.data {
            d.apply(&mut base.dashboard);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerToml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub title: Option<String>,
}

impl ServerToml {
    fn apply(self, d: &mut DashboardConfig) {
        if let Some(v) = self.host {
            d.host = v;
        }
        if let Some(v) = self.port {
            d.port = v;
        }
        if let Some(v) = self.title {
            d.title = v;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DataToml {
    pub dir: Option<PathBuf>,
}

impl DataToml {
    fn apply(self, d: &mut DashboardConfig) {
        if let Some(v) = self.dir {
            d.data_dir = v;
        }
    }
}
