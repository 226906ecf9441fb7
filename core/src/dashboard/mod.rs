// Dashboard module - the web view host
//
// Serves the single page (selector, description, chart) and the JSON API the
// page calls whenever the selection changes.

mod api;
mod static_assets;

use std::path::PathBuf;

pub use api::{DashboardServer, DatasetOption, DatasetsResponse, ErrorBody, ViewResponse};

pub const DEFAULT_PORT: u16 = 8050;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_TITLE: &str = "Plotly Express Data Sets";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Dashboard configuration
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    pub port: u16,
    pub host: String,
    /// Page heading
    pub title: String,
    /// Directory holding `<key>.csv` for each dataset
    pub data_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            title: DEFAULT_TITLE.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PXDASH_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            host: std::env::var("PXDASH_HOST")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            title: std::env::var("PXDASH_TITLE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            data_dir: std::env::var("PXDASH_DATA_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_dash_port() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.port, 8050);
        assert_eq!(cfg.addr(), "127.0.0.1:8050");
        assert_eq!(cfg.title, "Plotly Express Data Sets");
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
    }
}
