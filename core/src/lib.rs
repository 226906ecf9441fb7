// pxdash Core Library
// Example-dataset dispatcher and the web view host that renders it

pub mod chart;
pub mod dashboard;
pub mod data;
pub mod dataset;
pub mod dispatcher;
pub mod figure;
pub mod palette;
pub mod telemetry;

// Export core types
pub use chart::{BarMode, Channel, ChartKind, ChartSpec, DisplayParams, Marginal};
pub use data::{Cell, DataStore, Table};
pub use dataset::{DatasetInfo, SelectionKey};
pub use dispatcher::{chart_kind, dispatch, dispatch_str, DatasetView};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Unknown selection: {0:?}")]
    UnknownSelection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Data error: {0}")]
    Data(String),
}
pub type Result<T> = std::result::Result<T, DashError>;
