// Dashboard HTTP API server
//
// Serves the page and the selection endpoint the page calls on every change

use crate::dashboard::static_assets;
use crate::dashboard::DashboardConfig;
use crate::data::DataStore;
use crate::dataset::SelectionKey;
use crate::dispatcher::{chart_kind, dispatch_str, DatasetView};
use crate::figure;
use crate::{ChartKind, DashError};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Dashboard server state
#[derive(Clone)]
struct DashboardState {
    config: Arc<DashboardConfig>,
    data: Arc<DataStore>,
    started_at: String,
}

/// One selector option
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetOption {
    pub value: SelectionKey,
    pub label: String,
    pub rows: usize,
    pub kind: ChartKind,
}

/// Body of `GET /api/datasets`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetsResponse {
    pub default: SelectionKey,
    pub options: Vec<DatasetOption>,
}

/// Body of `GET /api/datasets/{key}`
#[derive(Clone, Debug, Serialize)]
pub struct ViewResponse {
    #[serde(flatten)]
    pub view: DatasetView,
    /// Plotly.js figure derived from `view.chart`
    pub figure: serde_json::Value,
}

/// Dashboard HTTP server
pub struct DashboardServer {
    config: DashboardConfig,
    data: Arc<DataStore>,
}

impl DashboardServer {
    /// Server with no tables loaded; charts come back without points
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            data: Arc::new(DataStore::new()),
        }
    }

    pub fn with_data(mut self, data: DataStore) -> Self {
        self.data = Arc::new(data);
        self
    }

    /// Build the router without binding a socket
    pub fn router(&self) -> Router {
        let state = DashboardState {
            config: Arc::new(self.config.clone()),
            data: self.data.clone(),
            started_at: chrono::Utc::now().to_rfc3339(),
        };

        Router::new()
            .route("/", get(index_handler))
            .route("/static/*asset", get(static_asset_handler))
            .route("/api/datasets", get(datasets_handler))
            .route("/api/datasets/:key", get(dataset_view_handler))
            .route("/api/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(state)
    }

    /// Bind the configured address and serve until the process exits
    pub async fn serve(self) -> crate::Result<()> {
        let addr = self.config.addr();
        info!(target: "dashboard", addr = %addr, "Starting Dashboard server");
        let listener = TcpListener::bind(&addr).await?;
        self.serve_with_listener(listener, std::future::pending())
            .await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let local = listener.local_addr()?;
        info!(
            target: "dashboard",
            url = %format!("http://{}", local),
            datasets = self.data.len(),
            "Dashboard server ready"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!(target: "dashboard", "Dashboard server stopped");
        Ok(())
    }
}

/// Error body returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

struct ApiError(DashError);

impl From<DashError> for ApiError {
    fn from(e: DashError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, key) = match &self.0 {
            DashError::UnknownSelection(key) => (StatusCode::NOT_FOUND, Some(key.clone())),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            key,
        };
        (status, Json(body)).into_response()
    }
}

/// Serve the page, with the selector options rendered from the closed key set
async fn index_handler(State(state): State<DashboardState>) -> Html<String> {
    Html(render_index(&state.config.title))
}

fn render_index(title: &str) -> String {
    let default = SelectionKey::default();
    let options = SelectionKey::ALL
        .iter()
        .map(|key| {
            let selected = if *key == default { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                key.as_str(),
                selected,
                key.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n          ");

    static_assets::INDEX_TEMPLATE
        .replace("{{title}}", &escape_html(title))
        .replace("{{options}}", &options)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

async fn static_asset_handler(Path(asset): Path<String>) -> impl IntoResponse {
    match static_assets::get(asset.as_str()) {
        Some(asset) => {
            let mut headers = HeaderMap::new();
            if let Ok(value) = header::HeaderValue::from_str(asset.content_type) {
                headers.insert(header::CONTENT_TYPE, value);
            }
            (StatusCode::OK, headers, asset.body).into_response()
        }
        None => (StatusCode::NOT_FOUND, b"Not found".as_slice()).into_response(),
    }
}

/// List the selector options
async fn datasets_handler() -> Json<DatasetsResponse> {
    let options = SelectionKey::ALL
        .iter()
        .map(|key| DatasetOption {
            value: *key,
            label: key.label().to_string(),
            rows: key.info().rows,
            kind: chart_kind(*key),
        })
        .collect();

    Json(DatasetsResponse {
        default: SelectionKey::default(),
        options,
    })
}

/// Description + chart for one selection
async fn dataset_view_handler(
    State(state): State<DashboardState>,
    Path(key): Path<String>,
) -> Result<Json<ViewResponse>, ApiError> {
    let view = dispatch_str(&key).map_err(|e| {
        warn!(target: "dashboard", key = %key, error = %e, "Rejected selection update");
        e
    })?;
    let figure = figure::to_plotly(&view.chart, state.data.get(view.key));
    Ok(Json(ViewResponse { view, figure }))
}

async fn health_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "started_at": state.started_at,
        "datasets_loaded": state.data.len(),
    }))
}
