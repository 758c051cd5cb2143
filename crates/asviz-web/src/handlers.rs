// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers for the query page and REST API.

use crate::routes;
use crate::AppState;
use asviz::graph;
use asviz::render::json;
use asviz::{DaemonError, DataMode, IsdAs, PagePayload, Report, ReportRequest, SourceError};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tera::Tera;
use tracing::warn;

/// Tabs of the query page; the first is shown when none is given.
pub const TABS: [&str; 3] = ["list", "topo", "paths"];

/// Name of the query page template.
pub const PAGE_TEMPLATE: &str = "index.html";

/// API error response
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    fn bad_request(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: 400,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<&SourceError> for ApiError {
    fn from(err: &SourceError) -> Self {
        Self {
            error: err.to_string(),
            code: match err {
                SourceError::Daemon(DaemonError::Connection { .. }) => 503,
                SourceError::Daemon(DaemonError::Timeout { .. }) => 504,
                SourceError::Daemon(_) | SourceError::Decode(_) => 502,
                SourceError::File { .. } => 404,
                SourceError::Unsupported(_) => 501,
            },
        }
    }
}

/// Query parameters shared by the page and the API.
///
/// Empty values, as submitted by a blank form field, count as absent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ViewQuery {
    pub src: Option<String>,
    pub dst: Option<String>,
    pub tab: Option<String>,
    pub data: Option<String>,
    pub mp: Option<String>,
    pub addr: Option<String>,
}

fn field(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validated query.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub request: ReportRequest,
    pub mode: DataMode,
    pub addr: Option<Ipv4Addr>,
}

impl ViewQuery {
    pub fn has_source(&self) -> bool {
        field(&self.src).is_some()
    }

    /// Requested tab, or the default tab when unknown.
    pub fn tab(&self) -> &'static str {
        field(&self.tab)
            .and_then(|t| TABS.iter().find(|known| **known == t))
            .copied()
            .unwrap_or(TABS[0])
    }

    pub fn parse(&self, default_max_paths: usize) -> Result<ParsedQuery, String> {
        let src: IsdAs = field(&self.src)
            .ok_or("missing 'src' parameter")?
            .parse()
            .map_err(|e| format!("src: {}", e))?;
        let dst = field(&self.dst)
            .map(|d| d.parse::<IsdAs>())
            .transpose()
            .map_err(|e| format!("dst: {}", e))?;
        let mode = field(&self.data)
            .map(str::parse::<DataMode>)
            .transpose()?
            .unwrap_or_default();
        let max_paths = match field(&self.mp) {
            Some(mp) => mp
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("mp: invalid path count '{}'", mp))?,
            None => default_max_paths,
        };
        let addr = field(&self.addr)
            .map(|a| a.parse::<Ipv4Addr>())
            .transpose()
            .map_err(|e| format!("addr: {}", e))?;

        Ok(ParsedQuery {
            request: ReportRequest::full(src, dst, max_paths),
            mode,
            addr,
        })
    }
}

/// Run the blocking daemon/file queries off the async runtime.
async fn fetch(state: Arc<AppState>, query: ParsedQuery) -> Result<Report, ApiError> {
    tokio::task::spawn_blocking(move || {
        Report::fetch(state.pool(), query.mode, &query.request, query.addr)
    })
    .await
    .map_err(|e| {
        warn!("Report task failed: {}", e);
        ApiError {
            error: "report task failed".into(),
            code: 500,
        }
    })
}

// ============================================================================
// Query page
// ============================================================================

/// GET / - query page
pub async fn page(State(state): State<Arc<AppState>>, Query(query): Query<ViewQuery>) -> Response {
    let payload = if !query.has_source() {
        PagePayload::blank()
    } else {
        match query.parse(state.config().max_paths) {
            Err(msg) => PagePayload::failed(msg),
            Ok(parsed) => match fetch(Arc::clone(&state), parsed).await {
                Ok(report) => PagePayload::from_report(&report),
                Err(e) => PagePayload::failed(e.error),
            },
        }
    };

    match render_page(state.templates(), &query, &payload) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            warn!("Failed to render query page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
        }
    }
}

/// Parse the embedded query page template.
pub fn load_templates() -> Result<Tera, tera::Error> {
    let source = routes::asset_text(PAGE_TEMPLATE)
        .ok_or_else(|| tera::Error::msg(format!("{} asset missing", PAGE_TEMPLATE)))?;
    page_templates(&source)
}

/// Template set holding `source` as the query page. Form values are
/// autoescaped; the JSON payloads and outline are marked `safe` in the page.
pub fn page_templates(source: &str) -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(PAGE_TEMPLATE, source)?;
    Ok(tera)
}

/// Fill the page template.
pub fn render_page(
    tera: &Tera,
    query: &ViewQuery,
    payload: &PagePayload,
) -> Result<String, tera::Error> {
    let text = |v: &Option<String>| field(v).unwrap_or_default().to_string();

    let mut ctx = tera::Context::new();
    ctx.insert("src", &text(&query.src));
    ctx.insert("dst", &text(&query.dst));
    ctx.insert("tab", query.tab());
    ctx.insert("data", &text(&query.data));
    ctx.insert("mp", &text(&query.mp));
    ctx.insert("addr", &text(&query.addr));
    ctx.insert("error", payload.error.as_deref().unwrap_or_default());
    ctx.insert("json_astopo", &json::render_script(&payload.topology));
    ctx.insert("json_pathtopo", &json::render_script(&payload.paths));
    ctx.insert("json_segtopo", &json::render_script(&payload.segments));
    ctx.insert("path_info", &payload.outline_html);

    tera.render(PAGE_TEMPLATE, &ctx)
}

// ============================================================================
// REST API
// ============================================================================

async fn report_for(
    state: Arc<AppState>,
    query: &ViewQuery,
    shape: impl FnOnce(&mut ReportRequest),
) -> Result<Report, ApiError> {
    let mut parsed = query
        .parse(state.config().max_paths)
        .map_err(ApiError::bad_request)?;
    shape(&mut parsed.request);
    fetch(state, parsed).await
}

/// GET /api/v1/report
pub async fn report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    let report = report_for(state, &query, |_| {}).await?;
    Ok((StatusCode::OK, Json(report.to_json())).into_response())
}

/// GET /api/v1/topology
pub async fn topology(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    let report = report_for(state, &query, |r| {
        r.paths = false;
        r.segments = false;
    })
    .await?;

    match &report.topology {
        Some(Ok(topo)) => Ok(Json(graph::topology_graph(&topo.value)).into_response()),
        Some(Err(e)) => Err(ApiError::from(e)),
        None => Err(ApiError::bad_request("topology not requested")),
    }
}

/// GET /api/v1/paths
pub async fn paths(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    if field(&query.dst).is_none() {
        return Err(ApiError::bad_request("missing 'dst' parameter"));
    }
    let report = report_for(state, &query, |r| r.topology = false).await?;

    if let Some(Err(e)) = &report.paths {
        return Err(ApiError::from(e));
    }
    let segments = report.segments();
    Ok(Json(serde_json::json!({
        "graph": graph::path_graph(&segments, report.paths()),
        "links": graph::path_links(report.paths()),
    }))
    .into_response())
}

/// GET /api/v1/segments
pub async fn segments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    if field(&query.dst).is_none() {
        return Err(ApiError::bad_request("missing 'dst' parameter"));
    }
    let report = report_for(state, &query, |r| {
        r.topology = false;
        r.paths = false;
    })
    .await?;

    if let Some((_, Err(e))) = report.segments.iter().find(|(_, r)| r.is_err()) {
        return Err(ApiError::from(e));
    }
    Ok(Json(graph::segment_listing(&report.segments())).into_response())
}

/// GET /api/v1/info - Server info
pub async fn info() -> Response {
    let info = serde_json::json!({
        "name": "asviz-web",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/report",
            "/api/v1/topology",
            "/api/v1/paths",
            "/api/v1/segments",
            "/api/v1/info"
        ]
    });

    (StatusCode::OK, Json(info)).into_response()
}
