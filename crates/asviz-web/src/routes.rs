// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Route definitions for REST API and Web UI.

use crate::handlers;
use crate::AppState;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rust_embed::RustEmbed;
use std::sync::Arc;

#[derive(RustEmbed)]
#[folder = "static/"]
struct Assets;

/// API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/report", get(handlers::report))
        .route("/api/v1/topology", get(handlers::topology))
        .route("/api/v1/paths", get(handlers::paths))
        .route("/api/v1/segments", get(handlers::segments))
        .route("/api/v1/info", get(handlers::info))
}

/// Web UI routes
pub fn ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::page))
        .route("/index.html", get(handlers::page))
        .route("/style.css", get(serve_style))
        .route("/asviz.js", get(serve_app_js))
        .route("/favicon.ico", get(serve_favicon))
}

/// Embedded text asset, e.g. the page template.
pub fn asset_text(path: &str) -> Option<String> {
    Assets::get(path).map(|content| String::from_utf8_lossy(&content.data).into_owned())
}

async fn serve_style() -> Response {
    serve_asset("style.css")
}

async fn serve_app_js() -> Response {
    serve_asset("asviz.js")
}

async fn serve_favicon() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn serve_asset(path: &str) -> Response {
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
