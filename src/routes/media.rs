use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    services::media_service::{self, PLACEHOLDER_SVG},
    state::AppState,
};

const PROXY_FALLBACK_HEADER: HeaderName = HeaderName::from_static("x-proxy-fallback");

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/image-proxy", get(image_proxy))
        .route("/invoice", get(invoice_preview))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImageProxyQuery {
    pub url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvoiceQuery {
    pub sku: Option<String>,
    pub price: Option<String>,
    pub name: Option<String>,
}

fn svg_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers
}

#[utoipa::path(
    get,
    path = "/api/image-proxy",
    params(("url" = String, Query, description = "Absolute http(s) image URL")),
    responses(
        (status = 200, description = "Upstream image, or a placeholder SVG with x-proxy-fallback: 1", content_type = "image/*"),
        (status = 400, description = "Not an http(s) URL"),
    ),
    tag = "Media"
)]
pub async fn image_proxy(
    State(state): State<AppState>,
    Query(query): Query<ImageProxyQuery>,
) -> AppResult<Response> {
    let url = media_service::validate_proxy_url(&query.url)?;

    let Some(upstream) = media_service::fetch_image(&state.http, url).await else {
        let mut headers = svg_headers();
        headers.insert(PROXY_FALLBACK_HEADER, HeaderValue::from_static("1"));
        return Ok((headers, PLACEHOLDER_SVG).into_response());
    };

    let mut headers = HeaderMap::new();
    for name in [header::CONTENT_TYPE, header::CONTENT_LENGTH, header::CACHE_CONTROL] {
        if let Some(value) = upstream.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400"));
    }

    Ok((headers, Body::from_stream(upstream.bytes_stream())).into_response())
}

#[utoipa::path(
    get,
    path = "/api/invoice",
    params(
        ("sku" = String, Query, description = "SKU code"),
        ("price" = String, Query, description = "Unit price in minor units"),
        ("name" = String, Query, description = "Customer name"),
    ),
    responses(
        (status = 200, description = "Invoice image", content_type = "image/svg+xml"),
        (status = 400, description = "Missing or invalid parameters"),
    ),
    tag = "Media"
)]
pub async fn invoice_preview(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> AppResult<Response> {
    let svg = media_service::invoice_preview(
        &state.config.store_name,
        query.sku.as_deref(),
        query.price.as_deref(),
        query.name.as_deref(),
    )?;
    Ok((svg_headers(), svg).into_response())
}
