//! HTTP API server
//!
//! Thin hyper layer over the geofence engine:
//! - JSON API (/location, /vehicle/{id}/status, /zones, /config, /health)
//! - Prometheus text at /metrics
//! - Static frontend files from the configured directory
//!
//! Every response carries `Access-Control-Allow-Origin: *`.

use crate::domain::EngineError;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::prometheus::format_prometheus_metrics;
use crate::io::request::parse_location_body;
use crate::services::GeofenceEngine;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Values handed to the web frontend via /config
#[derive(Debug, Clone, Serialize)]
pub struct FrontendConfig {
    pub api_base_url: String,
    pub map_center: MapCenter,
    pub map_zoom: u8,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Shared state for all connections
pub struct AppState {
    engine: Arc<GeofenceEngine>,
    metrics: Arc<Metrics>,
    frontend: FrontendConfig,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(engine: Arc<GeofenceEngine>, metrics: Arc<Metrics>, config: &Config) -> Self {
        Self {
            engine,
            metrics,
            frontend: FrontendConfig {
                api_base_url: config.api_base_url(),
                map_center: MapCenter { lat: config.map_center_lat(), lon: config.map_center_lon() },
                map_zoom: config.map_zoom(),
            },
            static_dir: PathBuf::from(config.static_dir()),
        }
    }
}

type HttpResponse = Response<Full<Bytes>>;

fn response(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(body.into()))
        .expect("static response should not fail")
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => response(status, "application/json", body),
        Err(e) => {
            error!(error = %e, "response_serialization_failed");
            internal_error()
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &json!({ "error": message }))
}

fn internal_error() -> HttpResponse {
    response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "application/json",
        r#"{"error":"Internal server error"}"#,
    )
}

fn preflight() -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .body(Full::new(Bytes::new()))
        .expect("static response should not fail")
}

/// Extract `{id}` from `/vehicle/{id}/status`
fn vehicle_status_id(path: &str) -> Option<String> {
    let id = path.strip_prefix("/vehicle/")?.strip_suffix("/status")?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    percent_decode(id)
}

/// Decode `%XX` escapes in a path segment
fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Resolve a request path to a file under `static_dir`, refusing traversal
fn static_path(static_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(static_dir.join(relative))
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

async fn serve_static(path: PathBuf) -> HttpResponse {
    match tokio::fs::read(&path).await {
        Ok(content) => response(StatusCode::OK, content_type_for(&path), content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error_response(StatusCode::NOT_FOUND, "Not found")
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "static_read_failed");
            internal_error()
        }
    }
}

async fn receive_location<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            state.metrics.record_rejected();
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large");
        }
        Err(e) => {
            error!(error = %e, "request_body_read_failed");
            return internal_error();
        }
    };

    match parse_location_body(&body) {
        Ok(event) => {
            let update = state.engine.process_location_event(event);
            json_response(StatusCode::OK, &update)
        }
        Err(e) => {
            state.metrics.record_rejected();
            debug!(reason = %e, "location_rejected");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn vehicle_status(vehicle_id: &str, state: &AppState) -> HttpResponse {
    match state.engine.get_vehicle_status(vehicle_id) {
        Ok(status) => json_response(StatusCode::OK, &status),
        Err(EngineError::VehicleNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, "Vehicle not found")
        }
        Err(e) => {
            error!(vehicle_id = %vehicle_id, error = %e, "vehicle_status_failed");
            internal_error()
        }
    }
}

/// Route a single request
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let resp = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => preflight(),
        (&Method::GET, "/health") => json_response(StatusCode::OK, &json!({ "status": "healthy" })),
        (&Method::POST, "/location") => receive_location(req, &state).await,
        (&Method::GET, "/zones") => {
            json_response(StatusCode::OK, &json!({ "zones": state.engine.list_zones() }))
        }
        (&Method::GET, "/config") => json_response(StatusCode::OK, &state.frontend),
        (&Method::GET, "/metrics") => {
            let body = format_prometheus_metrics(
                &state.metrics,
                state.engine.tracked_vehicles(),
                state.engine.registry().len(),
            );
            response(StatusCode::OK, "text/plain; version=0.0.4; charset=utf-8", body)
        }
        (&Method::GET, "/") => serve_static(state.static_dir.join("index.html")).await,
        (&Method::GET, p) => {
            if let Some(vehicle_id) = vehicle_status_id(p) {
                vehicle_status(&vehicle_id, &state)
            } else if let Some(file) = static_path(&state.static_dir, p) {
                serve_static(file).await
            } else {
                error_response(StatusCode::NOT_FOUND, "Not found")
            }
        }
        _ => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    };

    debug!(method = %method, path = %path, status = %resp.status().as_u16(), "http_request");
    Ok(resp)
}

/// Start the HTTP server and serve until shutdown is signalled
pub async fn start_http_server(
    addr: SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;

    info!(addr = %addr, "http_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _peer)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let state = state.clone();
                                async move { handle_request(req, state).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                warn!(error = %e, "http_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
