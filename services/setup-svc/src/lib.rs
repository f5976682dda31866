pub mod config;
pub mod error;
pub mod flows;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use common_config::ServiceConfig;
use common_obs::{health_router, ObsInit};
use deliveroo_setup::{Credentials, DeliverooValidator, FlowResult};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use config::SetupSvcConfig;
use error::ApiError;
use flows::FlowRegistry;

pub const SERVICE_NAME: &str = "setup-svc";
const REQUEST_ID_HEADER: &str = "x-request-id";

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_SHA: &str = match option_env!("BUILD_SHA") {
    Some(value) => value,
    None => "dev",
};

#[derive(Clone)]
pub struct AppState {
    pub flows: FlowRegistry,
}

impl AppState {
    pub fn from_config(config: &SetupSvcConfig) -> Result<Self, reqwest::Error> {
        let validator = DeliverooValidator::new(config.http_client()?)
            .with_endpoint(config.api_endpoint.clone());
        Ok(Self {
            flows: FlowRegistry::new(Arc::new(validator)).with_ttl(config.flow_ttl()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub flow_id: String,
    pub result: FlowResult,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    ObsInit::init(SERVICE_NAME).map_err(|err| -> Box<dyn std::error::Error> { Box::new(err) })?;

    let config = SetupSvcConfig::load()?;
    let addr = config.socket_addr()?;
    tracing::info!(
        event = "service_start",
        service = SERVICE_NAME,
        version = VERSION,
        build_sha = BUILD_SHA,
        listen_addr = %addr,
        api_endpoint = %config.api_endpoint,
        "starting service",
    );

    let state = Arc::new(AppState::from_config(&config)?);
    serve(addr, state).await
}

pub async fn serve(
    addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state).into_make_service()).await?;
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let flow_routes = Router::new()
        .route("/v1/flows", post(start_flow))
        .route("/v1/flows/:flow_id", post(submit_flow).delete(abandon_flow))
        .with_state(state);

    Router::new()
        .merge(flow_routes)
        .merge(health_router(SERVICE_NAME))
        .layer(from_fn(request_context))
}

async fn start_flow(State(state): State<Arc<AppState>>) -> Json<FlowResponse> {
    let (flow_id, result) = state.flows.start().await;
    Json(FlowResponse { flow_id, result })
}

async fn submit_flow(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<String>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<FlowResponse>, ApiError> {
    let result = state.flows.submit(&flow_id, credentials).await?;
    Ok(Json(FlowResponse { flow_id, result }))
}

async fn abandon_flow(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.flows.abandon(&flow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn request_context(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "http.request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id
    );

    let start = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            event = "request_end",
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_secs_f64() * 1000.0
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
