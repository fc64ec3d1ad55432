// core/api/src/server.rs

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use projrec_engine::{RankerConfig, RecommendationEngine};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};

use crate::logging::TraceId;

/// Header carrying a propagated trace ID in and out of the service
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Server state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    engine: Arc<RecommendationEngine>,
}

/// Successful recommendation payload
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<String>,
}

/// Error payload; every engine fault maps to the same shape
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Optional per-request ranking overrides
#[derive(Debug, Default, Deserialize)]
pub struct RecommendQuery {
    pub top_n: Option<usize>,
    pub alpha: Option<f64>,
}

impl RecommendQuery {
    fn apply(&self, base: RankerConfig) -> RankerConfig {
        RankerConfig {
            top_n: self.top_n.unwrap_or(base.top_n),
            alpha: self.alpha.unwrap_or(base.alpha),
        }
    }
}

/// REST front end for the recommendation engine
pub struct RecommendationServer {
    engine: Arc<RecommendationEngine>,
}

impl RecommendationServer {
    pub fn new(engine: Arc<RecommendationEngine>) -> Self {
        Self { engine }
    }

    /// Create the Axum router with all API endpoints
    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
        };

        Router::new()
            .route("/recommendations/:user_id", get(recommendations))
            .route("/health", get(health_check))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
            .with_state(state)
    }

    /// Start the REST API server
    pub async fn start(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let app = self.router();

        info!("Starting recommendation API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

/// Reuse a well-formed incoming trace ID, otherwise mint a new one
fn request_trace_id(headers: &HeaderMap) -> TraceId {
    headers
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(TraceId::parse)
        .unwrap_or_default()
}

/// GET /recommendations/:user_id - ranked project titles for a user
async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendQuery>,
    headers: HeaderMap,
) -> Response {
    let trace_id = request_trace_id(&headers);
    let span = info_span!("recommendations", trace_id = %trace_id, user_id = %user_id);

    let mut response = async move {
        let config = query.apply(state.engine.config());
        if let Err(e) = config.validate() {
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }

        match state.engine.get_recommendations_with(&user_id, config).await {
            Ok(result) => Json(RecommendationResponse {
                recommendations: result.recommendations,
            })
            .into_response(),
            Err(e) => {
                error!(kind = e.kind(), "Recommendation failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// GET /health - liveness probe
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
