//! HTTP surface assembly.
//!
//! All API routes live under `/api`; handles are injected with `Extension` layers.

use crate::membership::handlers::handle_list_nodes;
use crate::membership::protocol::{ENDPOINT_NODES, ENDPOINT_WS_NODES};
use crate::membership::service::FleetView;
use crate::membership::types::NodeId;
use crate::streaming::adapter::StreamSettings;
use crate::streaming::handlers::{handle_ws_nodes, handle_ws_tasks};
use crate::tasks::handlers::*;
use crate::tasks::protocol::*;
use crate::tasks::registry::TaskRegistry;

use axum::http::HeaderValue;
use axum::{Extension, Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Everything a request handler may need, cloned into each route.
#[derive(Clone)]
pub struct AppState {
    pub node_id: NodeId,
    pub fleet: FleetView,
    pub registry: TaskRegistry,
    pub stream: StreamSettings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route(ENDPOINT_NODES, get(handle_list_nodes))
        .route(ENDPOINT_WS_NODES, get(handle_ws_nodes))
        .route(ENDPOINT_TASKS, get(handle_list_tasks))
        .route(ENDPOINT_TASK, get(handle_get_task).delete(handle_cancel_task))
        .route(ENDPOINT_WS_TASKS, get(handle_ws_tasks))
        .route(
            ENDPOINT_UPLOAD,
            get(handle_upload_usage).post(handle_upload_csv),
        )
        .route(
            ENDPOINT_QUERY,
            get(handle_query_usage).post(handle_submit_query),
        );

    Router::new()
        .route("/", get(handle_root))
        .nest("/api", api)
        .layer(Extension(state.node_id))
        .layer(Extension(state.fleet))
        .layer(Extension(state.registry))
        .layer(Extension(state.stream))
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn handle_root(Extension(node_id): Extension<NodeId>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Welcome to the fleet coordination API ({})", node_id),
    })
}

/// Serves `router` until `shutdown` fires, then drains in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
