mod cors;

use axum::Router;
use axum::routing::{any, get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/apps/{app_id}/action/{action_path}",
            any(handlers::actions::dispatch_action_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .with_state(app_state)
}
