pub mod health;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, routing::post, Router};

use crate::auth::require_session;
use crate::pipeline::handlers;
use crate::state::AppState;

/// Headroom for multipart boundaries and the text fields alongside the file.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let resumes = Router::new()
        .route("/api/v1/resumes", get(handlers::handle_list_records))
        .route("/api/v1/resumes/analyze", post(handlers::handle_analyze))
        .route(
            "/api/v1/resumes/analyze/status",
            get(handlers::handle_analyze_status),
        )
        .route("/api/v1/resumes/:id", get(handlers::handle_get_record))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(resumes)
        .with_state(state)
}
