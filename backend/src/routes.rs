use crate::handlers;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([HeaderValue::from_static("http://localhost:5173")])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/papers", post(handlers::create_paper).get(handlers::list_papers))
        .route("/api/v1/papers/:id", get(handlers::get_paper))
        .route(
            "/api/v1/papers/:id/responses",
            post(handlers::submit_response).get(handlers::list_responses),
        )
        .route("/api/v1/papers/:id/group-fields", get(handlers::paper_group_fields))
        .route("/api/v1/papers/:id/analytics", get(handlers::class_analytics))
        .route("/api/v1/papers/:id/analytics/export", get(handlers::class_export))
        .route("/api/v1/papers/:id/analytics/areas", get(handlers::class_areas))
        .route("/api/v1/responses/:id/analytics", get(handlers::student_analytics))
        .route("/api/v1/responses/:id/areas", get(handlers::student_areas))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
