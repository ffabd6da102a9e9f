pub mod auth;
pub mod dto;
pub mod handlers;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub use state::AppState;

/// Assembles the full route table plus the ambient `/healthz`
/// probe and tower-http's tracing/CORS/timeout layers.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/room/create", post(handlers::create_room))
        .route("/api/room/my-room", get(handlers::my_owned_room))
        .route("/api/room/my-joined-room", get(handlers::my_joined_room))
        .route("/api/room/{code}", get(handlers::get_room).delete(handlers::close_room))
        .route("/api/room/{code}/join", post(handlers::join_room))
        .route("/api/room/{code}/leave", post(handlers::leave_room))
        .route("/api/room/{code}/remove/{member_id}", post(handlers::remove_member))
        .route("/api/room/{code}/divide", post(handlers::divide_teams))
        .route("/api/room/{code}/redivide", post(handlers::redivide_teams))
        .route("/api/room/{code}/result", get(handlers::get_division_result))
        .route("/api/room/{code}/member/{member_id}/labels", post(handlers::set_member_labels))
        .route("/api/room/{code}/label-rules", post(handlers::set_label_rules))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
