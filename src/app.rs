use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/selector/pointer", post(handlers::pointer))
        .route("/api/selector/toggle", post(handlers::toggle))
        .route("/api/selector/pick", post(handlers::pick))
        .route("/api/selector/range", post(handlers::range))
        .route("/api/notify", post(handlers::notify))
        .route("/api/records", post(handlers::ingest))
        .with_state(state)
}
