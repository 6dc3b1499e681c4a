use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{calls, handlers, middleware::metrics_middleware, reports, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Tickets
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/finish", post(tickets::finish_ticket))
        .route("/tickets/{id}/discard", post(tickets::discard_ticket))
        .route("/queue", get(tickets::queue_status))
        // Calls
        .route("/calls", post(calls::call_next))
        .route("/calls/recent", get(calls::recent_calls))
        // Reports
        .route("/reports/daily", get(reports::daily_report))
        .route("/reports/monthly", get(reports::monthly_report));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
