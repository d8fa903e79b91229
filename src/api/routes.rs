use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::assignments::assignment_routes;
use super::clients::client_routes;
use super::health::health_check;
use super::notifications::notification_routes;
use super::progression::progression_routes;
use super::schedules::schedule_routes;
use super::sessions::session_routes;
use super::templates::template_routes;
use super::users::user_routes;
use crate::services::ProcessorOptions;

pub fn create_routes(db: PgPool, processor_options: ProcessorOptions) -> Router {
    let api = Router::new()
        .merge(user_routes(db.clone()))
        .merge(client_routes(db.clone()))
        .merge(template_routes(db.clone()))
        .merge(assignment_routes(db.clone()))
        .merge(schedule_routes(db.clone(), processor_options))
        .merge(session_routes(db.clone()))
        .merge(progression_routes(db.clone()))
        .merge(notification_routes(db));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
