// src/routes/mod.rs
pub mod chat;
pub mod health;

use std::any::Any;

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{error::AppError, state::SharedState};
use chat::chat_handler;
use health::health_handler;

pub fn create_router() -> Router<SharedState> {
    with_middleware(
        Router::new()
            .route("/", get(health_handler))
            .route("/chat", post(chat_handler)),
    )
}

/// Wrap routes in the fallback error funnel, request tracing and a
/// permissive CORS policy.
pub fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal(detail).into_response()
}
