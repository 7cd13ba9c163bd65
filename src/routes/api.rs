use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::{call, voice_agent};
use crate::state::AppState;
use std::sync::Arc;

pub const VOICE_AGENT_PATH: &str = "/api/voice-agent";

/// Create the webhook router
///
/// `call_handler_path` is the configured dialogue route; every generated
/// callback action points back at it.
pub fn create_api_router(call_handler_path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(call_handler_path, post(call::call_handler))
        .route(VOICE_AGENT_PATH, post(voice_agent::voice_agent_handler))
        .layer(TraceLayer::new_for_http())
}
