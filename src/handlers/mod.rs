//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `call` - Appointment booking dialogue webhook
//! - `voice_agent` - Freeform chat reply webhook

pub mod api;
pub mod call;
pub mod voice_agent;

use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use crate::core::twiml::TWIML_CONTENT_TYPE;

pub use call::call_handler;
pub use voice_agent::voice_agent_handler;

/// Wrap a TwiML document in a 200 response.
pub(crate) fn twiml_response(twiml: String) -> Response {
    ([(CONTENT_TYPE, TWIML_CONTENT_TYPE)], twiml).into_response()
}
