use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    response::Response,
};
use tracing::info;

use super::twiml_response;
use crate::core::dialogue::{CallInput, CallOutcome, DialogueStep, Turn};
use crate::state::AppState;

/// Dialogue webhook: one booking turn per request.
///
/// Always answers with TwiML; bad or missing input is spoken back to the caller.
pub async fn call_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let input = CallInput::from_request(&body, query.as_deref());
    let turn = state.dialogue.respond(&input);

    let step = DialogueStep::parse(&input.step)
        .map(|step| step.as_str())
        .unwrap_or("unknown");

    match &turn {
        Turn::Reprompt(gather) => {
            info!(step, next = gather.next.step().as_str(), "Re-prompting caller");
        }
        Turn::Advance(gather) => {
            info!(step, next = gather.next.step().as_str(), "Dialogue advanced");
        }
        Turn::Hangup {
            outcome: CallOutcome::Booked,
            ..
        } => {
            info!(
                step,
                outcome = CallOutcome::Booked.as_str(),
                name = %input.name,
                date = %input.date,
                time = %input.time,
                "Appointment booked"
            );
        }
        Turn::Hangup { outcome, .. } => {
            info!(step, outcome = outcome.as_str(), "Call ended");
        }
    }

    twiml_response(turn.to_twiml(
        &state.config.call_handler_path,
        &state.config.speech_language,
    ))
}
