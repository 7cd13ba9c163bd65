use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::Response,
};
use tracing::{error, info};

use super::twiml_response;
use crate::core::twiml::TwimlBuilder;
use crate::errors::AppResult;
use crate::state::AppState;

/// Caller utterance: query `SpeechResult`, then `speechResult`, then the raw body.
///
/// Invalid UTF-8 in the body is dropped.
fn user_text(params: &HashMap<String, String>, body: &[u8]) -> String {
    ["SpeechResult", "speechResult"]
        .iter()
        .filter_map(|key| params.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            body.utf8_chunks()
                .map(|chunk| chunk.valid())
                .collect::<String>()
                .trim()
                .to_string()
        })
}

/// Freeform reply webhook
///
/// Sends the utterance to the chat deployment and speaks the reply, as
/// synthesized audio when enabled and available, otherwise with `<Say>`.
/// Chat failures are returned as HTTP 500.
pub async fn voice_agent_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> AppResult<Response> {
    let text = user_text(&params, &body);

    let reply = state.chat.reply(&text).await.map_err(|e| {
        error!("Voice agent chat completion failed: {}", e);
        e
    })?;

    let audio_url = match (&state.speech, state.config.use_azure_tts) {
        (Some(speech), true) => speech.publish(&reply).await,
        _ => None,
    };

    let twiml = match audio_url {
        Some(url) => {
            info!("Voice agent replying with synthesized audio");
            TwimlBuilder::new().play(&url).build()
        }
        None => {
            info!("Voice agent replying with <Say>");
            TwimlBuilder::new().say(&reply).build()
        }
    };

    Ok(twiml_response(twiml))
}
