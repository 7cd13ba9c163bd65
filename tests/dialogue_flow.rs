//! End-to-end booking dialogue over the webhook router.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use tower::ServiceExt;

use appointment_gateway::{AppState, ServerConfig, ServiceSecrets, routes};

fn app_with(config: ServerConfig) -> Router {
    let path = config.call_handler_path.clone();
    let state: Arc<AppState> = AppState::with_secrets(config, &ServiceSecrets::default()).unwrap();
    routes::api::create_api_router(&path).with_state(state)
}

fn app() -> Router {
    app_with(ServerConfig::default())
}

async fn post(app: Router, uri: &str, form: &str) -> (StatusCode, String, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn assert_gathers_to(twiml: &str, action: &str) {
    let escaped = action.replace('&', "&amp;");
    assert!(
        twiml.contains(&format!(r#"<Gather action="{escaped}""#)),
        "expected gather to {action} in {twiml}"
    );
    assert!(twiml.contains(&format!("<Redirect>{escaped}</Redirect>")));
    assert!(!twiml.contains("<Hangup/>"));
}

fn assert_terminal(twiml: &str) {
    assert!(twiml.contains("<Hangup/>"));
    assert!(!twiml.contains("<Gather"));
    assert!(!twiml.contains("<Redirect>"));
}

#[tokio::test]
async fn test_entry_asks_for_name() {
    let (status, content_type, twiml) = post(app(), "/api/call-handler", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/xml");
    assert!(twiml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#));
    assert!(twiml.contains(
        "Hi! Thanks for calling. I am an AI Voice Agent for Aurora Healthcare. What is your name?"
    ));
    assert_gathers_to(&twiml, "/api/call-handler?step=got_name");
    assert!(twiml.contains(r#"input="speech""#));
    assert!(twiml.contains(r#"language="en-US""#));
}

#[tokio::test]
async fn test_got_name_missing_reprompts() {
    let (_, _, twiml) = post(app(), "/api/call-handler?step=got_name", "").await;

    assert!(twiml.contains(
        "Sorry, I didn&apos;t get your name. Please say your first and last name."
    ));
    assert_gathers_to(&twiml, "/api/call-handler?step=got_name");
}

#[tokio::test]
async fn test_got_name_advances_to_date() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=got_name",
        "SpeechResult=Alex+Smith",
    )
    .await;

    assert!(twiml.contains(
        "Nice to meet you, Alex Smith. What date works best for your appointment?"
    ));
    assert_gathers_to(&twiml, "/api/call-handler?step=got_date&name=Alex+Smith");
}

#[tokio::test]
async fn test_got_date_missing_reprompts_with_name() {
    let (_, _, twiml) = post(app(), "/api/call-handler?step=got_date&name=Alex", "").await;

    assert!(twiml.contains(
        "Sorry, I didn&apos;t get the date. Please say the best date for your appointment."
    ));
    assert_gathers_to(&twiml, "/api/call-handler?step=got_date&name=Alex");
}

#[tokio::test]
async fn test_got_date_advances_to_time() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=got_date&name=Alex",
        "SpeechResult=Monday",
    )
    .await;

    assert!(twiml.contains("Great. What time on Monday works best?"));
    assert_gathers_to(&twiml, "/api/call-handler?step=got_time&name=Alex&date=Monday");
}

#[tokio::test]
async fn test_got_time_missing_reprompts() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=got_time&name=Alex&date=Monday",
        "",
    )
    .await;

    assert!(twiml.contains("Sorry, I didn&apos;t get the time. What time on Monday works best?"));
    assert_gathers_to(&twiml, "/api/call-handler?step=got_time&name=Alex&date=Monday");
}

#[tokio::test]
async fn test_got_time_reads_summary() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=got_time",
        "time=3pm&name=Alex&date=Monday",
    )
    .await;

    assert!(twiml.contains(
        "Just to confirm, Alex, you want an appointment on Monday at 3pm. \
         Is that correct? Please say yes or no."
    ));
    assert_gathers_to(
        &twiml,
        "/api/call-handler?step=confirm&name=Alex&date=Monday&time=3pm",
    );
}

#[tokio::test]
async fn test_confirm_yes_books() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=confirm&name=Alex&date=Monday&time=3pm",
        "SpeechResult=yes+please",
    )
    .await;

    assert!(twiml.contains(
        "Awesome. Alex, you&apos;re booked for Monday at 3pm. See you then. Goodbye."
    ));
    assert_terminal(&twiml);
}

#[tokio::test]
async fn test_confirm_no_declines() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=confirm&name=Alex&date=Monday&time=3pm",
        "SpeechResult=nope",
    )
    .await;

    assert!(twiml.contains(
        "Okay, I won&apos;t book that. If you&apos;d like to try again, please call back. Goodbye."
    ));
    assert_terminal(&twiml);
}

#[tokio::test]
async fn test_confirm_unclear_reasks() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=confirm&name=Alex&date=Monday&time=3pm",
        "SpeechResult=maybe",
    )
    .await;

    assert!(twiml.contains(
        "Sorry, I didn&apos;t get that. Do you confirm the appointment for Monday at 3pm? \
         Please say yes or no."
    ));
    assert_gathers_to(
        &twiml,
        "/api/call-handler?step=confirm&name=Alex&date=Monday&time=3pm",
    );
}

#[tokio::test]
async fn test_confirm_without_speech_reasks() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=confirm&name=Alex&date=Monday&time=3pm",
        "",
    )
    .await;

    assert!(twiml.contains("Do you confirm the appointment for Monday at 3pm?"));
    assert_gathers_to(
        &twiml,
        "/api/call-handler?step=confirm&name=Alex&date=Monday&time=3pm",
    );
}

#[tokio::test]
async fn test_unknown_step_ends_call() {
    let (status, _, twiml) = post(app(), "/api/call-handler?step=banana", "").await;

    assert_eq!(status, StatusCode::OK);
    assert!(twiml.contains("<Say>Sorry, something went wrong. Please call again.</Say>"));
    assert_terminal(&twiml);
}

#[tokio::test]
async fn test_body_fields_win_over_query() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=got_time&name=Mallory&date=Friday&time=9am",
        "name=Alex&date=Monday&time=3pm",
    )
    .await;

    assert!(twiml.contains("Just to confirm, Alex, you want an appointment on Monday at 3pm."));
    assert!(!twiml.contains("Mallory"));
}

#[tokio::test]
async fn test_markup_in_speech_is_escaped() {
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=got_name",
        "SpeechResult=%3CHangup%2F%3E+%26+Co",
    )
    .await;

    assert!(twiml.contains("Nice to meet you, &lt;Hangup/&gt; &amp; Co."));
    assert!(!twiml.contains("<Hangup/>"));
    assert!(twiml.contains("name=%3CHangup%2F%3E+%26+Co"));
}

#[tokio::test]
async fn test_long_values_are_truncated() {
    let long_name = "a".repeat(500);
    let (_, _, twiml) = post(
        app(),
        "/api/call-handler?step=got_name",
        &format!("SpeechResult={long_name}"),
    )
    .await;

    assert!(twiml.contains(&format!("name={}", "a".repeat(200))));
    assert!(!twiml.contains(&"a".repeat(201)));
}

#[tokio::test]
async fn test_configured_path_and_business_name() {
    let mut config = ServerConfig::default();
    config.call_handler_path = "/hooks/call".to_string();
    config.business_name = "Northside Dental".to_string();
    config.speech_language = "en-GB".to_string();

    let (_, _, twiml) = post(app_with(config), "/hooks/call", "").await;

    assert!(twiml.contains("I am an AI Voice Agent for Northside Dental."));
    assert!(twiml.contains(r#"language="en-GB""#));
    assert_gathers_to(&twiml, "/hooks/call?step=got_name");
}

#[tokio::test]
async fn test_full_booking_walkthrough() {
    let app = app();

    let (_, _, turn) = post(app.clone(), "/api/call-handler", "").await;
    assert!(turn.contains("step=got_name"));

    let (_, _, turn) = post(
        app.clone(),
        "/api/call-handler?step=got_name",
        "SpeechResult=Jordan",
    )
    .await;
    assert!(turn.contains("step=got_date&amp;name=Jordan"));

    let (_, _, turn) = post(
        app.clone(),
        "/api/call-handler?step=got_date&name=Jordan",
        "SpeechResult=next+Tuesday",
    )
    .await;
    assert!(turn.contains("step=got_time&amp;name=Jordan&amp;date=next+Tuesday"));

    let (_, _, turn) = post(
        app.clone(),
        "/api/call-handler?step=got_time&name=Jordan&date=next+Tuesday",
        "SpeechResult=10+am",
    )
    .await;
    assert!(turn.contains("step=confirm&amp;name=Jordan&amp;date=next+Tuesday&amp;time=10+am"));

    let (_, _, turn) = post(
        app,
        "/api/call-handler?step=confirm&name=Jordan&date=next+Tuesday&time=10+am",
        "SpeechResult=Yeah",
    )
    .await;
    assert!(turn.contains("Jordan, you&apos;re booked for next Tuesday at 10 am."));
    assert_terminal(&turn);
}
