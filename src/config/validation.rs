use url::Url;

use crate::routes::api::VOICE_AGENT_PATH;

/// The dialogue callback path is embedded in every `<Gather>` action and
/// must be usable as an axum route.
pub fn validate_call_handler_path(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.starts_with('/') {
        return Err(format!("CALL_HANDLER_PATH must start with '/', got '{path}'").into());
    }
    if path.contains('?') || path.contains('#') {
        return Err(
            format!("CALL_HANDLER_PATH must not contain a query or fragment, got '{path}'").into(),
        );
    }
    if path == "/" || path == VOICE_AGENT_PATH {
        return Err(format!("CALL_HANDLER_PATH '{path}' is already routed").into());
    }
    let captures = path.split('/').any(|segment| {
        segment.starts_with(':') || segment.starts_with('*') || segment.contains(['{', '}'])
    });
    if captures {
        return Err(
            format!("CALL_HANDLER_PATH must be a literal path without captures, got '{path}'").into(),
        );
    }
    Ok(())
}

/// A configured vault address must be an absolute HTTP(S) URL.
pub fn validate_keyvault_uri(uri: &Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(uri) = uri else {
        return Ok(());
    };

    let parsed = Url::parse(uri).map_err(|e| format!("Invalid KEYVAULT_URI '{uri}': {e}"))?;
    match parsed.scheme() {
        "https" | "http" => Ok(()),
        other => Err(format!("KEYVAULT_URI must use https, got scheme '{other}'").into()),
    }
}
