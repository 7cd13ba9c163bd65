//! SharedKey authorization for Blob service REST calls.
//!
//! Used for the container-management call that `object_store` does not
//! expose. See "Authorize with Shared Key" in the Azure Storage REST docs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;
use time::macros::format_description;
use url::Url;

use super::StorageError;

pub const STORAGE_API_VERSION: &str = "2021-08-06";

type HmacSha256 = Hmac<Sha256>;

/// `x-ms-date` value in RFC 1123 form.
pub fn format_ms_date(at: OffsetDateTime) -> Result<String, StorageError> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .map_err(|e| StorageError::Signing(format!("Failed to format date: {e}")))
}

/// Build the SharedKey string-to-sign.
///
/// `ms_headers` are the `x-ms-*` headers sent with the request. Only the
/// Content-Length standard header is supported; the rest are left empty.
pub fn string_to_sign(
    method: &str,
    content_length: u64,
    ms_headers: &[(&str, &str)],
    account_name: &str,
    url: &Url,
) -> String {
    let content_length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let mut headers: Vec<(String, &str)> = ms_headers
        .iter()
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let mut query: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();
    query.sort();

    // VERB, then Content-Encoding through Range
    let mut out = format!("{method}\n\n\n{content_length}\n\n\n\n\n\n\n\n\n");
    for (name, value) in headers {
        out.push_str(&name);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    out.push('/');
    out.push_str(account_name);
    out.push_str(url.path());
    for (name, value) in query {
        out.push('\n');
        out.push_str(&name);
        out.push(':');
        out.push_str(&value);
    }
    out
}

/// `Authorization` header value for a string-to-sign.
pub fn authorization(
    account_name: &str,
    account_key: &str,
    string_to_sign: &str,
) -> Result<String, StorageError> {
    let key = STANDARD
        .decode(account_key)
        .map_err(|e| StorageError::Signing(format!("AccountKey is not valid base64: {e}")))?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());
    Ok(format!("SharedKey {account_name}:{signature}"))
}
