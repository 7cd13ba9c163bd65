use super::StorageError;

/// Well-known Azurite account.
pub const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
pub const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
pub const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Parsed Azure Storage connection string.
///
/// ```text
/// DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=...;EndpointSuffix=core.windows.net
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConnection {
    pub account_name: String,
    pub account_key: String,
    /// Blob service endpoint without a trailing slash
    pub blob_endpoint: String,
}

impl StorageConnection {
    pub fn parse(conn_str: &str) -> Result<Self, StorageError> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut endpoint_suffix = None;
        let mut blob_endpoint = None;
        let mut development = false;

        for part in conn_str.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                StorageError::InvalidConnectionString(format!(
                    "segment without '=': {}",
                    redact_segment(part)
                ))
            })?;
            let value = value.trim().to_string();
            match key.trim() {
                "DefaultEndpointsProtocol" => protocol = Some(value),
                "AccountName" => account_name = Some(value),
                "AccountKey" => account_key = Some(value),
                "EndpointSuffix" => endpoint_suffix = Some(value),
                "BlobEndpoint" => blob_endpoint = Some(value),
                "UseDevelopmentStorage" => development = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if development {
            return Ok(Self {
                account_name: account_name.unwrap_or_else(|| DEV_ACCOUNT_NAME.to_string()),
                account_key: account_key.unwrap_or_else(|| DEV_ACCOUNT_KEY.to_string()),
                blob_endpoint: normalize_endpoint(
                    blob_endpoint.as_deref().unwrap_or(DEV_BLOB_ENDPOINT),
                ),
            });
        }

        let account_name = account_name
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::InvalidConnectionString("missing AccountName".to_string()))?;
        let account_key = account_key
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::InvalidConnectionString("missing AccountKey".to_string()))?;

        let blob_endpoint = match blob_endpoint {
            Some(endpoint) => normalize_endpoint(&endpoint),
            None => format!(
                "{}://{}.blob.{}",
                protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL),
                account_name,
                endpoint_suffix.as_deref().unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ),
        };

        Ok(Self {
            account_name,
            account_key,
            blob_endpoint,
        })
    }

    pub fn allows_http(&self) -> bool {
        self.blob_endpoint.starts_with("http://")
    }
}

impl std::fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConnection")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .finish()
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

fn redact_segment(segment: &str) -> String {
    segment.chars().take(16).collect()
}
