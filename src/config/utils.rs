//! Small parsing helpers shared by the configuration loaders.

/// Values accepted as `true` for boolean flags such as `USE_AZURE_TTS`.
///
/// Matching is case-insensitive after trimming. Every other value,
/// including the empty string, is `false`.
pub const TRUTHY_VALUES: &[&str] = &["1", "true", "yes", "on"];

/// Parse a boolean flag using [`TRUTHY_VALUES`].
pub fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    TRUTHY_VALUES.contains(&normalized.as_str())
}

/// Read an environment variable, treating unset and blank values alike.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_truthy_values() {
        for value in ["1", "true", "TRUE", "Yes", " on ", "ON"] {
            assert!(parse_bool(value), "{value:?} should be true");
        }
    }

    #[test]
    fn test_parse_bool_falsy_values() {
        for value in ["", "0", "false", "no", "off", "enabled", "y"] {
            assert!(!parse_bool(value), "{value:?} should be false");
        }
    }
}
