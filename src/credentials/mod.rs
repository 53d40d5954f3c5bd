use thiserror::Error;

use crate::config::FredConfig;

/// Environment variable name for providing the FRED API key without a config file
pub const ENV_KEY_VAR: &str = "CB_ALPHA_FRED_KEY";

#[derive(Debug, Error, PartialEq)]
pub enum CredentialError {
    #[error("No FRED API key found. Set CB_ALPHA_FRED_KEY or fred.api_key in the config file.")]
    NotFound,
}

/// Check for a FRED API key in the CB_ALPHA_FRED_KEY environment variable.
/// Returns Some(key) if the env var is set and non-empty, None otherwise.
pub fn get_key_from_env() -> Option<String> {
    std::env::var(ENV_KEY_VAR).ok().and_then(non_empty)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Pick the API key: environment first, then the config file.
pub fn select_api_key(
    from_env: Option<String>,
    config: &FredConfig,
) -> Result<String, CredentialError> {
    from_env
        .and_then(non_empty)
        .or_else(|| config.api_key.clone().and_then(non_empty))
        .ok_or(CredentialError::NotFound)
}

/// Resolve the FRED API key once at startup.
pub fn resolve_api_key(config: &FredConfig) -> Result<String, CredentialError> {
    select_api_key(get_key_from_env(), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(key: Option<&str>) -> FredConfig {
        FredConfig {
            api_key: key.map(str::to_string),
            ..FredConfig::default()
        }
    }

    #[test]
    fn test_env_wins_over_config() {
        let key = select_api_key(Some("env-key".into()), &config_with(Some("file-key")));
        assert_eq!(key.unwrap(), "env-key");
    }

    #[test]
    fn test_falls_back_to_config() {
        let key = select_api_key(None, &config_with(Some(" file-key ")));
        assert_eq!(key.unwrap(), "file-key");
    }

    #[test]
    fn test_blank_env_ignored() {
        let key = select_api_key(Some("   ".into()), &config_with(Some("file-key")));
        assert_eq!(key.unwrap(), "file-key");
    }

    #[test]
    fn test_missing_everywhere() {
        let err = select_api_key(None, &config_with(None)).unwrap_err();
        assert_eq!(err, CredentialError::NotFound);
        assert!(err.to_string().contains(ENV_KEY_VAR));
    }
}
