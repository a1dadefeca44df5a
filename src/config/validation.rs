//! Configuration parsing helpers.

use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse a human-readable duration such as `10s`, `1m30s` or `500ms`.
///
/// # Examples
///
/// ```
/// use release_exporter::config::parse_duration;
///
/// assert_eq!(parse_duration("10s").unwrap().as_secs(), 10);
/// assert_eq!(parse_duration("500ms").unwrap().as_millis(), 500);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Expand `${VAR}` and `${VAR:-default}` references from the environment.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let default_value = caps.get(2).map_or("", |m| m.as_str());
            std::env::var(&caps[1]).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("10").is_err());
    }

    #[test]
    fn test_expand_env_vars_untouched() {
        assert_eq!(expand_env_vars("namespace: helm_operator"), "namespace: helm_operator");
    }

    #[test]
    fn test_expand_env_vars_default() {
        let result = expand_env_vars("port: ${NONEXISTENT_EXPORTER_PORT_12345:-9100}");
        assert_eq!(result, "port: 9100");
    }

    #[test]
    fn test_expand_env_vars_missing_without_default() {
        assert_eq!(expand_env_vars("x${NONEXISTENT_EXPORTER_VAR_12345}y"), "xy");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: Only this test reads or writes this variable.
        unsafe {
            std::env::set_var("RELEASE_EXPORTER_TEST_NAMESPACE", "flux");
        }
        let result = expand_env_vars("namespace: ${RELEASE_EXPORTER_TEST_NAMESPACE}");
        assert_eq!(result, "namespace: flux");
        // SAFETY: Cleanup test variable.
        unsafe {
            std::env::remove_var("RELEASE_EXPORTER_TEST_NAMESPACE");
        }
    }
}
