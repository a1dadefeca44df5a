//! Application configuration structures.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default metric name prefix.
pub const DEFAULT_NAMESPACE: &str = "helm_operator";

/// Default deadline for one HelmRelease list call (10 seconds).
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_list_timeout() -> Duration {
    DEFAULT_LIST_TIMEOUT
}

fn default_in_cluster() -> bool {
    true
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to listen on. Works for IPv4 and IPv6 binds.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if `bind` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!("invalid server bind address: '{}'", self.bind))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

// =============================================================================
// Cluster Configuration
// =============================================================================

/// How to reach the Kubernetes API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Use the pod's service account (default: true).
    #[serde(default = "default_in_cluster")]
    pub in_cluster: bool,

    /// Explicit kubeconfig path, used when `in_cluster` is false.
    #[serde(default)]
    pub kubeconfig: Option<String>,

    /// Deadline for each list call (default: 10s).
    #[serde(default = "default_list_timeout", with = "humantime_serde")]
    pub list_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            in_cluster: true,
            kubeconfig: None,
            list_timeout: DEFAULT_LIST_TIMEOUT,
        }
    }
}

// =============================================================================
// Log Configuration
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level: trace, debug, info, warn or error (default: "info").
    pub level: String,

    /// Output format (default: json).
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefix for every exported metric name.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Kubernetes access configuration.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            server: ServerConfig::default(),
            cluster: ClusterConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&expand_env_vars(&content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        static NAMESPACE_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        let namespace_regex = NAMESPACE_REGEX.get_or_init(|| {
            regex::Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("failed to compile namespace regex")
        });

        // Validate metric namespace
        if !namespace_regex.is_match(&self.namespace) {
            return Err(ConfigError::ValidationError(format!(
                "invalid metric namespace: '{}'",
                self.namespace
            )));
        }

        // Validate server bind address
        self.server.socket_addr()?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        // Validate list timeout
        if self.cluster.list_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "cluster list_timeout must be positive".to_string(),
            ));
        }

        // Validate log level
        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "invalid log level: '{}' (expected one of {})",
                self.log.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_app_config_default_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert!(config.cluster.in_cluster);
        assert_eq!(config.cluster.list_timeout, DEFAULT_LIST_TIMEOUT);
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_port() {
        let config = AppConfig {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 0,
            },
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_bind_address() {
        let config = AppConfig {
            server: ServerConfig {
                bind: "not-an-ip".to_string(),
                port: 8080,
            },
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid server bind address")
        );
    }

    #[test]
    fn test_server_socket_addr_ipv6() {
        let config = ServerConfig {
            bind: "::".to_string(),
            port: 9102,
        };
        let addr = config.socket_addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 9102);
        assert_eq!(addr.to_string(), "[::]:9102");

        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_validation_namespace() {
        for bad in ["", "1helm", "helm-operator", "helm operator"] {
            let config = AppConfig {
                namespace: bad.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "namespace {bad:?}");
        }
    }

    #[test]
    fn test_config_validation_log_level() {
        let mut config = AppConfig::default();
        config.log.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.log.level = "verbose".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("invalid log level"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = AppConfig::default();
        config.cluster.list_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
namespace: flux
server:
  port: 9090
cluster:
  in_cluster: false
  kubeconfig: ${{NONEXISTENT_KUBECONFIG_12345:-/tmp/kubeconfig}}
  list_timeout: 2s
log:
  level: debug
  format: text
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.namespace, "flux");
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert!(!config.cluster.in_cluster);
        assert_eq!(config.cluster.kubeconfig.as_deref(), Some("/tmp/kubeconfig"));
        assert_eq!(config.cluster.list_timeout, Duration::from_secs(2));
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_load_shipped_config() {
        let config =
            AppConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/configs/config.yaml")).unwrap();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert!(config.cluster.in_cluster);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/release-exporter.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
