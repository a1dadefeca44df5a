//! Configuration module for the release exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Metric namespace prefix
//! - Server settings (port, bind address)
//! - Cluster access (in-cluster or kubeconfig, list deadline)
//! - Logging (level, format)
//!
//! Every setting can also be overridden from the command line or the
//! environment by the binary.

mod app;
mod validation;

pub use app::{AppConfig, ClusterConfig, LogConfig, LogFormat, ServerConfig};
pub use app::{DEFAULT_LIST_TIMEOUT, DEFAULT_NAMESPACE};
pub use validation::{ConfigError, expand_env_vars, parse_duration};
