//! Release Exporter Binary Entry Point
//!
//! Wires configuration, the Kubernetes client, the collectors and the HTTP
//! server together. Core functionality lives in the `release_exporter` library.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use release_exporter::{
    AppConfig, CollectorContext, CollectorRegistry, HealthReporter, KubeReleaseLister,
    ReleaseLister, Scraper,
    config::{LogFormat, parse_duration},
    server::{AppState, create_router},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Prometheus exporter for HelmRelease status
#[derive(Parser, Debug)]
#[command(name = "release-exporter", version, about, long_about = None)]
struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long, env = "CONFIG")]
    config: Option<String>,

    /// Metric name prefix (overrides config file)
    #[arg(long, env = "NAMESPACE")]
    namespace: Option<String>,

    /// Use the in-cluster service account (overrides config file)
    #[arg(long, env = "IS_IN_CLUSTER")]
    in_cluster: Option<bool>,

    /// Kubeconfig path when running outside the cluster (overrides config file)
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<String>,

    /// Deadline for each HelmRelease list call, e.g. "10s" (overrides config file)
    #[arg(long, env = "LIST_TIMEOUT", value_parser = parse_duration)]
    list_timeout: Option<Duration>,

    /// Server bind address (overrides config file)
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Log level: trace, debug, info, warn, error (overrides config file)
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: json or text (overrides config file)
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    /// Build the effective configuration (CLI > ENV > config file > defaults).
    fn into_config(self) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        if let Some(in_cluster) = self.in_cluster {
            config.cluster.in_cluster = in_cluster;
        }
        if let Some(kubeconfig) = self.kubeconfig {
            config.cluster.kubeconfig = Some(kubeconfig);
        }
        if let Some(list_timeout) = self.list_timeout {
            config.cluster.list_timeout = list_timeout;
        }
        if let Some(host) = self.host {
            config.server.bind = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.to_lowercase()));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error parsing configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "could not start helm operator metrics exporter");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting helm operator metrics exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Build the shared HelmRelease lister
    let lister: Arc<dyn ReleaseLister> =
        Arc::new(KubeReleaseLister::connect(&config.cluster).await?);

    // Instantiate every registered collector; any failure aborts startup
    let ctx = CollectorContext::new(config.namespace.clone(), Arc::clone(&lister));
    let registry = CollectorRegistry::with_builtin();
    let collectors = registry.instantiate(&ctx)?;
    let scraper = Scraper::new(&config.namespace, collectors);
    tracing::info!(collectors = ?scraper.collector_names(), "Collectors ready");

    let app = create_router(AppState {
        scraper,
        health: HealthReporter::new(lister),
    });

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
