//! Release Exporter - HelmRelease status as Prometheus metrics
//!
//! This crate polls the `HelmRelease` custom resources of a Kubernetes cluster
//! and republishes their state as gauges on every scrape. It can be used as a
//! library or run as the standalone `release-exporter` binary.
//!
//! # Architecture
//!
//! - **Kubernetes**: Read-only HelmRelease listing behind the [`ReleaseLister`] trait
//! - **Collectors**: Pluggable units registered by name in a [`CollectorRegistry`]
//! - **Scraper**: Concurrent fan-out over all collectors with duration/success gauges
//! - **Health**: Liveness derived from a single list call
//! - **Server**: `/metrics` and `/health` over Axum
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use release_exporter::{
//!     ClusterConfig, CollectorContext, CollectorRegistry, HealthReporter, KubeReleaseLister,
//!     Scraper,
//!     server::{AppState, create_router},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lister = Arc::new(KubeReleaseLister::connect(&ClusterConfig::default()).await?);
//!     let ctx = CollectorContext::new("helm_operator", lister.clone());
//!     let collectors = CollectorRegistry::with_builtin().instantiate(&ctx)?;
//!
//!     let app = create_router(AppState {
//!         scraper: Scraper::new(&ctx.namespace, collectors),
//!         health: HealthReporter::new(lister),
//!     });
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod exposition;
pub mod health;
pub mod kubernetes;
pub mod metric;
pub mod server;

pub use collector::{
    Collector, CollectorContext, CollectorError, CollectorRegistry, ScrapeOutcome, Scraper,
    StatusCollector,
};
pub use config::{AppConfig, ClusterConfig, ConfigError};
pub use health::HealthReporter;
pub use kubernetes::{KubeReleaseLister, ListError, Release, ReleaseLister};
pub use metric::{Desc, Sample, SampleSink};
