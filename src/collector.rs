//! Collector Layer
//!
//! Pluggable collectors that turn cluster state into metric samples. Each
//! collector runs in its own Tokio task on every scrape.
//!
//! # Architecture
//!
//! - [`Collector`]: Core trait for implementing data collectors
//! - [`CollectorRegistry`]: Named factories, instantiated once at startup
//! - [`Scraper`]: Runs all collectors concurrently and records duration/success
//! - [`StatusCollector`]: HelmRelease status and condition samples
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use release_exporter::collector::{CollectorContext, CollectorRegistry, Scraper};
//! use release_exporter::kubernetes::ReleaseLister;
//!
//! # async fn run(lister: Arc<dyn ReleaseLister>) -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = CollectorContext::new("helm_operator", lister);
//! let collectors = CollectorRegistry::with_builtin().instantiate(&ctx)?;
//! let scraper = Scraper::new(&ctx.namespace, collectors);
//! let samples = scraper.scrape().await;
//! # Ok(())
//! # }
//! ```

mod registry;
mod scrape;
pub mod status;
mod traits;

pub use registry::{CollectorFactory, CollectorRegistry, CollectorSet};
pub use scrape::{ScrapeOutcome, Scraper};
pub use status::{ReleaseStatus, StatusCollector};
pub use traits::{Collector, CollectorContext, CollectorError};
