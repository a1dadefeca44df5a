//! Core collector traits and types.

use std::sync::Arc;

use thiserror::Error;

use crate::kubernetes::{ListError, ReleaseLister};
use crate::metric::{SampleError, SampleSink};

/// Errors that can occur while building or running a collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Listing releases from the cluster failed.
    #[error("list releases: {0}")]
    List(#[from] ListError),

    /// A sample could not be built.
    #[error("build sample: {0}")]
    Sample(#[from] SampleError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A collector factory failed at startup.
    #[error("failed to create collector '{name}': {source}")]
    Construction {
        name: String,
        #[source]
        source: Box<CollectorError>,
    },

    /// The collector task panicked or was cancelled.
    #[error("collector task aborted: {0}")]
    Aborted(String),
}

/// Everything a collector factory may draw on.
#[derive(Clone)]
pub struct CollectorContext {
    /// Prefix for every metric name.
    pub namespace: String,
    /// Shared release source.
    pub lister: Arc<dyn ReleaseLister>,
}

impl CollectorContext {
    pub fn new(namespace: impl Into<String>, lister: Arc<dyn ReleaseLister>) -> Self {
        Self {
            namespace: namespace.into(),
            lister,
        }
    }
}

impl std::fmt::Debug for CollectorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorContext")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// A unit producing the samples for one concern.
///
/// Collectors are built once at startup and invoked on every scrape,
/// possibly concurrently with other collectors.
///
/// # Error Handling
///
/// Returning `Err` marks this collector as failed for the current scrape only.
/// Samples already emitted before the error are kept; other collectors are
/// unaffected.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Produce this scrape's samples into `sink`.
    async fn update(&self, sink: &SampleSink) -> Result<(), CollectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_error_names_collector() {
        let err = CollectorError::Construction {
            name: "status".to_string(),
            source: Box::new(CollectorError::Config("bad namespace".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "failed to create collector 'status': config error: bad namespace"
        );
    }

    #[test]
    fn test_list_error_converts() {
        let err: CollectorError = ListError::Other("connection refused".to_string()).into();
        assert!(matches!(err, CollectorError::List(_)));
        assert_eq!(err.to_string(), "list releases: connection refused");
    }
}
