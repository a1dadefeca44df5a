//! Liveness check against the Kubernetes API.

use std::sync::Arc;

use crate::kubernetes::ReleaseLister;

/// Reports whether HelmReleases can currently be listed.
#[derive(Clone)]
pub struct HealthReporter {
    lister: Arc<dyn ReleaseLister>,
}

impl std::fmt::Debug for HealthReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthReporter").finish_non_exhaustive()
    }
}

impl HealthReporter {
    pub fn new(lister: Arc<dyn ReleaseLister>) -> Self {
        Self { lister }
    }

    /// One list call; any error means unhealthy. The number of releases is irrelevant.
    pub async fn is_healthy(&self) -> bool {
        match self.lister.list_releases().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "kubernetes client is not healthy");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::{ListError, Release};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLister {
        calls: AtomicUsize,
        result: Result<usize, String>,
    }

    #[async_trait::async_trait]
    impl ReleaseLister for CountingLister {
        async fn list_releases(&self) -> Result<Vec<Release>, ListError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(n) => Ok(vec![Release::default(); *n]),
                Err(e) => Err(ListError::Other(e.clone())),
            }
        }
    }

    fn reporter(result: Result<usize, String>) -> (HealthReporter, Arc<CountingLister>) {
        let lister = Arc::new(CountingLister {
            calls: AtomicUsize::new(0),
            result,
        });
        (HealthReporter::new(lister.clone()), lister)
    }

    #[tokio::test]
    async fn test_healthy_with_zero_releases() {
        let (health, lister) = reporter(Ok(0));
        assert!(health.is_healthy().await);
        assert_eq!(lister.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_healthy_with_releases() {
        let (health, _) = reporter(Ok(3));
        assert!(health.is_healthy().await);
    }

    #[tokio::test]
    async fn test_unhealthy_on_error() {
        let (health, lister) = reporter(Err("forbidden".to_string()));
        assert!(!health.is_healthy().await);
        assert_eq!(lister.calls.load(Ordering::SeqCst), 1);
    }
}
