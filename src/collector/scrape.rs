//! Scrape orchestration.
//!
//! Runs every collector concurrently, one Tokio task each, and appends
//! `scrape_collector_duration_seconds` and `scrape_collector_success` for
//! each of them. A failing collector only affects its own success sample.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::collector::{Collector, CollectorError, CollectorSet};
use crate::metric::{Desc, Sample, SampleSink, build_fq_name, drain};

const SUBSYSTEM: &str = "scrape";

/// Outcome of one collector within one scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOutcome {
    pub collector: String,
    pub duration: Duration,
    pub success: bool,
}

/// Runs scrape cycles over a fixed collector set.
#[derive(Clone)]
pub struct Scraper {
    collectors: Arc<CollectorSet>,
    duration_desc: Arc<Desc>,
    success_desc: Arc<Desc>,
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("collectors", &self.collectors.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Scraper {
    pub fn new(namespace: &str, collectors: CollectorSet) -> Self {
        Self {
            collectors: Arc::new(collectors),
            duration_desc: Arc::new(Desc::new(
                build_fq_name(namespace, SUBSYSTEM, "collector_duration_seconds"),
                "HelmRelease: Duration of a collector scrape.",
                &["collector"],
            )),
            success_desc: Arc::new(Desc::new(
                build_fq_name(namespace, SUBSYSTEM, "collector_success"),
                "HelmRelease: Whether a collector succeeded.",
                &["collector"],
            )),
        }
    }

    /// Names of the collectors run on every scrape.
    pub fn collector_names(&self) -> Vec<&str> {
        self.collectors.keys().map(String::as_str).collect()
    }

    /// Run one scrape cycle and return every sample it produced.
    ///
    /// Completes once all collectors have returned.
    pub async fn scrape(&self) -> Vec<Sample> {
        let (sink, rx) = SampleSink::channel();
        let outcomes = self.scrape_into(&sink).await;
        tracing::debug!(collectors = outcomes.len(), "Scrape finished");
        drop(sink);
        drain(rx).await
    }

    /// Run one scrape cycle, writing every sample into `sink`.
    pub async fn scrape_into(&self, sink: &SampleSink) -> Vec<ScrapeOutcome> {
        let handles: Vec<_> = self
            .collectors
            .iter()
            .map(|(name, collector)| {
                let handle = tokio::spawn(run_collector(
                    name.clone(),
                    Arc::clone(collector),
                    sink.clone(),
                ));
                (name.clone(), handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                // Only reachable when the runtime cancels the task; no timing exists.
                Err(e) => {
                    let err = CollectorError::Aborted(e.to_string());
                    tracing::error!(collector = %name, error = %err, "Collector task failed");
                    ScrapeOutcome {
                        collector: name,
                        duration: Duration::ZERO,
                        success: false,
                    }
                }
            };
            self.emit_outcome(sink, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    fn emit_outcome(&self, sink: &SampleSink, outcome: &ScrapeOutcome) {
        let success = if outcome.success { 1.0 } else { 0.0 };
        let labels = [outcome.collector.as_str()];
        let samples = Sample::gauge(&self.duration_desc, outcome.duration.as_secs_f64(), labels)
            .and_then(|duration| {
                Sample::gauge(&self.success_desc, success, labels).map(|s| (duration, s))
            });

        match samples {
            Ok((duration, success)) => {
                sink.emit(duration);
                sink.emit(success);
            }
            Err(e) => tracing::error!(error = %e, "Failed to build scrape meta samples"),
        }
    }
}

/// Execute a single collector and time it.
///
/// The update runs in its own task so a panic ends the timing at the point
/// of the panic instead of propagating.
async fn run_collector(
    name: String,
    collector: Arc<dyn Collector>,
    sink: SampleSink,
) -> ScrapeOutcome {
    let begin = Instant::now();
    let update = tokio::spawn(async move { collector.update(&sink).await });
    let result = update
        .await
        .unwrap_or_else(|e| Err(CollectorError::Aborted(e.to_string())));
    let duration = begin.elapsed();

    let success = match result {
        Ok(()) => {
            tracing::debug!(
                collector = %name,
                duration_secs = duration.as_secs_f64(),
                "Collector succeeded"
            );
            true
        }
        Err(e) => {
            tracing::error!(
                collector = %name,
                duration_secs = duration.as_secs_f64(),
                error = %e,
                "Collector failed"
            );
            false
        }
    };

    ScrapeOutcome {
        collector: name,
        duration,
        success,
    }
}
