//! Metric descriptors, samples and the sample sink.
//!
//! Collectors never talk to the exposition library directly. They push
//! [`Sample`]s into a [`SampleSink`], which any number of tasks may hold
//! at the same time.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised when building a sample.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Label value count does not match the descriptor.
    #[error("metric '{fq_name}' expects {expected} label values, got {actual}")]
    LabelCount {
        fq_name: String,
        expected: usize,
        actual: usize,
    },
}

/// Fully qualified metric name, joining non-empty parts with `_`.
///
/// ```
/// use release_exporter::metric::build_fq_name;
///
/// assert_eq!(build_fq_name("helm", "status", "info"), "helm_status_info");
/// assert_eq!(build_fq_name("", "status", "info"), "status_info");
/// ```
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    prometheus::Opts::new(name, "")
        .namespace(namespace)
        .subsystem(subsystem)
        .fq_name()
}

/// Immutable description of a metric family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Desc {
    /// Fully qualified metric name.
    pub fq_name: String,
    /// Help text.
    pub help: String,
    /// Ordered label names.
    pub label_names: Vec<String>,
}

impl Desc {
    pub fn new(fq_name: impl Into<String>, help: impl Into<String>, label_names: &[&str]) -> Self {
        Self {
            fq_name: fq_name.into(),
            help: help.into(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Metric kind. Only gauges are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
}

/// One fully formed metric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    desc: Arc<Desc>,
    kind: MetricKind,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    /// Build a gauge sample.
    ///
    /// # Errors
    /// Returns `SampleError::LabelCount` if `label_values` does not line up with
    /// the descriptor's label names.
    pub fn gauge<S: Into<String>>(
        desc: &Arc<Desc>,
        value: f64,
        label_values: impl IntoIterator<Item = S>,
    ) -> Result<Self, SampleError> {
        let label_values: Vec<String> = label_values.into_iter().map(Into::into).collect();
        if label_values.len() != desc.label_names.len() {
            return Err(SampleError::LabelCount {
                fq_name: desc.fq_name.clone(),
                expected: desc.label_names.len(),
                actual: label_values.len(),
            });
        }

        Ok(Self {
            desc: Arc::clone(desc),
            kind: MetricKind::Gauge,
            value,
            label_values,
        })
    }

    pub fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Look up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .label_names
            .iter()
            .position(|l| l == name)
            .map(|i| self.label_values[i].as_str())
    }
}

/// Receiving half of a sample channel.
pub type SampleReceiver = mpsc::UnboundedReceiver<Sample>;

/// Cloneable, concurrency-safe output channel for samples.
///
/// Emitting never blocks. Samples emitted after the receiver is dropped are
/// discarded.
#[derive(Clone)]
pub struct SampleSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl std::fmt::Debug for SampleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSink").finish_non_exhaustive()
    }
}

impl SampleSink {
    /// Create a sink and its receiver.
    pub fn channel() -> (Self, SampleReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Push one sample.
    pub fn emit(&self, sample: Sample) {
        if self.tx.send(sample).is_err() {
            tracing::warn!("Sample receiver dropped, discarding sample");
        }
    }
}

/// Drain every sample currently buffered in `rx`.
///
/// Callers drop all sinks first so the drain terminates.
pub async fn drain(mut rx: SampleReceiver) -> Vec<Sample> {
    let mut samples = Vec::new();
    while let Some(sample) = rx.recv().await {
        samples.push(sample);
    }
    samples
}
