//! Prometheus text exposition for scraped samples.

use std::collections::BTreeMap;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

use crate::metric::{MetricKind, Sample};

/// Errors raised while encoding samples.
#[derive(Debug, Error)]
pub enum ExpositionError {
    /// The prometheus crate rejected a metric or failed to encode.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Encoded output was not valid UTF-8.
    #[error("encoded metrics are not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Content type of [`encode_text`] output.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Encode samples in the Prometheus text format.
///
/// Samples are grouped into one family per descriptor. A repeated label set
/// within a family keeps the last value.
pub fn encode_text(samples: &[Sample]) -> Result<String, ExpositionError> {
    let registry = Registry::new();
    let mut families: BTreeMap<&str, GaugeVec> = BTreeMap::new();

    for sample in samples {
        let desc = sample.desc();
        if !families.contains_key(desc.fq_name.as_str()) {
            let labels: Vec<&str> = desc.label_names.iter().map(String::as_str).collect();
            let gauge = match sample.kind() {
                MetricKind::Gauge => {
                    GaugeVec::new(Opts::new(desc.fq_name.as_str(), desc.help.as_str()), &labels)?
                }
            };
            registry.register(Box::new(gauge.clone()))?;
            families.insert(desc.fq_name.as_str(), gauge);
        }
        let family = &families[desc.fq_name.as_str()];

        let values: Vec<&str> = sample.label_values().iter().map(String::as_str).collect();
        family.get_metric_with_label_values(&values)?.set(sample.value());
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
