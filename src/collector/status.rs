//! HelmRelease status collector.
//!
//! Maps each release into one `status_info` sample and one `status_condition`
//! sample per condition.

use std::str::FromStr;
use std::sync::Arc;

use strum_macros::{AsRefStr, EnumString};

use crate::collector::{Collector, CollectorContext, CollectorError};
use crate::kubernetes::{Release, ReleaseLister};
use crate::metric::{Desc, Sample, SampleSink, build_fq_name};

/// Registered collector name.
pub const NAME: &str = "status";

const SUBSYSTEM: &str = "status";
const INFO_LABELS: [&str; 4] = ["name", "namespace", "release_status", "release_name"];
const CONDITION_LABELS: [&str; 6] = ["name", "namespace", "message", "reason", "status", "type"];

/// Condition value when the status is `True`.
pub const CONDITION_TRUE_VALUE: f64 = 1.0;
/// Condition value for `False`, `Unknown` and anything else.
pub const CONDITION_NOT_TRUE_VALUE: f64 = -1.0;

/// Helm release status as reported by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    Unknown,
    Deployed,
    Deleted,
    Superseded,
    Failed,
    Deleting,
    PendingInstall,
    PendingUpgrade,
    PendingRollback,
    /// Empty or unrecognised status string.
    #[strum(disabled)]
    Invalid,
}

impl ReleaseStatus {
    /// Parse a raw status string. Never fails: unknown input is `Invalid`.
    pub fn parse(raw: &str) -> Self {
        Self::from_str(raw).unwrap_or(Self::Invalid)
    }

    /// Numeric gauge value for this status.
    pub fn code(self) -> f64 {
        match self {
            Self::Unknown => 0.0,
            Self::Deployed => 1.0,
            Self::Deleted => 2.0,
            Self::Superseded => 3.0,
            Self::Failed => -1.0,
            Self::Deleting => 5.0,
            Self::PendingInstall => 6.0,
            Self::PendingUpgrade => 7.0,
            Self::PendingRollback => 8.0,
            Self::Invalid => -1.0,
        }
    }
}

/// Status code for a raw release status string.
pub fn release_status_code(raw: &str) -> f64 {
    ReleaseStatus::parse(raw).code()
}

/// Collector exporting release status and conditions.
pub struct StatusCollector {
    lister: Arc<dyn ReleaseLister>,
    info_desc: Arc<Desc>,
    condition_desc: Arc<Desc>,
}

impl std::fmt::Debug for StatusCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusCollector")
            .field("info", &self.info_desc.fq_name)
            .field("condition", &self.condition_desc.fq_name)
            .finish_non_exhaustive()
    }
}

/// Factory registered under [`NAME`].
pub fn factory(ctx: &CollectorContext) -> Result<Arc<dyn Collector>, CollectorError> {
    Ok(Arc::new(StatusCollector::new(ctx)))
}

impl StatusCollector {
    pub fn new(ctx: &CollectorContext) -> Self {
        Self {
            lister: Arc::clone(&ctx.lister),
            info_desc: Arc::new(Desc::new(
                build_fq_name(&ctx.namespace, SUBSYSTEM, "info"),
                "HelmRelease Status information",
                &INFO_LABELS,
            )),
            condition_desc: Arc::new(Desc::new(
                build_fq_name(&ctx.namespace, SUBSYSTEM, "condition"),
                "HelmRelease Status Conditions",
                &CONDITION_LABELS,
            )),
        }
    }

    /// Map a release list into samples.
    ///
    /// Pure: the same input always yields the same samples in the same order.
    pub fn map_releases(&self, releases: &[Release]) -> Result<Vec<Sample>, CollectorError> {
        let mut samples = Vec::new();
        for release in releases {
            let status = &release.status;
            samples.push(Sample::gauge(
                &self.info_desc,
                release_status_code(&status.release_status),
                [
                    release.name.as_str(),
                    release.namespace.as_str(),
                    status.release_status.as_str(),
                    status.release_name.as_str(),
                ],
            )?);

            for condition in &status.conditions {
                let value = if condition.is_true() {
                    CONDITION_TRUE_VALUE
                } else {
                    CONDITION_NOT_TRUE_VALUE
                };
                samples.push(Sample::gauge(
                    &self.condition_desc,
                    value,
                    [
                        release.name.as_str(),
                        release.namespace.as_str(),
                        condition.message.as_str(),
                        condition.reason.as_str(),
                        condition.status.as_str(),
                        condition.type_.as_str(),
                    ],
                )?);
            }
        }
        Ok(samples)
    }
}

#[async_trait::async_trait]
impl Collector for StatusCollector {
    async fn update(&self, sink: &SampleSink) -> Result<(), CollectorError> {
        tracing::debug!("Collecting helmrelease metrics");

        let releases = self.lister.list_releases().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to get helmrelease list from Kubernetes");
        })?;

        for sample in self.map_releases(&releases)? {
            sink.emit(sample);
        }
        Ok(())
    }
}
