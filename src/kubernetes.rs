//! Kubernetes Layer
//!
//! Read-only access to HelmRelease custom resources.
//!
//! - [`Release`]: Snapshot of one HelmRelease (identity, status, conditions)
//! - [`ReleaseLister`]: Capability trait for listing releases, shared by collectors and health checks
//! - [`KubeReleaseLister`]: Implementation backed by the `kube` client

mod client;
mod release;

pub use client::{ClientError, KubeReleaseLister, kubeconfig_path};
pub use release::{
    CONDITION_TRUE, Condition, ListError, Release, ReleaseLister, ReleaseStatusFields,
};
