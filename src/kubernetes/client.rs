//! Kubernetes-backed release lister.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kube::api::{ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use thiserror::Error;

use crate::config::ClusterConfig;
use crate::kubernetes::release::{ListError, Release, ReleaseLister, ReleaseStatusFields};

/// API group of the HelmRelease custom resource.
pub const HELM_RELEASE_GROUP: &str = "flux.weave.works";
/// API version of the HelmRelease custom resource.
pub const HELM_RELEASE_VERSION: &str = "v1beta1";
/// Kind of the HelmRelease custom resource.
pub const HELM_RELEASE_KIND: &str = "HelmRelease";
const HELM_RELEASE_PLURAL: &str = "helmreleases";

/// Errors raised while building the Kubernetes client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// In-cluster service account config could not be loaded.
    #[error("in-cluster config: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    /// Kubeconfig could not be read or interpreted.
    #[error("read kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// No kubeconfig file could be located.
    #[error("couldn't find home directory to look for the kube config")]
    NoKubeconfig,

    /// Client construction failed.
    #[error("error creating kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// Lists HelmReleases from the cluster control plane.
///
/// Every call is bounded by `list_timeout`.
#[derive(Clone)]
pub struct KubeReleaseLister {
    api: Api<DynamicObject>,
    list_timeout: Duration,
}

impl std::fmt::Debug for KubeReleaseLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeReleaseLister")
            .field("list_timeout", &self.list_timeout)
            .finish_non_exhaustive()
    }
}

impl KubeReleaseLister {
    /// Build a lister from an existing client.
    pub fn new(client: Client, list_timeout: Duration) -> Self {
        let gvk = GroupVersionKind::gvk(HELM_RELEASE_GROUP, HELM_RELEASE_VERSION, HELM_RELEASE_KIND);
        let resource = ApiResource::from_gvk_with_plural(&gvk, HELM_RELEASE_PLURAL);
        Self {
            api: Api::all_with(client, &resource),
            list_timeout,
        }
    }

    /// Connect to the cluster described by `config`.
    ///
    /// # Errors
    /// Returns `ClientError` if no usable cluster configuration is found.
    pub async fn connect(config: &ClusterConfig) -> Result<Self, ClientError> {
        let kube_config = if config.in_cluster {
            tracing::info!("Creating InCluster config to communicate with Kubernetes master");
            Config::incluster()?
        } else {
            tracing::info!("Looking for Kubernetes config to communicate with Kubernetes master");
            let kubeconfig = match &config.kubeconfig {
                Some(paths) => read_kubeconfig(paths)?,
                None => {
                    let path = kubeconfig_path().ok_or(ClientError::NoKubeconfig)?;
                    tracing::debug!(path = %path.display(), "Using kubeconfig");
                    Kubeconfig::read_from(&path)?
                }
            };
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        };

        let client = Client::try_from(kube_config)?;
        Ok(Self::new(client, config.list_timeout))
    }
}

#[async_trait::async_trait]
impl ReleaseLister for KubeReleaseLister {
    async fn list_releases(&self) -> Result<Vec<Release>, ListError> {
        let list = tokio::time::timeout(self.list_timeout, self.api.list(&ListParams::default()))
            .await
            .map_err(|_| ListError::Timeout(self.list_timeout))??;

        let releases = list
            .items
            .into_iter()
            .filter_map(|obj| match release_from_object(obj) {
                Ok(release) => Some(release),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable HelmRelease");
                    None
                }
            })
            .collect();
        Ok(releases)
    }
}

/// Convert a dynamic HelmRelease object into a [`Release`].
fn release_from_object(obj: DynamicObject) -> Result<Release, ListError> {
    let name = obj.metadata.name.unwrap_or_default();
    let namespace = obj.metadata.namespace.unwrap_or_default();

    let status = match obj.data.get("status") {
        Some(value) if !value.is_null() => {
            serde_json::from_value::<ReleaseStatusFields>(value.clone()).map_err(|source| {
                ListError::Decode {
                    name: format!("{namespace}/{name}"),
                    source,
                }
            })?
        }
        _ => ReleaseStatusFields::default(),
    };

    Ok(Release {
        name,
        namespace,
        status,
    })
}

/// Read and merge a kubeconfig path list (`KUBECONFIG` syntax).
///
/// Entries are separated by the platform path separator. Earlier files win
/// on conflicting names.
pub fn read_kubeconfig(paths: &str) -> Result<Kubeconfig, ClientError> {
    let mut merged: Option<Kubeconfig> = None;
    for path in std::env::split_paths(paths).filter(|p| !p.as_os_str().is_empty()) {
        tracing::debug!(path = %path.display(), "Using kubeconfig");
        let next = Kubeconfig::read_from(&path)?;
        merged = Some(match merged {
            Some(current) => current.merge(next)?,
            None => next,
        });
    }
    merged.ok_or(ClientError::NoKubeconfig)
}

/// Locate the local kubeconfig.
///
/// Checks `$HOME/.kube/config` first, then `$USERPROFILE/.kube/config`.
pub fn kubeconfig_path() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"].iter().find_map(|var| {
        let home = std::env::var(var).ok().filter(|h| !h.is_empty())?;
        existing_kubeconfig(Path::new(&home))
    })
}

fn existing_kubeconfig(home: &Path) -> Option<PathBuf> {
    let path = home.join(".kube").join("config");
    path.is_file().then_some(path)
}
