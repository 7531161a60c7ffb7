//! Where endpoint subsets come from.
//!
//! [`EndpointSource`] is the seam between the poll loop and the cluster.
//! [`KubeEndpointSource`] implements it with a plain `GET` of the core/v1
//! `Endpoints` object named after the service; [`connect`] builds the client
//! it needs from either in-cluster credentials or an explicit kubeconfig.

use std::path::Path;

use k8s_openapi::api::core::v1::Endpoints;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};

use crate::error::{BoxError, Error, Result};
use crate::resolver::{EndpointSubset, subsets_of};

/// Interface that fetches the current endpoint subsets of a service.
#[async_trait::async_trait]
pub trait EndpointSource: Send + Sync {
    /// Returns the subsets currently backing `service` in `namespace`.
    ///
    /// Fails if the service does not exist or the API cannot be reached.
    async fn fetch_subsets(
        &self,
        service: &str,
        namespace: &str,
    ) -> std::result::Result<Vec<EndpointSubset>, BoxError>;
}

/// [`EndpointSource`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeEndpointSource {
    client: Client,
}

impl KubeEndpointSource {
    /// Wraps an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl EndpointSource for KubeEndpointSource {
    async fn fetch_subsets(
        &self,
        service: &str,
        namespace: &str,
    ) -> std::result::Result<Vec<EndpointSubset>, BoxError> {
        let api: Api<Endpoints> = Api::namespaced(self.client.clone(), namespace);
        let endpoints = api.get(service).await?;

        tracing::debug!(
            "fetched {} endpoint subsets for {namespace}/{service}",
            endpoints.subsets.as_ref().map_or(0, Vec::len)
        );

        Ok(subsets_of(&endpoints))
    }
}

/// Builds a Kubernetes client.
///
/// With `kubeconfig` set, the file's current context is used (for running
/// outside the cluster). Otherwise the in-cluster service account is used.
///
/// # Errors
///
/// Returns [`Error::InCluster`] or [`Error::Kubeconfig`] if no cluster config
/// can be created, and [`Error::Client`] if the client cannot be built from it.
pub async fn connect(kubeconfig: Option<&Path>) -> Result<Client> {
    let config = match kubeconfig {
        Some(path) => {
            tracing::debug!("loading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }

        None => {
            tracing::debug!("using in-cluster configuration");
            Config::incluster()?
        }
    };

    Client::try_from(config).map_err(Error::Client)
}
