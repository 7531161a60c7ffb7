//! Flattening of `Endpoints` subsets into `host:port` strings.
//!
//! A core/v1 `Endpoints` object groups addresses and ports into subsets.
//! Every address of the service is paired with every port of the service:
//! addresses and ports are first pooled across *all* subsets, then the
//! Cartesian product of the two pools is taken.
//!
//! # Example
//!
//! ```
//! use k8s_endpoint_watcher::{EndpointSubset, resolve};
//!
//! let subsets = vec![EndpointSubset::new(["10.0.0.1", "10.0.0.2"], [80, 443])];
//! let resolved = resolve(&subsets);
//!
//! assert_eq!(
//!     resolved.report("web"),
//!     "web: 10.0.0.1:80, 10.0.0.1:443, 10.0.0.2:80, 10.0.0.2:443"
//! );
//! ```

use std::fmt;

use k8s_openapi::api::core::v1 as core;

/// A group of addresses paired with a group of ports, as reported for a service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointSubset {
    /// IP addresses, in the order the API returned them.
    pub addresses: Vec<String>,

    /// Port numbers, in the order the API returned them. Not validated.
    pub ports: Vec<i32>,
}

impl EndpointSubset {
    /// Creates a subset from addresses and ports.
    #[must_use]
    pub fn new<A, S>(addresses: A, ports: impl IntoIterator<Item = i32>) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
            ports: ports.into_iter().collect(),
        }
    }
}

impl From<&core::EndpointSubset> for EndpointSubset {
    fn from(subset: &core::EndpointSubset) -> Self {
        // Only the IP is used; hostname is usually blank.
        let addresses = subset
            .addresses
            .iter()
            .flatten()
            .map(|addr| addr.ip.clone())
            .collect();

        let ports = subset.ports.iter().flatten().map(|port| port.port).collect();

        Self { addresses, ports }
    }
}

/// Extracts the subsets of an `Endpoints` object. A missing list yields no subsets.
#[must_use]
pub fn subsets_of(endpoints: &core::Endpoints) -> Vec<EndpointSubset> {
    endpoints
        .subsets
        .iter()
        .flatten()
        .map(EndpointSubset::from)
        .collect()
}

/// The flattened `host:port` list produced by [`resolve`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedEndpoints(Vec<String>);

impl ResolvedEndpoints {
    /// Number of `host:port` entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The entries in resolution order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Formats the report line for `service`, e.g. `web: 10.0.0.1:80, 10.0.0.2:80`.
    ///
    /// An empty set renders as `web: ` (with the trailing space).
    #[must_use]
    pub fn report(&self, service: &str) -> String {
        format!("{service}: {self}")
    }
}

impl fmt::Display for ResolvedEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl IntoIterator for ResolvedEndpoints {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Computes the `host:port` pairs for the given subsets.
///
/// Addresses and ports are pooled across all subsets without deduplication,
/// so the result always has `Σaddresses × Σports` entries. The outer loop runs
/// over addresses and the inner loop over ports, both in discovery order.
#[must_use]
pub fn resolve(subsets: &[EndpointSubset]) -> ResolvedEndpoints {
    let addresses: Vec<&str> = subsets
        .iter()
        .flat_map(|subset| subset.addresses.iter().map(String::as_str))
        .collect();
    let ports: Vec<i32> = subsets
        .iter()
        .flat_map(|subset| subset.ports.iter().copied())
        .collect();

    let mut pairs = Vec::with_capacity(addresses.len() * ports.len());

    for addr in &addresses {
        for port in &ports {
            pairs.push(format!("{addr}:{port}"));
        }
    }

    ResolvedEndpoints(pairs)
}
