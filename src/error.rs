//! Error types for the watcher.

/// Boxed error returned by an [`EndpointSource`](crate::EndpointSource).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for watcher operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failed endpoint lookup for one poll cycle.
#[derive(Debug, thiserror::Error)]
#[error("cannot find endpoints of service {namespace}/{service}: {source}")]
pub struct LookupError {
    /// The service that was looked up.
    pub service: String,

    /// The namespace the service was looked up in.
    pub namespace: String,

    /// The underlying cause reported by the endpoint source.
    #[source]
    pub source: BoxError,
}

/// Errors raised by the watcher.
///
/// Only [`Error::Lookup`] can happen once polling has started, and it never
/// stops the poll loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No service name was given.
    #[error("no service name specified")]
    MissingService,

    /// In-cluster credentials could not be loaded.
    #[error("cannot create cluster config: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    /// The explicit kubeconfig file could not be loaded.
    #[error("cannot create cluster config: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// The Kubernetes client could not be built from the config.
    #[error("cannot create client: {0}")]
    Client(#[source] kube::Error),

    /// SIGINT/SIGTERM handlers could not be installed.
    #[error("cannot register signal handlers: {0}")]
    Signals(#[from] std::io::Error),

    /// A single poll cycle failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The poll loop task terminated abnormally.
    #[error("poll loop stopped unexpectedly: {0}")]
    PollLoop(#[source] tokio::task::JoinError),

    /// Every activity went away without reporting an outcome.
    #[error("watcher activities ended without reporting an outcome")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_error_names_service_namespace_and_cause() {
        let err = LookupError {
            service: "web".to_string(),
            namespace: "prod".to_string(),
            source: "connection refused".into(),
        };

        assert_eq!(
            err.to_string(),
            "cannot find endpoints of service prod/web: connection refused"
        );
    }

    #[test]
    fn lookup_variant_is_transparent() {
        let err = Error::from(LookupError {
            service: "web".to_string(),
            namespace: "default".to_string(),
            source: "not found".into(),
        });

        assert_eq!(
            err.to_string(),
            "cannot find endpoints of service default/web: not found"
        );
    }
}
