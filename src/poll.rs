//! The fixed-rate poll loop.
//!
//! Every tick the loop fetches the subsets of the configured service, resolves
//! them into `host:port` pairs and hands one line to the [`Reporter`]. A failed
//! lookup is reported and the loop waits for the next tick; nothing is retried,
//! cached or diffed between cycles.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::Span;

use crate::error::LookupError;
use crate::resolver::{ResolvedEndpoints, resolve};
use crate::source::EndpointSource;

/// Default namespace of the watched service.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default period between two poll cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest period the poll loop accepts; shorter intervals are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the poll loop.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// The Kubernetes service name to watch.
    pub service_name: String,

    /// The Kubernetes namespace where the service is deployed.
    pub namespace: String,

    /// The period between two poll cycles.
    pub interval: Duration,
}

impl WatchConfig {
    /// Creates a configuration for `service_name` in the `default` namespace,
    /// polled every five seconds.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Sets the namespace of the service.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the period between poll cycles, raised to at least [`MIN_INTERVAL`].
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }
}

/// Receives the outcome of each poll cycle.
pub trait Reporter: Send + Sync {
    /// Called with the formatted report line of a successful cycle.
    fn report(&self, line: &str);

    /// Called when a cycle's lookup failed.
    fn lookup_failed(&self, error: &LookupError);
}

/// [`Reporter`] that emits `tracing` events under the given span.
#[derive(Clone, Debug)]
pub struct LogReporter {
    span: Span,
}

impl LogReporter {
    /// Creates a reporter whose events are children of `span`.
    #[must_use]
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

impl Reporter for LogReporter {
    fn report(&self, line: &str) {
        tracing::info!(parent: &self.span, "{line}");
    }

    fn lookup_failed(&self, error: &LookupError) {
        tracing::error!(
            parent: &self.span,
            service = %error.service,
            namespace = %error.namespace,
            err = %error.source,
            "Cannot find endpoints of service"
        );
    }
}

/// Drives an [`EndpointSource`] on a fixed period.
pub struct PollLoop<S, R> {
    source: S,
    reporter: R,
    config: WatchConfig,
}

impl<S, R> PollLoop<S, R>
where
    S: EndpointSource,
    R: Reporter,
{
    /// Creates a poll loop; nothing runs until [`PollLoop::run`] is awaited.
    #[must_use]
    pub fn new(config: WatchConfig, source: S, reporter: R) -> Self {
        Self {
            source,
            reporter,
            config,
        }
    }

    /// The loop's configuration.
    #[must_use]
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Fetches and resolves the endpoints once, without reporting.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] tagged with the service and namespace if the
    /// endpoint source fails.
    pub async fn poll_once(&self) -> Result<ResolvedEndpoints, LookupError> {
        let WatchConfig {
            service_name,
            namespace,
            ..
        } = &self.config;

        let subsets = self
            .source
            .fetch_subsets(service_name, namespace)
            .await
            .map_err(|source| LookupError {
                service: service_name.clone(),
                namespace: namespace.clone(),
                source,
            })?;

        Ok(resolve(&subsets))
    }

    /// Runs one cycle and hands its outcome to the reporter.
    pub async fn cycle(&self) {
        match self.poll_once().await {
            Ok(resolved) => self.reporter.report(&resolved.report(&self.config.service_name)),
            Err(e) => self.reporter.lookup_failed(&e),
        }
    }

    /// Polls forever, one cycle per tick.
    ///
    /// The first tick fires one period after the call. Ticks are a fixed-rate
    /// clock: a cycle that overruns its period does not delay later ticks, the
    /// missed ones fire back to back once it returns.
    pub async fn run(self) {
        // `interval` is a public field, so the setter's floor may have been bypassed.
        let period = self.config.interval.max(MIN_INTERVAL);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        tracing::debug!(
            "polling endpoints of {}/{} every {period:?}",
            self.config.namespace,
            self.config.service_name
        );

        loop {
            ticker.tick().await;
            self.cycle().await;
        }
    }
}
