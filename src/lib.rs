#![deny(missing_docs)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Periodic endpoint reporting for a Kubernetes service.
//!
//! Every few seconds the watcher reads the core/v1 `Endpoints` object of one
//! service, expands its address and port subsets into `host:port` pairs and
//! logs them as a single line. It keeps no state between polls and stops on
//! SIGINT or SIGTERM.
//!
//! # Features
//!
//! - **Fixed-rate polling**: a fresh lookup on every tick, no caching or diffing
//! - **Non-fatal lookups**: a failed poll is logged and the next tick retries
//! - **Clean shutdown**: termination signals end the process with success
//!
//! # Usage
//!
//! ```ignore
//! use k8s_endpoint_watcher::{
//!     KubeEndpointSource, LogReporter, PollLoop, ShutdownCoordinator, WatchConfig, connect, run,
//! };
//!
//! let span = tracing::info_span!("watcher", service = "web");
//! let client = connect(None).await?;
//! let poll = PollLoop::new(
//!     WatchConfig::new("web").namespace("prod"),
//!     KubeEndpointSource::new(client),
//!     LogReporter::new(span.clone()),
//! );
//! let shutdown = ShutdownCoordinator::new(span)?;
//!
//! let signal = run(poll, shutdown.wait()).await?;
//! ```

mod error;
mod poll;
mod resolver;
mod shutdown;
mod source;

use std::future::Future;

use tokio::sync::mpsc;

pub use error::{BoxError, Error, LookupError, Result};
pub use poll::{
    DEFAULT_INTERVAL, DEFAULT_NAMESPACE, LogReporter, MIN_INTERVAL, PollLoop, Reporter, WatchConfig,
};
pub use resolver::{EndpointSubset, ResolvedEndpoints, resolve, subsets_of};
pub use shutdown::{ShutdownCoordinator, Signal};
pub use source::{EndpointSource, KubeEndpointSource, connect};

/// Runs the poll loop and waits for `shutdown` to complete.
///
/// Both activities run as independent tasks and report to a single-slot
/// completion channel; the first report decides the outcome. Lookup failures
/// never reach it, so in practice the call returns when `shutdown` yields a
/// [`Signal`]. The poll task is then aborted, and a lookup in flight at that
/// moment is abandoned rather than awaited.
///
/// # Errors
///
/// Returns [`Error::PollLoop`] if the poll loop task panics, and
/// [`Error::Abandoned`] if every activity ends without reporting.
pub async fn run<S, R, F>(poll: PollLoop<S, R>, shutdown: F) -> Result<Signal>
where
    S: EndpointSource + 'static,
    R: Reporter + 'static,
    F: Future<Output = Signal> + Send + 'static,
{
    let (done_tx, mut done_rx) = mpsc::channel::<Result<Signal>>(1);

    let poll_task = tokio::spawn(poll.run());
    let poll_abort = poll_task.abort_handle();

    let poll_done = done_tx.clone();
    tokio::spawn(async move {
        // Cancellation after shutdown is not a failure.
        if let Err(e) = poll_task.await
            && e.is_panic()
        {
            let _ = poll_done.send(Err(Error::PollLoop(e))).await;
        }
    });

    tokio::spawn(async move {
        let signal = shutdown.await;
        let _ = done_tx.send(Ok(signal)).await;
    });

    let outcome = done_rx.recv().await.unwrap_or(Err(Error::Abandoned));
    poll_abort.abort();

    outcome
}
