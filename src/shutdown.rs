//! Termination signal handling.
//!
//! The coordinator is armed when it is created: signal handlers are installed
//! right away so a signal delivered before [`ShutdownCoordinator::wait`] is
//! polled is not lost. It never looks at the poll loop.

use std::fmt;
use std::io;

use tracing::Span;

/// A termination signal that triggers shutdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT (or Ctrl-C).
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Waits for SIGINT or SIGTERM.
pub struct ShutdownCoordinator {
    span: Span,

    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,

    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownCoordinator {
    /// Installs the signal handlers. Events are logged as children of `span`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if a signal handler cannot be registered.
    #[cfg(unix)]
    pub fn new(span: Span) -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let sigint = signal(SignalKind::interrupt())?;
        let sigterm = signal(SignalKind::terminate())?;

        Ok(Self {
            span,
            sigint,
            sigterm,
        })
    }

    /// Creates the coordinator. Events are logged as children of `span`.
    ///
    /// # Errors
    ///
    /// Never fails on this platform; Ctrl-C is hooked when waiting.
    #[cfg(not(unix))]
    pub fn new(span: Span) -> io::Result<Self> {
        Ok(Self { span })
    }

    /// Waits until a termination signal arrives and returns it.
    #[cfg(unix)]
    pub async fn wait(mut self) -> Signal {
        let signal = tokio::select! {
            _ = self.sigint.recv() => Signal::Interrupt,
            _ = self.sigterm.recv() => Signal::Terminate,
        };

        tracing::info!(parent: &self.span, signal = %signal, "Received termination signal");
        signal
    }

    /// Waits until Ctrl-C is pressed.
    #[cfg(not(unix))]
    pub async fn wait(self) -> Signal {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(parent: &self.span, err = %e, "Cannot wait for Ctrl-C");
            return std::future::pending().await;
        }

        tracing::info!(parent: &self.span, signal = %Signal::Interrupt, "Received termination signal");
        Signal::Interrupt
    }
}
