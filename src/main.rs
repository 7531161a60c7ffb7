//! Command-line entry point: logs the endpoints of one service until stopped.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use k8s_endpoint_watcher::{
    DEFAULT_NAMESPACE, Error, KubeEndpointSource, LogReporter, PollLoop, ShutdownCoordinator,
    WatchConfig, connect, run,
};
use tracing::{error, info, info_span};

/// Build time, injected by the release pipeline.
const BUILD_TIME: &str = match option_env!("BUILD_TIME") {
    Some(value) => value,
    None => "",
};

/// Build tag, injected by the release pipeline.
const BUILD_TAG: &str = match option_env!("BUILD_TAG") {
    Some(value) => value,
    None => "",
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

/// Periodically logs the endpoints of a Kubernetes service.
#[derive(Debug, Parser)]
#[command(name = "k8s-endpoint-watcher", version)]
struct Args {
    /// Kubeconfig file (for usage of this tool from outside the cluster)
    #[arg(long, env = "WATCHER_KUBECONFIG", value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Name of service endpoints to watch
    #[arg(long, env = "WATCHER_SERVICE", value_name = "NAME")]
    service: Option<String>,

    /// Kubernetes namespace
    #[arg(long, env = "WATCHER_NAMESPACE", value_name = "NAME", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Seconds between two polls
    #[arg(long, env = "WATCHER_INTERVAL", value_name = "SECONDS", default_value_t = 5,
          value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Log output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value = "json")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }

        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .compact()
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_format);

    let kubeconfig = args
        .kubeconfig
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    info!(
        kubeconfig = %kubeconfig,
        service = args.service.as_deref().unwrap_or_default(),
        namespace = %args.namespace,
        version = env!("CARGO_PKG_VERSION"),
        build_time = BUILD_TIME,
        build_tag = BUILD_TAG,
        "Watcher starting"
    );

    match watch(args).await {
        Ok(()) => {
            info!("Watcher stopped");
            ExitCode::SUCCESS
        }

        Err(e) => {
            log_failure(&e);
            ExitCode::FAILURE
        }
    }
}

/// Logs a fatal error once, under the message for the stage that failed.
fn log_failure(e: &Error) {
    match e {
        Error::MissingService => error!("No service name specified"),
        Error::InCluster(source) => error!(err = %source, "Cannot create cluster config"),
        Error::Kubeconfig(source) => error!(err = %source, "Cannot create cluster config"),
        Error::Client(source) => error!(err = %source, "Cannot create client"),
        Error::Signals(source) => error!(err = %source, "Cannot register signal handlers"),
        _ => error!(err = %e, "Watcher stopped with error"),
    }
}

async fn watch(args: Args) -> Result<(), Error> {
    let Some(service) = args.service.filter(|name| !name.is_empty()) else {
        return Err(Error::MissingService);
    };

    let client = connect(args.kubeconfig.as_deref()).await?;

    let span = info_span!("watcher", service = %service, namespace = %args.namespace);
    let config = WatchConfig::new(service)
        .namespace(args.namespace)
        .interval(Duration::from_secs(args.interval));
    let poll = PollLoop::new(
        config,
        KubeEndpointSource::new(client),
        LogReporter::new(span.clone()),
    );

    let shutdown = ShutdownCoordinator::new(span.clone())?;
    info!(parent: &span, "Watcher started");

    let signal = run(poll, shutdown.wait()).await?;
    info!(parent: &span, signal = %signal, "Shutting down");

    Ok(())
}
