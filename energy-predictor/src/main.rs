use clap::Parser;
use energy_predictor::{Application, Config, telemetry};
use tokio::signal;

/// Resolve once the process is asked to stop, naming the signal that did it.
async fn stop_requested() -> &'static str {
    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, only Ctrl+C stops the server");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = sigterm => "SIGTERM",
    }
}

async fn shutdown_signal() {
    let received = stop_requested().await;
    tracing::info!(signal = received, "Stopping energy predictor, draining in-flight requests");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = energy_predictor::config::Args::parse();

    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!("{:?}", args);

    // A failed artifact load does not stop startup; the service runs degraded
    Application::new(config).await?.serve(shutdown_signal()).await
}
