use std::process::ExitCode;

use tracing::{error, info};

use probe_beacon::config::Config;
use probe_beacon::health::add_health_checks;
use probe_beacon::{logging, ProbeHost, VERSION};

fn main() -> ExitCode {
    // Configuration errors are reported before logging exists
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid probe configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Probe host failed");
            ExitCode::FAILURE
        }
    }
}

async fn async_main(config: Config) -> probe_beacon::Result<()> {
    info!(version = VERSION, "Starting probe_beacon...");
    config.log_summary();

    let mut host = ProbeHost::new(config, add_health_checks().build())?;
    host.start().await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down...");

    host.stop().await;
    Ok(())
}
