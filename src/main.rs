// src/main.rs - Heated enclosure controller host
mod config;
mod console;
mod control;
mod controller;
#[cfg(test)]
mod cycle_test;
mod display;
mod hardware;
mod sensor;
mod simulator;
mod units;

use clap::Parser;
use tokio::sync::mpsc;

use controller::EnclosureController;

/// Host-side controller for a heated enclosure: holds relative
/// humidity at a setpoint with a proportional heater law, keeps the
/// circulation fan running, and reports on an OLED and the log.
#[derive(Debug, Parser)]
#[command(name = "heatbox-host", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(default_value = "heatbox.toml")]
    config: String,

    /// Run against the in-memory peripheral rig instead of the MCU bridge.
    #[arg(long)]
    simulate: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    tracing::info!("Starting heatbox host");
    tracing::info!("Loading configuration from: {}", cli.config);

    let config = config::Config::load(&cli.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", cli.config, e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    let peripherals = if cli.simulate {
        tracing::info!("Running with simulated peripherals");
        let (rig, _handle) = simulator::rig();
        rig
    } else {
        hardware::mcu::connect(&config).await.map_err(|e| {
            tracing::error!("Peripheral init failed, refusing to start: {}", e);
            Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
        })?
    };

    let mut controller = EnclosureController::new(config, peripherals)?;
    controller.start().await?;

    // Operator console feeds the controller task over a channel.
    let (console_tx, console_rx) = mpsc::channel(16);
    tokio::spawn(console::run(console_tx));

    let shutdown = controller.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            let _ = shutdown.send(());
        }
    });

    controller.run(console_rx).await?;
    Ok(())
}
