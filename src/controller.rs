// src/controller.rs - The enclosure control loop
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{RwLock, broadcast, mpsc};

use crate::config::{Config, ConfigError};
use crate::console::ControllerRequest;
use crate::control;
use crate::display::{StatusPresenter, format_status_line, power_percent};
use crate::hardware::{HardwareError, HumiditySensor, Peripherals, PwmOutput, StatusIndicator, SwitchOutput};
use crate::sensor;
use crate::units;

/// Indicator color for a controller that made it through startup.
const READY_COLOR: (u8, u8, u8) = (0, 64, 0);

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Observable snapshot of the running loop, for the console status
/// query. Purely informational; the control law never reads it.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub ready: bool,
    pub temperature_f: f64,
    pub humidity: f64,
    pub target_humidity: f64,
    pub heater_power: f64,
    pub fallback: bool,
}

impl std::fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            format_status_line(
                self.temperature_f,
                self.humidity,
                self.target_humidity,
                self.heater_power
            ),
            if self.fallback { " (fallback data)" } else { "" }
        )
    }
}

/// Owns the configuration and every peripheral handle, and runs the
/// sample/control/actuate/report cycle on a fixed cadence.
pub struct EnclosureController {
    config: Config,
    sensor: Box<dyn HumiditySensor>,
    heater: Box<dyn PwmOutput>,
    fan: Box<dyn SwitchOutput>,
    indicator: Box<dyn StatusIndicator>,
    presenter: StatusPresenter,
    state: Arc<RwLock<StatusSnapshot>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl EnclosureController {
    pub fn new(config: Config, peripherals: Peripherals) -> Result<Self, ControllerError> {
        config.validate()?;
        let (shutdown_tx, _) = broadcast::channel(1);
        let presenter = StatusPresenter::new(peripherals.display, config.display.width);

        Ok(Self {
            config,
            sensor: peripherals.sensor,
            heater: peripherals.heater,
            fan: peripherals.fan,
            indicator: peripherals.indicator,
            presenter,
            state: Arc::new(RwLock::new(StatusSnapshot::default())),
            shutdown_tx,
        })
    }

    /// Sender half of the shutdown channel, for signal handlers.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.state.read().await.clone()
    }

    /// Drive the safety-critical actuators into their startup state.
    /// Failure here is fatal: the loop must not run without a working
    /// heater, fan and indicator. The fan and indicator are commanded
    /// once and are not part of the per-cycle control law.
    pub async fn start(&mut self) -> Result<(), ControllerError> {
        tracing::info!("Starting humidity controller");
        self.heater.set_duty(0).await?;
        self.fan.set(true).await?;
        let (r, g, b) = READY_COLOR;
        self.indicator.set_color(r, g, b).await?;
        self.indicator.commit().await?;
        self.state.write().await.ready = true;
        tracing::info!(
            "Controller ready: target {:.1} %, gain {:.1}, period {} s",
            self.config.controller.target_humidity,
            self.config.controller.proportional_gain,
            self.config.controller.sample_period_secs
        );
        Ok(())
    }

    /// Run the control loop until shutdown. One cycle per sample
    /// period; console requests are handled between cycles by this same
    /// task, so the config has exactly one reader and one writer.
    pub async fn run(
        &mut self,
        mut requests: mpsc::Receiver<ControllerRequest>,
    ) -> Result<(), ControllerError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut interval = tokio::time::interval(self.config.controller.sample_period());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut console_open = true;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Control loop shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        // The next tick recomputes and re-commands the
                        // heater from scratch, so skipping is safe.
                        tracing::error!("Cycle failed, skipping to next sample: {}", e);
                    }
                }
                request = requests.recv(), if console_open => {
                    match request {
                        Some(request) => self.handle_request(request).await,
                        None => console_open = false,
                    }
                }
            }
        }

        self.make_safe().await;
        Ok(())
    }

    /// One control cycle: acquire, convert, compute, actuate, report.
    pub(crate) async fn run_cycle(&mut self) -> Result<(), ControllerError> {
        let sample = sensor::acquire(self.sensor.as_ref()).await;
        let temperature_f = units::celsius_to_fahrenheit(sample.reading.temperature_celsius);
        let duty = control::compute_duty(sample.reading.humidity_percent, &self.config.controller);
        self.heater.set_duty(duty).await?;

        {
            let mut state = self.state.write().await;
            state.temperature_f = temperature_f;
            state.humidity = sample.reading.humidity_percent;
            state.target_humidity = self.config.controller.target_humidity;
            state.heater_power = power_percent(duty, self.config.controller.max_duty);
            state.fallback = sample.fallback;
        }

        self.presenter
            .render(
                temperature_f,
                sample.reading.humidity_percent,
                duty,
                &self.config.controller,
            )
            .await;
        Ok(())
    }

    async fn handle_request(&mut self, request: ControllerRequest) {
        match request {
            ControllerRequest::SetTargetHumidity { value, respond_to } => {
                let result = match self.config.controller.set_target_humidity(&value) {
                    Ok(accepted) => Ok(accepted),
                    Err(e) => {
                        tracing::warn!("Rejected target humidity update: {}", e);
                        Err(e.to_string())
                    }
                };
                let _ = respond_to.send(result);
            }
            ControllerRequest::GetStatus { respond_to } => {
                let _ = respond_to.send(self.state.read().await.clone());
            }
        }
    }

    /// Best-effort safe state on the way out: heater off, fan off.
    async fn make_safe(&mut self) {
        if let Err(e) = self.heater.set_duty(0).await {
            tracing::error!("Failed to zero heater duty on shutdown: {}", e);
        }
        if let Err(e) = self.fan.set(false).await {
            tracing::error!("Failed to stop fan on shutdown: {}", e);
        }
    }
}
