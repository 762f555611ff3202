// src/hardware/mod.rs - Peripheral port contracts and the MCU-backed bundle
pub mod mcu;
pub mod serial;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out after {0} ms waiting for MCU reply")]
    Timeout(u64),
    #[error("MCU rejected command '{command}': {reply}")]
    Rejected { command: String, reply: String },
    #[error("malformed MCU reply '{0}'")]
    Protocol(String),
    #[error("serial link closed")]
    LinkClosed,
    #[error("peripheral init failed: {0}")]
    InitFailed(String),
}

/// Combined temperature/relative-humidity sensor. `measure` triggers a
/// conversion, `read` returns the latest (celsius, percent) pair.
/// Either step can fail on the wire.
#[async_trait]
pub trait HumiditySensor: Send + Sync {
    async fn measure(&self) -> Result<(), HardwareError>;
    async fn read(&self) -> Result<(f64, f64), HardwareError>;
}

/// PWM channel, commanded in absolute duty counts up to the configured
/// full scale.
#[async_trait]
pub trait PwmOutput: Send + Sync {
    async fn set_duty(&self, duty: u32) -> Result<(), HardwareError>;
}

/// Plain on/off output.
#[async_trait]
pub trait SwitchOutput: Send + Sync {
    async fn set(&self, on: bool) -> Result<(), HardwareError>;
}

/// Addressable RGB status pixel. Color takes effect on `commit`.
#[async_trait]
pub trait StatusIndicator: Send + Sync {
    async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), HardwareError>;
    async fn commit(&self) -> Result<(), HardwareError>;
}

/// Small text/graphics panel. Draw calls build a frame, `commit` pushes
/// it to the glass.
#[async_trait]
pub trait TextDisplay: Send + Sync {
    async fn clear(&self) -> Result<(), HardwareError>;
    async fn draw_text(&self, text: &str, x: u32, y: u32) -> Result<(), HardwareError>;
    async fn draw_line(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Result<(), HardwareError>;
    async fn commit(&self) -> Result<(), HardwareError>;
}

/// The full peripheral set the controller owns. The display is the one
/// non-essential peripheral: absent means log-only status reporting.
pub struct Peripherals {
    pub sensor: Box<dyn HumiditySensor>,
    pub heater: Box<dyn PwmOutput>,
    pub fan: Box<dyn SwitchOutput>,
    pub indicator: Box<dyn StatusIndicator>,
    pub display: Option<Box<dyn TextDisplay>>,
}
