// src/hardware/mcu.rs - Port implementations over the serial MCU bridge
use std::sync::Arc;

use async_trait::async_trait;

use super::serial::SerialLink;
use super::{
    HardwareError, HumiditySensor, Peripherals, PwmOutput, StatusIndicator, SwitchOutput,
    TextDisplay,
};
use crate::config::Config;

/// PWM frequency for the heater MOSFET, in Hz.
const HEATER_PWM_FREQ: u32 = 1_000;

pub struct McuHeater {
    link: Arc<SerialLink>,
    pin: u8,
}

#[async_trait]
impl PwmOutput for McuHeater {
    async fn set_duty(&self, duty: u32) -> Result<(), HardwareError> {
        self.link
            .command(&format!("pwm pin={} duty={}", self.pin, duty))
            .await
    }
}

pub struct McuSwitch {
    link: Arc<SerialLink>,
    pin: u8,
}

#[async_trait]
impl SwitchOutput for McuSwitch {
    async fn set(&self, on: bool) -> Result<(), HardwareError> {
        self.link
            .command(&format!(
                "gpio pin={} state={}",
                self.pin,
                if on { 1 } else { 0 }
            ))
            .await
    }
}

pub struct McuIndicator {
    link: Arc<SerialLink>,
}

#[async_trait]
impl StatusIndicator for McuIndicator {
    async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), HardwareError> {
        self.link
            .command(&format!("rgb r={} g={} b={}", r, g, b))
            .await
    }

    async fn commit(&self) -> Result<(), HardwareError> {
        self.link.command("rgb_show").await
    }
}

pub struct McuSensor {
    link: Arc<SerialLink>,
}

#[async_trait]
impl HumiditySensor for McuSensor {
    async fn measure(&self) -> Result<(), HardwareError> {
        self.link.command("dht_measure").await
    }

    async fn read(&self) -> Result<(f64, f64), HardwareError> {
        let reply = self.link.request("dht_read").await?;
        parse_reading(&reply)
    }
}

/// Parse a `reading: <celsius> <percent>` bridge reply.
fn parse_reading(reply: &str) -> Result<(f64, f64), HardwareError> {
    let payload = reply
        .strip_prefix("reading:")
        .ok_or_else(|| HardwareError::Protocol(reply.to_string()))?;
    let mut fields = payload.split_whitespace();
    let celsius = fields.next().and_then(|v| v.parse::<f64>().ok());
    let percent = fields.next().and_then(|v| v.parse::<f64>().ok());
    match (celsius, percent, fields.next()) {
        (Some(c), Some(rh), None) => Ok((c, rh)),
        _ => Err(HardwareError::Protocol(reply.to_string())),
    }
}

pub struct McuDisplay {
    link: Arc<SerialLink>,
}

#[async_trait]
impl TextDisplay for McuDisplay {
    async fn clear(&self) -> Result<(), HardwareError> {
        self.link.command("oled_clear").await
    }

    async fn draw_text(&self, text: &str, x: u32, y: u32) -> Result<(), HardwareError> {
        // Text is the remainder of the line, so it may contain spaces.
        self.link
            .command(&format!("oled_text x={} y={} {}", x, y, text))
            .await
    }

    async fn draw_line(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Result<(), HardwareError> {
        self.link
            .command(&format!("oled_line x0={} y0={} x1={} y1={}", x0, y0, x1, y1))
            .await
    }

    async fn commit(&self) -> Result<(), HardwareError> {
        self.link.command("oled_show").await
    }
}

/// Connect the serial bridge and configure every peripheral channel.
///
/// Heater, fan, indicator and sensor channels must configure cleanly:
/// the control loop is not allowed to start without its actuators. The
/// display is non-essential and downgrades to log-only reporting.
pub async fn connect(config: &Config) -> Result<Peripherals, HardwareError> {
    let link = Arc::new(SerialLink::open(&config.serial.port, config.serial.baud)?);

    link.command("ping")
        .await
        .map_err(|e| HardwareError::InitFailed(format!("MCU bridge not answering: {}", e)))?;

    link.command(&format!(
        "config_pwm pin={} freq={}",
        config.pins.heater, HEATER_PWM_FREQ
    ))
    .await?;
    link.command(&format!("config_gpio pin={}", config.pins.fan))
        .await?;
    link.command(&format!("config_rgb pin={} count=1", config.pins.indicator))
        .await?;
    link.command(&format!("config_dht pin={}", config.pins.sensor))
        .await?;

    let display: Option<Box<dyn TextDisplay>> = match link
        .command(&format!(
            "oled_init width={} height={} addr={:#04x}",
            config.display.width, config.display.height, config.display.i2c_addr
        ))
        .await
    {
        Ok(()) => Some(Box::new(McuDisplay { link: link.clone() })),
        Err(e) => {
            tracing::warn!("Display init failed, continuing without display: {}", e);
            None
        }
    };

    Ok(Peripherals {
        sensor: Box::new(McuSensor { link: link.clone() }),
        heater: Box::new(McuHeater {
            link: link.clone(),
            pin: config.pins.heater,
        }),
        fan: Box::new(McuSwitch {
            link: link.clone(),
            pin: config.pins.fan,
        }),
        indicator: Box::new(McuIndicator { link }),
        display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reading() {
        assert_eq!(parse_reading("reading: 21.5 48.0").unwrap(), (21.5, 48.0));
        assert_eq!(parse_reading("reading: -3.2 99.9").unwrap(), (-3.2, 99.9));
    }

    #[test]
    fn test_parse_reading_rejects_garbage() {
        assert!(parse_reading("ok").is_err());
        assert!(parse_reading("reading: warm").is_err());
        assert!(parse_reading("reading: 21.5").is_err());
        assert!(parse_reading("reading: 21.5 48.0 7").is_err());
    }
}
