// src/display/mod.rs - Status presentation to the OLED and the log
use crate::config::ControllerConfig;
use crate::hardware::{HardwareError, TextDisplay};

// Fixed layout for a 128x64 panel with an 8px font.
const TITLE: &str = "Heated Box Control";
const RULE_Y: u32 = 10;
const TEMP_Y: u32 = 15;
const HUMIDITY_Y: u32 = 25;
const TARGET_Y: u32 = 40;
const HEATER_Y: u32 = 50;

/// Renders the per-cycle status to the display and the log.
///
/// The display is an optional capability: when it is absent every draw
/// path is skipped and only the log line is produced. Display trouble
/// must never stop the control loop.
pub struct StatusPresenter {
    display: Option<Box<dyn TextDisplay>>,
    width: u32,
}

impl StatusPresenter {
    pub fn new(display: Option<Box<dyn TextDisplay>>, width: u32) -> Self {
        if display.is_none() {
            tracing::warn!("No display attached, status goes to the log only");
        }
        Self { display, width }
    }

    /// Emit the cycle status: one log line always, plus a display frame
    /// when a display is attached.
    pub async fn render(
        &self,
        temperature_f: f64,
        humidity: f64,
        duty: u32,
        config: &ControllerConfig,
    ) {
        let power = power_percent(duty, config.max_duty);
        tracing::info!(
            "{}",
            format_status_line(temperature_f, humidity, config.target_humidity, power)
        );

        if let Some(ref display) = self.display {
            if let Err(e) = self
                .draw(display.as_ref(), temperature_f, humidity, power, config)
                .await
            {
                tracing::warn!("Display update failed: {}", e);
            }
        }
    }

    async fn draw(
        &self,
        display: &dyn TextDisplay,
        temperature_f: f64,
        humidity: f64,
        power: f64,
        config: &ControllerConfig,
    ) -> Result<(), HardwareError> {
        display.clear().await?;
        display.draw_text(TITLE, 0, 0).await?;
        display.draw_line(0, RULE_Y, self.width, RULE_Y).await?;
        display
            .draw_text(&format!("Temp: {:.1} F", temperature_f), 0, TEMP_Y)
            .await?;
        display
            .draw_text(&format!("Humi: {:.1} %", humidity), 0, HUMIDITY_Y)
            .await?;
        display
            .draw_text(
                &format!("Target H: {:.0} %", config.target_humidity),
                0,
                TARGET_Y,
            )
            .await?;
        display
            .draw_text(&format!("Heater: {:.0} %", power), 0, HEATER_Y)
            .await?;
        display.commit().await
    }
}

/// Heater output as a human percentage of full scale.
pub fn power_percent(duty: u32, max_duty: u32) -> f64 {
    if max_duty == 0 {
        return 0.0;
    }
    duty as f64 / max_duty as f64 * 100.0
}

/// The per-cycle log line. Temperature and humidity carry one decimal,
/// target and heater power are whole percents.
pub fn format_status_line(temperature_f: f64, humidity: f64, target: f64, power: f64) -> String {
    format!(
        "T: {:.1} F, H: {:.1} %, Target: {:.0} %, Heater: {:.0} %",
        temperature_f, humidity, target, power
    )
}
