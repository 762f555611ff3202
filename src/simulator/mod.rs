// src/simulator/mod.rs - In-memory peripheral rig for tests and bench runs
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::hardware::{
    HardwareError, HumiditySensor, Peripherals, PwmOutput, StatusIndicator, SwitchOutput,
    TextDisplay,
};

/// Everything the simulated peripherals have been commanded to do.
#[derive(Debug, Default)]
pub struct SimState {
    pub heater_duty: Vec<u32>,
    pub fan_on: Option<bool>,
    pub color: Option<(u8, u8, u8)>,
    pub color_committed: bool,
    pub display_lines: Vec<String>,
    pub display_commits: u32,
}

/// Shared view into the rig, for assertions after driving the loop.
#[derive(Clone, Default)]
pub struct SimHandle(Arc<Mutex<SimState>>);

impl SimHandle {
    pub fn state(&self) -> MutexGuard<'_, SimState> {
        self.0.lock().unwrap()
    }
}

/// Sensor fed either by a script of results (tests) or by synthetic
/// jittered readings (bench runs with `--simulate`).
pub struct SimSensor {
    script: Mutex<VecDeque<Result<(f64, f64), HardwareError>>>,
    synthesize: bool,
}

#[async_trait]
impl HumiditySensor for SimSensor {
    async fn measure(&self) -> Result<(), HardwareError> {
        Ok(())
    }

    async fn read(&self) -> Result<(f64, f64), HardwareError> {
        if let Some(result) = self.script.lock().unwrap().pop_front() {
            return result;
        }
        if self.synthesize {
            let celsius = 22.0 + (rand::random::<f64>() - 0.5) * 2.0;
            let humidity = 45.0 + (rand::random::<f64>() - 0.5) * 10.0;
            Ok((celsius, humidity))
        } else {
            Err(HardwareError::Protocol("sensor script exhausted".to_string()))
        }
    }
}

pub struct SimHeater {
    handle: SimHandle,
}

#[async_trait]
impl PwmOutput for SimHeater {
    async fn set_duty(&self, duty: u32) -> Result<(), HardwareError> {
        self.handle.state().heater_duty.push(duty);
        Ok(())
    }
}

pub struct SimSwitch {
    handle: SimHandle,
}

#[async_trait]
impl SwitchOutput for SimSwitch {
    async fn set(&self, on: bool) -> Result<(), HardwareError> {
        self.handle.state().fan_on = Some(on);
        Ok(())
    }
}

pub struct SimIndicator {
    handle: SimHandle,
}

#[async_trait]
impl StatusIndicator for SimIndicator {
    async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), HardwareError> {
        self.handle.state().color = Some((r, g, b));
        Ok(())
    }

    async fn commit(&self) -> Result<(), HardwareError> {
        self.handle.state().color_committed = true;
        Ok(())
    }
}

pub struct SimDisplay {
    handle: SimHandle,
}

#[async_trait]
impl TextDisplay for SimDisplay {
    async fn clear(&self) -> Result<(), HardwareError> {
        self.handle.state().display_lines.clear();
        Ok(())
    }

    async fn draw_text(&self, text: &str, _x: u32, y: u32) -> Result<(), HardwareError> {
        self.handle.state().display_lines.push(format!("{}: {}", y, text));
        Ok(())
    }

    async fn draw_line(&self, _x0: u32, _y0: u32, _x1: u32, _y1: u32) -> Result<(), HardwareError> {
        Ok(())
    }

    async fn commit(&self) -> Result<(), HardwareError> {
        self.handle.state().display_commits += 1;
        Ok(())
    }
}

/// Build a rig that synthesizes plausible readings forever.
pub fn rig() -> (Peripherals, SimHandle) {
    build(VecDeque::new(), true, true)
}

/// Build a rig that replays the given sensor results, then errors.
pub fn scripted_rig(
    script: Vec<Result<(f64, f64), HardwareError>>,
    with_display: bool,
) -> (Peripherals, SimHandle) {
    build(script.into(), false, with_display)
}

fn build(
    script: VecDeque<Result<(f64, f64), HardwareError>>,
    synthesize: bool,
    with_display: bool,
) -> (Peripherals, SimHandle) {
    let handle = SimHandle::default();
    let display: Option<Box<dyn TextDisplay>> = if with_display {
        Some(Box::new(SimDisplay {
            handle: handle.clone(),
        }))
    } else {
        None
    };

    let peripherals = Peripherals {
        sensor: Box::new(SimSensor {
            script: Mutex::new(script),
            synthesize,
        }),
        heater: Box::new(SimHeater {
            handle: handle.clone(),
        }),
        fan: Box::new(SimSwitch {
            handle: handle.clone(),
        }),
        indicator: Box::new(SimIndicator {
            handle: handle.clone(),
        }),
        display,
    };
    (peripherals, handle)
}
