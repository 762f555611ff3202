// src/hardware/serial.rs - Line-oriented serial link to the MCU bridge
use std::sync::Arc;
use std::time::Duration;

use serial2_tokio::SerialPort;
use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;

use super::HardwareError;

const REPLY_TIMEOUT_MS: u64 = 1_000;

/// One serial connection to the bridge MCU. A background task splits
/// the incoming byte stream into lines; `request` pairs one outgoing
/// command line with the next reply line. The control loop is the only
/// caller and commands strictly in sequence, so no command IDs are
/// needed on the wire.
pub struct SerialLink {
    port: Arc<SerialPort>,
    reply_rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl SerialLink {
    pub fn open(port_name: &str, baud: u32) -> Result<Self, HardwareError> {
        tracing::info!("Opening MCU bridge on {} at {} baud", port_name, baud);
        let port = Arc::new(SerialPort::open(port_name, baud)?);
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        let read_port = port.clone();
        tokio::spawn(async move {
            let mut pending: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 256];
            loop {
                match read_port.read(&mut chunk).await {
                    Ok(0) => {
                        tracing::info!("Serial link closed by remote");
                        break;
                    }
                    Ok(n) => {
                        pending.extend_from_slice(&chunk[..n]);
                        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                            let raw: Vec<u8> = pending.drain(..=pos).collect();
                            let line = String::from_utf8_lossy(&raw).trim().to_string();
                            if line.is_empty() {
                                continue;
                            }
                            tracing::debug!("MCU -> {}", line);
                            if reply_tx.send(line).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Serial read error: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            port,
            reply_rx: Mutex::new(reply_rx),
        })
    }

    /// Send one command line and wait for the single reply line.
    pub async fn request(&self, command: &str) -> Result<String, HardwareError> {
        tracing::debug!("MCU <- {}", command);
        let framed = format!("{}\n", command);
        self.port.write_all(framed.as_bytes()).await?;

        let mut rx = self.reply_rx.lock().await;
        match timeout(Duration::from_millis(REPLY_TIMEOUT_MS), rx.recv()).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(HardwareError::LinkClosed),
            Err(_) => Err(HardwareError::Timeout(REPLY_TIMEOUT_MS)),
        }
    }

    /// Send a command and require an `ok`-prefixed reply.
    pub async fn command(&self, command: &str) -> Result<(), HardwareError> {
        let reply = self.request(command).await?;
        if reply.starts_with("ok") {
            Ok(())
        } else {
            Err(HardwareError::Rejected {
                command: command.to_string(),
                reply,
            })
        }
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink").finish()
    }
}
