// src/console.rs - Operator console on stdin
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

use crate::controller::StatusSnapshot;

/// A request sent from the console task to the controller task. All
/// validation happens on the controller side, which is the single
/// owner of the configuration.
#[derive(Debug)]
pub enum ControllerRequest {
    /// Update the humidity setpoint. The value is raw operator input.
    SetTargetHumidity {
        value: String,
        respond_to: oneshot::Sender<Result<f64, String>>,
    },
    /// Read-only snapshot of the running controller.
    GetStatus {
        respond_to: oneshot::Sender<StatusSnapshot>,
    },
}

/// Read operator commands from stdin and forward them to the
/// controller. Runs until stdin closes or the controller goes away.
pub async fn run(tx: mpsc::Sender<ControllerRequest>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("target"), Some(value)) => {
                let (respond_to, response) = oneshot::channel();
                let request = ControllerRequest::SetTargetHumidity {
                    value: value.to_string(),
                    respond_to,
                };
                if tx.send(request).await.is_err() {
                    break;
                }
                match response.await {
                    Ok(Ok(accepted)) => {
                        tracing::info!("Target humidity updated to {:.1} %", accepted);
                    }
                    // The controller already logged the rejection.
                    Ok(Err(_)) => {}
                    Err(_) => break,
                }
            }
            (Some("status"), None) => {
                let (respond_to, response) = oneshot::channel();
                if tx
                    .send(ControllerRequest::GetStatus { respond_to })
                    .await
                    .is_err()
                {
                    break;
                }
                if let Ok(status) = response.await {
                    tracing::info!("{}", status);
                }
            }
            _ => {
                tracing::warn!(
                    "Unknown command '{}'. Usage: 'target <percent>' or 'status'",
                    line
                );
            }
        }
    }
    tracing::debug!("Console input closed");
}
