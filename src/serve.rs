// src/serve.rs

//! Dependent service startup and update forwarding.
//!
//! The host owns the service process; this module owns the
//! subscription. [`start_service`] asks the host for the update
//! stream and forwards every update into the engine's event channel,
//! translating the stream's end into a `ServiceStreamClosed` event.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::TaskEvent;
use crate::errors::Result;
use crate::host::{Host, ServiceUpdate};

/// Handle for a running service subscription.
///
/// Releasing it stops the forwarder and drops the update receiver,
/// which is the host's signal to take the service down.
pub struct ServiceHandle {
    forwarder: JoinHandle<()>,
}

impl ServiceHandle {
    pub fn release(self) {
        self.forwarder.abort();
    }
}

/// Start `target` through the host and forward its updates into the
/// engine's event channel.
///
/// Exactly one `ServiceStreamClosed` is emitted, when the host's
/// update channel closes. Updates are forwarded in arrival order and
/// never coalesced.
pub fn start_service<H: Host>(
    host: &H,
    target: &str,
    watch: bool,
    event_tx: mpsc::Sender<TaskEvent>,
) -> Result<ServiceHandle> {
    let mut updates = host.start_target(target, watch)?;

    let forwarder = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            let event = match update {
                ServiceUpdate::Build { success } => TaskEvent::ServiceBuildCompleted { success },
                ServiceUpdate::Error { message } => TaskEvent::ServiceStreamFailed { message },
            };
            if event_tx.send(event).await.is_err() {
                return;
            }
        }

        debug!("service update stream ended");
        let _ = event_tx.send(TaskEvent::ServiceStreamClosed).await;
    });

    Ok(ServiceHandle { forwarder })
}
