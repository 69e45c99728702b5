//! Process-wide Ctrl-C fan-out.
//!
//! One listener, installed by `main`, turns every SIGINT into a tick on a
//! `watch` channel. The menu holds a subscription for its whole lifetime:
//! a tick stops the running capture mode, or ends the menu when it arrives
//! at a prompt. A tick nobody has observed yet stays pending until the
//! next wait.

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Interrupts {
    tx: Arc<watch::Sender<u64>>,
}

impl Interrupts {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Deliver one interrupt to every subscriber.
    pub fn raise(&self) {
        self.tx.send_modify(|count| *count += 1);
    }

    /// Subscribe to interrupts raised from now on.
    pub fn subscribe(&self) -> Interrupted {
        Interrupted(self.tx.subscribe())
    }

    /// Forward the process's Ctrl-C signals until the runtime shuts down.
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let interrupts = self.clone();
        tokio::spawn(async move {
            loop {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Ctrl-C received");
                        interrupts.raise();
                    }
                    Err(e) => {
                        warn!("Cannot listen for Ctrl-C: {}", e);
                        break;
                    }
                }
            }
        })
    }
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of [`Interrupts`].
#[derive(Debug)]
pub struct Interrupted(watch::Receiver<u64>);

impl Interrupted {
    /// Wait for the next interrupt. Cancel safe.
    pub async fn recv(&mut self) {
        if self.0.changed().await.is_err() {
            // Senders live as long as any `Interrupts` clone; without one no
            // interrupt can ever come.
            std::future::pending::<()>().await;
        }
    }
}
