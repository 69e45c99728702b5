use std::io::{self, BufRead};

use log::debug;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Lines of a blocking reader, delivered asynchronously.
///
/// A dedicated thread reads `reader` line by line and sends each line
/// through a channel, the same way [`crate::AsyncCapture`] does for packets.
/// Waiting for input therefore never blocks a runtime worker, and a pending
/// read does not hold up runtime shutdown.
pub struct LineInput {
    rx: UnboundedReceiver<io::Result<String>>,
}

impl LineInput {
    pub fn spawn<R: BufRead + Send + 'static>(mut reader: R) -> Self {
        let (tx, rx) = unbounded_channel();

        std::thread::spawn(move || {
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
            debug!("Input reader thread finished");
        });

        Self { rx }
    }

    /// Next line including its terminator, `None` at end of input.
    ///
    /// Cancel safe.
    pub async fn next_line(&mut self) -> Option<io::Result<String>> {
        self.rx.recv().await
    }
}
