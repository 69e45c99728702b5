use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use crate::capture::{CaptureSource, Pull};
use crate::error::Result;
use crate::packet::PacketRecord;

/// An asynchronous front for a blocking [`CaptureSource`].
///
/// A dedicated thread pulls records from the source and sends them
/// through a channel that can be awaited. The thread owns the source and
/// drops it, releasing the capture handle, as soon as any of these
/// happens:
///
/// * the source reports it is closed or fails,
/// * [`AsyncCapture::stop`] is called or the `AsyncCapture` is dropped,
/// * the receiving side is gone.
///
/// A stop request is noticed after the read in progress returns, so the
/// source's read timeout bounds how long the handle outlives the request.
pub struct AsyncCapture {
    rx: Mutex<UnboundedReceiver<Result<PacketRecord>>>,
    stop: Arc<AtomicBool>,
}

impl AsyncCapture {
    /// Starts reading `source` on its own thread.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pktstat::{AsyncCapture, CaptureConfig, LiveSource};
    ///
    /// # async fn run() -> pktstat::Result<()> {
    /// let source = LiveSource::open("eth0", &CaptureConfig::default())?;
    /// let capture = AsyncCapture::new(source);
    /// while let Some(record) = capture.next_packet().await {
    ///     println!("Got packet with {} bytes", record?.data.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<S: CaptureSource>(mut source: S) -> Self {
        let (tx, rx) = unbounded_channel::<Result<PacketRecord>>();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        std::thread::spawn(move || {
            while !stop_flag.load(Ordering::Acquire) {
                match source.pull() {
                    Ok(Pull::Packet(record)) => {
                        if tx.send(Ok(record)).is_err() {
                            break;
                        }
                    }
                    Ok(Pull::Idle) => {
                        if tx.is_closed() {
                            break;
                        }
                    }
                    Ok(Pull::Closed) => break,
                    Err(e) => {
                        warn!("Capture source failed: {}", e);
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
            drop(source);
            debug!("Capture reader thread finished");
        });

        Self {
            rx: Mutex::new(rx),
            stop,
        }
    }

    /// Asynchronously retrieves the next captured packet.
    ///
    /// Returns `None` once the reader thread has exited and every record it
    /// sent has been received. A source failure is delivered once as
    /// `Some(Err(_))` before the `None`.
    ///
    /// Cancel safe: dropping the returned future loses no packet.
    pub async fn next_packet(&self) -> Option<Result<PacketRecord>> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Asks the reader thread to stop and release the source.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

impl Drop for AsyncCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
