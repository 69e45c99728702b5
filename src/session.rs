//! Deadline-bounded statistics sessions.
//!
//! A session consumes one capture source on a spawned task and folds
//! every record into an [`AggregateStats`]. The caller races that task
//! against a timer. When the timer wins, the task is told to stop, hands
//! back what it has counted so far and drops the capture, which in turn
//! makes the reader thread release the handle.

use std::time::{Duration, Instant};

use log::{debug, info};
use tokio::sync::oneshot;

use crate::async_capture::AsyncCapture;
use crate::capture::CaptureSource;
use crate::error::{Error, Result};
use crate::stats::AggregateStats;

/// Default deadline for a statistics session
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Interface chosen, nothing consumed yet
    Idle,
    /// Capture handle open and being consumed
    Capturing,
    /// The source ran out before the deadline
    Completed,
    /// The deadline fired while still capturing
    TimedOut,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    StreamExhausted,
    DeadlineExceeded,
}

/// What a finished session hands back.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub interface: String,
    /// Complete totals, or the partial snapshot taken at the deadline.
    pub stats: AggregateStats,
    pub reason: TerminationReason,
    pub elapsed: Duration,
}

/// One capture run bound to an interface and a deadline.
#[derive(Debug)]
pub struct Session {
    interface: String,
    deadline: Duration,
    state: SessionState,
}

impl Session {
    pub fn new(interface: impl Into<String>, deadline: Duration) -> Self {
        Self {
            interface: interface.into(),
            deadline,
            state: SessionState::Idle,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Consume an opened `source` until it closes or the deadline fires.
    ///
    /// Dropping the returned future before it resolves cancels the
    /// consumption task as well, which then releases the source.
    pub async fn run<S: CaptureSource>(&mut self, source: S) -> Result<SessionReport> {
        if self.state != SessionState::Idle {
            return Err(Error::SessionFinished(self.interface.clone()));
        }

        self.transition(SessionState::Capturing);
        let started = Instant::now();

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let mut worker = tokio::spawn(consume(AsyncCapture::new(source), cancel_rx));
        let timer = tokio::time::sleep(self.deadline);

        let finished = tokio::select! {
            // The timer is polled first so an expired deadline always wins.
            biased;
            _ = timer => None,
            joined = &mut worker => Some(joined),
        };

        let (joined, reason) = match finished {
            Some(joined) => (joined, TerminationReason::StreamExhausted),
            None => {
                debug!("Deadline of {:?} reached on {}", self.deadline, self.interface);
                let _ = cancel_tx.send(());
                (worker.await, TerminationReason::DeadlineExceeded)
            }
        };

        let outcome = joined
            .map_err(|e| Error::Worker(e.to_string()))
            .and_then(|consumed| consumed);

        self.transition(match reason {
            TerminationReason::StreamExhausted => SessionState::Completed,
            TerminationReason::DeadlineExceeded => SessionState::TimedOut,
        });
        let stats = outcome?;

        let elapsed = started.elapsed();
        info!(
            "Session on {} ended ({:?}) after {:?}: {} packets, {} bytes",
            self.interface, reason, elapsed, stats.total_packets, stats.total_bytes
        );

        Ok(SessionReport {
            interface: self.interface.clone(),
            stats,
            reason,
            elapsed,
        })
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session on {}: {:?} -> {:?}", self.interface, self.state, next);
        self.state = next;
    }
}

/// Run a one-shot session on `interface`.
pub async fn run_session<S: CaptureSource>(
    interface: &str,
    source: S,
    deadline: Duration,
) -> Result<SessionReport> {
    Session::new(interface, deadline).run(source).await
}

/// Single writer of the session's aggregate.
async fn consume(
    capture: AsyncCapture,
    mut cancel: oneshot::Receiver<()>,
) -> Result<AggregateStats> {
    let mut stats = AggregateStats::new();

    loop {
        tokio::select! {
            biased;
            // A dropped sender counts as a cancel too.
            _ = &mut cancel => break,
            next = capture.next_packet() => match next {
                Some(Ok(record)) => stats.update(&record),
                Some(Err(e)) => return Err(e),
                None => break,
            },
        }
    }

    capture.stop();
    Ok(stats)
}
