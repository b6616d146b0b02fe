//! Rate limiter
//!
//! A periodic token source: one admission per interval, shared by every
//! caller holding the limiter. Callers block in [`RateLimiter::admit`]
//! until a token is available. The first token arrives one interval after
//! construction.
//!
//! [`RateLimiter::stop`] wakes every blocked caller with
//! `ItemDbError::Shutdown`; later calls fail the same way immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::error::{ItemDbError, Result};

/// Interval-based admission control
pub struct RateLimiter {
    interval: Duration,
    /// Ticks at most once per interval; a tick is consumed by exactly one caller
    ticker: Receiver<Instant>,
    /// Dropping the sender disconnects `stop_rx` and releases all waiters
    stop_tx: Mutex<Option<Sender<()>>>,
    stop_rx: Receiver<()>,
    admitted: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter that admits one caller per `interval`
    pub fn new(interval: Duration) -> Self {
        let (stop_tx, stop_rx) = channel::bounded(0);

        Self {
            interval,
            ticker: channel::tick(interval),
            stop_tx: Mutex::new(Some(stop_tx)),
            stop_rx,
            admitted: AtomicU64::new(0),
        }
    }

    /// Block until a token is available
    ///
    /// Returns `ItemDbError::Shutdown` if the limiter is (or gets) stopped.
    pub fn admit(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(ItemDbError::Shutdown);
        }

        select! {
            recv(self.ticker) -> tick => {
                if tick.is_err() || self.is_stopped() {
                    return Err(ItemDbError::Shutdown);
                }
            }
            recv(self.stop_rx) -> _ => return Err(ItemDbError::Shutdown),
        }

        self.admitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Stop issuing tokens and release every blocked caller
    ///
    /// Safe to call more than once and from any thread.
    pub fn stop(&self) {
        if self.stop_tx.lock().take().is_some() {
            tracing::debug!("rate limiter stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_tx.lock().is_none()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of admissions granted so far
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }
}
