//! Cancellable per-room timers for Sketchroom.
//!
//! A room only ever waits on one thing at a time: the start delay, the
//! word-choice grace period, the next countdown second, the pause before
//! a reveal, or the pause before the next round. [`TimerSlot`] holds at
//! most one armed deadline, identified by a [`TimerToken`]. Arming a new
//! token replaces whatever was armed, so a superseded timer can never fire.
//!
//! # Idle mode
//!
//! When nothing is armed, [`TimerSlot::wait`] pends forever. That is the
//! right behavior inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = commands.recv() => { /* handle command */ }
//!         token = timer.wait() => {
//!             let effects = machine.on_timer(token, Instant::now());
//!             /* apply effects */
//!         }
//!     }
//! }
//! ```
//!
//! `wait` is cancel-safe: if the `select!` picks another branch, the armed
//! deadline stays in place for the next iteration.

use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Ownership token for one scheduled delay.
///
/// Whoever holds the current token owns the timer; a token that is no
/// longer armed is stale and must be ignored when it shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Returns the underlying sequence number.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// Hands out strictly increasing tokens. One source per room.
#[derive(Debug, Default)]
pub struct TokenSource {
    issued: u64,
}

impl TokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token that has never been issued by this source before.
    pub fn next_token(&mut self) -> TimerToken {
        self.issued += 1;
        TimerToken(self.issued)
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters kept by a [`TimerSlot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerMetrics {
    /// Times a token was armed.
    pub armed: u64,
    /// Times an armed token reached its deadline.
    pub fired: u64,
    /// Times an armed token was cancelled explicitly.
    pub cancelled: u64,
    /// Times arming displaced a different, still-armed token.
    pub replaced: u64,
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Armed {
    token: TimerToken,
    deadline: Instant,
}

/// Holds at most one armed deadline.
#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<Armed>,
    metrics: TimerMetrics,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `token` to fire `after` from now, replacing any armed token.
    pub fn arm(&mut self, token: TimerToken, after: Duration) {
        let deadline = Instant::now() + after;
        if let Some(prev) = self.armed.replace(Armed { token, deadline }) {
            if prev.token != token {
                self.metrics.replaced += 1;
                debug!(
                    replaced = %prev.token,
                    %token,
                    "armed timer replaced before firing"
                );
            }
        }
        self.metrics.armed += 1;
        trace!(%token, after_ms = after.as_millis() as u64, "timer armed");
    }

    /// Disarms `token` if it is the one currently armed.
    ///
    /// Idempotent: cancelling a token that already fired, was already
    /// cancelled, or was replaced does nothing and returns `false`.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.armed {
            Some(armed) if armed.token == token => {
                self.armed = None;
                self.metrics.cancelled += 1;
                trace!(%token, "timer cancelled");
                true
            }
            _ => false,
        }
    }

    /// Waits for the armed deadline and returns its token, leaving the
    /// slot idle. Pends forever while nothing is armed.
    pub async fn wait(&mut self) -> TimerToken {
        let Some(Armed { token, deadline }) = self.armed else {
            return std::future::pending::<TimerToken>().await;
        };

        time::sleep_until(deadline).await;

        self.armed = None;
        self.metrics.fired += 1;
        trace!(%token, "timer fired");
        token
    }

    /// The currently armed token, if any.
    pub fn armed(&self) -> Option<TimerToken> {
        self.armed.map(|a| a.token)
    }

    /// `true` when nothing is armed.
    pub fn is_idle(&self) -> bool {
        self.armed.is_none()
    }

    pub fn metrics(&self) -> &TimerMetrics {
        &self.metrics
    }
}
