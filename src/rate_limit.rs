//! # Rate Limiter
//! Dual sliding window (per-minute + per-day) guarding the generation backend.
//!
//! Admission is two-phase: [`RateLimiter::admit`] checks capacity and hands out
//! a [`Permit`]; the slot is only written into the windows once the guarded call
//! succeeded and the permit is recorded. A permit dropped without recording
//! (backend error, timeout, abandoned request) gives its slot back untouched.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock source; swapped for a fixed clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Capacity per window. Defaults match the Gemini free tier (15 RPM, 1500 RPD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    #[serde(default = "default_per_minute")]
    pub per_minute: usize,
    #[serde(default = "default_per_day")]
    pub per_day: usize,
}

fn default_per_minute() -> usize {
    15
}
fn default_per_day() -> usize {
    1500
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            per_day: default_per_day(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeniedReason {
    PerMinuteExceeded { limit: usize },
    PerDayExceeded { limit: usize },
}

impl DeniedReason {
    pub fn message(&self) -> String {
        match self {
            Self::PerMinuteExceeded { limit } => format!(
                "Rate limit exceeded: {limit} requests per minute. Please wait a moment."
            ),
            Self::PerDayExceeded { limit } => format!(
                "Daily limit exceeded: {limit} requests per day. Please try again tomorrow."
            ),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::PerMinuteExceeded { .. } => "per_minute",
            Self::PerDayExceeded { .. } => "per_day",
        }
    }
}

/// Timestamps of admitted requests inside one horizon, oldest first.
///
/// Bounded ring: never holds more than `capacity` entries.
#[derive(Debug)]
struct RateWindow {
    horizon: Duration,
    capacity: usize,
    buf: VecDeque<DateTime<Utc>>,
}

impl RateWindow {
    fn new(horizon: Duration, capacity: usize) -> Self {
        Self {
            horizon,
            capacity,
            buf: VecDeque::with_capacity(capacity),
        }
    }

    /// Drop leading entries older than `now - horizon`.
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.horizon;
        while let Some(&t) = self.buf.front() {
            if t < cutoff {
                self.buf.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self, in_flight: usize) -> bool {
        self.buf.len() + in_flight >= self.capacity
    }

    fn push(&mut self, now: DateTime<Utc>) {
        if self.capacity == 0 {
            return;
        }
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        // Keep non-decreasing order even if the clock steps backwards.
        let ts = match self.buf.back() {
            Some(&last) if last > now => last,
            _ => now,
        };
        self.buf.push_back(ts);
    }
}

#[derive(Debug)]
struct Windows {
    per_minute: RateWindow,
    per_day: RateWindow,
    /// Permits handed out but neither recorded nor dropped yet.
    in_flight: usize,
}

/// Point-in-time view of limiter usage (diagnostics / health).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateUsage {
    pub minute_used: usize,
    pub minute_limit: usize,
    pub day_used: usize,
    pub day_limit: usize,
    pub in_flight: usize,
}

#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    inner: Mutex<Windows>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            inner: Mutex::new(Windows {
                per_minute: RateWindow::new(Duration::seconds(60), limits.per_minute),
                per_day: RateWindow::new(Duration::hours(24), limits.per_day),
                in_flight: 0,
            }),
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        // The windows stay consistent even if a holder panicked mid-update.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Prune both windows, then check capacity (minute first, then day).
    ///
    /// Admission reserves an in-flight slot until the returned permit is
    /// recorded or dropped, so the check-then-act sequence is atomic across callers.
    pub fn admit(&self, now: DateTime<Utc>) -> Result<Permit<'_>, DeniedReason> {
        let mut w = self.lock();
        w.per_minute.prune(now);
        w.per_day.prune(now);

        let in_flight = w.in_flight;
        if w.per_minute.is_full(in_flight) {
            return Err(DeniedReason::PerMinuteExceeded {
                limit: self.limits.per_minute,
            });
        }
        if w.per_day.is_full(in_flight) {
            return Err(DeniedReason::PerDayExceeded {
                limit: self.limits.per_day,
            });
        }

        w.in_flight += 1;
        Ok(Permit {
            limiter: self,
            settled: false,
        })
    }

    /// Append `now` to both windows. Call once per successful guarded operation.
    pub fn record(&self, now: DateTime<Utc>) {
        let mut w = self.lock();
        w.per_minute.push(now);
        w.per_day.push(now);
    }

    pub fn usage(&self, now: DateTime<Utc>) -> RateUsage {
        let mut w = self.lock();
        w.per_minute.prune(now);
        w.per_day.prune(now);
        RateUsage {
            minute_used: w.per_minute.buf.len(),
            minute_limit: self.limits.per_minute,
            day_used: w.per_day.buf.len(),
            day_limit: self.limits.per_day,
            in_flight: w.in_flight,
        }
    }

    fn settle(&self, record_at: Option<DateTime<Utc>>) {
        let mut w = self.lock();
        w.in_flight = w.in_flight.saturating_sub(1);
        if let Some(now) = record_at {
            w.per_minute.push(now);
            w.per_day.push(now);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}

/// An admitted, not-yet-recorded request.
#[must_use = "dropping a permit releases the slot without recording it"]
#[derive(Debug)]
pub struct Permit<'a> {
    limiter: &'a RateLimiter,
    settled: bool,
}

impl Permit<'_> {
    /// Commit the slot after the guarded operation succeeded.
    pub fn record(mut self, now: DateTime<Utc>) {
        self.settled = true;
        self.limiter.settle(Some(now));
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.limiter.settle(None);
        }
    }
}
