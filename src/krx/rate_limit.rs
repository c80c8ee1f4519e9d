// =============================================================================
// Rate-Limit Tracker — keeps the vendor's per-second call budget honest
// =============================================================================
//
// The market-data vendor allows at most 20 REST calls per rolling second and
// echoes the current usage back in the `X-KRX-CALLS-PER-SEC` response header.
// The tracker mirrors that header into an atomic counter any task may query
// lock-free, and counts calls locally between responses so the pre-flight
// check stays accurate even before the first header arrives.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, warn};

/// Hard ceiling at which we refuse to send additional requests.
const CALLS_HARD_LIMIT: u32 = 20;
/// Soft warning threshold.
const CALLS_WARN_THRESHOLD: u32 = 15;

/// Thread-safe rate-limit tracker backed by atomic counters.
pub struct RateLimitTracker {
    calls_in_window: AtomicU32,
    total_calls: AtomicU64,
}

/// Immutable snapshot of the current rate-limit state (suitable for
/// end-of-run summary logging).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub calls_in_window: u32,
    pub total_calls: u64,
}

impl RateLimitTracker {
    /// Create a new tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            calls_in_window: AtomicU32::new(0),
            total_calls: AtomicU64::new(0),
        }
    }

    // -------------------------------------------------------------------------
    // Header-based updates
    // -------------------------------------------------------------------------

    /// Update the window counter from the HTTP response headers returned by
    /// the vendor.  The vendor's view wins over our local count.
    pub fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        if let Some(val) = headers.get("X-KRX-CALLS-PER-SEC") {
            if let Ok(s) = val.to_str() {
                if let Ok(c) = s.parse::<u32>() {
                    let prev = self.calls_in_window.swap(c, Ordering::Relaxed);
                    if c >= CALLS_WARN_THRESHOLD && prev < CALLS_WARN_THRESHOLD {
                        warn!(
                            calls = c,
                            hard_limit = CALLS_HARD_LIMIT,
                            "rate-limit usage crossed warning threshold"
                        );
                    }
                    debug!(calls_in_window = c, "rate-limit usage updated from header");
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Pre-flight checks
    // -------------------------------------------------------------------------

    /// Return `true` if we can afford `calls` more requests in the current
    /// window without exceeding the hard limit.
    pub fn can_send_request(&self, calls: u32) -> bool {
        let current = self.calls_in_window.load(Ordering::Relaxed);
        let allowed = current + calls <= CALLS_HARD_LIMIT;
        if !allowed {
            warn!(
                current_calls = current,
                requested = calls,
                hard_limit = CALLS_HARD_LIMIT,
                "request deferred — would exceed vendor rate-limit"
            );
        }
        allowed
    }

    /// Count a request we just sent (the vendor header will correct the
    /// window counter once the response lands).
    pub fn record_request(&self) {
        self.calls_in_window.fetch_add(1, Ordering::Relaxed);
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the per-second window counter (call after backing off long
    /// enough for the vendor window to roll over).
    pub fn reset_window(&self) {
        self.calls_in_window.store(0, Ordering::Relaxed);
    }

    // -------------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------------

    /// Produce a serialisable snapshot of the current counters.
    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            calls_in_window: self.calls_in_window.load(Ordering::Relaxed),
            total_calls: self.total_calls.load(Ordering::Relaxed),
        }
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("calls_in_window", &self.calls_in_window.load(Ordering::Relaxed))
            .field("total_calls", &self.total_calls.load(Ordering::Relaxed))
            .finish()
    }
}
