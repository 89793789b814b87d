//! # Replay Protection
//!
//! Strictly advancing `(timestamp, sequence)` frontier with a freshness window.
//!
//! Unlike a sliding bitmap, the frontier accepts nothing behind the last
//! accepted pair. A sender whose 32-bit counter wraps within a single second
//! loses the frames after the wrap until the timestamp advances.

/// Absolute difference of two unix timestamps
#[inline]
pub fn time_delta(x: u64, y: u64) -> u64 {
    x.abs_diff(y)
}

/// Current wall clock in unix seconds
pub fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Highest accepted `(timestamp, sequence)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayFrontier {
    last_timestamp: u64,
    last_sequence: u32,
    valid_secs: u64,
}

impl ReplayFrontier {
    /// Create a frontier at `(0, 0)` with the given freshness window
    pub fn new(valid_secs: u64) -> Self {
        ReplayFrontier {
            last_timestamp: 0,
            last_sequence: 0,
            valid_secs,
        }
    }

    /// Check a header against the window and the frontier without updating
    #[inline]
    pub fn is_fresh(&self, timestamp: u64, sequence: u32, now: u64) -> bool {
        if time_delta(now, timestamp) >= self.valid_secs {
            return false;
        }
        (timestamp, sequence) > (self.last_timestamp, self.last_sequence)
    }

    /// Advance the frontier to an accepted pair
    #[inline]
    pub fn advance(&mut self, timestamp: u64, sequence: u32) {
        self.last_timestamp = timestamp;
        self.last_sequence = sequence;
    }

    #[inline]
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    #[inline]
    pub fn last_sequence(&self) -> u32 {
        self.last_sequence
    }
}
