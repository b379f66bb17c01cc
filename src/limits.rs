//! Search resource limits and the cooperative time/node check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::score::{CHECK_RATE, MAX_PLY};

/// Resource ceilings for one `go` command. `0` means unlimited for `time_ms`/`nodes`.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub time_ms: u64,
    pub depth: u32,
    pub nodes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { time_ms: 0, depth: MAX_PLY as u32, nodes: 0 }
    }
}

/// Cooperative stop/time/node check, throttled so the clock is read only every
/// `CHECK_RATE` non-`iter` calls.
pub struct TimeCheck {
    stop: Arc<AtomicBool>,
    start: Instant,
    checks: u64,
}

impl TimeCheck {
    pub fn new(stop: Arc<AtomicBool>) -> Self {
        TimeCheck { stop, start: Instant::now(), checks: CHECK_RATE }
    }

    pub fn restart(&mut self) {
        self.start = Instant::now();
        self.checks = CHECK_RATE;
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Returns true when the search must stop. `iter` forces a real clock/stop read
    /// (used once per completed depth by the iterative deepening driver); otherwise
    /// the check is throttled to once every `CHECK_RATE` calls.
    pub fn check_time(&mut self, iter: bool, nodes: u64, limits: &Limits) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        if limits.nodes != 0 && nodes >= limits.nodes {
            return true;
        }
        if !iter {
            if self.checks > 0 {
                self.checks -= 1;
                return false;
            }
            self.checks = CHECK_RATE;
        }
        if limits.time_ms == 0 {
            return false;
        }
        self.elapsed_ms() > limits.time_ms
    }
}
