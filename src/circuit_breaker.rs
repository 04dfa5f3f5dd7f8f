//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for OCR provider calls.
//! After repeated failures the EnhancedOCR recovery strategy is skipped
//! until a reset timeout elapses.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::observability::metrics::update_circuit_breaker_state;

/// Circuit breaker for OCR provider calls
///
/// ## State Machine
///
/// ```text
/// CLOSED ────failures ≥ threshold────► OPEN
///    ▲                                      │
///    │                                      │
///    └─────────reset timeout───────────────┘
/// ```
///
/// - **CLOSED → OPEN**: consecutive failure count reaches `failure_threshold`
/// - **OPEN → CLOSED**: `reset_timeout` has elapsed since the last failure;
///   the counter is cleared and the next call tests the provider again
/// - Any success clears the counter
///
/// Both fields live behind one `parking_lot::Mutex`, so a check never sees
/// a count from one failure and a timestamp from another.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    ///
    /// # Arguments
    ///
    /// * `failure_threshold` - Consecutive failures before the circuit opens
    /// * `reset_timeout` - How long the circuit stays open after the last failure
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            failure_threshold,
            reset_timeout,
        }
    }

    /// Check if the circuit is open (calls should be skipped)
    ///
    /// Resets the breaker to closed once the reset timeout has elapsed.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock();

        if state.failure_count >= self.failure_threshold {
            if let Some(last_time) = state.last_failure_time {
                if last_time.elapsed() < self.reset_timeout {
                    return true;
                }
                *state = BreakerState::default();
                update_circuit_breaker_state(false);
            }
        }
        false
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_time = Some(Instant::now());

        if state.failure_count == self.failure_threshold {
            tracing::warn!(
                target: "recovery",
                failures = state.failure_count,
                reset_secs = self.reset_timeout.as_secs(),
                "OCR circuit breaker opened"
            );
            update_circuit_breaker_state(true);
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.failure_count >= self.failure_threshold {
            update_circuit_breaker_state(false);
        }
        *state = BreakerState::default();
    }

    /// Current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }
}
