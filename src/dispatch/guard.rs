//! Submission guard — single-flight admission and duplicate suppression.
//!
//! Two layers:
//! - a binary in-flight lock: while one submission runs, any other is
//!   rejected outright. Release rides an RAII permit so every exit path —
//!   success, failure, panic unwind — frees the lock.
//! - a duplicate throttle: identical raw input re-submitted within the
//!   window of the previously accepted identical input is silently dropped.
//!   Comparison is exact string equality plus timestamp.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default duplicate-suppression window.
pub const DEFAULT_DUPLICATE_WINDOW: Duration = Duration::from_secs(1);

/// Outcome of an admission attempt.
#[derive(Debug)]
pub enum Admission<'a> {
    /// Admitted; drop the permit to release the in-flight lock.
    Admitted(InFlightPermit<'a>),
    /// A submission is already in flight.
    Busy,
    /// Identical input within the duplicate window — drop silently.
    Duplicate,
}

/// RAII release of the in-flight lock.
#[derive(Debug)]
pub struct InFlightPermit<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightPermit<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Serializes submissions and suppresses accidental double-submits.
pub struct SubmissionGuard {
    in_flight: AtomicBool,
    /// The previously accepted input and when it was accepted.
    last_accepted: Mutex<Option<(String, Instant)>>,
    window: Duration,
}

impl SubmissionGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            last_accepted: Mutex::new(None),
            window,
        }
    }

    /// Attempt admission at the current instant.
    pub fn try_admit(&self, input: &str) -> Admission<'_> {
        self.try_admit_at(input, Instant::now())
    }

    /// Clock-injected admission, used by tests to pin timestamps.
    ///
    /// The duplicate check runs first: a double-submit of the running
    /// command is an accident to swallow, not a busy rejection to surface.
    pub fn try_admit_at(&self, input: &str, now: Instant) -> Admission<'_> {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((previous, accepted_at)) = last.as_ref() {
            if previous == input && now.duration_since(*accepted_at) < self.window {
                tracing::debug!(input, "duplicate submission suppressed");
                return Admission::Duplicate;
            }
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            return Admission::Busy;
        }

        *last = Some((input.to_string(), now));
        Admission::Admitted(InFlightPermit {
            flag: &self.in_flight,
        })
    }
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DUPLICATE_WINDOW)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_then_busy_until_permit_dropped() {
        let guard = SubmissionGuard::default();

        let permit = match guard.try_admit("list my repos") {
            Admission::Admitted(p) => p,
            other => panic!("expected admission, got {other:?}"),
        };

        // Different input while in flight → busy, not duplicate.
        assert!(matches!(guard.try_admit("check my mail"), Admission::Busy));

        drop(permit);
        assert!(matches!(
            guard.try_admit("check my mail"),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_identical_input_within_window_is_duplicate() {
        let guard = SubmissionGuard::default();
        let t0 = Instant::now();

        let permit = match guard.try_admit_at("list my repos", t0) {
            Admission::Admitted(p) => p,
            other => panic!("expected admission, got {other:?}"),
        };
        drop(permit);

        // Same input 300ms later — swallowed.
        let t1 = t0 + Duration::from_millis(300);
        assert!(matches!(
            guard.try_admit_at("list my repos", t1),
            Admission::Duplicate
        ));
    }

    #[test]
    fn test_identical_input_after_window_is_admitted() {
        let guard = SubmissionGuard::default();
        let t0 = Instant::now();

        match guard.try_admit_at("list my repos", t0) {
            Admission::Admitted(permit) => drop(permit),
            other => panic!("expected admission, got {other:?}"),
        }

        let t1 = t0 + Duration::from_millis(1500);
        assert!(matches!(
            guard.try_admit_at("list my repos", t1),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_duplicate_beats_busy_for_identical_input() {
        let guard = SubmissionGuard::default();
        let t0 = Instant::now();

        let _permit = match guard.try_admit_at("list my repos", t0) {
            Admission::Admitted(p) => p,
            other => panic!("expected admission, got {other:?}"),
        };

        // Identical input while still in flight and inside the window:
        // a double-submit, silently dropped rather than rejected as busy.
        let t1 = t0 + Duration::from_millis(100);
        assert!(matches!(
            guard.try_admit_at("list my repos", t1),
            Admission::Duplicate
        ));
    }

    #[test]
    fn test_different_input_is_not_a_duplicate() {
        let guard = SubmissionGuard::default();
        let t0 = Instant::now();

        match guard.try_admit_at("list my repos", t0) {
            Admission::Admitted(permit) => drop(permit),
            other => panic!("expected admission, got {other:?}"),
        }

        // Different string 100ms later — exact equality only.
        assert!(matches!(
            guard.try_admit_at("list my  repos", t0 + Duration::from_millis(100)),
            Admission::Admitted(_)
        ));
    }

    #[test]
    fn test_busy_rejection_does_not_update_duplicate_tracker() {
        let guard = SubmissionGuard::default();
        let t0 = Instant::now();

        let permit = match guard.try_admit_at("first", t0) {
            Admission::Admitted(p) => p,
            other => panic!("expected admission, got {other:?}"),
        };

        // Rejected while busy — must not be recorded as "accepted".
        assert!(matches!(
            guard.try_admit_at("second", t0 + Duration::from_millis(10)),
            Admission::Busy
        ));
        drop(permit);

        // "second" was never accepted, so it is admitted, not deduplicated.
        assert!(matches!(
            guard.try_admit_at("second", t0 + Duration::from_millis(20)),
            Admission::Admitted(_)
        ));
    }
}
