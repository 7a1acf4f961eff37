//! Lifecycle event signaling.
//!
//! Observability widgets subscribe through the `EventSink` trait; the
//! dispatcher owns one sink and signals `started` / `finished` / `failed`
//! around every admitted submission. The pairing invariant — one `started`,
//! exactly one terminal signal — is enforced structurally by
//! `LifecycleSpan`, whose `Drop` emits `finished` on any path that didn't
//! already emit `failed`. Early returns cannot leak an in-flight count.

/// Observer for submission lifecycle signals.
pub trait EventSink: Send + Sync {
    /// A submission was admitted and is now in flight.
    fn started(&self, input: &str);

    /// The submission reached a successful terminal result.
    fn finished(&self, input: &str);

    /// The submission reached a terminal failure.
    fn failed(&self, input: &str, message: &str);
}

/// Sink that drops every signal.
pub struct NullSink;

impl EventSink for NullSink {
    fn started(&self, _input: &str) {}
    fn finished(&self, _input: &str) {}
    fn failed(&self, _input: &str, _message: &str) {}
}

/// Default sink — structured log lines per signal.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn started(&self, input: &str) {
        tracing::info!(input, "command started");
    }

    fn finished(&self, input: &str) {
        tracing::info!(input, "command finished");
    }

    fn failed(&self, input: &str, message: &str) {
        tracing::warn!(input, message, "command failed");
    }
}

// ─── LifecycleSpan ───────────────────────────────────────────────────────────

/// Scoped start/terminal pairing for one admitted submission.
///
/// Emits `started` on construction. Call [`fail`] for a terminal failure;
/// otherwise `Drop` emits `finished`. Exactly one terminal signal fires on
/// every path.
///
/// [`fail`]: LifecycleSpan::fail
pub struct LifecycleSpan<'a> {
    sink: &'a dyn EventSink,
    input: &'a str,
    terminal_fired: bool,
}

impl<'a> LifecycleSpan<'a> {
    /// Open the span, firing `started`.
    pub fn begin(sink: &'a dyn EventSink, input: &'a str) -> Self {
        sink.started(input);
        Self {
            sink,
            input,
            terminal_fired: false,
        }
    }

    /// Fire the terminal `failed` signal. Later calls and the implicit
    /// `finished` on drop are suppressed.
    pub fn fail(&mut self, message: &str) {
        if self.terminal_fired {
            return;
        }
        self.terminal_fired = true;
        self.sink.failed(self.input, message);
    }
}

impl Drop for LifecycleSpan<'_> {
    fn drop(&mut self) {
        if !self.terminal_fired {
            self.sink.finished(self.input);
        }
    }
}

// ─── Test Double ─────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::EventSink;

    /// One recorded lifecycle signal.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Signal {
        Started(String),
        Finished(String),
        Failed(String, String),
    }

    /// Sink that records every signal for assertions.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        log: Arc<Mutex<Vec<Signal>>>,
    }

    impl RecordingSink {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn signals(&self) -> Vec<Signal> {
            self.log.lock().unwrap().clone()
        }

        /// Count of (started, finished, failed) signals.
        pub(crate) fn counts(&self) -> (usize, usize, usize) {
            let signals = self.signals();
            (
                signals.iter().filter(|s| matches!(s, Signal::Started(_))).count(),
                signals.iter().filter(|s| matches!(s, Signal::Finished(_))).count(),
                signals
                    .iter()
                    .filter(|s| matches!(s, Signal::Failed(_, _)))
                    .count(),
            )
        }
    }

    impl EventSink for RecordingSink {
        fn started(&self, input: &str) {
            self.log.lock().unwrap().push(Signal::Started(input.into()));
        }

        fn finished(&self, input: &str) {
            self.log.lock().unwrap().push(Signal::Finished(input.into()));
        }

        fn failed(&self, input: &str, message: &str) {
            self.log
                .lock()
                .unwrap()
                .push(Signal::Failed(input.into(), message.into()));
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::testing::{RecordingSink, Signal};
    use super::*;

    #[test]
    fn test_span_pairs_start_with_finished_on_drop() {
        let sink = RecordingSink::new();
        {
            let _span = LifecycleSpan::begin(&sink, "list my repos");
        }
        assert_eq!(
            sink.signals(),
            vec![
                Signal::Started("list my repos".into()),
                Signal::Finished("list my repos".into()),
            ]
        );
    }

    #[test]
    fn test_span_failure_suppresses_finished() {
        let sink = RecordingSink::new();
        {
            let mut span = LifecycleSpan::begin(&sink, "/drive list");
            span.fail("network down");
        }
        assert_eq!(
            sink.signals(),
            vec![
                Signal::Started("/drive list".into()),
                Signal::Failed("/drive list".into(), "network down".into()),
            ]
        );
    }

    #[test]
    fn test_span_second_fail_is_suppressed() {
        let sink = RecordingSink::new();
        {
            let mut span = LifecycleSpan::begin(&sink, "x");
            span.fail("first");
            span.fail("second");
        }
        let (started, finished, failed) = sink.counts();
        assert_eq!((started, finished, failed), (1, 0, 1));
    }

    #[test]
    fn test_span_early_return_still_terminates() {
        let sink = RecordingSink::new();

        // Simulate an early-return branch that forgets to signal anything.
        fn early_return_path(sink: &dyn EventSink) -> Option<()> {
            let _span = LifecycleSpan::begin(sink, "check my mail");
            None?; // bails out mid-pipeline
            Some(())
        }

        let _ = early_return_path(&sink);
        let (started, finished, failed) = sink.counts();
        assert_eq!((started, finished, failed), (1, 1, 0));
    }
}
