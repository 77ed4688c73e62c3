//! Render progress reporting.

use std::sync::Mutex;

/// Receives render progress as a fraction in `[0, 1]`.
///
/// Reports are delivered synchronously on the rendering thread.
pub trait ProgressSink {
    fn report(&self, fraction: f64);
}

impl<F: Fn(f64)> ProgressSink for F {
    fn report(&self, fraction: f64) {
        self(fraction)
    }
}

/// A sink that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f64) {}
}

/// Wraps a sink so it only ever sees clamped, non-decreasing fractions and
/// exactly one final `1.0`.
pub struct MonotonicProgress<'a> {
    inner: &'a dyn ProgressSink,
    state: Mutex<MonotonicState>,
}

#[derive(Debug, Default)]
struct MonotonicState {
    last: Option<f64>,
    finished: bool,
}

impl<'a> MonotonicProgress<'a> {
    pub fn new(inner: &'a dyn ProgressSink) -> Self {
        Self {
            inner,
            state: Mutex::new(MonotonicState::default()),
        }
    }

    /// Report completion. Only the first call is forwarded.
    pub fn finish(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.finished {
            return;
        }
        state.finished = true;
        state.last = Some(1.0);
        drop(state);
        self.inner.report(1.0);
    }

    /// Last fraction forwarded, if any.
    pub fn last(&self) -> Option<f64> {
        self.state.lock().ok().and_then(|s| s.last)
    }
}

impl ProgressSink for MonotonicProgress<'_> {
    fn report(&self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        // 1.0 is reserved for `finish`.
        let fraction = fraction.clamp(0.0, 1.0).min(0.999);
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.finished || state.last.is_some_and(|last| fraction <= last) {
            return;
        }
        state.last = Some(fraction);
        drop(state);
        self.inner.report(fraction);
    }
}

/// Maps one item's progress into its share of a batch.
pub(crate) struct BatchProgress<'a> {
    inner: &'a dyn ProgressSink,
    index: usize,
    total: usize,
}

impl<'a> BatchProgress<'a> {
    pub(crate) fn new(inner: &'a dyn ProgressSink, index: usize, total: usize) -> Self {
        Self {
            inner,
            index,
            total: total.max(1),
        }
    }
}

impl ProgressSink for BatchProgress<'_> {
    fn report(&self, fraction: f64) {
        self.inner
            .report((self.index as f64 + fraction.clamp(0.0, 1.0)) / self.total as f64);
    }
}
