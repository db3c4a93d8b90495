//! Cancellable timers, debouncing and location observers.
//!
//! All scheduled work is represented by handles that cancel on drop. Whoever
//! owns a handle owns the task: dropping it is the only way to stop a timer,
//! so timers cannot outlive the condition they belong to.

/// Timer facility of the host.
pub trait Scheduler {
    /// Cancels the scheduled task when dropped.
    type Handle;

    /// Run `task` once after `delay_ms`.
    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;

    /// Run `task` every `period_ms` until the handle is dropped.
    fn every(&self, period_ms: u32, task: Box<dyn FnMut()>) -> Self::Handle;
}

/// Trailing-edge debouncer: each trigger replaces the pending task, so only
/// the last trigger of a burst runs, `delay_ms` after the burst settles.
pub struct Debouncer<H> {
    delay_ms: u32,
    pending: Option<H>,
}

impl<H> Debouncer<H> {
    pub fn new(delay_ms: u32) -> Self {
        Self { delay_ms, pending: None }
    }

    pub fn trigger<S>(&mut self, scheduler: &S, task: Box<dyn FnOnce()>)
    where
        S: Scheduler<Handle = H>,
    {
        // Dropping the previous handle cancels it
        self.pending = Some(scheduler.after(self.delay_ms, task));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

// =============================================================================
// Location Observation
// =============================================================================

/// Detects that the logical location may have changed.
///
/// Observers only signal; deduplication against the last known location is
/// done by [`LocationTracker`], so several observers can run side by side.
pub trait LocationObserver {
    /// Stops observing when dropped.
    type Guard;

    fn watch(&self, on_change: Box<dyn FnMut()>) -> Self::Guard;
}

/// Poll-based observer: signals on a fixed period.
///
/// Robust against hosts that captured the history API before we attached.
pub struct PollingObserver<S> {
    scheduler: S,
    period_ms: u32,
}

impl<S: Scheduler> PollingObserver<S> {
    pub fn new(scheduler: S, period_ms: u32) -> Self {
        Self { scheduler, period_ms }
    }
}

impl<S: Scheduler> LocationObserver for PollingObserver<S> {
    type Guard = S::Handle;

    fn watch(&self, on_change: Box<dyn FnMut()>) -> Self::Guard {
        self.scheduler.every(self.period_ms, on_change)
    }
}

/// Last location seen by the engine.
#[derive(Debug, Clone, Default)]
pub struct LocationTracker {
    last: Option<String>,
}

impl LocationTracker {
    /// Record `href`; returns `true` when it differs from the previous one.
    pub fn observe(&mut self, href: &str) -> bool {
        if self.last.as_deref() == Some(href) {
            return false;
        }
        self.last = Some(href.to_string());
        true
    }
}
