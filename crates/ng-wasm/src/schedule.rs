//! Browser timers for the engine.

use gloo_timers::callback::{Interval, Timeout};
use ng_core::schedule::Scheduler;

/// `setTimeout` / `setInterval` through gloo; dropping the handle clears the timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerScheduler;

pub enum TimerHandle {
    Once(Timeout),
    Repeat(Interval),
}

impl Scheduler for TimerScheduler {
    type Handle = TimerHandle;

    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerHandle {
        TimerHandle::Once(Timeout::new(delay_ms, task))
    }

    fn every(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TimerHandle {
        TimerHandle::Repeat(Interval::new(period_ms, task))
    }
}
