// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-delay frame timer.
//!
//! [`TimerScheduler`] is the native stand-in for `setTimeout(cb, 1000 / 60)`:
//! every request is due one interval after it was made. Requests live in a
//! single-threaded queue ordered by `(deadline, sequence)`; nothing runs
//! until the owner turns the queue with [`turn`](TimerScheduler::turn),
//! [`run_due`](TimerScheduler::run_due) or
//! [`run_until_idle`](TimerScheduler::run_until_idle).

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use kinematica_core::clock::Clock;
use kinematica_core::frame::{FrameCallback, FrameScheduler, FrameSource, fallback_interval};
use kinematica_core::time::{Duration, HostTime};

use crate::time::{HostClock, timebase};

/// Identifies a pending [`TimerScheduler`] request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle {
    deadline: HostTime,
    seq: u64,
}

impl TimerHandle {
    /// Host time at which the request becomes due.
    #[must_use]
    pub const fn deadline(self) -> HostTime {
        self.deadline
    }
}

/// A single-threaded fixed-delay timer queue.
pub struct TimerScheduler {
    clock: HostClock,
    interval: Duration,
    timers: RefCell<BTreeMap<TimerHandle, FrameCallback>>,
    next_seq: Cell<u64>,
}

impl core::fmt::Debug for TimerScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerScheduler")
            .field("clock", &self.clock)
            .field("interval", &self.interval)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerScheduler {
    /// Creates a timer firing at the 60 Hz fallback interval (~16.67 ms).
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(fallback_interval(timebase()))
    }

    /// Creates a timer with a custom delay, in nanosecond ticks.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            clock: HostClock::default(),
            interval,
            timers: RefCell::new(BTreeMap::new()),
            next_seq: Cell::new(0),
        }
    }

    /// Delay between a request and its deadline.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of requests waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Deadline of the earliest pending request.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.timers.borrow().keys().next().map(|h| h.deadline)
    }

    /// Runs every request due at or before `now` without sleeping, and
    /// returns how many ran.
    ///
    /// Requests made by those callbacks wait for a later call, even with a
    /// zero interval. A request cancelled by an earlier callback of the same
    /// call does not run.
    pub fn run_due(&self, now: HostTime) -> usize {
        let first_unbatched = self.next_seq.get();
        let mut ran = 0;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let handle = timers
                    .keys()
                    .take_while(|h| h.deadline <= now)
                    .find(|h| h.seq < first_unbatched)
                    .copied();
                handle.and_then(|h| timers.remove(&h))
            };
            let Some(callback) = next else {
                return ran;
            };
            callback();
            ran += 1;
        }
    }

    /// Sleeps until the earliest deadline, then runs everything due.
    ///
    /// Returns how many callbacks ran; zero means the queue was empty.
    pub fn turn(&self) -> usize {
        let Some(deadline) = self.next_deadline() else {
            return 0;
        };
        let now = self.clock.now();
        if deadline > now {
            let nanos = (deadline - now).to_nanos(timebase());
            std::thread::sleep(std::time::Duration::from_nanos(nanos));
        }
        self.run_due(self.clock.now().max(deadline))
    }

    /// Turns at most `turns` times, stopping early once the queue is empty.
    ///
    /// Returns how many callbacks ran.
    pub fn run_turns(&self, turns: usize) -> usize {
        let mut ran = 0;
        for _ in 0..turns {
            if self.pending() == 0 {
                break;
            }
            ran += self.turn();
        }
        ran
    }

    /// Turns until no requests remain and returns how many callbacks ran.
    ///
    /// Never returns while a running animation loop keeps re-requesting.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.pending() > 0 {
            ran += self.turn();
        }
        ran
    }
}

impl FrameScheduler for TimerScheduler {
    type Handle = TimerHandle;

    fn source(&self) -> FrameSource {
        FrameSource::Timer
    }

    fn request_frame(&self, callback: FrameCallback) -> TimerHandle {
        let seq = self.next_seq.get();
        self.next_seq.set(seq.wrapping_add(1));
        let handle = TimerHandle {
            deadline: self.clock.now().saturating_add(self.interval),
            seq,
        };
        self.timers.borrow_mut().insert(handle, callback);
        handle
    }

    fn cancel_frame(&self, handle: TimerHandle) {
        self.timers.borrow_mut().remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move || h.set(h.get() + 1))
    }

    #[test]
    fn request_is_due_one_interval_later() {
        let timer = TimerScheduler::new();
        let before = timer.clock.now();
        let handle = timer.request_frame(Box::new(|| {}));
        assert!(handle.deadline() >= before + timer.interval());
        assert_eq!(timer.next_deadline(), Some(handle.deadline()));
        assert_eq!(timer.source(), FrameSource::Timer);
    }

    #[test]
    fn nothing_runs_before_deadline() {
        let timer = TimerScheduler::new();
        let (hits, cb) = counter();
        let handle = timer.request_frame(Box::new(cb));
        assert_eq!(hits.get(), 0, "request must not run synchronously");

        let early = HostTime(handle.deadline().ticks() - 1);
        assert_eq!(timer.run_due(early), 0);
        assert_eq!(timer.run_due(handle.deadline()), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn due_requests_run_in_request_order() {
        let timer = TimerScheduler::with_interval(Duration::ZERO);
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..4 {
            let o = Rc::clone(&order);
            timer.request_frame(Box::new(move || o.borrow_mut().push(i)));
        }
        assert_eq!(timer.run_due(HostTime(u64::MAX)), 4);
        assert_eq!(*order.borrow(), [0, 1, 2, 3]);
    }

    #[test]
    fn cancelled_request_never_runs() {
        let timer = TimerScheduler::with_interval(Duration::ZERO);
        let (hits, cb) = counter();
        let handle = timer.request_frame(Box::new(cb));
        timer.cancel_frame(handle);
        assert_eq!(timer.run_until_idle(), 0);
        assert_eq!(hits.get(), 0);

        // Cancelling again is a no-op.
        timer.cancel_frame(handle);
    }

    #[test]
    fn requests_made_while_running_wait_for_later_turn() {
        let timer = Rc::new(TimerScheduler::with_interval(Duration::ZERO));
        let (hits, cb) = counter();
        let t = Rc::clone(&timer);
        timer.request_frame(Box::new(move || {
            t.request_frame(Box::new(cb));
        }));

        assert_eq!(timer.turn(), 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(timer.pending(), 1);
        assert_eq!(timer.turn(), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn cancel_from_an_earlier_callback_in_the_same_run() {
        let timer = Rc::new(TimerScheduler::with_interval(Duration::ZERO));
        let victim: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));
        let (hits, cb) = counter();

        let t = Rc::clone(&timer);
        let v = Rc::clone(&victim);
        timer.request_frame(Box::new(move || {
            if let Some(handle) = v.get() {
                t.cancel_frame(handle);
            }
        }));
        victim.set(Some(timer.request_frame(Box::new(cb))));

        assert_eq!(timer.run_due(HostTime(u64::MAX)), 1);
        assert_eq!(hits.get(), 0, "cancelled before its turn came");
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn requests_made_during_run_due_are_not_in_the_batch() {
        let timer = Rc::new(TimerScheduler::with_interval(Duration::ZERO));
        let t = Rc::clone(&timer);
        timer.request_frame(Box::new(move || {
            t.request_frame(Box::new(|| {}));
        }));
        assert_eq!(timer.run_due(HostTime(u64::MAX)), 1);
        assert_eq!(timer.pending(), 1);
    }

    #[test]
    fn turn_sleeps_until_deadline() {
        let timer = TimerScheduler::with_interval(Duration(5_000_000));
        let (hits, cb) = counter();
        let handle = timer.request_frame(Box::new(cb));
        assert_eq!(timer.turn(), 1);
        assert_eq!(hits.get(), 1);
        assert!(timer.clock.now() >= handle.deadline());
    }

    #[test]
    fn run_turns_stops_when_idle() {
        let timer = TimerScheduler::with_interval(Duration::ZERO);
        let (hits, cb) = counter();
        timer.request_frame(Box::new(cb));
        assert_eq!(timer.run_turns(10), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(timer.turn(), 0, "empty queue");
    }
}
