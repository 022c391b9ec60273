// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic clock and frame scheduler.
//!
//! [`ManualClock`] only moves when told to, and [`ManualScheduler`] only runs
//! callbacks when [`fire_pending`](ManualScheduler::fire_pending) is called.
//! Together they drive an [`AnimationLoop`](crate::animation::AnimationLoop)
//! without a host event loop, which is how simulations and tests step frames.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::cell::{Cell, RefCell};

use crate::clock::{Clock, ClockSource};
use crate::frame::{FrameCallback, FrameScheduler, FrameSource};
use crate::time::{Duration, HostTime, Timebase};

/// A clock whose time is set explicitly.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<HostTime>,
    timebase: Timebase,
    source: ClockSource,
}

impl ManualClock {
    /// Creates a clock reading zero that reports itself as `source`.
    #[must_use]
    pub fn new(timebase: Timebase, source: ClockSource) -> Self {
        Self {
            now: Cell::new(HostTime(0)),
            timebase,
            source,
        }
    }

    /// Sets the current time. Going backwards is allowed.
    pub fn set(&self, t: HostTime) {
        self.now.set(t);
    }

    /// Moves the current time forward, saturating at `u64::MAX`.
    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get().saturating_add(d));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        self.now.get()
    }

    fn timebase(&self) -> Timebase {
        self.timebase
    }

    fn source(&self) -> ClockSource {
        self.source
    }
}

/// Handle returned by [`ManualScheduler::request_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ManualFrameId(pub u64);

/// A frame scheduler whose callbacks run only on
/// [`fire_pending`](Self::fire_pending).
pub struct ManualScheduler {
    queue: RefCell<VecDeque<(ManualFrameId, FrameCallback)>>,
    next_id: Cell<u64>,
    source: FrameSource,
}

impl core::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .field("next_id", &self.next_id.get())
            .field("source", &self.source)
            .finish()
    }
}

impl ManualScheduler {
    /// Creates an empty scheduler that reports itself as `source`.
    #[must_use]
    pub fn new(source: FrameSource) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            next_id: Cell::new(0),
            source,
        }
    }

    /// Number of requests waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs every callback that was pending when this call began, in request
    /// order, and returns how many ran.
    ///
    /// Requests made by those callbacks wait for the next call.
    ///
    /// A callback may cancel a request from the same batch that has not run
    /// yet; the cancelled request is skipped.
    pub fn fire_pending(&self) -> usize {
        let first_unbatched = self.next_id.get();
        let mut ran = 0;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let due = queue
                    .front()
                    .is_some_and(|(id, _)| id.0 < first_unbatched);
                if due { queue.pop_front() } else { None }
            };
            let Some((_, callback)) = next else {
                return ran;
            };
            callback();
            ran += 1;
        }
    }
}

impl FrameScheduler for ManualScheduler {
    type Handle = ManualFrameId;

    fn source(&self) -> FrameSource {
        self.source
    }

    fn request_frame(&self, callback: FrameCallback) -> ManualFrameId {
        let id = ManualFrameId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue.borrow_mut().push_back((id, callback));
        id
    }

    fn cancel_frame(&self, handle: ManualFrameId) {
        self.queue.borrow_mut().retain(|(id, _)| *id != handle);
    }
}

/// Convenience for boxing a closure as a [`FrameCallback`].
pub fn callback(f: impl FnOnce() + 'static) -> FrameCallback {
    Box::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;

    #[test]
    fn request_never_runs_synchronously() {
        let scheduler = ManualScheduler::new(FrameSource::Timer);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        scheduler.request_frame(callback(move || h.set(h.get() + 1)));
        assert_eq!(hits.get(), 0, "callback must not run inside request_frame");

        assert_eq!(scheduler.fire_pending(), 1);
        assert_eq!(hits.get(), 1);

        // Fired requests are gone: exactly once.
        assert_eq!(scheduler.fire_pending(), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn requests_made_while_firing_wait_for_next_turn() {
        let scheduler = Rc::new(ManualScheduler::new(FrameSource::Standard));
        let hits = Rc::new(Cell::new(0));

        let s = Rc::clone(&scheduler);
        let h = Rc::clone(&hits);
        scheduler.request_frame(callback(move || {
            h.set(h.get() + 1);
            let h2 = Rc::clone(&h);
            s.request_frame(callback(move || h2.set(h2.get() + 1)));
        }));

        assert_eq!(scheduler.fire_pending(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.fire_pending(), 1);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn cancel_removes_only_the_given_request() {
        let scheduler = ManualScheduler::new(FrameSource::Timer);
        let hits = Rc::new(Cell::new(0_u32));
        let a = Rc::clone(&hits);
        let b = Rc::clone(&hits);
        let first = scheduler.request_frame(callback(move || a.set(a.get() + 1)));
        scheduler.request_frame(callback(move || b.set(b.get() + 10)));

        scheduler.cancel_frame(first);
        assert_eq!(scheduler.pending(), 1);
        scheduler.fire_pending();
        assert_eq!(hits.get(), 10);

        // Already fired or cancelled: no-op.
        scheduler.cancel_frame(first);
    }

    #[test]
    fn cancel_from_an_earlier_callback_in_the_same_batch() {
        let scheduler = Rc::new(ManualScheduler::new(FrameSource::Timer));
        let victim: Rc<Cell<Option<ManualFrameId>>> = Rc::new(Cell::new(None));
        let hits = Rc::new(Cell::new(0_u32));

        let s = Rc::clone(&scheduler);
        let v = Rc::clone(&victim);
        scheduler.request_frame(callback(move || {
            if let Some(id) = v.get() {
                s.cancel_frame(id);
            }
        }));
        let h = Rc::clone(&hits);
        victim.set(Some(
            scheduler.request_frame(callback(move || h.set(h.get() + 1))),
        ));

        assert_eq!(scheduler.fire_pending(), 1, "only the cancelling callback ran");
        assert_eq!(hits.get(), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(Timebase::NANOS, ClockSource::Monotonic);
        assert_eq!(clock.now(), HostTime(0));
        clock.advance(Duration(16_666_667));
        assert_eq!(clock.now(), HostTime(16_666_667));
        assert!((clock.now_millis() - 16.666_667).abs() < 1e-9);
    }
}
