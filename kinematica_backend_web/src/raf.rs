// Copyright 2026 the Kinematica Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame scheduler.
//!
//! The global object is probed once per thread for `requestAnimationFrame`
//! and its vendor-prefixed variants in [`FrameSource::PROBE_ORDER`]. The
//! first hit and its matching cancel function are cached and every
//! [`RafScheduler`] routes through them. Without any of them, requests go to
//! `setTimeout(cb, 1000 / 60)`.
//!
//! Each request's JS closure is owned by the scheduler until it fires or is
//! cancelled. A host without a matching cancel function still fires a
//! cancelled request, so its closure stays registered and runs as a no-op.
//!
//! Timing confidence is pacing-only: the browser paces frames but does not
//! predict when they reach the screen.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use kinematica_core::frame::{FALLBACK_INTERVAL_MS, FrameCallback, FrameScheduler, FrameSource};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &JsValue, timeout_ms: f64) -> JsValue;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: &JsValue);
}

/// The cached winner of the frame-source probe.
#[derive(Clone, Debug)]
struct NativeFrameFns {
    source: FrameSource,
    request: Function,
    cancel: Option<Function>,
}

impl NativeFrameFns {
    fn probe(global: &Object) -> Option<Self> {
        let source = FrameSource::select(|source| {
            source
                .request_name()
                .is_some_and(|name| lookup(global, name).is_some())
        });
        let request = lookup(global, source.request_name()?)?;
        let cancel = source.cancel_name().and_then(|name| lookup(global, name));
        Some(Self {
            source,
            request,
            cancel,
        })
    }
}

fn lookup(global: &Object, name: &str) -> Option<Function> {
    Reflect::get(global, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

std::thread_local! {
    static NATIVE: Option<NativeFrameFns> = NativeFrameFns::probe(&js_sys::global());
}

/// Returns the frame source selected for this thread.
#[must_use]
pub fn frame_source() -> FrameSource {
    NATIVE.with(|native| native.as_ref().map_or(FrameSource::Timer, |n| n.source))
}

/// Requests that have been handed to the host but have not fired yet.
struct PendingRequests<T> {
    entries: RefCell<BTreeMap<u64, T>>,
    next_seq: Cell<u64>,
}

impl<T> PendingRequests<T> {
    fn new() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            next_seq: Cell::new(0),
        }
    }

    fn reserve(&self) -> u64 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq.wrapping_add(1));
        seq
    }

    fn insert(&self, seq: u64, entry: T) {
        self.entries.borrow_mut().insert(seq, entry);
    }

    fn take(&self, seq: u64) -> Option<T> {
        self.entries.borrow_mut().remove(&seq)
    }

    fn drain(&self) -> BTreeMap<u64, T> {
        core::mem::take(&mut *self.entries.borrow_mut())
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

enum HostRequest {
    Frame(JsValue),
    Timeout(JsValue),
}

struct PendingFrame {
    request: HostRequest,
    /// Set when cancelled on a host that fires the request anyway.
    cancelled: bool,
    /// Keeps the JS callback alive until the request fires or is cancelled.
    closure: Closure<dyn FnMut()>,
}

/// Identifies a pending [`RafScheduler`] request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RafHandle(u64);

/// A [`FrameScheduler`] over the selected browser primitive.
pub struct RafScheduler {
    native: Option<NativeFrameFns>,
    global: Object,
    pending: Rc<PendingRequests<PendingFrame>>,
}

impl core::fmt::Debug for RafScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafScheduler")
            .field("source", &self.source())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Default for RafScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RafScheduler {
    /// Creates a scheduler on this thread's probed frame source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            native: NATIVE.with(Clone::clone),
            global: js_sys::global(),
            pending: Rc::new(PendingRequests::new()),
        }
    }

    /// Number of requests the host still holds, including cancelled ones it
    /// could not revoke.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn send(&self, js_callback: &JsValue) -> HostRequest {
        // A primitive that throws routes this request to the timer instead.
        if let Some(native) = &self.native
            && let Ok(id) = native.request.call1(&self.global, js_callback)
        {
            return HostRequest::Frame(id);
        }
        HostRequest::Timeout(set_timeout(js_callback, FALLBACK_INTERVAL_MS))
    }

    /// Asks the host to drop `request`. Returns `false` if it may still fire.
    fn revoke(&self, request: &HostRequest) -> bool {
        match request {
            HostRequest::Frame(id) => self
                .native
                .as_ref()
                .and_then(|n| n.cancel.as_ref())
                .is_some_and(|cancel| cancel.call1(&self.global, id).is_ok()),
            HostRequest::Timeout(id) => {
                clear_timeout(id);
                true
            }
        }
    }
}

impl FrameScheduler for RafScheduler {
    type Handle = RafHandle;

    fn source(&self) -> FrameSource {
        self.native
            .as_ref()
            .map_or(FrameSource::Timer, |native| native.source)
    }

    fn request_frame(&self, callback: FrameCallback) -> RafHandle {
        let seq = self.pending.reserve();
        let pending: Weak<PendingRequests<PendingFrame>> = Rc::downgrade(&self.pending);
        let closure: Closure<dyn FnMut()> = Closure::once(move || {
            let Some(pending) = pending.upgrade() else {
                return;
            };
            // Held until the callback returns; wasm-bindgen frees the
            // closure once the current call unwinds.
            let entry = pending.take(seq);
            if entry.as_ref().is_some_and(|e| !e.cancelled) {
                callback();
            }
            drop(entry);
        });

        let request = self.send(closure.as_ref());
        self.pending.insert(
            seq,
            PendingFrame {
                request,
                cancelled: false,
                closure,
            },
        );
        RafHandle(seq)
    }

    fn cancel_frame(&self, handle: RafHandle) {
        let Some(entry) = self.pending.take(handle.0) else {
            return;
        };
        if !self.revoke(&entry.request) {
            self.pending.insert(
                handle.0,
                PendingFrame {
                    cancelled: true,
                    ..entry
                },
            );
        }
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        for entry in self.pending.drain().into_values() {
            if !self.revoke(&entry.request) {
                // The host will still call it; freeing it now would make
                // that call throw.
                entry.closure.forget();
            }
        }
    }
}
