#![forbid(unsafe_code)]

//! Cooperative deferred scheduling.
//!
//! The engines never block and never poll; when they must wait for the host
//! to settle they park a callback in one of three lanes, mirroring the host
//! runtime's boundaries:
//!
//! - **microtask** (`after_tick`): runs once current synchronous work settles.
//! - **macrotask** (`post_task`): runs one tick later, after DOM removal and
//!   other same-tick side effects.
//! - **frame** (`request_frame`): aligned to the next paint; cancelable.
//!
//! Tests (and host adapters) drive the queues explicitly with the `flush_*`
//! methods. Posting from inside a callback is allowed; lanes drain FIFO to
//! quiescence.
//!
//! # Invariants
//!
//! 1. Within a lane, callbacks run in posting order.
//! 2. `flush_macrotasks` drains microtasks after every macrotask, matching
//!    host event-loop ordering.
//! 3. A canceled frame callback never runs; cancellation is idempotent.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

struct FrameEntry {
    id: u64,
    callback: Option<Task>,
}

struct SchedulerInner {
    microtasks: RefCell<VecDeque<Task>>,
    macrotasks: RefCell<VecDeque<Task>>,
    frames: RefCell<Vec<FrameEntry>>,
    next_frame_id: RefCell<u64>,
}

/// Handle to three deferred-execution lanes. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                microtasks: RefCell::new(VecDeque::new()),
                macrotasks: RefCell::new(VecDeque::new()),
                frames: RefCell::new(Vec::new()),
                next_frame_id: RefCell::new(0),
            }),
        }
    }

    /// Park a callback on the microtask lane.
    pub fn after_tick(&self, f: impl FnOnce() + 'static) {
        self.inner.microtasks.borrow_mut().push_back(Box::new(f));
    }

    /// Park a callback on the macrotask lane (one tick later).
    pub fn post_task(&self, f: impl FnOnce() + 'static) {
        self.inner.macrotasks.borrow_mut().push_back(Box::new(f));
    }

    /// Park a callback for the next frame. Dropping the handle cancels it.
    #[must_use]
    pub fn request_frame(&self, f: impl FnOnce() + 'static) -> FrameHandle {
        let id = {
            let mut next = self.inner.next_frame_id.borrow_mut();
            let id = *next;
            *next += 1;
            id
        };
        self.inner.frames.borrow_mut().push(FrameEntry {
            id,
            callback: Some(Box::new(f)),
        });
        FrameHandle {
            scheduler: Rc::clone(&self.inner),
            id,
            armed: true,
        }
    }

    /// Run all queued microtasks, including ones they enqueue.
    pub fn flush_microtasks(&self) {
        loop {
            let task = self.inner.microtasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Run all queued macrotasks, draining microtasks after each.
    pub fn flush_macrotasks(&self) {
        loop {
            let task = self.inner.macrotasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    self.flush_microtasks();
                }
                None => break,
            }
        }
    }

    /// Run the currently queued frame callbacks (not ones they enqueue),
    /// then drain microtasks.
    pub fn run_frame(&self) {
        let entries: Vec<FrameEntry> = self.inner.frames.borrow_mut().drain(..).collect();
        for entry in entries {
            if let Some(cb) = entry.callback {
                cb();
            }
        }
        self.flush_microtasks();
    }

    /// Drain every lane until all are empty.
    pub fn flush_all(&self) {
        loop {
            self.flush_microtasks();
            if !self.inner.macrotasks.borrow().is_empty() {
                self.flush_macrotasks();
                continue;
            }
            if !self.inner.frames.borrow().is_empty() {
                self.run_frame();
                continue;
            }
            break;
        }
    }

    /// Whether any lane holds pending work.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.inner.microtasks.borrow().is_empty()
            || !self.inner.macrotasks.borrow().is_empty()
            || !self.inner.frames.borrow().is_empty()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("microtasks", &self.inner.microtasks.borrow().len())
            .field("macrotasks", &self.inner.macrotasks.borrow().len())
            .field("frames", &self.inner.frames.borrow().len())
            .finish()
    }
}

/// RAII handle for a frame callback; drop (or [`cancel`](Self::cancel))
/// prevents it from running.
pub struct FrameHandle {
    scheduler: Rc<SchedulerInner>,
    id: u64,
    armed: bool,
}

impl FrameHandle {
    /// Cancel now instead of at drop time.
    pub fn cancel(mut self) {
        self.disarm();
    }

    /// Keep the callback alive without holding the handle.
    pub fn forget(mut self) {
        self.armed = false;
    }

    fn disarm(&mut self) {
        if self.armed {
            self.armed = false;
            self.scheduler.frames.borrow_mut().retain(|e| e.id != self.id);
        }
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl std::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHandle")
            .field("id", &self.id)
            .field("armed", &self.armed)
            .finish()
    }
}
