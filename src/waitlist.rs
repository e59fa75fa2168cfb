//! FIFO queue of parked task wakers.
//!
//! The bus suspends a task by appending a [`Waiter`] entry to one of these
//! lists and returning `Poll::Pending`. Wakeups are served strictly one at a
//! time from the head: first parked, first woken.
//!
//! An entry is shared between the list and the parked future's frame
//! ([`Rc`]), so detachment can happen from either side:
//!
//! - [`WaitList::wake_one`] detaches the head entry, flags it woken and hands
//!   its waker to the caller;
//! - a future that completes or is dropped while still un-woken removes its
//!   own entry with [`WaitList::remove`].
//!
//! The `woken` flag is what tells the owning future which of the two paths it
//! is on when it runs again.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::task::Waker;

/// One parked task, linked into exactly one [`WaitList`] at a time.
pub(crate) struct Waiter {
    waker: Cell<Option<Waker>>,
    woken: Cell<bool>,
}

impl Waiter {
    pub(crate) fn new(waker: Waker) -> Rc<Self> {
        Rc::new(Self {
            waker: Cell::new(Some(waker)),
            woken: Cell::new(false),
        })
    }

    /// Refreshes the stored waker without giving up the queue position.
    ///
    /// Used when a still-queued entry is polled spuriously: the task keeps
    /// its place in line but may have migrated to a new waker.
    pub(crate) fn register(&self, waker: &Waker) {
        match self.waker.take() {
            Some(old) if old.will_wake(waker) => self.waker.set(Some(old)),
            _ => self.waker.set(Some(waker.clone())),
        }
    }

    /// True once [`WaitList::wake_one`] has detached this entry.
    pub(crate) fn was_woken(&self) -> bool {
        self.woken.get()
    }

    /// Rearms a woken entry so it can be parked again.
    ///
    /// A woken task holds no reservation: if the operation is still blocked
    /// when it runs, it goes back to the tail of the line.
    pub(crate) fn rearm(&self, waker: &Waker) {
        self.woken.set(false);
        self.register(waker);
    }
}

/// FIFO list of parked tasks, served one at a time.
#[derive(Default)]
pub(crate) struct WaitList {
    waiters: VecDeque<Rc<Waiter>>,
}

impl WaitList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Parks an entry at the tail.
    pub(crate) fn push(&mut self, waiter: Rc<Waiter>) {
        self.waiters.push_back(waiter);
    }

    /// Detaches the head entry and returns its waker; `None` if empty.
    ///
    /// The entry is flagged woken before the waker is handed out, so the
    /// owning future observes that it no longer sits in any list. The caller
    /// must invoke the waker only after releasing the bus borrow.
    pub(crate) fn wake_one(&mut self) -> Option<Waker> {
        let waiter = self.waiters.pop_front()?;
        waiter.woken.set(true);
        waiter.waker.take()
    }

    /// Self-detach path for futures that complete or cancel while un-woken.
    pub(crate) fn remove(&mut self, waiter: &Rc<Waiter>) {
        self.waiters.retain(|w| !Rc::ptr_eq(w, waiter));
    }

    /// Detaches every entry, flags it woken and collects the wakers.
    ///
    /// Close-time drain: every parked task resumes and re-checks the channel.
    pub(crate) fn drain_into(&mut self, wakes: &mut Vec<Waker>) {
        while !self.waiters.is_empty() {
            if let Some(waker) = self.wake_one() {
                wakes.push(waker);
            }
        }
    }
}

#[cfg(test)]
mod waitlist_test {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::task::Wake;

    /// Waker that records the order in which entries fire.
    struct Tagged {
        tag: usize,
        log: Arc<Log>,
    }

    #[derive(Default)]
    struct Log {
        fired: Mutex<Vec<usize>>,
    }

    impl Wake for Tagged {
        fn wake(self: Arc<Self>) {
            self.log.fired.lock().unwrap().push(self.tag);
        }
    }

    fn tagged(tag: usize, log: &Arc<Log>) -> Waker {
        Arc::new(Tagged {
            tag,
            log: log.clone(),
        })
        .into()
    }

    /// First parked must be first woken
    #[test]
    fn test_fifo_order() {
        let log = Arc::new(Log::default());
        let mut list = WaitList::new();
        let entries: Vec<_> = (0..3).map(|i| Waiter::new(tagged(i, &log))).collect();
        for e in &entries {
            list.push(e.clone());
        }

        for expected in 0..3 {
            let waker = list.wake_one().unwrap();
            assert!(entries[expected].was_woken());
            waker.wake();
        }
        assert!(list.wake_one().is_none());
        assert_eq!(*log.fired.lock().unwrap(), vec![0, 1, 2]);
    }

    /// A removed entry must never be woken
    #[test]
    fn test_remove_detaches() {
        let log = Arc::new(Log::default());
        let mut list = WaitList::new();
        let a = Waiter::new(tagged(0, &log));
        let b = Waiter::new(tagged(1, &log));
        let c = Waiter::new(tagged(2, &log));
        list.push(a.clone());
        list.push(b.clone());
        list.push(c.clone());

        list.remove(&b);

        list.wake_one().unwrap().wake();
        list.wake_one().unwrap().wake();
        assert!(list.wake_one().is_none());
        assert!(!b.was_woken());
        assert_eq!(*log.fired.lock().unwrap(), vec![0, 2]);
    }

    /// Drain wakes everything in FIFO order and flags every entry
    #[test]
    fn test_drain() {
        let log = Arc::new(Log::default());
        let mut list = WaitList::new();
        let entries: Vec<_> = (0..4).map(|i| Waiter::new(tagged(i, &log))).collect();
        for e in &entries {
            list.push(e.clone());
        }

        let mut wakes = Vec::new();
        list.drain_into(&mut wakes);
        assert!(list.wake_one().is_none());
        assert_eq!(wakes.len(), 4);
        assert!(entries.iter().all(|e| e.was_woken()));

        for w in wakes {
            w.wake();
        }
        assert_eq!(*log.fired.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    /// Rearming clears the woken flag so the entry can park again
    #[test]
    fn test_rearm() {
        let log = Arc::new(Log::default());
        let mut list = WaitList::new();
        let w = Waiter::new(tagged(0, &log));
        list.push(w.clone());

        list.wake_one().unwrap();
        assert!(w.was_woken());

        w.rearm(&tagged(0, &log));
        assert!(!w.was_woken());
        list.push(w.clone());
        assert!(list.wake_one().is_some());
        assert!(w.was_woken());
    }
}
