use std::collections::VecDeque;
use std::rc::Rc;
use std::task::Waker;

use crate::bus::{Bus, ChannelId};
use crate::waitlist::{WaitList, Waiter};

/// A bounded FIFO with one wait list per direction.
///
/// Producers park on `send_waiters` when the buffer is at capacity, consumers
/// park on `recv_waiters` when it is empty. Whoever makes the buffer
/// transition out of one of those states wakes exactly one entry of the
/// opposite list.
pub(super) struct Channel {
    /// Channel max capacity, fixed at open time.
    pub(super) capacity: usize,
    /// Buffered messages, oldest at the front.
    pub(super) buffer: VecDeque<u32>,
    /// Tasks waiting until the channel is not full.
    pub(super) send_waiters: WaitList,
    /// Tasks waiting until the channel is not empty.
    pub(super) recv_waiters: WaitList,
}

impl Channel {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity),
            send_waiters: WaitList::new(),
            recv_waiters: WaitList::new(),
        }
    }

    pub(super) fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    pub(super) fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub(super) fn free_space(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Appends up to [`free_space`](Self::free_space) messages, in order.
    pub(super) fn push_many(&mut self, data: &[u32]) -> usize {
        let n = data.len().min(self.free_space());
        self.buffer.extend(data[..n].iter().copied());
        n
    }

    /// Pops up to `out.len()` messages into the front of `out`, oldest first.
    pub(super) fn pop_many(&mut self, out: &mut [u32]) -> usize {
        let n = out.len().min(self.buffer.len());
        for (slot, value) in out[..n].iter_mut().zip(self.buffer.drain(..n)) {
            *slot = value;
        }
        n
    }
}

/// Bus state behind the `RefCell`: the sparse channel table plus the
/// bus-wide broadcast wait list.
///
/// Ids are dense: `open` reuses the lowest vacant slot before growing the
/// table, `close` leaves a vacant slot behind.
pub(super) struct Inner {
    pub(super) channels: Vec<Option<Channel>>,
    /// Tasks waiting until every open channel has a free slot.
    pub(super) broadcast_waiters: WaitList,
}

impl Inner {
    pub(super) fn new() -> Self {
        Self {
            channels: Vec::new(),
            broadcast_waiters: WaitList::new(),
        }
    }

    pub(super) fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.0)?.as_ref()
    }

    pub(super) fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(id.0)?.as_mut()
    }

    /// The wait list a parked operation belongs to, if it still exists.
    ///
    /// `None` only for a send/recv queue whose channel has been closed; the
    /// broadcast list lives as long as the bus.
    pub(super) fn wait_list(&mut self, queue: Queue) -> Option<&mut WaitList> {
        match queue {
            Queue::Send(id) => Some(&mut self.channel_mut(id)?.send_waiters),
            Queue::Recv(id) => Some(&mut self.channel_mut(id)?.recv_waiters),
            Queue::Broadcast => Some(&mut self.broadcast_waiters),
        }
    }
}

/// Identifies the wait list a suspending operation parks on.
#[derive(Clone, Copy)]
pub(super) enum Queue {
    Send(ChannelId),
    Recv(ChannelId),
    Broadcast,
}

/// Parks the calling task on `queue`, or refreshes an existing entry.
///
/// Three cases, driven by the entry's `woken` flag:
/// - no entry yet: first blocked poll, enqueue at the tail;
/// - entry woken: the wakeup raced with another task that drained the
///   channel first; no reservation is held, so rearm and go back to the
///   tail;
/// - entry still queued: spurious poll, refresh the waker in place and keep
///   the position.
pub(super) fn park(
    inner: &mut Inner,
    queue: Queue,
    slot: &mut Option<Rc<Waiter>>,
    waker: &Waker,
) {
    // The operation returned its would-block error under this same borrow,
    // so the list is still there.
    let list = inner
        .wait_list(queue)
        .expect("channel vanished inside a bus operation");
    match slot {
        Some(waiter) if waiter.was_woken() => {
            waiter.rearm(waker);
            list.push(waiter.clone());
        }
        Some(waiter) => waiter.register(waker),
        None => {
            let waiter = Waiter::new(waker.clone());
            list.push(waiter.clone());
            *slot = Some(waiter);
        }
    }
}

/// Releases a waiter entry after its operation completed.
///
/// A woken entry was already detached by the waker; an un-woken one is still
/// queued (the operation succeeded on a spurious poll) and detaches itself.
pub(super) fn unpark(inner: &mut Inner, queue: Queue, slot: &mut Option<Rc<Waiter>>) {
    if let Some(waiter) = slot.take() {
        if !waiter.was_woken() {
            if let Some(list) = inner.wait_list(queue) {
                list.remove(&waiter);
            }
        }
    }
}

/// Drop path for a parked future.
///
/// An un-woken entry detaches itself. A woken entry has absorbed a wakeup it
/// will never act on, so that wakeup is forwarded to the next waiter in
/// line; otherwise a message (or a freed slot) could sit unobserved while a
/// parked task starves.
pub(super) fn cancel(bus: &Bus, queue: Queue, slot: &mut Option<Rc<Waiter>>) {
    let Some(waiter) = slot.take() else {
        return;
    };
    let forwarded = {
        let mut inner = bus.inner.borrow_mut();
        match inner.wait_list(queue) {
            Some(list) if waiter.was_woken() => list.wake_one(),
            Some(list) => {
                list.remove(&waiter);
                None
            }
            // the channel is gone; close already woke everyone
            None => None,
        }
    };
    if let Some(waker) = forwarded {
        waker.wake();
    }
}

/// Invokes collected wakers once the bus borrow is released.
///
/// Wakers only schedule their task, they never poll it inline, so nothing
/// re-enters the bus while it is borrowed.
pub(super) fn fire(wakes: Vec<Waker>) {
    for waker in wakes {
        waker.wake();
    }
}

#[cfg(test)]
mod channel_test {
    use super::*;

    /// Partial append stops at capacity
    #[test]
    fn test_push_many_caps_at_free_space() {
        let mut ch = Channel::new(3);
        assert_eq!(ch.push_many(&[10, 20, 30, 40, 50]), 3);
        assert!(ch.is_full());
        assert_eq!(ch.buffer, [10, 20, 30]);
        assert_eq!(ch.push_many(&[60]), 0);
    }

    /// Partial pop stops at whichever runs out first, slice or buffer
    #[test]
    fn test_pop_many_fifo() {
        let mut ch = Channel::new(4);
        ch.push_many(&[1, 2, 3]);

        let mut out = [0u32; 2];
        assert_eq!(ch.pop_many(&mut out), 2);
        assert_eq!(out, [1, 2]);

        let mut out = [0u32; 8];
        assert_eq!(ch.pop_many(&mut out), 1);
        assert_eq!(out[0], 3);
        assert!(ch.is_empty());
    }
}
