//! Cooperative Message Bus
//!
//! A dynamically allocated set of bounded FIFO channels shared by tasks on a
//! single-threaded executor, carrying `u32` messages, with an all-or-nothing
//! broadcast across every open channel.
//!
//! ## How It Works
//!
//!```text
//! ┌───────────────────────── Bus ─────────────────────────┐
//! │ [0]  buffer │▓▓▓│▓▓▓│   │   send_waiters recv_waiters │
//! │ [1]  (vacant, reused by the next open)                │
//! │ [2]  buffer │▓▓▓│   │   │   send_waiters recv_waiters │
//! │                                                       │
//! │ broadcast_waiters                                     │
//! └───────────────────────────────────────────────────────┘
//!```
//!
//! - **Producers** append at the tail of a channel's buffer, **consumers**
//!   pop from the head; per channel, messages arrive in send order.
//! - **Buffer full**: senders park. **Buffer empty**: receivers park.
//! - **Broadcast** appends one message to *every* open channel, or to none;
//!   a broadcaster parks until every open channel has a free slot.
//!
//! ## Suspension
//!
//! Everything runs on one thread; an operation either completes immediately
//! or parks the calling task on a FIFO wait list and yields to the executor:
//!
//! | Operation | Parks while | Woken by |
//! |-----------|-------------|----------|
//! | [`send`](Bus::send), [`send_many`](Bus::send_many) | the channel is full | a pop freeing a slot, close |
//! | [`recv`](Bus::recv), [`recv_many`](Bus::recv_many), [`messages`](Bus::messages) | the channel is empty | an append, close |
//! | [`broadcast`](Bus::broadcast) | any open channel is full | every pop, every close |
//!
//! Wakeups are served one waiter at a time, first parked first woken. A
//! woken task holds no reservation: it re-checks the channel when it runs,
//! and goes back to the end of the line if someone else got there first.
//!
//! Every pop also wakes one parked broadcaster, because freeing a slot on
//! any channel may be what a broadcaster was waiting for; the woken
//! broadcaster re-evaluates the whole bus.
//!
//! ## Close
//!
//! [`close`](Bus::close) vacates the slot first, then drains every parked
//! sender, receiver and broadcaster. The woken tasks observe the vacant slot
//! and resolve with [`ChannelClosed`] (broadcasters re-evaluate against the
//! remaining channels). Ids are reused, so don't hold on to one across a
//! close.
//!
//! ## Example
//!
//!```
//! use filovia::bus::Bus;
//! use futures::executor::block_on;
//!
//! let bus = Bus::new();
//! let id = bus.open(2);
//!
//! block_on(async {
//!     bus.send(id, 7).await.unwrap();
//!     assert_eq!(bus.recv(id).await.unwrap(), 7);
//! });
//!
//! bus.try_send(id, 8).unwrap();
//! assert_eq!(bus.try_recv(id).unwrap(), 8);
//! ```

mod broadcast;
mod channel;
mod error;
mod recv;
mod send;

use std::cell::RefCell;
use std::fmt;

use channel::{Channel, Inner};

pub use error::*;

#[cfg(feature = "async")]
pub use broadcast::BroadcastFuture;
#[cfg(feature = "async")]
pub use recv::{Messages, RecvFuture, RecvManyFuture};
#[cfg(feature = "async")]
pub use send::{SendFuture, SendManyFuture};

/// Handle to one open channel.
///
/// Ids are dense and reused: closing a channel vacates its slot and the next
/// [`open`](Bus::open) takes the lowest vacant one, so a retained id is
/// meaningful only until its channel is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub(crate) usize);

impl ChannelId {
    /// The dense slot index behind this id.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The bus: a sparse table of channels plus the broadcast wait list.
///
/// All state lives behind a single `RefCell`; each non-suspending operation
/// is one borrow, released before any waker fires. The bus is neither `Send`
/// nor `Sync`: it belongs to the tasks of one executor thread. Dropping it
/// frees every remaining channel; operation futures borrow the bus, so none
/// can still be parked at that point.
pub struct Bus {
    pub(crate) inner: RefCell<Inner>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner::new()),
        }
    }

    /// Opens a channel holding up to `capacity` messages.
    ///
    /// The lowest vacant slot is reused; otherwise the table grows by one.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero: a channel nothing can ever be sent on
    /// is a programming error, not a runtime condition.
    pub fn open(&self, capacity: usize) -> ChannelId {
        assert!(capacity > 0, "channel capacity must be at least 1");
        let mut inner = self.inner.borrow_mut();
        let id = match inner.channels.iter().position(Option::is_none) {
            Some(vacant) => vacant,
            None => {
                inner.channels.push(None);
                inner.channels.len() - 1
            }
        };
        inner.channels[id] = Some(Channel::new(capacity));
        ChannelId(id)
    }

    /// Closes a channel, dropping its buffered messages.
    ///
    /// The slot is vacated *before* the wait lists are drained, so every
    /// woken task observes a closed channel instead of re-parking on a queue
    /// about to disappear. All parked senders and receivers resolve with
    /// [`ChannelClosed`]; all parked broadcasters re-evaluate the remaining
    /// channels.
    pub fn close(&self, id: ChannelId) -> Result<(), ChannelClosed> {
        let mut wakes = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            let slot = inner.channels.get_mut(id.0).ok_or(ChannelClosed)?;
            let mut ch = slot.take().ok_or(ChannelClosed)?;
            ch.send_waiters.drain_into(&mut wakes);
            ch.recv_waiters.drain_into(&mut wakes);
            inner.broadcast_waiters.drain_into(&mut wakes);
        }
        channel::fire(wakes);
        Ok(())
    }

    /// Number of currently open channels.
    pub fn channel_count(&self) -> usize {
        self.inner
            .borrow()
            .channels
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Capacity fixed at open time.
    pub fn capacity(&self, id: ChannelId) -> Result<usize, ChannelClosed> {
        self.with_channel(id, |ch| ch.capacity)
    }

    /// Number of buffered messages.
    pub fn len(&self, id: ChannelId) -> Result<usize, ChannelClosed> {
        self.with_channel(id, |ch| ch.buffer.len())
    }

    pub fn is_empty(&self, id: ChannelId) -> Result<bool, ChannelClosed> {
        self.with_channel(id, Channel::is_empty)
    }

    pub fn is_full(&self, id: ChannelId) -> Result<bool, ChannelClosed> {
        self.with_channel(id, Channel::is_full)
    }

    fn with_channel<T>(
        &self,
        id: ChannelId,
        f: impl FnOnce(&Channel) -> T,
    ) -> Result<T, ChannelClosed> {
        self.inner
            .borrow()
            .channel(id)
            .map(f)
            .ok_or(ChannelClosed)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
