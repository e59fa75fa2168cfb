use std::task::Waker;

use crate::bus::channel::{fire, Inner};
use crate::bus::error::TryBroadcastError;
use crate::bus::Bus;

#[cfg(feature = "async")]
pub use r#async::BroadcastFuture;

impl Inner {
    /// All-or-nothing append to every open channel.
    ///
    /// Two passes: the first proves that every open channel has a free slot,
    /// the second writes. The channel set cannot change between the passes
    /// because the whole call runs under one borrow.
    pub(super) fn try_broadcast(
        &mut self,
        value: u32,
        wakes: &mut Vec<Waker>,
    ) -> Result<(), TryBroadcastError> {
        let mut open = 0usize;
        let mut full = false;
        for ch in self.channels.iter().flatten() {
            open += 1;
            full |= ch.is_full();
        }
        if open == 0 {
            return Err(TryBroadcastError::NoChannels);
        }
        if full {
            return Err(TryBroadcastError::Full);
        }

        for ch in self.channels.iter_mut().flatten() {
            ch.buffer.push_back(value);
            wakes.extend(ch.recv_waiters.wake_one());
        }
        Ok(())
    }
}

impl Bus {
    /// Appends `value` to every open channel, or to none.
    ///
    /// Fails with [`TryBroadcastError::Full`] if any open channel is at
    /// capacity, leaving every buffer untouched. Wakes one parked receiver
    /// per channel on success.
    pub fn try_broadcast(&self, value: u32) -> Result<(), TryBroadcastError> {
        let mut wakes = Vec::new();
        let result = self.inner.borrow_mut().try_broadcast(value, &mut wakes);
        fire(wakes);
        result
    }

    /// Broadcasts `value`, suspending until every open channel has room.
    ///
    /// Each successful `recv` (and each `close`) re-evaluates the wait:
    /// popping any channel may be what frees the last required slot. Only
    /// one parked broadcaster is woken per pop; several broadcasters
    /// serialize through subsequent pops.
    ///
    /// Resolves with [`NoChannels`](crate::bus::NoChannels) once no channel
    /// is open on the bus.
    #[cfg(feature = "async")]
    pub fn broadcast(&self, value: u32) -> BroadcastFuture<'_> {
        BroadcastFuture::new(self, value)
    }
}

#[cfg(feature = "async")]
mod r#async {
    use std::pin::Pin;
    use std::rc::Rc;
    use std::task::{Context, Poll};

    use crate::bus::channel::{self, Queue};
    use crate::bus::error::{NoChannels, TryBroadcastError};
    use crate::bus::Bus;
    use crate::waitlist::Waiter;

    #[must_use = "futures do nothing unless polled"]
    pub struct BroadcastFuture<'a> {
        bus: &'a Bus,
        value: u32,
        waiter: Option<Rc<Waiter>>,
    }

    impl<'a> BroadcastFuture<'a> {
        pub(in crate::bus) fn new(bus: &'a Bus, value: u32) -> Self {
            Self {
                bus,
                value,
                waiter: None,
            }
        }
    }

    impl Future for BroadcastFuture<'_> {
        type Output = Result<(), NoChannels>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            let this = self.get_mut();

            let mut wakes = Vec::new();
            let ready = {
                let mut inner = this.bus.inner.borrow_mut();
                match inner.try_broadcast(this.value, &mut wakes) {
                    Ok(()) => {
                        channel::unpark(&mut inner, Queue::Broadcast, &mut this.waiter);
                        Poll::Ready(Ok(()))
                    }
                    Err(TryBroadcastError::NoChannels) => {
                        // the broadcast list outlives every channel, so a
                        // still-queued entry detaches itself here
                        channel::unpark(&mut inner, Queue::Broadcast, &mut this.waiter);
                        Poll::Ready(Err(NoChannels))
                    }
                    Err(TryBroadcastError::Full) => {
                        channel::park(&mut inner, Queue::Broadcast, &mut this.waiter, cx.waker());
                        Poll::Pending
                    }
                }
            };
            channel::fire(wakes);
            ready
        }
    }

    impl Drop for BroadcastFuture<'_> {
        fn drop(&mut self) {
            channel::cancel(self.bus, Queue::Broadcast, &mut self.waiter);
        }
    }
}
