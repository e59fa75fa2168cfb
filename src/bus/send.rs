use std::task::Waker;

use crate::bus::channel::{fire, Inner};
use crate::bus::error::TrySendError;
use crate::bus::{Bus, ChannelId};

#[cfg(feature = "async")]
pub use r#async::{SendFuture, SendManyFuture};

impl Inner {
    pub(super) fn try_send(
        &mut self,
        id: ChannelId,
        value: u32,
        wakes: &mut Vec<Waker>,
    ) -> Result<(), TrySendError> {
        let ch = self.channel_mut(id).ok_or(TrySendError::Closed)?;
        if ch.is_full() {
            return Err(TrySendError::Full);
        }
        ch.buffer.push_back(value);
        wakes.extend(ch.recv_waiters.wake_one());
        Ok(())
    }

    pub(super) fn try_send_many(
        &mut self,
        id: ChannelId,
        data: &[u32],
        wakes: &mut Vec<Waker>,
    ) -> Result<usize, TrySendError> {
        let ch = self.channel_mut(id).ok_or(TrySendError::Closed)?;
        if data.is_empty() {
            // a no-op write is not "full", even on a full channel
            return Ok(0);
        }
        if ch.is_full() {
            return Err(TrySendError::Full);
        }
        let n = ch.push_many(data);
        wakes.extend(ch.recv_waiters.wake_one());
        Ok(n)
    }
}

impl Bus {
    /// Appends a message if the channel has a free slot.
    ///
    /// Wakes one parked receiver on success.
    pub fn try_send(&self, id: ChannelId, value: u32) -> Result<(), TrySendError> {
        let mut wakes = Vec::new();
        let result = self.inner.borrow_mut().try_send(id, value, &mut wakes);
        fire(wakes);
        result
    }

    /// Appends up to `data.len()` messages, in order, stopping at capacity.
    ///
    /// Returns how many messages were written (at least 1) and wakes one
    /// parked receiver. Fails with [`TrySendError::Full`] only when not even
    /// one message fits; an empty `data` returns `Ok(0)` even on a full
    /// channel.
    pub fn try_send_many(&self, id: ChannelId, data: &[u32]) -> Result<usize, TrySendError> {
        let mut wakes = Vec::new();
        let result = self.inner.borrow_mut().try_send_many(id, data, &mut wakes);
        fire(wakes);
        result
    }

    /// Sends a message, suspending while the channel is full.
    ///
    /// Resolves with [`ChannelClosed`](crate::bus::ChannelClosed) if the id
    /// is unknown or the channel is closed while the task is parked.
    ///
    /// # Cancel Safety
    ///
    /// Cancel-safe for the message: a `u32` is either still owned by the
    /// future or already in the channel. A wakeup absorbed by a dropped
    /// future is forwarded to the next parked sender.
    #[cfg(feature = "async")]
    pub fn send(&self, id: ChannelId, value: u32) -> SendFuture<'_> {
        SendFuture::new(self, id, value)
    }

    /// Sends a batch, suspending only while no progress at all is possible.
    ///
    /// Resolves with the size of the first batch that makes progress, which
    /// may be smaller than `data.len()`: a partially written batch is not
    /// convoyed behind a full channel. Callers wanting the rest call again
    /// with the tail of the slice.
    #[cfg(feature = "async")]
    pub fn send_many<'a>(&'a self, id: ChannelId, data: &'a [u32]) -> SendManyFuture<'a> {
        SendManyFuture::new(self, id, data)
    }
}

#[cfg(feature = "async")]
mod r#async {
    use std::pin::Pin;
    use std::rc::Rc;
    use std::task::{Context, Poll};

    use crate::bus::channel::{self, Queue};
    use crate::bus::error::{ChannelClosed, TrySendError};
    use crate::bus::{Bus, ChannelId};
    use crate::waitlist::Waiter;

    #[must_use = "futures do nothing unless polled"]
    pub struct SendFuture<'a> {
        bus: &'a Bus,
        id: ChannelId,
        value: Option<u32>,
        waiter: Option<Rc<Waiter>>,
    }

    impl<'a> SendFuture<'a> {
        pub(in crate::bus) fn new(bus: &'a Bus, id: ChannelId, value: u32) -> Self {
            Self {
                bus,
                id,
                value: Some(value),
                waiter: None,
            }
        }
    }

    impl Future for SendFuture<'_> {
        type Output = Result<(), ChannelClosed>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            let this = self.get_mut();
            let value = this.value.take().expect("polled after completion");

            let mut wakes = Vec::new();
            let ready = {
                let mut inner = this.bus.inner.borrow_mut();
                match inner.try_send(this.id, value, &mut wakes) {
                    Ok(()) => {
                        channel::unpark(&mut inner, Queue::Send(this.id), &mut this.waiter);
                        Poll::Ready(Ok(()))
                    }
                    Err(TrySendError::Closed) => {
                        // close drained its wait lists, so any entry we had
                        // is already detached
                        this.waiter = None;
                        Poll::Ready(Err(ChannelClosed))
                    }
                    Err(TrySendError::Full) => {
                        this.value = Some(value);
                        channel::park(&mut inner, Queue::Send(this.id), &mut this.waiter, cx.waker());
                        Poll::Pending
                    }
                }
            };
            channel::fire(wakes);
            ready
        }
    }

    impl Drop for SendFuture<'_> {
        fn drop(&mut self) {
            channel::cancel(self.bus, Queue::Send(self.id), &mut self.waiter);
        }
    }

    #[must_use = "futures do nothing unless polled"]
    pub struct SendManyFuture<'a> {
        bus: &'a Bus,
        id: ChannelId,
        data: &'a [u32],
        waiter: Option<Rc<Waiter>>,
    }

    impl<'a> SendManyFuture<'a> {
        pub(in crate::bus) fn new(bus: &'a Bus, id: ChannelId, data: &'a [u32]) -> Self {
            Self {
                bus,
                id,
                data,
                waiter: None,
            }
        }
    }

    impl Future for SendManyFuture<'_> {
        type Output = Result<usize, ChannelClosed>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            let this = self.get_mut();

            let mut wakes = Vec::new();
            let ready = {
                let mut inner = this.bus.inner.borrow_mut();
                match inner.try_send_many(this.id, this.data, &mut wakes) {
                    Ok(n) => {
                        channel::unpark(&mut inner, Queue::Send(this.id), &mut this.waiter);
                        Poll::Ready(Ok(n))
                    }
                    Err(TrySendError::Closed) => {
                        this.waiter = None;
                        Poll::Ready(Err(ChannelClosed))
                    }
                    Err(TrySendError::Full) => {
                        channel::park(&mut inner, Queue::Send(this.id), &mut this.waiter, cx.waker());
                        Poll::Pending
                    }
                }
            };
            channel::fire(wakes);
            ready
        }
    }

    impl Drop for SendManyFuture<'_> {
        fn drop(&mut self) {
            channel::cancel(self.bus, Queue::Send(self.id), &mut self.waiter);
        }
    }
}
