use std::task::Waker;

use crate::bus::channel::{fire, Inner};
use crate::bus::error::TryRecvError;
use crate::bus::{Bus, ChannelId};

#[cfg(feature = "async")]
pub use r#async::{Messages, RecvFuture, RecvManyFuture};

impl Inner {
    pub(super) fn try_recv(
        &mut self,
        id: ChannelId,
        wakes: &mut Vec<Waker>,
    ) -> Result<u32, TryRecvError> {
        let ch = self.channel_mut(id).ok_or(TryRecvError::Closed)?;
        let Some(value) = ch.buffer.pop_front() else {
            return Err(TryRecvError::Empty);
        };
        wakes.extend(ch.send_waiters.wake_one());
        // a freed slot may be the one a broadcaster is waiting for
        wakes.extend(self.broadcast_waiters.wake_one());
        Ok(value)
    }

    pub(super) fn try_recv_many(
        &mut self,
        id: ChannelId,
        out: &mut [u32],
        wakes: &mut Vec<Waker>,
    ) -> Result<usize, TryRecvError> {
        let ch = self.channel_mut(id).ok_or(TryRecvError::Closed)?;
        if out.is_empty() {
            return Ok(0);
        }
        if ch.is_empty() {
            return Err(TryRecvError::Empty);
        }
        let n = ch.pop_many(out);
        wakes.extend(ch.send_waiters.wake_one());
        wakes.extend(self.broadcast_waiters.wake_one());
        Ok(n)
    }
}

impl Bus {
    /// Pops the oldest buffered message, if any.
    ///
    /// Wakes one parked sender and one parked broadcaster on success: the
    /// freed slot may unblock either.
    pub fn try_recv(&self, id: ChannelId) -> Result<u32, TryRecvError> {
        let mut wakes = Vec::new();
        let result = self.inner.borrow_mut().try_recv(id, &mut wakes);
        fire(wakes);
        result
    }

    /// Pops up to `out.len()` messages into `out`, oldest first.
    ///
    /// Returns how many messages were read (at least 1) and wakes one parked
    /// sender and one parked broadcaster. Fails with [`TryRecvError::Empty`]
    /// on an empty buffer; an empty `out` returns `Ok(0)` even when messages
    /// are buffered.
    pub fn try_recv_many(&self, id: ChannelId, out: &mut [u32]) -> Result<usize, TryRecvError> {
        let mut wakes = Vec::new();
        let result = self.inner.borrow_mut().try_recv_many(id, out, &mut wakes);
        fire(wakes);
        result
    }

    /// Receives a message, suspending while the channel is empty.
    ///
    /// Resolves with [`ChannelClosed`](crate::bus::ChannelClosed) if the id
    /// is unknown or the channel is closed while the task is parked.
    ///
    /// # Cancel Safety
    ///
    /// Cancel-safe: no message is popped before the future resolves, and a
    /// wakeup absorbed by a dropped future is forwarded to the next parked
    /// receiver.
    #[cfg(feature = "async")]
    pub fn recv(&self, id: ChannelId) -> RecvFuture<'_> {
        RecvFuture::new(self, id)
    }

    /// Receives a batch, suspending only while the channel is empty.
    ///
    /// Resolves with the first non-empty batch; it never waits around to
    /// fill `out`. Callers wanting more call again.
    #[cfg(feature = "async")]
    pub fn recv_many<'a>(&'a self, id: ChannelId, out: &'a mut [u32]) -> RecvManyFuture<'a> {
        RecvManyFuture::new(self, id, out)
    }

    /// Streams messages off the channel until it is closed.
    ///
    /// The stream parks like [`recv`](Self::recv) while the channel is empty
    /// and terminates once the channel is closed.
    #[cfg(feature = "async")]
    pub fn messages(&self, id: ChannelId) -> Messages<'_> {
        Messages::new(self, id)
    }
}

#[cfg(feature = "async")]
mod r#async {
    use std::pin::Pin;
    use std::rc::Rc;
    use std::task::{Context, Poll};

    use futures::Stream;

    use crate::bus::channel::{self, Queue};
    use crate::bus::error::{ChannelClosed, TryRecvError};
    use crate::bus::{Bus, ChannelId};
    use crate::waitlist::Waiter;

    #[must_use = "futures do nothing unless polled"]
    pub struct RecvFuture<'a> {
        bus: &'a Bus,
        id: ChannelId,
        waiter: Option<Rc<Waiter>>,
    }

    impl<'a> RecvFuture<'a> {
        pub(in crate::bus) fn new(bus: &'a Bus, id: ChannelId) -> Self {
            Self {
                bus,
                id,
                waiter: None,
            }
        }
    }

    impl Future for RecvFuture<'_> {
        type Output = Result<u32, ChannelClosed>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            let this = self.get_mut();

            let mut wakes = Vec::new();
            let ready = {
                let mut inner = this.bus.inner.borrow_mut();
                match inner.try_recv(this.id, &mut wakes) {
                    Ok(value) => {
                        channel::unpark(&mut inner, Queue::Recv(this.id), &mut this.waiter);
                        Poll::Ready(Ok(value))
                    }
                    Err(TryRecvError::Closed) => {
                        this.waiter = None;
                        Poll::Ready(Err(ChannelClosed))
                    }
                    Err(TryRecvError::Empty) => {
                        channel::park(&mut inner, Queue::Recv(this.id), &mut this.waiter, cx.waker());
                        Poll::Pending
                    }
                }
            };
            channel::fire(wakes);
            ready
        }
    }

    impl Drop for RecvFuture<'_> {
        fn drop(&mut self) {
            channel::cancel(self.bus, Queue::Recv(self.id), &mut self.waiter);
        }
    }

    #[must_use = "futures do nothing unless polled"]
    pub struct RecvManyFuture<'a> {
        bus: &'a Bus,
        id: ChannelId,
        out: &'a mut [u32],
        waiter: Option<Rc<Waiter>>,
    }

    impl<'a> RecvManyFuture<'a> {
        pub(in crate::bus) fn new(bus: &'a Bus, id: ChannelId, out: &'a mut [u32]) -> Self {
            Self {
                bus,
                id,
                out,
                waiter: None,
            }
        }
    }

    impl Future for RecvManyFuture<'_> {
        type Output = Result<usize, ChannelClosed>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            let this = self.get_mut();

            let mut wakes = Vec::new();
            let ready = {
                let mut inner = this.bus.inner.borrow_mut();
                match inner.try_recv_many(this.id, this.out, &mut wakes) {
                    Ok(n) => {
                        channel::unpark(&mut inner, Queue::Recv(this.id), &mut this.waiter);
                        Poll::Ready(Ok(n))
                    }
                    Err(TryRecvError::Closed) => {
                        this.waiter = None;
                        Poll::Ready(Err(ChannelClosed))
                    }
                    Err(TryRecvError::Empty) => {
                        channel::park(&mut inner, Queue::Recv(this.id), &mut this.waiter, cx.waker());
                        Poll::Pending
                    }
                }
            };
            channel::fire(wakes);
            ready
        }
    }

    impl Drop for RecvManyFuture<'_> {
        fn drop(&mut self) {
            channel::cancel(self.bus, Queue::Recv(self.id), &mut self.waiter);
        }
    }

    /// Stream of messages off one channel, ending when it closes.
    #[must_use = "streams do nothing unless polled"]
    pub struct Messages<'a> {
        bus: &'a Bus,
        id: ChannelId,
        waiter: Option<Rc<Waiter>>,
    }

    impl<'a> Messages<'a> {
        pub(in crate::bus) fn new(bus: &'a Bus, id: ChannelId) -> Self {
            Self {
                bus,
                id,
                waiter: None,
            }
        }
    }

    impl Stream for Messages<'_> {
        type Item = u32;

        fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<u32>> {
            let this = self.get_mut();

            let mut wakes = Vec::new();
            let ready = {
                let mut inner = this.bus.inner.borrow_mut();
                match inner.try_recv(this.id, &mut wakes) {
                    Ok(value) => {
                        channel::unpark(&mut inner, Queue::Recv(this.id), &mut this.waiter);
                        Poll::Ready(Some(value))
                    }
                    Err(TryRecvError::Closed) => {
                        this.waiter = None;
                        Poll::Ready(None)
                    }
                    Err(TryRecvError::Empty) => {
                        channel::park(&mut inner, Queue::Recv(this.id), &mut this.waiter, cx.waker());
                        Poll::Pending
                    }
                }
            };
            channel::fire(wakes);
            ready
        }
    }

    impl Drop for Messages<'_> {
        fn drop(&mut self) {
            channel::cancel(self.bus, Queue::Recv(self.id), &mut self.waiter);
        }
    }
}
