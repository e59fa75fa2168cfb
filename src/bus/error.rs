use std::error::Error;
use std::fmt;

/// The id does not name an open channel.
///
/// Suspending operations also resolve with this when the channel is closed
/// while the caller is parked on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

impl fmt::Display for ChannelClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel is closed")
    }
}

impl Error for ChannelClosed {}

/// No channel is open on the bus, so a broadcast can never complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoChannels;

impl fmt::Display for NoChannels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no channels are open on the bus")
    }
}

impl Error for NoChannels {}

/// Thrown by [`try_send`](crate::bus::Bus::try_send) and
/// [`try_send_many`](crate::bus::Bus::try_send_many).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrySendError {
    /// The channel has no free slot.
    Full,
    /// The id does not name an open channel.
    Closed,
}

impl TrySendError {
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for TrySendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "channel is full"),
            Self::Closed => write!(f, "channel is closed"),
        }
    }
}

impl Error for TrySendError {}

/// Thrown by [`try_recv`](crate::bus::Bus::try_recv) and
/// [`try_recv_many`](crate::bus::Bus::try_recv_many).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// The channel has no buffered message.
    Empty,
    /// The id does not name an open channel.
    Closed,
}

impl TryRecvError {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "channel is empty"),
            Self::Closed => write!(f, "channel is closed"),
        }
    }
}

impl Error for TryRecvError {}

/// Thrown by [`try_broadcast`](crate::bus::Bus::try_broadcast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryBroadcastError {
    /// At least one open channel has no free slot, and a broadcast is
    /// all-or-nothing.
    Full,
    /// No channel is open on the bus.
    NoChannels,
}

impl TryBroadcastError {
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    pub fn is_no_channels(&self) -> bool {
        matches!(self, Self::NoChannels)
    }
}

impl fmt::Display for TryBroadcastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "a channel is full"),
            Self::NoChannels => write!(f, "no channels are open on the bus"),
        }
    }
}

impl Error for TryBroadcastError {}
