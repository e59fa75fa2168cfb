//! Cooperative message bus for single-threaded async tasks.
//!
//! `filovia` connects tasks running on one executor thread through a dynamic
//! set of bounded FIFO channels carrying `u32` messages, plus a bus-wide
//! all-or-nothing broadcast. Blocked operations suspend the calling task and
//! resume it through FIFO wait lists; nothing spins and nothing locks.
//!
//! See [`bus`] for the full protocol and examples.

pub mod bus;
mod waitlist;
