// callback.rs - Guest callbacks raised by the ATRAC9 player

//! Lifecycle events delivered to the guest's module callback.
//!
//! The guest sees a reason code plus two integer arguments; [`Atrac9Event`]
//! keeps them typed until they reach the [`CallbackSink`].

use crate::ngs::Address;

/// Reason codes passed to guest callbacks
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackReason {
    EndOfData = 0,
    SwappedBuffer = 1,
    DecodeError = 2,
    LoopedBuffer = 3,
}

/// Event raised while walking the buffer chain or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atrac9Event {
    /// The chain reached a terminal slot
    EndOfData,
    /// Playback moved to a buffer (also raised when a buffer loops onto itself)
    SwappedBuffer { loop_count: i32, buffer: Address },
    /// A buffer looped onto itself
    LoopedBuffer { loop_count: i32, buffer: Address },
    /// A superframe failed to decode
    DecodeError { byte_offset: u32, buffer: Address },
}

impl Atrac9Event {
    pub fn reason(&self) -> CallbackReason {
        match self {
            Atrac9Event::EndOfData => CallbackReason::EndOfData,
            Atrac9Event::SwappedBuffer { .. } => CallbackReason::SwappedBuffer,
            Atrac9Event::LoopedBuffer { .. } => CallbackReason::LoopedBuffer,
            Atrac9Event::DecodeError { .. } => CallbackReason::DecodeError,
        }
    }

    /// The two integer arguments in guest calling order
    pub fn args(&self) -> (i32, u32) {
        match *self {
            Atrac9Event::EndOfData => (0, 0),
            Atrac9Event::SwappedBuffer { loop_count, buffer }
            | Atrac9Event::LoopedBuffer { loop_count, buffer } => (loop_count, buffer.0),
            Atrac9Event::DecodeError {
                byte_offset,
                buffer,
            } => (byte_offset as i32, buffer.0),
        }
    }
}

/// Receiver of player events.
///
/// Always invoked with the scheduler and voice locks released, so an
/// implementation may call back into the scheduler.
pub trait CallbackSink {
    fn invoke(&mut self, event: Atrac9Event);
}

impl<F: FnMut(Atrac9Event)> CallbackSink for F {
    fn invoke(&mut self, event: Atrac9Event) {
        self(event)
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl CallbackSink for NullSink {
    fn invoke(&mut self, _event: Atrac9Event) {}
}
