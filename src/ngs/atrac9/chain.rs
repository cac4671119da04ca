// chain.rs - Buffer chain walking for the ATRAC9 player

//! Moves a voice along its chain of up to four buffer slots.
//!
//! When the read position reaches the end of the current slot the slot
//! either loops onto itself or hands over to `next_buffer_index`, and the
//! guest is told about it. Empty slots are skipped without callbacks.

use super::callback::{Atrac9Event, CallbackSink};
use super::state::PlaybackState;
use super::types::{BufferParameters, Parameters, MAX_BUFFER_PARAMS, NO_BUFFER};
use crate::ngs::VoiceLocks;

/// Result of checking the current slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStep {
    /// The current slot still has unread bytes
    HasData,
    /// Playback moved (or looped) to a slot with data
    Advanced,
    /// The chain is finished
    EndOfData,
}

/// Follow `next_buffer_index` from `start` until a slot with data is found,
/// taking at most one hop per slot.
pub fn find_non_empty(params: &Parameters, start: i32) -> Option<i32> {
    let mut index = start;
    for _ in 0..MAX_BUFFER_PARAMS {
        let slot = params.buffer(index)?;
        if slot.bytes_count > 0 {
            return Some(index);
        }
        index = next_slot(params, slot)?.0;
    }
    params
        .buffer(index)
        .filter(|slot| slot.bytes_count > 0)
        .map(|_| index)
}

/// Index of the slot following `slot`, or `None` at the end of the chain.
/// An out-of-range index is logged and treated as the end.
pub fn next_slot<'p>(
    params: &'p Parameters,
    slot: &BufferParameters,
) -> Option<(i32, &'p BufferParameters)> {
    let next = slot.next_buffer_index as i32;
    if let Some(next_params) = params.buffer(next) {
        return Some((next, next_params));
    }
    if next != NO_BUFFER {
        log::warn!("ATRAC9 buffer chain points at invalid slot {}", next);
    }
    None
}

/// Whether exhausting the current slot would end the chain
pub fn is_last_pass(params: &Parameters, state: &PlaybackState) -> bool {
    match params.buffer(state.current_buffer) {
        Some(slot) => {
            !slot.loops_forever()
                && state.current_loop_count + 1 > slot.loop_count as i32
                && params.buffer(slot.next_buffer_index as i32).is_none()
        }
        None => true,
    }
}

/// Skip the unread tail of the current slot if it is the last thing the
/// chain will play, reporting the end of data. Returns whether it did.
pub fn end_if_last_pass<S, V, K>(
    locks: &mut VoiceLocks<'_, S, V>,
    params: &Parameters,
    sink: &mut K,
) -> bool
where
    V: AsMut<PlaybackState>,
    K: CallbackSink + ?Sized,
{
    let state: &mut PlaybackState = (**locks).as_mut();
    if !is_last_pass(params, state) {
        return false;
    }
    if let Some(slot) = params.buffer(state.current_buffer) {
        state.current_byte_position_in_buffer = slot.bytes_count;
    }
    advance_if_exhausted(locks, params, sink);
    true
}

/// Check whether the current slot is exhausted and, if so, move along the
/// chain. Callbacks are delivered with both lock scopes released.
pub fn advance_if_exhausted<S, V, K>(
    locks: &mut VoiceLocks<'_, S, V>,
    params: &Parameters,
    sink: &mut K,
) -> ChainStep
where
    V: AsMut<PlaybackState>,
    K: CallbackSink + ?Sized,
{
    let state: &mut PlaybackState = (**locks).as_mut();

    let Some(slot) = params.buffer(state.current_buffer) else {
        state.current_buffer = NO_BUFFER;
        return ChainStep::EndOfData;
    };
    if state.current_byte_position_in_buffer < slot.bytes_count {
        return ChainStep::HasData;
    }

    let mut events = Vec::with_capacity(2);
    state.current_loop_count += 1;

    if !slot.loops_forever() && state.current_loop_count > slot.loop_count as i32 {
        state.current_loop_count = 0;
        match next_slot(params, slot) {
            Some((next, next_params)) => {
                state.current_buffer = next;
                events.push(Atrac9Event::SwappedBuffer {
                    loop_count: 0,
                    buffer: next_params.buffer,
                });
            }
            None => {
                state.current_buffer = NO_BUFFER;
                events.push(Atrac9Event::EndOfData);
            }
        }
    } else {
        // Looping onto the same slot is reported as a swap as well
        let loop_count = state.current_loop_count;
        events.push(Atrac9Event::SwappedBuffer {
            loop_count,
            buffer: slot.buffer,
        });
        events.push(Atrac9Event::LoopedBuffer {
            loop_count,
            buffer: slot.buffer,
        });
    }
    state.current_byte_position_in_buffer = 0;

    log::trace!(
        "ATRAC9 buffer exhausted, now at slot {} (loop {})",
        state.current_buffer,
        state.current_loop_count
    );

    locks.unlocked(|| {
        for event in events {
            sink.invoke(event);
        }
    });

    let state: &mut PlaybackState = (**locks).as_mut();
    if state.current_buffer == NO_BUFFER {
        return ChainStep::EndOfData;
    }

    match find_non_empty(params, state.current_buffer) {
        Some(index) => {
            state.current_buffer = index;
            ChainStep::Advanced
        }
        None => {
            state.current_buffer = NO_BUFFER;
            locks.unlocked(|| sink.invoke(Atrac9Event::EndOfData));
            ChainStep::EndOfData
        }
    }
}
