// decode.rs - One superframe of ATRAC9 decode

//! Decodes the superframe at the current read position of a voice.
//!
//! Encoder padding is trimmed here: `samples_discard_start_off` samples are
//! dropped from the first superframes of a buffer and
//! `samples_discard_end_off` from the last ones, both clamped to a single
//! superframe per step.

use super::callback::{Atrac9Event, CallbackSink};
use super::codec::{DecodeError, DecoderQuery};
use super::convert::ChannelLayout;
use super::module::Atrac9Voice;
use super::types::{BufferParameters, Parameters, OUTPUT_CHANNELS};
use crate::ngs::{GuestMemory, VoiceLocks};
use crate::error_once;

/// Result of one decode step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A superframe was decoded and its trimmed samples appended
    Decoded,
    /// A frame failed; the superframe was skipped and reported
    Failed,
    /// The unread remainder is not a whole superframe (or not readable);
    /// nothing was consumed
    ShortBuffer,
}

/// Samples of one superframe kept after padding removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    /// Decoded samples skipped at the front
    pub start: u32,
    /// Samples kept after `start`
    pub len: u32,
}

/// Work out which decoded samples of the superframe at `byte_offset`
/// survive padding removal.
///
/// `remaining` is the number of unread bytes from `byte_offset` to the end
/// of the buffer and must be at least one superframe.
pub fn trim_window(
    slot: &BufferParameters,
    byte_offset: u32,
    remaining: u32,
    superframe_size: u32,
    samples_per_superframe: u32,
) -> TrimWindow {
    let mut start = 0;
    let mut len = samples_per_superframe;

    let sample_index = (byte_offset / superframe_size).saturating_mul(samples_per_superframe);
    let discard_start = slot.samples_discard_start_off as u32;
    if discard_start > sample_index {
        let skipped = samples_per_superframe.min(discard_start - sample_index);
        start += skipped;
        len -= skipped;
    }

    let superframes_after = (remaining / superframe_size).saturating_sub(1);
    let samples_left_after = superframes_after.saturating_mul(samples_per_superframe);
    let discard_end = slot.samples_discard_end_off as u32;
    if discard_end > samples_left_after {
        let skipped = samples_per_superframe.min(discard_end - samples_left_after);
        len = len.saturating_sub(skipped);
    }

    TrimWindow { start, len }
}

/// Decode the superframe at the read position of the current slot.
///
/// The caller has made sure the current slot has unread bytes and the voice
/// has a decoder for `params.config_data`.
pub fn decode_superframe<S, M, K>(
    locks: &mut VoiceLocks<'_, S, Atrac9Voice>,
    params: &Parameters,
    memory: &M,
    sink: &mut K,
) -> StepOutcome
where
    M: GuestMemory + ?Sized,
    K: CallbackSink + ?Sized,
{
    let voice: &mut Atrac9Voice = &mut **locks;
    let registry = &voice.registry;
    let state = &mut voice.state;
    let Some(decoder) = voice.decoder.as_mut() else {
        error_once!("ATRAC9 decode attempted without a configured decoder");
        return StepOutcome::ShortBuffer;
    };
    let Some(slot) = params.buffer(state.current_buffer).copied() else {
        return StepOutcome::ShortBuffer;
    };

    let superframe_start = state.current_byte_position_in_buffer;
    let superframe_size = decoder.get(DecoderQuery::SuperframeSize);
    let remaining = slot.bytes_count.saturating_sub(superframe_start);
    if superframe_size == 0 || remaining < superframe_size {
        error_once!(
            "The supplied buffer isn't big enough for an ATRAC9 superframe or isn't aligned \
             ({} bytes left, superframe is {} bytes)",
            remaining,
            superframe_size
        );
        return StepOutcome::ShortBuffer;
    }

    let input = slot
        .buffer
        .offset(superframe_start)
        .and_then(|address| memory.read(address, superframe_size as usize));
    let Some(input) = input else {
        error_once!(
            "ATRAC9 buffer at {:#x} is not readable guest memory",
            slot.buffer.0
        );
        return StepOutcome::ShortBuffer;
    };

    let channels = decoder.get(DecoderQuery::Channels).max(1);
    let frames_in_superframe = decoder.get(DecoderQuery::FramesInSuperframe);
    let samples_per_frame = decoder.get(DecoderQuery::SamplesPerFrame) as usize;
    let samples_per_superframe = decoder.get(DecoderQuery::SamplesPerSuperframe);

    let window = trim_window(
        &slot,
        superframe_start,
        remaining,
        superframe_size,
        samples_per_superframe,
    );

    let converter = registry.converter(ChannelLayout::from_channels(channels));
    let mut converter = converter.lock();
    let mut decoded = vec![0.0f32; samples_per_superframe as usize * OUTPUT_CHANNELS];
    let mut frame_pcm = vec![0i16; samples_per_frame * channels as usize];
    let mut produced = 0usize;
    let mut frame_pos = 0usize;
    let mut failed = false;

    // decode a whole superframe at a time
    for frame in 0..frames_in_superframe {
        let sent = match input.get(frame_pos..) {
            Some(bytes) => decoder.send(bytes),
            None => Err(DecodeError::Truncated {
                needed: frame_pos,
                available: input.len(),
            }),
        };
        if let Err(err) = sent {
            log::trace!("ATRAC9 frame {} at byte {:#x} failed: {}", frame, superframe_start, err);
            failed = true;
            break;
        }

        let frames = decoder.receive(&mut frame_pcm);
        let out = decoded.get_mut(produced * OUTPUT_CHANNELS..).unwrap_or_default();
        produced += converter.convert(&frame_pcm, frames, out);

        let es_size = decoder.es_size();
        frame_pos += es_size as usize;
        state.current_byte_position_in_buffer =
            state.current_byte_position_in_buffer.saturating_add(es_size);
    }
    drop(converter);

    state.add_bytes_consumed(superframe_size);

    if failed {
        // the partial superframe is dropped and decoding resumes after it
        state.current_byte_position_in_buffer = superframe_start + superframe_size;
        let event = Atrac9Event::DecodeError {
            byte_offset: superframe_start,
            buffer: slot.buffer,
        };
        locks.unlocked(|| sink.invoke(event));

        // clear the context or the next superframe fails as well
        if let Some(decoder) = locks.decoder.as_mut() {
            decoder.clear_context();
        }
        return StepOutcome::Failed;
    }

    let start = (window.start as usize).min(produced);
    let end = (start + window.len as usize).min(produced);
    state.push_decoded(&decoded[start * OUTPUT_CHANNELS..end * OUTPUT_CHANNELS]);

    StepOutcome::Decoded
}
