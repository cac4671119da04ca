// state.rs - Per-voice playback state of the ATRAC9 player

//! Playback position, counters and the decoded PCM backlog of one voice.
//!
//! The backlog holds interleaved stereo `f32` frames. Frames before
//! `decoded_passed` were already published; the `decoded_samples_pending`
//! frames after it are waiting for a tick.

use super::types::OUTPUT_CHANNELS;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    // Counters wrap like the guest's 32-bit fields
    /// Current chain slot, or `NO_BUFFER` once the chain ended
    pub current_buffer: i32,
    pub current_byte_position_in_buffer: u32,
    pub current_loop_count: i32,
    pub samples_generated_since_key_on: u32,
    pub bytes_consumed_since_key_on: u32,
    pub samples_generated_total: u32,
    pub total_bytes_consumed: u32,
    /// Decoded frames not yet published
    pub decoded_samples_pending: u32,
    /// Frames at the front of the backlog already published
    pub decoded_passed: u32,
    backlog: Vec<f32>,
}

impl PlaybackState {
    pub fn new() -> Self {
        PlaybackState {
            current_buffer: 0,
            current_byte_position_in_buffer: 0,
            current_loop_count: 0,
            samples_generated_since_key_on: 0,
            bytes_consumed_since_key_on: 0,
            samples_generated_total: 0,
            total_bytes_consumed: 0,
            decoded_samples_pending: 0,
            decoded_passed: 0,
            backlog: Vec::new(),
        }
    }

    /// Back to the start of the chain with nothing decoded
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Retrigger: counters restart, the buffer position is kept
    pub fn reset_since_key_on(&mut self) {
        self.samples_generated_since_key_on = 0;
        self.bytes_consumed_since_key_on = 0;
    }

    /// Interleaved frames currently held, published or not
    pub fn backlog(&self) -> &[f32] {
        &self.backlog
    }

    /// Frames currently held, published or not
    pub fn backlog_frames(&self) -> usize {
        self.backlog.len() / OUTPUT_CHANNELS
    }

    /// Drop frames that were already published from the front of the backlog
    pub fn compact(&mut self) {
        if self.decoded_passed == 0 {
            return;
        }
        let passed = (self.decoded_passed as usize * OUTPUT_CHANNELS).min(self.backlog.len());
        self.backlog.drain(..passed);
        self.decoded_passed = 0;
    }

    /// Append freshly decoded interleaved frames
    pub fn push_decoded(&mut self, frames: &[f32]) {
        debug_assert_eq!(frames.len() % OUTPUT_CHANNELS, 0);
        self.backlog.extend_from_slice(frames);
        let count = (frames.len() / OUTPUT_CHANNELS) as u32;
        self.decoded_samples_pending += count;
        self.samples_generated_since_key_on = self.samples_generated_since_key_on.wrapping_add(count);
        self.samples_generated_total = self.samples_generated_total.wrapping_add(count);
    }

    /// Record encoded bytes handed to the decoder
    pub fn add_bytes_consumed(&mut self, bytes: u32) {
        self.bytes_consumed_since_key_on = self.bytes_consumed_since_key_on.wrapping_add(bytes);
        self.total_bytes_consumed = self.total_bytes_consumed.wrapping_add(bytes);
    }

    /// Pad with silence until the backlog holds at least `frames` frames
    pub fn pad_to(&mut self, frames: usize) {
        let len = frames * OUTPUT_CHANNELS;
        if self.backlog.len() < len {
            self.backlog.resize(len, 0.0);
        }
    }

    /// Mark `frames` frames starting at the cursor as published
    pub fn consume(&mut self, frames: u32) {
        self.decoded_samples_pending = self.decoded_samples_pending.saturating_sub(frames);
        self.decoded_passed += frames;
    }

    /// Mark everything in the backlog as published, padding included
    pub fn consume_all(&mut self) {
        self.decoded_samples_pending = 0;
        self.decoded_passed = self.backlog_frames() as u32;
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl AsMut<PlaybackState> for PlaybackState {
    fn as_mut(&mut self) -> &mut PlaybackState {
        self
    }
}
