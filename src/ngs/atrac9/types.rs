// types.rs - Parameter block and constants for the ATRAC9 player

//! Guest-visible parameter block of an ATRAC9 player voice.
//!
//! The guest fills these before each tick; the module only reads them.

use crate::config::NOMINAL_SAMPLE_RATE;
use crate::ngs::Address;

/// Number of chained buffer slots per voice
pub const MAX_BUFFER_PARAMS: usize = 4;

/// `loop_count` value meaning "loop forever"
pub const LOOP_INFINITE: i32 = -1;

/// `next_buffer_index` / current buffer value meaning "end of chain"
pub const NO_BUFFER: i32 = -1;

/// Interleaved channels in the published PCM
pub const OUTPUT_CHANNELS: usize = 2;

/// One slot of the buffer chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferParameters {
    pub buffer: Address,
    pub bytes_count: u32,
    /// Extra plays before moving on; [`LOOP_INFINITE`] never moves on
    pub loop_count: i16,
    /// Slot to continue with, or [`NO_BUFFER`]
    pub next_buffer_index: i16,
    pub samples_discard_start_off: u16,
    pub samples_discard_end_off: u16,
}

impl BufferParameters {
    pub const EMPTY: BufferParameters = BufferParameters {
        buffer: Address::NULL,
        bytes_count: 0,
        loop_count: 0,
        next_buffer_index: NO_BUFFER as i16,
        samples_discard_start_off: 0,
        samples_discard_end_off: 0,
    };

    /// Slot that plays once and ends the chain
    pub fn once(buffer: Address, bytes_count: u32) -> Self {
        Self {
            buffer,
            bytes_count,
            ..Self::EMPTY
        }
    }

    pub fn with_loop_count(mut self, loop_count: i16) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn with_next(mut self, next_buffer_index: i16) -> Self {
        self.next_buffer_index = next_buffer_index;
        self
    }

    pub fn with_discard(mut self, start: u16, end: u16) -> Self {
        self.samples_discard_start_off = start;
        self.samples_discard_end_off = end;
        self
    }

    pub fn loops_forever(&self) -> bool {
        self.loop_count as i32 == LOOP_INFINITE
    }
}

impl Default for BufferParameters {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Full parameter block of a player voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub buffer_params: [BufferParameters; MAX_BUFFER_PARAMS],
    pub playback_frequency: f32,
    pub playback_scalar: f32,
    pub config_data: u32,
}

impl Parameters {
    pub fn new(config_data: u32) -> Self {
        Self {
            buffer_params: [BufferParameters::EMPTY; MAX_BUFFER_PARAMS],
            playback_frequency: NOMINAL_SAMPLE_RATE as f32,
            playback_scalar: 1.0,
            config_data,
        }
    }

    /// Slot at a chain index; out-of-range and terminal indices give `None`
    pub fn buffer(&self, index: i32) -> Option<&BufferParameters> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.buffer_params.get(i))
    }

    /// Whether the voice plays at the nominal rate without scaling
    pub fn is_nominal_rate(&self) -> bool {
        self.playback_frequency == NOMINAL_SAMPLE_RATE as f32 && self.playback_scalar == 1.0
    }
}
