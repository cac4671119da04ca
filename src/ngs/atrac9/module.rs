// module.rs - ATRAC9 player voice module

//! Per-tick driver of an ATRAC9 player voice.
//!
//! Each tick the mixing engine asks for `granularity` frames. The module
//! decodes superframes until that many are pending, walking the buffer chain
//! as buffers run out, and publishes exactly `granularity` frames. When the
//! chain ends (or the stream cannot be decoded this tick) whatever is left
//! is padded with silence.

use std::ops::Range;
use std::sync::Arc;

use super::callback::CallbackSink;
use super::chain::{advance_if_exhausted, end_if_last_pass, ChainStep};
use super::codec::{Atrac9Decoder, CodecRegistry};
use super::decode::{decode_superframe, StepOutcome};
use super::state::PlaybackState;
use super::types::{Parameters, MAX_BUFFER_PARAMS, OUTPUT_CHANNELS};
use crate::config::SystemOptions;
use crate::ngs::{GuestMemory, VoiceLocks, VoiceState};
use crate::warn_once;

/// What the voice needs after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing left to play until the guest supplies new buffers
    Finished,
    /// More work may remain
    Pending,
}

/// Module data of one ATRAC9 player voice, guarded by the voice lock
pub struct Atrac9Voice {
    pub(crate) registry: Arc<CodecRegistry>,
    pub(crate) state: PlaybackState,
    pub(crate) decoder: Option<Box<dyn Atrac9Decoder>>,
    last_config: u32,
    product: Range<usize>,
}

impl Atrac9Voice {
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self {
            registry,
            state: PlaybackState::new(),
            decoder: None,
            last_config: 0,
            product: 0..0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Interleaved stereo frames published by the last tick. Empty when the
    /// tick had nothing to play.
    pub fn product(&self) -> &[f32] {
        self.state.backlog().get(self.product.clone()).unwrap_or_default()
    }

    /// React to a change of the owning voice's state
    pub fn on_state_change(&mut self, voice_state: VoiceState) {
        match voice_state {
            VoiceState::Available => {
                self.state.reset();
                self.product = 0..0;
            }
            VoiceState::KeyedOff => self.state.reset_since_key_on(),
            VoiceState::Active | VoiceState::Paused => {}
        }
    }

    /// Make sure the decoder matches the configuration word
    fn ensure_decoder(&mut self, config_data: u32) {
        if self.decoder.is_none() || config_data != self.last_config {
            log::debug!("Building ATRAC9 decoder for config {:#010x}", config_data);
            self.decoder = Some(self.registry.decoder(config_data));
            self.last_config = config_data;
        }
    }

    /// Publish the whole backlog padded with silence to `granularity` frames
    fn publish_padded(&mut self, granularity: u32) {
        self.state.pad_to(granularity as usize);
        self.product = 0..granularity as usize * OUTPUT_CHANNELS;
        self.state.consume_all();
    }

    /// Run one tick.
    ///
    /// Entered with the scheduler and voice locks held; both are released
    /// around every callback to `sink`.
    pub fn process<S, M, K>(
        locks: &mut VoiceLocks<'_, S, Atrac9Voice>,
        params: &Parameters,
        memory: &M,
        options: &SystemOptions,
        sink: &mut K,
    ) -> TickOutcome
    where
        M: GuestMemory + ?Sized,
        K: CallbackSink + ?Sized,
    {
        let granularity = options.granularity;
        let voice: &mut Atrac9Voice = &mut **locks;
        voice.product = 0..0;

        match params.buffer(voice.state.current_buffer) {
            Some(slot) if !slot.buffer.is_null() => {}
            _ => return TickOutcome::Finished,
        }

        if !params.is_nominal_rate() {
            warn_once!(
                "Playback rate scaling not implemented for the ATRAC9 player \
                 (frequency {}, scalar {})",
                params.playback_frequency,
                params.playback_scalar
            );
        }

        voice.ensure_decoder(params.config_data);
        voice.state.compact();

        // transitions in a row that produced no samples since the previous one
        let mut idle_transitions = 0usize;
        let mut generated_at_transition = voice.state.samples_generated_total;

        while locks.state.decoded_samples_pending < granularity {
            let exhausted = match advance_if_exhausted(locks, params, sink) {
                ChainStep::Advanced => {
                    let generated = locks.state.samples_generated_total;
                    if generated == generated_at_transition {
                        idle_transitions += 1;
                    } else {
                        idle_transitions = 0;
                        generated_at_transition = generated;
                    }
                    if idle_transitions > MAX_BUFFER_PARAMS {
                        warn_once!("ATRAC9 buffer chain keeps looping without producing samples");
                        locks.publish_padded(granularity);
                        return TickOutcome::Pending;
                    }
                    false
                }
                ChainStep::EndOfData => true,
                ChainStep::HasData => match decode_superframe(locks, params, memory, sink) {
                    StepOutcome::Decoded => false,
                    StepOutcome::Failed => {
                        // recoverable: the next tick picks up after the bad superframe
                        locks.publish_padded(granularity);
                        return TickOutcome::Pending;
                    }
                    StepOutcome::ShortBuffer => {
                        // the slot stays put unless nothing would follow it
                        end_if_last_pass(locks, params, sink);
                        true
                    }
                },
            };

            if exhausted {
                let voice: &mut Atrac9Voice = &mut **locks;
                voice.publish_padded(granularity);
                voice.state.reset_since_key_on();
                return TickOutcome::Finished;
            }
        }

        let voice: &mut Atrac9Voice = &mut **locks;
        let start = voice.state.decoded_passed as usize * OUTPUT_CHANNELS;
        voice.product = start..start + granularity as usize * OUTPUT_CHANNELS;
        voice.state.consume(granularity);

        TickOutcome::Pending
    }
}

impl AsMut<PlaybackState> for Atrac9Voice {
    fn as_mut(&mut self) -> &mut PlaybackState {
        &mut self.state
    }
}

impl std::fmt::Debug for Atrac9Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atrac9Voice")
            .field("state", &self.state)
            .field("has_decoder", &self.decoder.is_some())
            .field("last_config", &self.last_config)
            .field("product", &self.product)
            .finish()
    }
}
