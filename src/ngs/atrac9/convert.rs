// convert.rs - Decoded PCM to mixer format conversion

//! Conversion of decoded 16-bit PCM into the mixer's interleaved stereo
//! `f32` frames.
//!
//! Mono input is duplicated onto both output channels; stereo input keeps
//! its interleaving. Both paths run at the decoder's rate, no resampling.

/// Channel layout of decoded PCM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Layout for a decoder channel count; anything but 1 is treated as stereo
    pub fn from_channels(channels: u32) -> Self {
        if channels == 1 {
            ChannelLayout::Mono
        } else {
            ChannelLayout::Stereo
        }
    }

    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// Converter from decoded integer samples to interleaved stereo floats.
///
/// Instances are shared between voices and may carry internal state, so
/// callers serialize access.
pub trait SampleConverter: Send {
    /// Convert `frames` frames from `input` into `output`.
    ///
    /// Returns the number of frames written, bounded by the space in
    /// `output` and the samples available in `input`.
    fn convert(&mut self, input: &[i16], frames: usize, output: &mut [f32]) -> usize;
}

/// Default converter: scales by 1/32768 and maps to stereo
#[derive(Debug, Clone, Copy)]
pub struct PcmConverter {
    layout: ChannelLayout,
}

impl PcmConverter {
    pub fn new(layout: ChannelLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }
}

#[inline]
fn sample_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

impl SampleConverter for PcmConverter {
    fn convert(&mut self, input: &[i16], frames: usize, output: &mut [f32]) -> usize {
        let in_channels = self.layout.channels();
        let frames = frames.min(input.len() / in_channels).min(output.len() / 2);

        match self.layout {
            ChannelLayout::Mono => {
                for (out, &sample) in output.chunks_exact_mut(2).zip(&input[..frames]) {
                    let value = sample_to_f32(sample);
                    out[0] = value;
                    out[1] = value;
                }
            }
            ChannelLayout::Stereo => {
                for (out, &sample) in output[..frames * 2].iter_mut().zip(&input[..frames * 2]) {
                    *out = sample_to_f32(sample);
                }
            }
        }

        frames
    }
}
