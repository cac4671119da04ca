//! Shared fixtures for the ATRAC9 player tests: a scripted decoder, a
//! recording converter and a harness that runs ticks under real locks.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use ngs_atrac9::config::SystemOptions;
use ngs_atrac9::ngs::atrac9::{
    make_config, Atrac9Decoder, Atrac9Event, Atrac9Voice, ChannelLayout, CodecRegistry,
    DecodeError, DecodeResult, DecoderQuery, Parameters, PcmConverter, SampleConverter,
    StreamFormat, TickOutcome,
};
use ngs_atrac9::ngs::VoiceLocks;

/// First byte of a frame the stub decoder rejects
pub const BAD_FRAME: u8 = 0xFF;

pub const FRAME_BYTES: usize = 16;
pub const FRAMES_PER_SUPERFRAME: usize = 2;
pub const SUPERFRAME_BYTES: usize = FRAME_BYTES * FRAMES_PER_SUPERFRAME;
pub const SAMPLES_PER_FRAME: usize = 64;
pub const SAMPLES_PER_SUPERFRAME: usize = SAMPLES_PER_FRAME * FRAMES_PER_SUPERFRAME;

/// 64 samples per frame, 16-byte frames, two frames per superframe
pub fn test_config() -> u32 {
    make_config(0, 0, FRAME_BYTES as u32, 1)
}

/// Sample value the stub decoder produces for a frame starting with `byte`
pub fn frame_value(byte: u8) -> f32 {
    (byte as i16 * 256) as f32 / 32768.0
}

#[derive(Debug, Default)]
pub struct StubStats {
    pub configured: Vec<u32>,
    pub frames_sent: usize,
    pub cleared: usize,
}

/// Decoder whose frames decode to a constant: the frame's first byte.
///
/// A rejected frame leaves the decoder failing until `clear_context`.
pub struct StubDecoder {
    format: StreamFormat,
    channels: u32,
    errored: bool,
    value: i16,
    stats: Arc<Mutex<StubStats>>,
}

impl StubDecoder {
    pub fn new(channels: u32, stats: Arc<Mutex<StubStats>>) -> Self {
        Self {
            format: StreamFormat::from_config(0),
            channels,
            errored: false,
            value: 0,
            stats,
        }
    }
}

impl Atrac9Decoder for StubDecoder {
    fn configure(&mut self, config_data: u32) {
        self.format = StreamFormat::from_config(config_data);
        self.errored = false;
        self.stats.lock().configured.push(config_data);
    }

    fn get(&self, query: DecoderQuery) -> u32 {
        match query {
            DecoderQuery::Channels => self.channels,
            DecoderQuery::SampleRate => 48000,
            DecoderQuery::SuperframeSize => self.format.bytes_per_superframe(),
            DecoderQuery::FramesInSuperframe => self.format.frames_per_superframe(),
            DecoderQuery::SamplesPerFrame => self.format.samples_per_frame(),
            DecoderQuery::SamplesPerSuperframe => self.format.samples_per_superframe(),
        }
    }

    fn send(&mut self, input: &[u8]) -> DecodeResult<()> {
        self.stats.lock().frames_sent += 1;
        if self.errored {
            return Err(DecodeError::InvalidFrame);
        }
        let needed = self.format.frame_bytes as usize;
        if input.len() < needed {
            return Err(DecodeError::Truncated {
                needed,
                available: input.len(),
            });
        }
        if input[0] == BAD_FRAME {
            self.errored = true;
            return Err(DecodeError::InvalidFrame);
        }
        self.value = input[0] as i16 * 256;
        Ok(())
    }

    fn receive(&mut self, output: &mut [i16]) -> usize {
        let channels = self.channels as usize;
        let frames = self.format.samples_per_frame() as usize;
        for frame in output.chunks_exact_mut(channels).take(frames) {
            frame[0] = self.value;
            if channels == 2 {
                frame[1] = -self.value;
            }
        }
        frames
    }

    fn es_size(&self) -> u32 {
        self.format.frame_bytes
    }

    fn clear_context(&mut self) {
        self.errored = false;
        self.stats.lock().cleared += 1;
    }
}

/// Converter that records which layout each call used
pub struct RecordingConverter {
    inner: PcmConverter,
    calls: Arc<Mutex<Vec<ChannelLayout>>>,
}

impl SampleConverter for RecordingConverter {
    fn convert(&mut self, input: &[i16], frames: usize, output: &mut [f32]) -> usize {
        self.calls.lock().push(self.inner.layout());
        self.inner.convert(input, frames, output)
    }
}

/// Write frames whose bytes are all `value`, back to back from `address`
pub fn write_frames(memory: &mut [u8], address: u32, values: &[u8]) {
    for (i, &value) in values.iter().enumerate() {
        let at = address as usize + i * FRAME_BYTES;
        memory[at..at + FRAME_BYTES].fill(value);
    }
}

/// One voice with its locks, guest memory and a recording callback sink
pub struct Harness {
    pub scheduler: ReentrantMutex<()>,
    pub voice: Mutex<Atrac9Voice>,
    pub memory: Vec<u8>,
    pub params: Parameters,
    pub options: SystemOptions,
    pub events: Vec<Atrac9Event>,
    pub product: Vec<f32>,
    pub stats: Arc<Mutex<StubStats>>,
    pub conversions: Arc<Mutex<Vec<ChannelLayout>>>,
}

impl Harness {
    pub fn new(granularity: u32) -> Self {
        Self::with_channels(granularity, 1)
    }

    pub fn with_channels(granularity: u32, channels: u32) -> Self {
        let stats = Arc::new(Mutex::new(StubStats::default()));
        let conversions = Arc::new(Mutex::new(Vec::new()));

        let decoder_stats = Arc::clone(&stats);
        let converter_calls = Arc::clone(&conversions);
        let registry = CodecRegistry::with_converters(
            move || {
                Box::new(StubDecoder::new(channels, Arc::clone(&decoder_stats)))
                    as Box<dyn Atrac9Decoder>
            },
            move |layout| {
                Box::new(RecordingConverter {
                    inner: PcmConverter::new(layout),
                    calls: Arc::clone(&converter_calls),
                }) as Box<dyn SampleConverter>
            },
        );

        Self {
            scheduler: ReentrantMutex::new(()),
            voice: Mutex::new(Atrac9Voice::new(Arc::new(registry))),
            memory: vec![0u8; 0x4000],
            params: Parameters::new(test_config()),
            options: SystemOptions::new(granularity, 48000).unwrap(),
            events: Vec::new(),
            product: Vec::new(),
            stats,
            conversions,
        }
    }

    /// Run one tick and keep a copy of what it published
    pub fn tick(&mut self) -> TickOutcome {
        let mut locks = VoiceLocks::new(self.scheduler.lock(), self.voice.lock());
        let events = &mut self.events;
        let mut sink = |event: Atrac9Event| events.push(event);
        let outcome = Atrac9Voice::process(
            &mut locks,
            &self.params,
            &self.memory,
            &self.options,
            &mut sink,
        );
        self.product = locks.product().to_vec();
        outcome
    }

    /// Left channel of the last published product
    pub fn left(&self) -> Vec<f32> {
        self.product.iter().step_by(2).copied().collect()
    }
}

/// `count` copies of the value for frame byte `byte`
pub fn run_of(byte: u8, count: usize) -> Vec<f32> {
    vec![frame_value(byte); count]
}
