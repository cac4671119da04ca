// codec.rs - Decoder capability and shared codec registry

//! The ATRAC9 bitstream decoder is an external capability: this crate only
//! drives it. [`Atrac9Decoder`] is the seam, [`CodecRegistry`] hands out
//! decoders per configuration word and converters per channel layout.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::convert::{ChannelLayout, PcmConverter, SampleConverter};

/// Error type for decoder operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid ATRAC9 frame")]
    InvalidFrame,

    #[error("Frame truncated: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Decoder not configured")]
    NotConfigured,
}

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Values a decoder reports about its configured stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderQuery {
    Channels,
    SampleRate,
    SuperframeSize,
    FramesInSuperframe,
    SamplesPerFrame,
    SamplesPerSuperframe,
}

/// Stateful ATRAC9 frame decoder
pub trait Atrac9Decoder: Send {
    /// Apply a configuration word; resets the bitstream context
    fn configure(&mut self, config_data: u32);

    fn get(&self, query: DecoderQuery) -> u32;

    /// Submit the compressed frame at the start of `input`
    fn send(&mut self, input: &[u8]) -> DecodeResult<()>;

    /// Write the last decoded frame as interleaved `i16` into `output`,
    /// returning the number of frames written
    fn receive(&mut self, output: &mut [i16]) -> usize;

    /// Encoded size in bytes of the last submitted frame
    fn es_size(&self) -> u32;

    /// Forget any error state left by a failed frame
    fn clear_context(&mut self);
}

/// Creates unconfigured decoders
pub trait DecoderFactory: Send + Sync {
    fn create(&self) -> Box<dyn Atrac9Decoder>;
}

impl<F> DecoderFactory for F
where
    F: Fn() -> Box<dyn Atrac9Decoder> + Send + Sync,
{
    fn create(&self) -> Box<dyn Atrac9Decoder> {
        self()
    }
}

/// Creates converters for a channel layout
pub type ConverterFactory = dyn Fn(ChannelLayout) -> Box<dyn SampleConverter> + Send + Sync;

/// Shared converter handle
pub type SharedConverter = Arc<Mutex<Box<dyn SampleConverter>>>;

/// Process-wide codec handles, injected into every player voice.
///
/// Converters are built on first use and kept for the registry's lifetime,
/// one per channel layout.
pub struct CodecRegistry {
    decoders: Box<dyn DecoderFactory>,
    converter_factory: Box<ConverterFactory>,
    converters: Mutex<HashMap<ChannelLayout, SharedConverter>>,
}

impl CodecRegistry {
    /// Registry using the default [`PcmConverter`]
    pub fn new(decoders: impl DecoderFactory + 'static) -> Self {
        Self::with_converters(decoders, |layout| {
            Box::new(PcmConverter::new(layout)) as Box<dyn SampleConverter>
        })
    }

    pub fn with_converters<C>(decoders: impl DecoderFactory + 'static, converters: C) -> Self
    where
        C: Fn(ChannelLayout) -> Box<dyn SampleConverter> + Send + Sync + 'static,
    {
        Self {
            decoders: Box::new(decoders),
            converter_factory: Box::new(converters),
            converters: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh decoder configured for `config_data`
    pub fn decoder(&self, config_data: u32) -> Box<dyn Atrac9Decoder> {
        let mut decoder = self.decoders.create();
        decoder.configure(config_data);
        decoder
    }

    /// Converter for `layout`, built on first request
    pub fn converter(&self, layout: ChannelLayout) -> SharedConverter {
        let mut converters = self.converters.lock();
        Arc::clone(
            converters
                .entry(layout)
                .or_insert_with(|| Arc::new(Mutex::new((self.converter_factory)(layout)))),
        )
    }

    /// Number of converters built so far
    pub fn converter_count(&self) -> usize {
        self.converters.lock().len()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("converters", &self.converter_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct FixedDecoder {
        config: u32,
    }

    impl Atrac9Decoder for FixedDecoder {
        fn configure(&mut self, config_data: u32) {
            self.config = config_data;
        }

        fn get(&self, query: DecoderQuery) -> u32 {
            match query {
                DecoderQuery::Channels => 1,
                _ => self.config,
            }
        }

        fn send(&mut self, _input: &[u8]) -> DecodeResult<()> {
            Err(DecodeError::NotConfigured)
        }

        fn receive(&mut self, _output: &mut [i16]) -> usize {
            0
        }

        fn es_size(&self) -> u32 {
            0
        }

        fn clear_context(&mut self) {}
    }

    fn registry() -> CodecRegistry {
        CodecRegistry::new(|| Box::new(FixedDecoder::default()) as Box<dyn Atrac9Decoder>)
    }

    #[test]
    fn test_decoder_is_configured() {
        let decoder = registry().decoder(0x1234);
        assert_eq!(decoder.get(DecoderQuery::SuperframeSize), 0x1234);
        assert_eq!(decoder.get(DecoderQuery::Channels), 1);
    }

    #[test]
    fn test_converters_are_shared_per_layout() {
        let registry = registry();
        assert_eq!(registry.converter_count(), 0);

        let a = registry.converter(ChannelLayout::Mono);
        let b = registry.converter(ChannelLayout::Mono);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.converter_count(), 1);

        let c = registry.converter(ChannelLayout::Stereo);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.converter_count(), 2);
    }

    #[test]
    fn test_custom_converter_factory_called_once_per_layout() {
        let built = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&built);
        let registry = CodecRegistry::with_converters(
            || Box::new(FixedDecoder::default()) as Box<dyn Atrac9Decoder>,
            move |layout| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::new(PcmConverter::new(layout)) as Box<dyn SampleConverter>
            },
        );

        for _ in 0..3 {
            registry.converter(ChannelLayout::Stereo);
        }
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::Truncated {
            needed: 64,
            available: 10,
        };
        assert_eq!(format!("{}", err), "Frame truncated: need 64 bytes, got 10");
    }
}
