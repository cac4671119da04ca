// mod.rs - ATRAC9 player module

//! Streaming ATRAC9 player for NGS voices.
//!
//! Turns a chain of compressed buffers into the stereo `f32` frames the
//! mixing engine pulls every tick. The bitstream decoder and the PCM
//! converter are external capabilities supplied through [`CodecRegistry`].
//!
//! # Architecture
//!
//! - `format` - configuration word parsing and skip ranges
//! - `types` - guest parameter block
//! - `state` - per-voice playback state and PCM backlog
//! - `chain` - buffer chain walking and lifecycle callbacks
//! - `decode` - one superframe of decode with padding removal
//! - `module` - the per-tick driver
//! - `codec` / `convert` - decoder and converter capabilities
//! - `callback` - events delivered to the guest
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Arc::new(CodecRegistry::new(|| make_decoder()));
//! let voice = Mutex::new(Atrac9Voice::new(registry));
//!
//! let mut locks = VoiceLocks::new(scheduler.lock(), voice.lock());
//! let outcome = Atrac9Voice::process(&mut locks, &params, &memory, &options, &mut sink);
//! mixer.accept(locks.product());
//! ```

pub mod callback;
pub mod chain;
pub mod codec;
pub mod convert;
pub mod decode;
pub mod format;
pub mod module;
pub mod state;
pub mod types;

pub use callback::{Atrac9Event, CallbackReason, CallbackSink, NullSink};
pub use chain::ChainStep;
pub use codec::{
    Atrac9Decoder, CodecRegistry, DecodeError, DecodeResult, DecoderFactory, DecoderQuery,
    SharedConverter,
};
pub use convert::{ChannelLayout, PcmConverter, SampleConverter};
pub use decode::{StepOutcome, TrimWindow};
pub use format::{get_buffer_parameter, make_config, SkipBufferInfo, StreamFormat};
pub use module::{Atrac9Voice, TickOutcome};
pub use state::PlaybackState;
pub use types::{
    BufferParameters, Parameters, LOOP_INFINITE, MAX_BUFFER_PARAMS, NO_BUFFER, OUTPUT_CHANNELS,
};
