// format.rs - ATRAC9 stream format word parsing

//! Layout constants packed into the 32-bit ATRAC9 configuration word and
//! the byte/sample ranges covering an arbitrary window of samples.
//!
//! Bit layout of the word:
//!
//! | Bits  | Field |
//! |-------|-------|
//! | 9-11  | block rate index |
//! | 12-15 | sample rate index |
//! | 16-23 | frame bytes, high 8 bits |
//! | 27-28 | superframe exponent |
//! | 29-31 | frame bytes, low 3 bits |
//!
//! The stored frame byte count is one less than the real one.

/// log2 of the samples per frame, indexed by sample rate index
const SAMPLE_RATE_INDEX_TO_FRAME_SAMPLE_POWER: [u8; 16] =
    [6, 6, 7, 7, 7, 8, 8, 8, 6, 6, 7, 7, 7, 8, 8, 8];

/// Layout constants decoded from a configuration word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate_index: u8,
    pub block_rate_index: u8,
    pub frame_bytes: u32,
    pub superframe_exponent: u8,
}

impl StreamFormat {
    /// Decode the packed word. Every word yields a format; garbage in gives
    /// bounded garbage out.
    pub fn from_config(config: u32) -> Self {
        let sample_rate_index = ((config >> 12) & 0b1111) as u8;
        let block_rate_index = ((config >> 9) & 0b111) as u8;
        let frame_bytes = ((((config >> 16) & 0xFF) << 3) | ((config >> 29) & 0b111)) + 1;
        let superframe_exponent = ((config >> 27) & 0b11) as u8;

        Self {
            sample_rate_index,
            block_rate_index,
            frame_bytes,
            superframe_exponent,
        }
    }

    pub fn frames_per_superframe(&self) -> u32 {
        1 << self.superframe_exponent
    }

    pub fn samples_per_frame(&self) -> u32 {
        1 << SAMPLE_RATE_INDEX_TO_FRAME_SAMPLE_POWER[self.sample_rate_index as usize & 0xF]
    }

    pub fn samples_per_superframe(&self) -> u32 {
        self.samples_per_frame() * self.frames_per_superframe()
    }

    pub fn bytes_per_superframe(&self) -> u32 {
        self.frame_bytes * self.frames_per_superframe()
    }

    /// Whether frames are grouped into super-packets
    pub fn is_super_packet(&self) -> bool {
        self.frames_per_superframe() != 1
    }
}

/// Byte range and sample trim needed to decode a window of samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipBufferInfo {
    /// Bytes to hand to the decoder, whole superframes only
    pub num_bytes: u32,
    pub is_super_packet: bool,
    /// Offset of the first superframe touching the window
    pub start_byte_offset: u32,
    /// Decoded samples to drop before the window starts
    pub start_skip: u32,
    /// Decoded samples to drop after the window ends
    pub end_skip: u32,
}

/// Compute which superframes cover `num_samples` samples starting at
/// `start_sample` for a stream with the given configuration word.
pub fn get_buffer_parameter(start_sample: u32, num_samples: u32, config: u32) -> SkipBufferInfo {
    let format = StreamFormat::from_config(config);
    let samples_per_superframe = format.samples_per_superframe();
    let bytes_per_superframe = format.bytes_per_superframe();

    let end_sample = start_sample.wrapping_add(num_samples);
    let start_superframe = start_sample / samples_per_superframe;
    let end_superframe = end_sample.div_ceil(samples_per_superframe);
    let num_superframes = end_superframe.wrapping_sub(start_superframe);

    SkipBufferInfo {
        num_bytes: num_superframes.wrapping_mul(bytes_per_superframe),
        is_super_packet: format.is_super_packet(),
        start_byte_offset: start_superframe.wrapping_mul(bytes_per_superframe),
        start_skip: start_sample - start_superframe * samples_per_superframe,
        end_skip: end_superframe
            .wrapping_mul(samples_per_superframe)
            .wrapping_sub(end_sample),
    }
}

/// Build a configuration word from its fields. The inverse of
/// [`StreamFormat::from_config`] for the bits it reads.
pub fn make_config(
    sample_rate_index: u8,
    block_rate_index: u8,
    frame_bytes: u32,
    superframe_exponent: u8,
) -> u32 {
    let stored = frame_bytes.wrapping_sub(1) & 0x7FF;
    ((sample_rate_index as u32 & 0xF) << 12)
        | ((block_rate_index as u32 & 0x7) << 9)
        | ((stored >> 3) << 16)
        | ((superframe_exponent as u32 & 0x3) << 27)
        | ((stored & 0x7) << 29)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_decode_fields() {
        // 0x8000 = sample rate index 8, 0x400 = block rate index 2
        let config = make_config(8, 2, 0x100, 2);
        let format = StreamFormat::from_config(config);
        assert_eq!(format.sample_rate_index, 8);
        assert_eq!(format.block_rate_index, 2);
        assert_eq!(format.frame_bytes, 0x100);
        assert_eq!(format.superframe_exponent, 2);
        assert_eq!(format.frames_per_superframe(), 4);
        assert_eq!(format.samples_per_frame(), 64);
        assert_eq!(format.samples_per_superframe(), 256);
        assert_eq!(format.bytes_per_superframe(), 0x400);
        assert!(format.is_super_packet());
    }

    #[test]
    fn test_frame_bytes_low_bits_come_from_top_of_word() {
        // stored value 0b1_0000_0101 -> high byte 0b10_0000, low bits 0b101
        let config = (0b10_0000 << 16) | (0b101 << 29);
        assert_eq!(StreamFormat::from_config(config).frame_bytes, 0b1_0000_0101 + 1);
    }

    #[rstest]
    #[case(0, 64)]
    #[case(2, 128)]
    #[case(5, 256)]
    #[case(8, 64)]
    #[case(12, 128)]
    #[case(15, 256)]
    fn test_samples_per_frame_table(#[case] index: u8, #[case] expected: u32) {
        let format = StreamFormat::from_config(make_config(index, 0, 64, 0));
        assert_eq!(format.samples_per_frame(), expected);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 2)]
    #[case(2, 4)]
    #[case(3, 8)]
    fn test_frames_per_superframe(#[case] exponent: u8, #[case] expected: u32) {
        let format = StreamFormat::from_config(make_config(0, 0, 64, exponent));
        assert_eq!(format.frames_per_superframe(), expected);
        assert_eq!(format.is_super_packet(), expected != 1);
    }

    #[test]
    fn test_skip_info_window_inside_one_superframe() {
        // 256 samples and 0x400 bytes per superframe
        let config = make_config(8, 2, 0x100, 2);
        let info = get_buffer_parameter(10, 100, config);
        assert_eq!(
            info,
            SkipBufferInfo {
                num_bytes: 0x400,
                is_super_packet: true,
                start_byte_offset: 0,
                start_skip: 10,
                end_skip: 146,
            }
        );
    }

    #[test]
    fn test_skip_info_window_spanning_superframes() {
        let config = make_config(8, 2, 0x100, 2);
        let info = get_buffer_parameter(300, 500, config);
        // superframes 1..4 cover samples 256..1024
        assert_eq!(info.start_byte_offset, 0x400);
        assert_eq!(info.num_bytes, 3 * 0x400);
        assert_eq!(info.start_skip, 44);
        assert_eq!(info.end_skip, 1024 - 800);
    }

    #[test]
    fn test_skip_info_aligned_window() {
        let config = make_config(0, 0, 64, 0);
        let info = get_buffer_parameter(128, 64, config);
        assert_eq!(info.start_byte_offset, 128);
        assert_eq!(info.num_bytes, 64);
        assert_eq!(info.start_skip, 0);
        assert_eq!(info.end_skip, 0);
        assert!(!info.is_super_packet);
    }

    #[test]
    fn test_skip_info_empty_window() {
        let config = make_config(0, 0, 64, 0);
        let info = get_buffer_parameter(64, 0, config);
        assert_eq!(info.num_bytes, 0);
        assert_eq!(info.end_skip, 0);
    }

    proptest! {
        #[test]
        fn prop_superframe_samples_positive(config in any::<u32>()) {
            let format = StreamFormat::from_config(config);
            prop_assert!(format.samples_per_superframe() > 0);
            prop_assert_eq!(
                format.samples_per_superframe(),
                format.samples_per_frame() * format.frames_per_superframe()
            );
        }

        #[test]
        fn prop_make_config_round_trips(
            sri in 0u8..16,
            bri in 0u8..8,
            frame_bytes in 1u32..=2048,
            exp in 0u8..4,
        ) {
            let format = StreamFormat::from_config(make_config(sri, bri, frame_bytes, exp));
            prop_assert_eq!(format.sample_rate_index, sri);
            prop_assert_eq!(format.block_rate_index, bri);
            prop_assert_eq!(format.frame_bytes, frame_bytes);
            prop_assert_eq!(format.superframe_exponent, exp);
        }

        #[test]
        fn prop_skip_info_is_deterministic(
            start in 0u32..1_000_000,
            len in 0u32..100_000,
            config in any::<u32>(),
        ) {
            prop_assert_eq!(
                get_buffer_parameter(start, len, config),
                get_buffer_parameter(start, len, config)
            );
        }

        #[test]
        fn prop_skip_info_covers_window(
            start in 0u32..1_000_000,
            len in 1u32..100_000,
            sri in 0u8..16,
            exp in 0u8..4,
        ) {
            let config = make_config(sri, 0, 64, exp);
            let format = StreamFormat::from_config(config);
            let info = get_buffer_parameter(start, len, config);
            let spsf = format.samples_per_superframe();
            let covered = info.num_bytes / format.bytes_per_superframe() * spsf;
            prop_assert_eq!(covered, info.start_skip + len + info.end_skip);
            prop_assert!(info.start_skip < spsf);
            prop_assert!(info.end_skip < spsf);
        }
    }
}
