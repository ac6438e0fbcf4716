//! WAV container layout.
//!
//! Canonical 44-byte RIFF header for PCM content. The two size fields are
//! unknown while recording, so the header is first written with zeros and
//! patched once the final file size is known.

use crate::models::audio_models::SampleSpec;

/// Size of the canonical PCM WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size (`file size - 8`).
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the data sub-chunk size (`file size - 44`).
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Generate a 44-byte header with both size fields zeroed.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    0 (placeholder for file size - 8)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bits / 8
/// [32-33]  block_align = channels * bits / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  0 (placeholder for data size)
/// ```
pub fn placeholder_header(spec: &SampleSpec) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&spec.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&spec.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&spec.bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");

    header
}

/// RIFF chunk size for a file of `file_size` bytes, clamped to the 32-bit field.
pub fn riff_chunk_size(file_size: u64) -> u32 {
    clamp_u32(file_size.saturating_sub(8))
}

/// Data sub-chunk size for a file of `file_size` bytes, clamped to the 32-bit field.
pub fn data_chunk_size(file_size: u64) -> u32 {
    clamp_u32(file_size.saturating_sub(WAV_HEADER_SIZE as u64))
}

/// Read `(riff_chunk_size, data_chunk_size)` back out of a header.
///
/// Returns `None` if `bytes` is shorter than a header.
pub fn read_sizes(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < WAV_HEADER_SIZE {
        return None;
    }
    let riff = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let data = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
    Some((riff, data))
}

fn clamp_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        log::warn!("wav size {} exceeds the 32-bit header field, clamping", value);
        u32::MAX
    } else {
        value as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_riff_magic() {
        let header = placeholder_header(&SampleSpec::CAPTURE);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn placeholder_sizes_are_zero() {
        let header = placeholder_header(&SampleSpec::CAPTURE);
        assert_eq!(read_sizes(&header), Some((0, 0)));
    }

    #[test]
    fn header_mono_16bit_44100() {
        let header = placeholder_header(&SampleSpec::CAPTURE);

        // Format code = 1 (PCM), fmt chunk size = 16
        assert_eq!(u16::from_le_bytes([header[20], header[21]]), 1);
        assert_eq!(u32::from_le_bytes([header[16], header[17], header[18], header[19]]), 16);

        let channels = u16::from_le_bytes([header[22], header[23]]);
        assert_eq!(channels, 1);

        let sample_rate = u32::from_le_bytes([header[24], header[25], header[26], header[27]]);
        assert_eq!(sample_rate, 44100);

        let byte_rate = u32::from_le_bytes([header[28], header[29], header[30], header[31]]);
        assert_eq!(byte_rate, 88200);

        let block_align = u16::from_le_bytes([header[32], header[33]]);
        assert_eq!(block_align, 2);

        let bits = u16::from_le_bytes([header[34], header[35]]);
        assert_eq!(bits, 16);
    }

    #[test]
    fn chunk_sizes_from_file_size() {
        assert_eq!(riff_chunk_size(44), 36);
        assert_eq!(data_chunk_size(44), 0);
        assert_eq!(riff_chunk_size(88_244), 88_236);
        assert_eq!(data_chunk_size(88_244), 88_200);
    }

    #[test]
    fn oversized_file_clamps() {
        assert_eq!(data_chunk_size(u32::MAX as u64 + 1000), u32::MAX);
    }

    #[test]
    fn read_sizes_rejects_short_input() {
        assert_eq!(read_sizes(&[0u8; 10]), None);
    }
}
