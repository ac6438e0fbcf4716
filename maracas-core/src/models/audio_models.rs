use serde::{Deserialize, Serialize};

/// An input source reported by the audio server.
///
/// `id` is the server-assigned name, stable for the lifetime of the
/// connection; `display_name` is the human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioSourceDescriptor {
    pub id: String,
    pub display_name: String,
}

impl AudioSourceDescriptor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// PCM sample layout of a capture stream and of the WAV file it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl SampleSpec {
    /// Signed 16-bit little-endian, mono, 44.1 kHz.
    pub const CAPTURE: SampleSpec = SampleSpec {
        sample_rate: 44_100,
        channels: 1,
        bits_per_sample: 16,
    };

    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * self.bytes_per_sample() as u32
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self::CAPTURE
    }
}
