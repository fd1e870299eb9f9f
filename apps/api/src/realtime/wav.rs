//! WAV packaging for the PCM audio the live model sends back.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use thiserror::Error;

pub const WAV_HEADER_LEN: usize = 44;

const DEFAULT_CHANNELS: u16 = 1;
const DEFAULT_BITS_PER_SAMPLE: u16 = 16;
const DEFAULT_SAMPLE_RATE: u32 = 24_000;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("invalid base64 audio: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("audio format does not fit a WAV header: {0:?}")]
    UnsupportedFormat(AudioFormat),

    #[error("{0} bytes of audio do not fit a WAV header")]
    TooLong(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        }
    }
}

impl AudioFormat {
    /// `None` when the rate does not fit the header's 32-bit field.
    pub fn byte_rate(&self) -> Option<u32> {
        let rate = u64::from(self.sample_rate)
            .checked_mul(u64::from(self.channels))?
            .checked_mul(u64::from(self.bits_per_sample))?
            / 8;
        u32::try_from(rate).ok()
    }

    pub fn block_align(&self) -> Option<u16> {
        let align = u32::from(self.channels) * u32::from(self.bits_per_sample) / 8;
        u16::try_from(align).ok()
    }
}

/// Reads `audio/L<bits>;rate=<hz>`. Unknown or unparsable pieces keep their defaults.
pub fn parse_mime_type(mime_type: &str) -> AudioFormat {
    let mut format = AudioFormat::default();
    let mut pieces = mime_type.split(';').map(str::trim);

    let subtype = pieces
        .next()
        .and_then(|file_type| file_type.split_once('/'))
        .map(|(_, subtype)| subtype);
    if let Some(bits) = subtype
        .and_then(|s| s.strip_prefix('L'))
        .and_then(|bits| bits.parse::<u16>().ok())
    {
        format.bits_per_sample = bits;
    }

    for param in pieces {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim() == "rate" {
                if let Ok(rate) = value.trim().parse::<u32>() {
                    format.sample_rate = rate;
                }
            }
        }
    }

    format
}

/// Canonical 44-byte PCM WAV header for `data_len` bytes of sample data.
pub fn wav_header(data_len: usize, format: &AudioFormat) -> Result<[u8; WAV_HEADER_LEN], WavError> {
    let riff_len = u32::try_from(data_len)
        .ok()
        .and_then(|len| len.checked_add(36))
        .ok_or(WavError::TooLong(data_len))?;
    let data_len = riff_len - 36;
    let byte_rate = format
        .byte_rate()
        .ok_or(WavError::UnsupportedFormat(*format))?;
    let block_align = format
        .block_align()
        .ok_or(WavError::UnsupportedFormat(*format))?;

    let mut header = [0u8; WAV_HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_len.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    Ok(header)
}

/// Decodes base64 PCM fragments in arrival order and wraps them in a WAV container.
pub fn convert_to_wav<S: AsRef<str>>(parts: &[S], mime_type: &str) -> Result<Vec<u8>, WavError> {
    let mut pcm = Vec::new();
    for part in parts {
        pcm.extend(BASE64_STANDARD.decode(part.as_ref())?);
    }

    let header = wav_header(pcm.len(), &parse_mime_type(mime_type))?;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    wav.extend_from_slice(&header);
    wav.extend(pcm);
    Ok(wav)
}
