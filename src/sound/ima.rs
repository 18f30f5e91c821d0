//! Continuous step ADPCM (IMA-style)
//!
//! Each channel keeps one [`StepState`] for the whole track. Two codes are
//! packed per byte, low nibble first.
//!
//! Two channel arrangements exist in the wild:
//!
//! * [`StereoLayout::Interleaved`]: code `n` belongs to channel
//!   `n % channels`, so a stereo byte holds one left and one right code.
//!   This is what wave banks store.
//! * [`StereoLayout::Planar`]: each channel is a complete mono stream and
//!   the streams are stored back to back in equal-sized parts.

use std::fmt;
use std::str::FromStr;

use super::step::StepState;
use super::tables::IMA_INDEX_TABLE;

/// How multi-channel codes are arranged in the byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StereoLayout {
    #[default]
    Interleaved,
    Planar,
}

impl fmt::Display for StereoLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StereoLayout::Interleaved => write!(f, "interleaved"),
            StereoLayout::Planar => write!(f, "planar"),
        }
    }
}

impl FromStr for StereoLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interleaved" => Ok(StereoLayout::Interleaved),
            "planar" => Ok(StereoLayout::Planar),
            other => Err(format!("unknown stereo layout '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Nibble packing
// ---------------------------------------------------------------------------

/// Packs codes two per byte, low nibble first.
#[derive(Default)]
struct NibbleWriter {
    out: Vec<u8>,
    pending: Option<u8>,
}

impl NibbleWriter {
    fn with_capacity(codes: usize) -> Self {
        Self {
            out: Vec::with_capacity(codes.div_ceil(2)),
            pending: None,
        }
    }

    fn push(&mut self, code: u8) {
        match self.pending.take() {
            Some(low) => self.out.push(low | (code << 4)),
            None => self.pending = Some(code & 0x0F),
        }
    }

    /// Flush an odd trailing code with a zero high nibble.
    fn finish(mut self) -> Vec<u8> {
        if let Some(low) = self.pending.take() {
            self.out.push(low);
        }
        self.out
    }
}

fn nibbles(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes.iter().flat_map(|&b| [b & 0x0F, b >> 4])
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

fn encode_interleaved(samples: &[i16], channels: usize) -> Vec<u8> {
    let mut states = vec![StepState::default(); channels];
    let mut writer = NibbleWriter::with_capacity(samples.len());
    for (i, &sample) in samples.iter().enumerate() {
        writer.push(states[i % channels].quantize(sample, &IMA_INDEX_TABLE));
    }
    writer.finish()
}

fn decode_interleaved(payload: &[u8], channels: usize) -> Vec<i16> {
    let mut states = vec![StepState::default(); channels];
    nibbles(payload)
        .enumerate()
        .map(|(i, code)| states[i % channels].expand(code, &IMA_INDEX_TABLE))
        .collect()
}

/// Encode interleaved samples. Only whole frames are encoded.
pub fn encode(samples: &[i16], channels: usize, layout: StereoLayout) -> Vec<u8> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    let samples = &samples[..frames * channels];

    if channels == 1 || layout == StereoLayout::Interleaved {
        return encode_interleaved(samples, channels);
    }

    let mut out = Vec::with_capacity(channels * frames.div_ceil(2));
    let mut plane = Vec::with_capacity(frames);
    for ch in 0..channels {
        plane.clear();
        plane.extend(samples.iter().skip(ch).step_by(channels));
        out.extend(encode_interleaved(&plane, 1));
    }
    out
}

/// Decode a payload into interleaved samples.
pub fn decode(payload: &[u8], channels: usize, layout: StereoLayout) -> Vec<i16> {
    let channels = channels.max(1);
    if channels == 1 || layout == StereoLayout::Interleaved {
        return decode_interleaved(payload, channels);
    }

    let part = payload.len() / channels;
    if payload.len() % channels != 0 {
        log::warn!(
            "planar ADPCM payload of {} bytes does not split into {} channels",
            payload.len(),
            channels
        );
    }

    let planes: Vec<Vec<i16>> = payload
        .chunks_exact(part.max(1))
        .take(channels)
        .map(|bytes| decode_interleaved(bytes, 1))
        .collect();
    if part == 0 || planes.len() < channels {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(part * 2 * channels);
    for frame in 0..part * 2 {
        out.extend(planes.iter().map(|plane| plane[frame]));
    }
    out
}

/// [`decode`] trimmed to `frames` frames.
///
/// Odd frame counts leave a padding nibble at the end of every plane (or of
/// the interleaved stream); the frame count recorded for the track drops it.
pub fn decode_frames(payload: &[u8], channels: usize, layout: StereoLayout, frames: usize) -> Vec<i16> {
    let mut out = decode(payload, channels, layout);
    out.truncate(frames.saturating_mul(channels.max(1)));
    out
}
