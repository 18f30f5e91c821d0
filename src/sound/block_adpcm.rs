//! Block step ADPCM
//!
//! Audio is cut into blocks of 64 frames. Every block restarts the channel
//! state from a small per-channel header, so blocks decode independently.
//!
//! # Block layout (per block, `36 * channels` bytes)
//!
//! ```text
//! for each channel:    [i16 LE predictor] [u8 step index] [u8 reserved]
//! for slot in 0..32:
//!     for each channel: [u8: code for sample 2*slot+1 | code for 2*slot+2 << 4]
//! ```
//!
//! The first sample of each channel is the header predictor verbatim. The
//! high nibble of the last slot would address a 65th sample; it is written
//! as zero and ignored when decoding.

use super::step::StepState;
use super::tables::BLOCK_INDEX_TABLE;

/// Frames per block.
pub const SAMPLES_PER_BLOCK: usize = 64;

/// Per-channel header size.
pub const BLOCK_HEADER_SIZE: usize = 4;

/// Per-channel code bytes in a block.
pub const BLOCK_DATA_SIZE: usize = 32;

/// Bytes one channel contributes to a block.
pub const CHANNEL_BLOCK_SIZE: usize = BLOCK_HEADER_SIZE + BLOCK_DATA_SIZE;

/// Size of one block for the given channel count.
pub fn block_size(channels: usize) -> usize {
    CHANNEL_BLOCK_SIZE * channels.max(1)
}

/// Encode interleaved samples.
///
/// A short final block is padded by holding the predictor, which is what
/// a zero difference quantizes to.
pub fn encode(samples: &[i16], channels: usize) -> Vec<u8> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    let blocks = frames.div_ceil(SAMPLES_PER_BLOCK);
    let mut out = Vec::with_capacity(blocks * block_size(channels));
    let mut states = vec![StepState::default(); channels];

    for block in 0..blocks {
        let first = block * SAMPLES_PER_BLOCK;

        for (ch, state) in states.iter_mut().enumerate() {
            let predictor = samples[first * channels + ch];
            *state = StepState::new(predictor as i32, 0);
            out.extend_from_slice(&predictor.to_le_bytes());
            out.push(0);
            out.push(0);
        }

        for slot in 0..BLOCK_DATA_SIZE {
            for (ch, state) in states.iter_mut().enumerate() {
                let mut byte = 0u8;
                for half in 0..2 {
                    let offset = 1 + 2 * slot + half;
                    if offset >= SAMPLES_PER_BLOCK {
                        break;
                    }
                    let frame = first + offset;
                    let target = if frame < frames {
                        samples[frame * channels + ch]
                    } else {
                        state.predictor as i16
                    };
                    byte |= state.quantize(target, &BLOCK_INDEX_TABLE) << (4 * half);
                }
                out.push(byte);
            }
        }
    }
    out
}

/// Decode a payload into interleaved samples.
///
/// Only whole blocks are decoded; trailing bytes short of a block are
/// ignored.
pub fn decode(payload: &[u8], channels: usize) -> Vec<i16> {
    let channels = channels.max(1);
    let size = block_size(channels);
    let blocks = payload.len() / size;
    if payload.len() % size != 0 {
        log::warn!(
            "block ADPCM payload has {} trailing bytes past {} whole blocks",
            payload.len() % size,
            blocks
        );
    }

    let mut out = vec![0i16; blocks * SAMPLES_PER_BLOCK * channels];
    let mut states = vec![StepState::default(); channels];

    for (block, bytes) in payload.chunks_exact(size).enumerate() {
        let frames = &mut out[block * SAMPLES_PER_BLOCK * channels..][..SAMPLES_PER_BLOCK * channels];

        for (ch, state) in states.iter_mut().enumerate() {
            let header = &bytes[ch * BLOCK_HEADER_SIZE..][..BLOCK_HEADER_SIZE];
            let predictor = i16::from_le_bytes([header[0], header[1]]);
            *state = StepState::new(predictor as i32, header[2] as i32);
            frames[ch] = predictor;
        }

        let data = &bytes[channels * BLOCK_HEADER_SIZE..];
        for slot in 0..BLOCK_DATA_SIZE {
            for (ch, state) in states.iter_mut().enumerate() {
                let byte = data[slot * channels + ch];
                for half in 0..2 {
                    let offset = 1 + 2 * slot + half;
                    if offset >= SAMPLES_PER_BLOCK {
                        break;
                    }
                    let code = byte >> (4 * half);
                    frames[offset * channels + ch] = state.expand(code, &BLOCK_INDEX_TABLE);
                }
            }
        }
    }
    out
}
