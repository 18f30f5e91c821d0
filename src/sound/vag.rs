//! Predictive 4-bit ADPCM ("VAG-style")
//!
//! The stream is a sequence of 16-byte chunks, each holding 28 samples of a
//! single channel. Multi-channel streams interleave one chunk per channel per
//! time slot.
//!
//! # Chunk layout
//!
//! ```text
//! [1 byte]  predictor index (high nibble) | shift (low nibble)
//! [1 byte]  flags (0x03 = end of stream, 0x06 = loop start)
//! [14 bytes] 28 sample codes, low nibble first
//! ```
//!
//! Standalone single-track files carry a 16-byte header in front of the
//! first chunk; payloads stored inside a wave bank do not.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tables::{predictor_coefficients, PREDICTOR_COUNT};

/// Size of one chunk in bytes.
pub const CHUNK_SIZE: usize = 16;

/// Samples carried by one chunk.
pub const SAMPLES_PER_CHUNK: usize = 28;

/// Leading header of a standalone file, skipped by [`decode_file`].
pub const FILE_HEADER_SIZE: usize = 16;

/// Chunk flag marking the end of the stream.
pub const FLAG_END: u8 = 0x03;

/// Chunk flag marking a loop start. Has no effect on decoding.
pub const FLAG_LOOP_START: u8 = 0x06;

/// Largest shift tried by the encoder.
const MAX_ENCODE_SHIFT: u8 = 12;

/// Pole used by the DC removal pass.
pub const DC_REMOVAL_ALPHA: f64 = 0.995;

/// Dither amount used when none is given explicitly.
pub const DEFAULT_DITHER_AMOUNT: f64 = 0.2;

/// Low-pass pole used when none is given explicitly.
pub const DEFAULT_LOW_PASS_ALPHA: f64 = 0.95;

/// Optional post-processing applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VagDecodeOptions {
    /// Uniform dither amplitude added before clamping, if any.
    pub dither: Option<f64>,
    /// One-pole low-pass coefficient, if any.
    pub low_pass: Option<f64>,
    /// Run the one-pole DC removal pass.
    pub remove_dc: bool,
    /// Seed for the dither noise generator.
    pub seed: u64,
}

impl Default for VagDecodeOptions {
    fn default() -> Self {
        Self {
            dither: None,
            low_pass: None,
            remove_dc: false,
            seed: 0x5eed,
        }
    }
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// One parsed 16-byte chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    shift: u8,
    predictor: u8,
    flags: u8,
    data: [u8; 14],
}

impl Chunk {
    /// Parse a chunk from the first 16 bytes of `bytes`.
    fn parse(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= CHUNK_SIZE);
        let mut data = [0u8; 14];
        data.copy_from_slice(&bytes[2..CHUNK_SIZE]);
        Self {
            shift: bytes[0] & 0x0F,
            predictor: bytes[0] >> 4,
            flags: bytes[1],
            data,
        }
    }

    /// The canonical terminator chunk.
    fn end() -> Self {
        Self {
            shift: 0,
            predictor: 0,
            flags: FLAG_END,
            data: [0; 14],
        }
    }

    /// Build a data chunk from 28 quantized codes in `-8..=7`.
    fn from_codes(predictor: u8, shift: u8, codes: &[i32; SAMPLES_PER_CHUNK]) -> Self {
        let mut data = [0u8; 14];
        for (byte, pair) in data.iter_mut().zip(codes.chunks_exact(2)) {
            *byte = ((pair[1] as u8 & 0x0F) << 4) | (pair[0] as u8 & 0x0F);
        }
        Self {
            shift,
            predictor,
            flags: 0,
            data,
        }
    }

    fn to_bytes(self) -> [u8; CHUNK_SIZE] {
        let mut out = [0u8; CHUNK_SIZE];
        out[0] = (self.predictor << 4) | (self.shift & 0x0F);
        out[1] = self.flags;
        out[2..].copy_from_slice(&self.data);
        out
    }

    /// Sign-extended code for sample `i`.
    fn code(&self, i: usize) -> i32 {
        let byte = self.data[i / 2];
        let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        ((nibble as i32) << 28) >> 28
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Two most recent reconstructed samples of one channel: `(s[n-1], s[n-2])`.
type History = (f64, f64);

/// Result of running one (predictor, shift) candidate over a window.
struct Trial {
    error: f64,
    codes: [i32; SAMPLES_PER_CHUNK],
    history: History,
}

fn run_trial(window: &[i16; SAMPLES_PER_CHUNK], history: History, predictor: usize, shift: u8) -> Trial {
    let (c1, c2) = predictor_coefficients(predictor);
    let scale = (1u32 << shift) as f64;
    let (mut h1, mut h2) = history;
    let mut codes = [0i32; SAMPLES_PER_CHUNK];
    let mut error = 0.0;

    for (code, &sample) in codes.iter_mut().zip(window.iter()) {
        let predicted = h1 * c1 + h2 * c2;
        let delta = sample as f64 - predicted;
        let q = (delta * scale / 4096.0).round_ties_even().clamp(-8.0, 7.0) as i32;
        let recon = predicted + q as f64 * 4096.0 / scale;
        error += (sample as f64 - recon).powi(2);
        *code = q;
        h2 = h1;
        h1 = recon;
    }

    Trial {
        error,
        codes,
        history: (h1, h2),
    }
}

/// Exhaustive search over every predictor and shift; the first candidate
/// with the lowest squared error wins.
fn encode_window(window: &[i16; SAMPLES_PER_CHUNK], history: &mut History) -> Chunk {
    let mut best: Option<(u8, u8, Trial)> = None;

    for predictor in 0..PREDICTOR_COUNT {
        for shift in 0..=MAX_ENCODE_SHIFT {
            let trial = run_trial(window, *history, predictor, shift);
            let better = match &best {
                Some((_, _, current)) => trial.error < current.error,
                None => true,
            };
            if better {
                best = Some((predictor as u8, shift, trial));
            }
        }
    }

    match best {
        Some((predictor, shift, trial)) => {
            *history = trial.history;
            Chunk::from_codes(predictor, shift, &trial.codes)
        }
        None => Chunk::from_codes(0, 0, &[0; SAMPLES_PER_CHUNK]),
    }
}

/// Encode interleaved samples.
///
/// Each channel is consumed 28 frames at a time; a trailing window shorter
/// than 28 frames is dropped. One terminator chunk per channel closes the
/// stream.
pub fn encode(samples: &[i16], channels: usize) -> Vec<u8> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    let windows = frames / SAMPLES_PER_CHUNK;
    let mut out = Vec::with_capacity((windows + 1) * channels * CHUNK_SIZE);
    let mut history = vec![(0.0, 0.0); channels];
    let mut window = [0i16; SAMPLES_PER_CHUNK];

    for w in 0..windows {
        let first_frame = w * SAMPLES_PER_CHUNK;
        for (ch, history) in history.iter_mut().enumerate() {
            for (i, slot) in window.iter_mut().enumerate() {
                *slot = samples[(first_frame + i) * channels + ch];
            }
            out.extend_from_slice(&encode_window(&window, history).to_bytes());
        }
    }

    for _ in 0..channels {
        out.extend_from_slice(&Chunk::end().to_bytes());
    }
    out
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

fn decode_chunk(chunk: &Chunk, history: &mut History, dither: Option<(f64, &mut StdRng)>, out: &mut Vec<i16>) {
    let (c1, c2) = predictor_coefficients(chunk.predictor as usize);
    let divisor = (1u32 << chunk.shift) as f64;
    let mut dither = dither;

    for i in 0..SAMPLES_PER_CHUNK {
        let (h1, h2) = *history;
        let mut sample = (chunk.code(i) << 12) as f64 / divisor + h1 * c1 + h2 * c2;
        *history = (sample, h1);

        if let Some((amount, rng)) = dither.as_mut() {
            sample += (rng.gen::<f64>() - 0.5) * *amount;
        }

        out.push(clamp_round(sample));
    }
}

fn clamp_round(sample: f64) -> i16 {
    sample.clamp(i16::MIN as f64, i16::MAX as f64).round_ties_even() as i16
}

/// One-pole low-pass: `out[i] = alpha * out[i-1] + (1 - alpha) * in[i]`.
pub fn low_pass(samples: &mut [i16], alpha: f64) {
    let Some(&first) = samples.first() else {
        return;
    };
    let mut prev_out = first;
    for sample in samples.iter_mut().skip(1) {
        let out = alpha * prev_out as f64 + (1.0 - alpha) * *sample as f64;
        prev_out = clamp_round(out);
        *sample = prev_out;
    }
}

/// One-pole DC blocker: `out[i] = in[i] - in[i-1] + 0.995 * out[i-1]`.
pub fn remove_dc(samples: &mut [i16]) {
    let Some(&first) = samples.first() else {
        return;
    };
    let mut prev_in = first;
    let mut prev_out = first;
    for sample in samples.iter_mut().skip(1) {
        let current = *sample;
        let out = current as f64 - prev_in as f64 + DC_REMOVAL_ALPHA * prev_out as f64;
        prev_out = clamp_round(out);
        *sample = prev_out;
        prev_in = current;
    }
}

/// Decode a payload without a leading header.
///
/// Chunk `k` belongs to channel `k % channels`; decoding stops at the first
/// end-flagged chunk and the per-channel outputs are re-interleaved.
pub fn decode(payload: &[u8], channels: usize, options: &VagDecodeOptions) -> Vec<i16> {
    let channels = channels.max(1);
    let mut streams: Vec<Vec<i16>> = vec![Vec::with_capacity(payload.len() * 2 / channels); channels];
    let mut history = vec![(0.0, 0.0); channels];
    let mut rng = StdRng::seed_from_u64(options.seed);

    for (k, bytes) in payload.chunks_exact(CHUNK_SIZE).enumerate() {
        let chunk = Chunk::parse(bytes);
        if chunk.flags == FLAG_END {
            break;
        }
        let ch = k % channels;
        let dither = options.dither.map(|amount| (amount, &mut rng));
        decode_chunk(&chunk, &mut history[ch], dither, &mut streams[ch]);
    }

    for stream in streams.iter_mut() {
        if let Some(alpha) = options.low_pass {
            low_pass(stream, alpha);
        }
        if options.remove_dc {
            remove_dc(stream);
        }
    }

    if channels == 1 {
        return streams.pop().unwrap_or_default();
    }

    let frames = streams.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels);
    for frame in 0..frames {
        out.extend(streams.iter().map(|stream| stream[frame]));
    }
    out
}

/// Decode a standalone mono file, skipping its 16-byte header.
///
/// Files shorter than the header decode to nothing.
pub fn decode_file(data: &[u8], options: &VagDecodeOptions) -> Vec<i16> {
    match data.get(FILE_HEADER_SIZE..) {
        Some(payload) => decode(payload, 1, options),
        None => Vec::new(),
    }
}
