//! Sound codecs used by wave banks
//!
//! This module provides the 4-bit ADPCM codecs found in wave bank archives
//! and a small WAV reader/writer for moving tracks in and out.
//!
//! # Architecture
//!
//! - `tables` holds the step and predictor tables shared by the codecs
//! - `step` holds the per-channel state of the two step codecs
//! - `vag` is the chunked predictive codec (also used by standalone files)
//! - `block_adpcm` is the block step codec, reset every 64 frames
//! - `ima` is the continuous step codec
//! - `wav` converts between WAV files and interleaved 16-bit samples

pub mod block_adpcm;
pub mod ima;
pub mod step;
pub mod tables;
pub mod vag;
pub mod wav;

pub use ima::StereoLayout;
pub use step::StepState;
pub use vag::VagDecodeOptions;
pub use wav::{WavError, WavFile};
