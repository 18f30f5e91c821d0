//! Per-channel state shared by the block and continuous step codecs
//!
//! A 4-bit code is laid out as `SMMM`: bit 3 is the sign, bits 2/1/0 add
//! `step`, `step / 2` and `step / 4` on top of the base `step / 8`.

use super::tables::{MAX_STEP_INDEX, STEP_TABLE};

/// Running predictor and step index for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepState {
    /// Last reconstructed sample, always within the 16-bit range.
    pub predictor: i32,
    /// Index into [`STEP_TABLE`], always within `0..=88`.
    pub index: i32,
}

impl StepState {
    /// Create a state, clamping both fields into their legal ranges.
    pub fn new(predictor: i32, index: i32) -> Self {
        Self {
            predictor: predictor.clamp(i16::MIN as i32, i16::MAX as i32),
            index: index.clamp(0, MAX_STEP_INDEX),
        }
    }

    /// Apply one code and return the reconstructed sample.
    pub fn expand(&mut self, code: u8, index_table: &[i32; 16]) -> i16 {
        let code = code & 0x0F;
        let step = STEP_TABLE[self.index as usize];

        let mut diff = step >> 3;
        if code & 4 != 0 {
            diff += step;
        }
        if code & 2 != 0 {
            diff += step >> 1;
        }
        if code & 1 != 0 {
            diff += step >> 2;
        }
        if code & 8 != 0 {
            diff = -diff;
        }

        self.predictor = (self.predictor + diff).clamp(i16::MIN as i32, i16::MAX as i32);
        self.index = (self.index + index_table[code as usize]).clamp(0, MAX_STEP_INDEX);
        self.predictor as i16
    }

    /// Pick the code that moves the predictor towards `sample`, then apply it
    /// exactly as the decoder would.
    pub fn quantize(&mut self, sample: i16, index_table: &[i32; 16]) -> u8 {
        let mut diff = sample as i32 - self.predictor;
        let mut code = 0u8;
        if diff < 0 {
            code = 8;
            diff = -diff;
        }

        let mut mask = STEP_TABLE[self.index as usize];
        for bit in [4u8, 2, 1] {
            if diff >= mask {
                code |= bit;
                diff -= mask;
            }
            mask >>= 1;
        }

        self.expand(code, index_table);
        code
    }
}
