//! Coefficient and step tables shared by the wave bank codecs
//!
//! All tables are plain compile-time data.

// ---------------------------------------------------------------------------
// Step codec tables
// ---------------------------------------------------------------------------

/// Highest valid index into [`STEP_TABLE`].
pub const MAX_STEP_INDEX: i32 = 88;

/// Geometric quantizer step sizes used by both step codecs.
#[rustfmt::skip]
pub const STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17,
    19, 21, 23, 25, 28, 31, 34, 37, 41, 45,
    50, 55, 60, 66, 73, 80, 88, 97, 107, 118,
    130, 143, 157, 173, 190, 209, 230, 253, 279, 307,
    337, 371, 408, 449, 494, 544, 598, 658, 724, 796,
    876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358,
    5894, 6484, 7132, 7845, 8630, 9493, 10442, 11487, 12635, 13899,
    15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767,
];

/// Step index adjustment for the block codec (saturates at +6).
#[rustfmt::skip]
pub const BLOCK_INDEX_TABLE: [i32; 16] = [
    -1, -1, -1, -1, 2, 4, 6, 6,
    -1, -1, -1, -1, 2, 4, 6, 6,
];

/// Step index adjustment for the continuous codec (standard IMA).
#[rustfmt::skip]
pub const IMA_INDEX_TABLE: [i32; 16] = [
    -1, -1, -1, -1, 2, 4, 6, 8,
    -1, -1, -1, -1, 2, 4, 6, 8,
];

// ---------------------------------------------------------------------------
// Predictive codec tables
// ---------------------------------------------------------------------------

/// Number of predictor filters; indices past the end clamp to the last one.
pub const PREDICTOR_COUNT: usize = 5;

/// Predictor coefficient pairs in 1/64 fixed point: `[for s[n-1], for s[n-2]]`.
#[rustfmt::skip]
pub const PREDICTOR_TABLE: [[i32; 2]; PREDICTOR_COUNT] = [
    [0, 0],
    [60, 0],
    [115, -52],
    [98, -55],
    [122, -60],
];

/// Predictor coefficients as floating point multipliers.
pub fn predictor_coefficients(index: usize) -> (f64, f64) {
    let [c1, c2] = PREDICTOR_TABLE[index.min(PREDICTOR_COUNT - 1)];
    (c1 as f64 / 64.0, c2 as f64 / 64.0)
}
