//! Codec tags and dispatch to the sound codecs

use std::fmt;
use std::str::FromStr;

use super::error::{BankError, BankResult};
use crate::sound::{block_adpcm, ima, vag, StereoLayout, VagDecodeOptions};

/// Codecs a descriptor can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Codec {
    /// 16-bit little-endian samples
    Pcm = 1,
    /// 16-bit little-endian samples, second variant
    Pcm2 = 2,
    Reserved = 3,
    /// Chunked predictive ADPCM
    Vag = 4,
    /// Block step ADPCM
    BlockAdpcm = 5,
    Reserved3 = 6,
    /// Continuous step ADPCM
    Ima = 7,
}

impl Codec {
    pub const ALL: [Codec; 7] = [
        Codec::Pcm,
        Codec::Pcm2,
        Codec::Reserved,
        Codec::Vag,
        Codec::BlockAdpcm,
        Codec::Reserved3,
        Codec::Ima,
    ];

    /// Convert from the descriptor tag
    pub fn from_tag(tag: u8) -> BankResult<Self> {
        match tag {
            1 => Ok(Codec::Pcm),
            2 => Ok(Codec::Pcm2),
            3 => Ok(Codec::Reserved),
            4 => Ok(Codec::Vag),
            5 => Ok(Codec::BlockAdpcm),
            6 => Ok(Codec::Reserved3),
            7 => Ok(Codec::Ima),
            other => Err(BankError::UnsupportedCodec(other)),
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::Pcm => "pcm",
            Codec::Pcm2 => "pcm2",
            Codec::Reserved => "reserved",
            Codec::Vag => "vag",
            Codec::BlockAdpcm => "block",
            Codec::Reserved3 => "reserved3",
            Codec::Ima => "ima",
        }
    }

    /// Whether the codec has no working encoder or decoder.
    pub fn is_reserved(self) -> bool {
        matches!(self, Codec::Reserved | Codec::Reserved3)
    }

    /// Decode a payload into interleaved samples.
    ///
    /// Reserved codecs yield silence of `2 * payload.len()` samples.
    pub fn decode(self, payload: &[u8], channels: usize, options: &DecodeOptions) -> Vec<i16> {
        match self {
            Codec::Pcm | Codec::Pcm2 => payload
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
            Codec::Vag => vag::decode(payload, channels, &options.vag),
            Codec::BlockAdpcm => block_adpcm::decode(payload, channels),
            Codec::Ima => ima::decode(payload, channels, options.stereo_layout),
            Codec::Reserved | Codec::Reserved3 => {
                log::warn!(
                    "codec {} has no decoder, substituting {} samples of silence",
                    self.tag(),
                    payload.len() * 2
                );
                vec![0; payload.len() * 2]
            }
        }
    }

    /// Encode interleaved samples into a payload.
    pub fn encode(self, samples: &[i16], channels: usize, layout: StereoLayout) -> BankResult<Vec<u8>> {
        match self {
            Codec::Pcm | Codec::Pcm2 => Ok(samples.iter().flat_map(|s| s.to_le_bytes()).collect()),
            Codec::Vag => Ok(vag::encode(samples, channels)),
            Codec::BlockAdpcm => Ok(block_adpcm::encode(samples, channels)),
            Codec::Ima => Ok(ima::encode(samples, channels, layout)),
            Codec::Reserved | Codec::Reserved3 => Err(BankError::UnsupportedCodec(self.tag())),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.tag())
    }
}

impl FromStr for Codec {
    type Err = String;

    /// Accepts the numeric tag or a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(tag) = s.parse::<u8>() {
            return Codec::from_tag(tag).map_err(|e| e.to_string());
        }
        match s.to_ascii_lowercase().as_str() {
            "pcm" => Ok(Codec::Pcm),
            "pcm2" => Ok(Codec::Pcm2),
            "vag" | "adpcm1" | "predictive" => Ok(Codec::Vag),
            "block" | "adpcm2" => Ok(Codec::BlockAdpcm),
            "ima" | "ima_adpcm" => Ok(Codec::Ima),
            other => Err(format!("unknown codec '{}'", other)),
        }
    }
}

/// Codec requested for a replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodecChoice {
    /// Reuse the codec the track already has.
    #[default]
    Keep,
    Use(Codec),
}

impl CodecChoice {
    /// Pick the effective codec given the track's current tag.
    pub fn resolve(self, current_tag: u8) -> BankResult<Codec> {
        match self {
            CodecChoice::Keep => Codec::from_tag(current_tag),
            CodecChoice::Use(codec) => Ok(codec),
        }
    }
}

/// Options applied when decoding track payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodeOptions {
    /// Post-processing for the predictive codec.
    pub vag: VagDecodeOptions,
    /// Channel arrangement for the continuous step codec.
    pub stereo_layout: StereoLayout,
}
