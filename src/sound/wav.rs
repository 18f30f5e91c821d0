//! WAV (RIFF WAVE) reading and writing
//!
//! Reads PCM files with:
//! - 8-bit and 16-bit samples (8-bit is widened to 16-bit)
//! - 1 to 8 channels
//! - Any sample rate
//!
//! Writes canonical 16-bit PCM files with a 44-byte header.

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;

// WAV format constants (little-endian IDs)
const RIFF_ID: u32 = 0x46464952; // "RIFF"
const WAVE_ID: u32 = 0x45564157; // "WAVE"
const FMT_ID: u32 = 0x20746d66; // "fmt "
const DATA_ID: u32 = 0x61746164; // "data"

// WAV format codes
const WAVE_FORMAT_PCM: u16 = 1;

/// Size of the header written by [`WavFile::to_bytes`].
pub const CANONICAL_HEADER_SIZE: usize = 44;

/// Largest channel count a wave bank channel mask can describe.
pub const MAX_CHANNELS: u16 = 8;

/// Errors from reading or writing WAV files
#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid WAV data: {0}")]
    InvalidData(String),

    #[error("unsupported WAV file: {0}")]
    Unsupported(String),
}

pub type WavResult<T> = Result<T, WavError>;

/// WAV format chunk
#[derive(Debug, Default)]
struct WavFormatHeader {
    format: u16,          // 1 = PCM
    channels: u16,        // 1 = mono, 2 = stereo
    sample_rate: u32,     // Samples per second
    bits_per_sample: u16, // 8 or 16
}

/// WAV chunk header
#[derive(Debug, Default)]
struct WavChunkHeader {
    id: u32,
    size: u32,
}

/// Decoded PCM audio: interleaved 16-bit samples plus their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFile {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl WavFile {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Number of audio frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Read a little-endian u16
    fn read_le_u16(cursor: &mut Cursor<&[u8]>) -> WavResult<u16> {
        let mut buf = [0u8; 2];
        cursor
            .read_exact(&mut buf)
            .map_err(|e| WavError::InvalidData(format!("failed to read u16: {}", e)))?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a little-endian u32
    fn read_le_u32(cursor: &mut Cursor<&[u8]>) -> WavResult<u32> {
        let mut buf = [0u8; 4];
        cursor
            .read_exact(&mut buf)
            .map_err(|e| WavError::InvalidData(format!("failed to read u32: {}", e)))?;
        Ok(u32::from_le_bytes(buf))
    }

    fn parse_file_header(cursor: &mut Cursor<&[u8]>) -> WavResult<()> {
        let id = Self::read_le_u32(cursor)?;
        let _size = Self::read_le_u32(cursor)?;
        let format = Self::read_le_u32(cursor)?;

        if id != RIFF_ID {
            return Err(WavError::InvalidData("not a RIFF file".to_string()));
        }
        if format != WAVE_ID {
            return Err(WavError::InvalidData("not a WAVE file".to_string()));
        }
        Ok(())
    }

    fn parse_chunk_header(cursor: &mut Cursor<&[u8]>) -> WavResult<WavChunkHeader> {
        let id = Self::read_le_u32(cursor)?;
        let size = Self::read_le_u32(cursor)?;
        Ok(WavChunkHeader { id, size })
    }

    fn parse_format_header(cursor: &mut Cursor<&[u8]>, size: u32) -> WavResult<WavFormatHeader> {
        if size < 16 {
            return Err(WavError::InvalidData("format chunk too small".to_string()));
        }

        let format = Self::read_le_u16(cursor)?;
        let channels = Self::read_le_u16(cursor)?;
        let sample_rate = Self::read_le_u32(cursor)?;
        let _byte_rate = Self::read_le_u32(cursor)?;
        let _block_align = Self::read_le_u16(cursor)?;
        let bits_per_sample = Self::read_le_u16(cursor)?;

        // Skip any extra format bytes
        if size > 16 {
            cursor
                .seek(SeekFrom::Current((size - 16) as i64))
                .map_err(|e| WavError::InvalidData(format!("failed to skip format bytes: {}", e)))?;
        }

        if format != WAVE_FORMAT_PCM {
            return Err(WavError::Unsupported(format!(
                "format {} (only PCM supported)",
                format
            )));
        }

        if channels == 0 || channels > MAX_CHANNELS {
            return Err(WavError::Unsupported(format!("channel count {}", channels)));
        }

        if bits_per_sample != 8 && bits_per_sample != 16 {
            return Err(WavError::Unsupported(format!(
                "{} bits per sample",
                bits_per_sample
            )));
        }

        Ok(WavFormatHeader {
            format,
            channels,
            sample_rate,
            bits_per_sample,
        })
    }

    /// Parse a WAV file held in memory. Unknown chunks are skipped.
    pub fn from_bytes(data: &[u8]) -> WavResult<Self> {
        let mut cursor = Cursor::new(data);
        Self::parse_file_header(&mut cursor)?;

        let mut fmt_header: Option<WavFormatHeader> = None;
        let mut data_range: Option<(usize, usize)> = None;

        while (cursor.position() as usize) + 8 <= data.len() {
            let chunk = Self::parse_chunk_header(&mut cursor)?;

            match chunk.id {
                FMT_ID => {
                    fmt_header = Some(Self::parse_format_header(&mut cursor, chunk.size)?);
                }
                DATA_ID => {
                    let start = cursor.position() as usize;
                    let end = start.saturating_add(chunk.size as usize).min(data.len());
                    if end - start < chunk.size as usize {
                        log::warn!(
                            "WAV data chunk declares {} bytes but only {} are present",
                            chunk.size,
                            end - start
                        );
                    }
                    data_range = Some((start, end));
                    // Don't read past the data chunk
                    break;
                }
                _ => {
                    // Chunks are word aligned
                    let skip = chunk.size as i64 + (chunk.size & 1) as i64;
                    cursor
                        .seek(SeekFrom::Current(skip))
                        .map_err(|e| WavError::InvalidData(format!("failed to skip chunk: {}", e)))?;
                }
            }
        }

        let fmt = fmt_header.ok_or_else(|| WavError::InvalidData("no format chunk found".to_string()))?;
        let (start, end) = data_range.ok_or_else(|| WavError::InvalidData("no data chunk found".to_string()))?;
        let bytes = &data[start..end];

        let samples = match fmt.bits_per_sample {
            8 => bytes.iter().map(|&b| ((b as i16) - 128) << 8).collect(),
            _ => bytes
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        };

        debug_assert_eq!(fmt.format, WAVE_FORMAT_PCM);
        Ok(Self {
            sample_rate: fmt.sample_rate,
            channels: fmt.channels,
            samples,
        })
    }

    /// Read and parse a WAV file from disk.
    pub fn read(path: &Path) -> WavResult<Self> {
        let data = std::fs::read(path).map_err(|source| WavError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&data)
    }

    /// Serialize as a canonical 16-bit PCM file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let channels = self.channels.max(1);
        let block_align = channels as u32 * 2;
        let data_size = (self.samples.len() * 2) as u32;

        let mut out = Vec::with_capacity(CANONICAL_HEADER_SIZE + data_size as usize);
        out.extend_from_slice(&RIFF_ID.to_le_bytes());
        out.extend_from_slice(&(36 + data_size).to_le_bytes());
        out.extend_from_slice(&WAVE_ID.to_le_bytes());
        out.extend_from_slice(&FMT_ID.to_le_bytes());
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.saturating_mul(block_align).to_le_bytes());
        out.extend_from_slice(&(block_align as u16).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(&DATA_ID.to_le_bytes());
        out.extend_from_slice(&data_size.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Write as a canonical 16-bit PCM file.
    pub fn write(&self, path: &Path) -> WavResult<()> {
        std::fs::write(path, self.to_bytes()).map_err(|source| WavError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}
