//! On-disk records of a wave bank
//!
//! All fields are little-endian. Records are read field by field into owned
//! structures and written back the same way, so unknown fields round-trip
//! unchanged.
//!
//! ```text
//! 0x000  Header (256 bytes)
//! 0x100  Descriptor[num_entries] (40 bytes each)
//! ...    metadata records (32 bytes each), optional
//! ...    track payloads at descriptor offsets
//! ```

use std::io::{self, Cursor, Read};
use std::ops::Range;

use super::codec::Codec;
use super::error::{BankError, BankResult};

/// Size of the bank header.
pub const HEADER_SIZE: usize = 256;

/// Size of one track descriptor.
pub const DESCRIPTOR_SIZE: usize = 40;

/// Size of one metadata record.
pub const METADATA_SIZE: usize = 32;

/// Size of the descriptive tag that follows the metadata block.
pub const BANK_TYPE_SIZE: usize = 16;

/// Byte offset of descriptor `index`.
pub fn descriptor_offset(index: usize) -> usize {
    HEADER_SIZE + index * DESCRIPTOR_SIZE
}

/// Slice `size` bytes at `offset`, or report what was cut short.
pub(crate) fn record<'a>(data: &'a [u8], offset: usize, size: usize, what: &'static str) -> BankResult<&'a [u8]> {
    offset
        .checked_add(size)
        .and_then(|end| data.get(offset..end))
        .ok_or(BankError::Truncated {
            what,
            offset,
            needed: size,
            len: data.len(),
        })
}

// ---------------------------------------------------------------------------
// Field reader
// ---------------------------------------------------------------------------

struct FieldReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    fn array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn u8(&mut self) -> io::Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> io::Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }
}

fn short_record(what: &'static str, offset: usize, needed: usize, len: usize) -> impl Fn(io::Error) -> BankError {
    move |_| BankError::Truncated {
        what,
        offset,
        needed,
        len,
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// The fixed record at offset 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub unk: [u8; 8],
    pub flag: u32,
    pub size: u32,
    pub sample_data_offset: u32,
    /// Declared total size of the bank in bytes.
    pub total_bytes: u32,
    pub name: [u8; 32],
    pub num_entries: u32,
    pub vals: [u32; 3],
    pub offs: u32,
    /// Start of the metadata records, 0 when absent.
    pub metadata_offset: u32,
    pub offs3: u32,
    pub offs4: u32,
    pub num: u32,
    /// End of the metadata records.
    pub entry_description_offset: u32,
    pub padding: [u8; 152],
}

impl Header {
    /// Read the header from the start of `data`.
    pub fn from_bytes(data: &[u8]) -> BankResult<Self> {
        let bytes = record(data, 0, HEADER_SIZE, "header")?;
        Self::read(&mut FieldReader::new(bytes)).map_err(short_record("header", 0, HEADER_SIZE, data.len()))
    }

    fn read(r: &mut FieldReader<'_>) -> io::Result<Self> {
        Ok(Self {
            magic: r.array()?,
            unk: r.array()?,
            flag: r.u32()?,
            size: r.u32()?,
            sample_data_offset: r.u32()?,
            total_bytes: r.u32()?,
            name: r.array()?,
            num_entries: r.u32()?,
            vals: [r.u32()?, r.u32()?, r.u32()?],
            offs: r.u32()?,
            metadata_offset: r.u32()?,
            offs3: r.u32()?,
            offs4: r.u32()?,
            num: r.u32()?,
            entry_description_offset: r.u32()?,
            padding: r.array()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.extend_from_slice(&self.magic);
        out.extend_from_slice(&self.unk);
        for value in [self.flag, self.size, self.sample_data_offset, self.total_bytes] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&self.name);
        out.extend_from_slice(&self.num_entries.to_le_bytes());
        for value in self.vals {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for value in [
            self.offs,
            self.metadata_offset,
            self.offs3,
            self.offs4,
            self.num,
            self.entry_description_offset,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&self.padding);
        out
    }

    /// Bank name with trailing NULs removed.
    pub fn name(&self) -> String {
        c_string(&self.name)
    }

    /// Number of metadata records between the two metadata offsets.
    pub fn metadata_count(&self) -> usize {
        if self.metadata_offset == 0 {
            return 0;
        }
        self.entry_description_offset.saturating_sub(self.metadata_offset) as usize / METADATA_SIZE
    }
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: [0; 8],
            unk: [0; 8],
            flag: 0,
            size: 0,
            sample_data_offset: 0,
            total_bytes: 0,
            name: [0; 32],
            num_entries: 0,
            vals: [0; 3],
            offs: 0,
            metadata_offset: 0,
            offs3: 0,
            offs4: 0,
            num: 0,
            entry_description_offset: 0,
            padding: [0; 152],
        }
    }
}

/// Text up to the first NUL, lossily decoded.
pub(crate) fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Per-track record following the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub hash: u32,
    /// Raw codec tag; see [`Codec::from_tag`].
    pub codec: u8,
    pub field_5: u8,
    /// Set bits select the channels in use.
    pub channel_mask: u8,
    pub field_7: u8,
    pub num_samples: u32,
    pub num_bytes: u32,
    pub reserved: [u8; 12],
    pub compressed_data_offset: u32,
    pub sample_rate: u16,
    pub field_22: u16,
    pub unk: u32,
}

impl Descriptor {
    /// Read descriptor `index` out of a bank image.
    pub fn from_bank(data: &[u8], index: usize) -> BankResult<Self> {
        let offset = descriptor_offset(index);
        let bytes = record(data, offset, DESCRIPTOR_SIZE, "track descriptor")?;
        Self::read(&mut FieldReader::new(bytes)).map_err(short_record(
            "track descriptor",
            offset,
            DESCRIPTOR_SIZE,
            data.len(),
        ))
    }

    fn read(r: &mut FieldReader<'_>) -> io::Result<Self> {
        Ok(Self {
            hash: r.u32()?,
            codec: r.u8()?,
            field_5: r.u8()?,
            channel_mask: r.u8()?,
            field_7: r.u8()?,
            num_samples: r.u32()?,
            num_bytes: r.u32()?,
            reserved: r.array()?,
            compressed_data_offset: r.u32()?,
            sample_rate: r.u16()?,
            field_22: r.u16()?,
            unk: r.u32()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DESCRIPTOR_SIZE);
        out.extend_from_slice(&self.hash.to_le_bytes());
        out.extend_from_slice(&[self.codec, self.field_5, self.channel_mask, self.field_7]);
        out.extend_from_slice(&self.num_samples.to_le_bytes());
        out.extend_from_slice(&self.num_bytes.to_le_bytes());
        out.extend_from_slice(&self.reserved);
        out.extend_from_slice(&self.compressed_data_offset.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.field_22.to_le_bytes());
        out.extend_from_slice(&self.unk.to_le_bytes());
        out
    }

    /// Channel count: the number of set mask bits, or 1 for an empty mask.
    pub fn channel_count(&self) -> usize {
        match self.channel_mask.count_ones() {
            0 => 1,
            n => n as usize,
        }
    }

    /// Select the lowest `channels` mask bits.
    pub fn set_channel_count(&mut self, channels: usize) -> BankResult<()> {
        if channels == 0 || channels > 8 {
            return Err(BankError::InvalidInput(format!(
                "channel count {} does not fit a channel mask",
                channels
            )));
        }
        self.channel_mask = (0xFFu16 >> (8 - channels)) as u8;
        Ok(())
    }

    /// Typed codec, failing for tags outside the known set.
    pub fn codec(&self) -> BankResult<Codec> {
        Codec::from_tag(self.codec)
    }

    /// Byte range of the compressed payload.
    pub fn payload_range(&self) -> Range<usize> {
        let start = self.compressed_data_offset as usize;
        start..start + self.num_bytes as usize
    }

    /// Length in seconds, 0 for a zero sample rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples as f64 / self.sample_rate as f64
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Optional per-track parameters stored after the descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    pub codec: u8,
    pub flags: [u8; 3],
    pub unk: u32,
    pub params: [f32; 6],
}

impl MetadataRecord {
    /// Read the record at `offset`.
    pub fn from_bank(data: &[u8], offset: usize) -> BankResult<Self> {
        let bytes = record(data, offset, METADATA_SIZE, "metadata record")?;
        Self::read(&mut FieldReader::new(bytes)).map_err(short_record(
            "metadata record",
            offset,
            METADATA_SIZE,
            data.len(),
        ))
    }

    fn read(r: &mut FieldReader<'_>) -> io::Result<Self> {
        let codec = r.u8()?;
        let flags = r.array()?;
        let unk = r.u32()?;
        let mut params = [0f32; 6];
        for param in params.iter_mut() {
            *param = r.f32()?;
        }
        Ok(Self {
            codec,
            flags,
            unk,
            params,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(METADATA_SIZE);
        out.push(self.codec);
        out.extend_from_slice(&self.flags);
        out.extend_from_slice(&self.unk.to_le_bytes());
        for param in self.params {
            out.extend_from_slice(&param.to_le_bytes());
        }
        out
    }
}
