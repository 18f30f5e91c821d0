//! Wave bank container
//!
//! A [`WaveBank`] owns the raw bank image together with its parsed header,
//! descriptors and metadata. Parsing always rebuilds all of them at once,
//! and [`WaveBank::replace`] builds a new image off to the side, re-parses
//! it and only then swaps it in.
//!
//! # Replacement layout
//!
//! ```text
//! [ bytes before track i, unchanged ]
//! [ new payload of track i ] [ zero padding to 0x8000 ]
//! [ old bytes of track i+1 ] [ zero padding to 0x8000 ]
//! ...
//! [ old bytes of the last track, through end of file ] [ zero padding ]
//! ```

use std::ops::Range;
use std::path::Path;

use super::codec::{Codec, CodecChoice, DecodeOptions};
use super::error::{BankError, BankResult};
use super::layout::{
    c_string, descriptor_offset, record, Descriptor, Header, MetadataRecord, BANK_TYPE_SIZE,
    DESCRIPTOR_SIZE, HEADER_SIZE, METADATA_SIZE,
};
use crate::sound::{ima, WavFile};

/// Track payloads after a replaced track start on multiples of this.
pub const ALIGNMENT: usize = 0x8000;

/// Banks must stay below the signed 32-bit size ceiling.
pub const SIZE_LIMIT: u64 = i32::MAX as u64;

fn align_up(offset: usize) -> usize {
    (offset + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

fn check_size(size: u64) -> BankResult<()> {
    if size >= SIZE_LIMIT {
        return Err(BankError::FileTooLarge { size });
    }
    Ok(())
}

/// A parsed wave bank.
#[derive(Debug, Clone)]
pub struct WaveBank {
    data: Vec<u8>,
    header: Header,
    descriptors: Vec<Descriptor>,
    metadata: Vec<MetadataRecord>,
    bank_type: Option<String>,
    tracks: Vec<Vec<i16>>,
    options: DecodeOptions,
}

impl WaveBank {
    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    /// Parse a bank image, decoding every track when `decode` is set.
    pub fn from_bytes(data: Vec<u8>, decode: bool, options: &DecodeOptions) -> BankResult<Self> {
        check_size(data.len() as u64)?;
        let header = Header::from_bytes(&data)?;
        check_size(header.total_bytes as u64)?;
        if header.total_bytes as usize != data.len() {
            log::warn!(
                "header declares {} bytes but the bank is {} bytes",
                header.total_bytes,
                data.len()
            );
        }

        let count = header.num_entries as usize;
        let table_size = count.checked_mul(DESCRIPTOR_SIZE).ok_or_else(|| {
            BankError::Malformed(format!("descriptor count {} is not plausible", count))
        })?;
        record(&data, HEADER_SIZE, table_size, "descriptor table")?;

        let mut descriptors = Vec::with_capacity(count);
        let mut tracks = Vec::with_capacity(if decode { count } else { 0 });

        for index in 0..count {
            let descriptor = Descriptor::from_bank(&data, index)?;
            log::debug!(
                "[{}] hash={:#010x} codec={} samples={} channels={} rate={}Hz length={:.3}s offs={:#x}",
                index,
                descriptor.hash,
                descriptor.codec,
                descriptor.num_samples,
                descriptor.channel_count(),
                descriptor.sample_rate,
                descriptor.duration_secs(),
                descriptor.compressed_data_offset
            );

            let payload = record(
                &data,
                descriptor.compressed_data_offset as usize,
                descriptor.num_bytes as usize,
                "track payload",
            )?;

            if decode {
                tracks.push(decode_payload(&descriptor, payload, options)?);
            }
            descriptors.push(descriptor);
        }

        let (metadata, bank_type) = Self::parse_metadata(&data, &header)?;

        Ok(Self {
            data,
            header,
            descriptors,
            metadata,
            bank_type,
            tracks,
            options: *options,
        })
    }

    fn parse_metadata(data: &[u8], header: &Header) -> BankResult<(Vec<MetadataRecord>, Option<String>)> {
        if header.metadata_offset == 0 {
            return Ok((Vec::new(), None));
        }

        let start = header.metadata_offset as usize;
        let count = header.metadata_count();
        record(data, start, count * METADATA_SIZE, "metadata block")?;

        let mut metadata = Vec::new();
        for index in 0..count {
            let entry = MetadataRecord::from_bank(data, start + index * METADATA_SIZE)?;
            if entry.codec != 0 {
                log::debug!("metadata #{} codec={} params={:?}", index + 1, entry.codec, entry.params);
                metadata.push(entry);
            }
        }

        let tag_offset = start + count * METADATA_SIZE;
        let bank_type = data
            .get(tag_offset..tag_offset + BANK_TYPE_SIZE)
            .filter(|tag| tag[0] != 0)
            .map(c_string);
        if let Some(kind) = &bank_type {
            log::debug!("bank type: {}", kind);
        }

        Ok((metadata, bank_type))
    }

    /// Read and parse a bank file.
    pub fn open<P: AsRef<Path>>(path: P, decode: bool, options: &DecodeOptions) -> BankResult<Self> {
        let data = std::fs::read(path.as_ref()).map_err(BankError::Read)?;
        Self::from_bytes(data, decode, options)
    }

    /// Re-parse this bank from a new image, keeping the current options.
    ///
    /// On failure the bank is left untouched.
    pub fn parse(&mut self, data: Vec<u8>, decode: bool) -> BankResult<()> {
        *self = Self::from_bytes(data, decode, &self.options)?;
        Ok(())
    }

    /// Write the bank image to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> BankResult<()> {
        check_size(self.data.len() as u64)?;
        std::fs::write(path.as_ref(), &self.data).map_err(BankError::Write)?;
        log::info!("wrote {} bytes to {}", self.data.len(), path.as_ref().display());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn metadata(&self) -> &[MetadataRecord] {
        &self.metadata
    }

    /// Descriptive tag stored after the metadata block, if any.
    pub fn bank_type(&self) -> Option<&str> {
        self.bank_type.as_deref()
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Tracks decoded during the last parse; empty when decoding was skipped.
    pub fn tracks(&self) -> &[Vec<i16>] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&[i16]> {
        self.tracks.get(index).map(Vec::as_slice)
    }

    /// Descriptor at `index`, or an out-of-range error.
    pub fn descriptor(&self, index: usize) -> BankResult<&Descriptor> {
        self.descriptors.get(index).ok_or(BankError::InvalidIndex {
            index,
            count: self.descriptors.len(),
        })
    }

    pub fn channel_count(&self, index: usize) -> BankResult<usize> {
        Ok(self.descriptor(index)?.channel_count())
    }

    pub fn duration_secs(&self, index: usize) -> BankResult<f64> {
        Ok(self.descriptor(index)?.duration_secs())
    }

    /// Compressed payload of a track.
    pub fn payload(&self, index: usize) -> BankResult<&[u8]> {
        let descriptor = self.descriptor(index)?;
        record(
            &self.data,
            descriptor.compressed_data_offset as usize,
            descriptor.num_bytes as usize,
            "track payload",
        )
    }

    /// Decode one track on demand.
    pub fn decode_track(&self, index: usize, options: &DecodeOptions) -> BankResult<Vec<i16>> {
        decode_payload(self.descriptor(index)?, self.payload(index)?, options)
    }

    /// Index of the first track with the given hash.
    pub fn find_by_hash(&self, hash: u32) -> BankResult<usize> {
        self.descriptors
            .iter()
            .position(|d| d.hash == hash)
            .ok_or(BankError::HashNotFound(hash))
    }

    // -----------------------------------------------------------------------
    // Replacement
    // -----------------------------------------------------------------------

    /// Old byte regions of the tracks after `index`, in track order.
    fn later_regions(&self, index: usize) -> BankResult<Vec<(usize, Range<usize>)>> {
        let count = self.descriptors.len();
        let mut previous = self.descriptors[index].compressed_data_offset as usize;
        let mut regions = Vec::with_capacity(count - index - 1);

        for j in index + 1..count {
            let start = self.descriptors[j].compressed_data_offset as usize;
            let end = match self.descriptors.get(j + 1) {
                Some(next) => next.compressed_data_offset as usize,
                None => self.data.len(),
            };
            if start < previous || end < start || end > self.data.len() {
                return Err(BankError::Malformed(format!(
                    "track {} spans {:#x}..{:#x}, out of order with its neighbours",
                    j, start, end
                )));
            }
            regions.push((j, start..end));
            previous = start;
        }
        Ok(regions)
    }

    /// Trailing data behind the last track's payload that a header offset
    /// points into. Only consulted when the last track itself is replaced.
    fn trailer(&self, index: usize) -> Option<Range<usize>> {
        if index + 1 != self.descriptors.len() {
            return None;
        }
        let payload_end = self.descriptors[index].payload_range().end;
        [self.header.metadata_offset, self.header.entry_description_offset]
            .into_iter()
            .map(|offset| offset as usize)
            .filter(|&offset| offset != 0 && offset >= payload_end && offset < self.data.len())
            .min()
            .map(|start| start..self.data.len())
    }

    /// Re-encode track `index` from interleaved `samples` and rebuild the
    /// bank around it.
    ///
    /// Either the rebuilt image parses cleanly and replaces the bank, or the
    /// bank is left exactly as it was. Decoded tracks are not kept after a
    /// replacement; use [`WaveBank::decode_track`].
    pub fn replace(
        &mut self,
        index: usize,
        samples: &[i16],
        channels: usize,
        sample_rate: u32,
        codec: CodecChoice,
    ) -> BankResult<()> {
        let old = self.descriptor(index)?.clone();
        let count = self.descriptors.len();

        let mut patched = old.clone();
        if patched.channel_count() != channels {
            patched.set_channel_count(channels)?;
        }
        patched.sample_rate = u16::try_from(sample_rate)
            .map_err(|_| BankError::InvalidInput(format!("sample rate {} does not fit 16 bits", sample_rate)))?;

        let codec: Codec = codec.resolve(old.codec)?;
        let payload = codec.encode(samples, channels, self.options.stereo_layout)?;
        // An empty payload would leave the next track on the same offset
        if payload.is_empty() {
            return Err(BankError::InvalidInput(format!(
                "track {} would encode to an empty {} payload",
                index, codec
            )));
        }

        let start = old.compressed_data_offset as usize;
        if start < descriptor_offset(count) || start > self.data.len() {
            return Err(BankError::Malformed(format!(
                "track {} starts at {:#x}, outside the payload area",
                index, start
            )));
        }
        let regions = self.later_regions(index)?;
        let trailer = self.trailer(index);

        // Assemble the new image
        let mut out = Vec::with_capacity(self.data.len() + payload.len() + ALIGNMENT);
        out.extend_from_slice(&self.data[..start]);
        out.extend_from_slice(&payload);
        out.resize(align_up(out.len()), 0);

        let mut moves: Vec<(Range<usize>, usize)> = Vec::with_capacity(regions.len() + 1);
        if let Some(trailer) = trailer {
            moves.push((trailer.clone(), out.len()));
            out.extend_from_slice(&self.data[trailer]);
            out.resize(align_up(out.len()), 0);
        }

        let mut descriptors = self.descriptors.clone();
        for (j, region) in regions {
            let new_start = out.len();
            check_size(new_start as u64)?;
            descriptors[j].compressed_data_offset = new_start as u32;
            moves.push((region.clone(), new_start));
            out.extend_from_slice(&self.data[region]);
            out.resize(align_up(out.len()), 0);
        }
        check_size(out.len() as u64)?;

        // Patch records
        patched.codec = codec.tag();
        patched.num_bytes = payload.len() as u32;
        patched.num_samples = (samples.len() / channels) as u32;
        descriptors[index] = patched;

        let mut header = self.header.clone();
        header.total_bytes = out.len() as u32;
        let old_len = self.data.len();
        for offset in [&mut header.metadata_offset, &mut header.entry_description_offset] {
            *offset = relocate(*offset, start, old_len, &moves);
        }

        out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        for (j, descriptor) in descriptors.iter().enumerate() {
            let at = descriptor_offset(j);
            out[at..at + DESCRIPTOR_SIZE].copy_from_slice(&descriptor.to_bytes());
        }

        let new_len = out.len();
        self.parse(out, false)?;
        log::info!(
            "replaced track {} ({:#010x}) with {} bytes of {}, bank is now {} bytes",
            index,
            old.hash,
            payload.len(),
            codec,
            new_len
        );
        Ok(())
    }

    /// [`WaveBank::replace`] with the samples and format of a WAV file.
    pub fn replace_wav(&mut self, index: usize, wav: &WavFile, codec: CodecChoice) -> BankResult<()> {
        self.replace(index, &wav.samples, wav.channels as usize, wav.sample_rate, codec)
    }
}

/// Decode a track payload, trimmed to the recorded frame count where the
/// codec pads partial bytes.
fn decode_payload(descriptor: &Descriptor, payload: &[u8], options: &DecodeOptions) -> BankResult<Vec<i16>> {
    let codec = descriptor.codec()?;
    let channels = descriptor.channel_count();
    Ok(match codec {
        Codec::Ima if descriptor.num_samples != 0 => ima::decode_frames(
            payload,
            channels,
            options.stereo_layout,
            descriptor.num_samples as usize,
        ),
        _ => codec.decode(payload, channels, options),
    })
}

/// Map a header offset through the regions moved by a replacement.
fn relocate(offset: u32, replaced_start: usize, old_len: usize, moves: &[(Range<usize>, usize)]) -> u32 {
    let value = offset as usize;
    if offset == 0 || value < replaced_start {
        return offset;
    }
    for (old, new_start) in moves {
        if old.contains(&value) || (value == old_len && old.end == old_len) {
            return (new_start + (value - old.start)) as u32;
        }
    }
    log::warn!(
        "header offset {:#x} pointed into the replaced payload and was left unchanged",
        offset
    );
    offset
}
