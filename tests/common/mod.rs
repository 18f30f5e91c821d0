//! Synthetic wave banks shared by the integration tests

#![allow(dead_code)]

use wbk::bank::layout::{descriptor_offset, DESCRIPTOR_SIZE, HEADER_SIZE, METADATA_SIZE};
use wbk::bank::{Descriptor, Header, MetadataRecord};

/// Where the first payload starts in a built bank.
pub const PAYLOAD_START: usize = 0x800;

/// One track of a synthetic bank.
pub struct TrackSpec {
    pub hash: u32,
    pub codec: u8,
    pub channels: usize,
    pub sample_rate: u16,
    pub payload: Vec<u8>,
}

impl TrackSpec {
    pub fn new(hash: u32, codec: u8, payload: Vec<u8>) -> Self {
        Self {
            hash,
            codec,
            channels: 1,
            sample_rate: 22050,
            payload,
        }
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }
}

/// Little-endian PCM bytes.
pub fn pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Build a bank: header, descriptors, one metadata record per track, a
/// bank type tag, then payloads packed back to back from [`PAYLOAD_START`].
pub fn build_bank(tracks: &[TrackSpec], bank_type: &str) -> Vec<u8> {
    let n = tracks.len();
    let metadata_offset = descriptor_offset(n);
    let entry_description_offset = metadata_offset + n * METADATA_SIZE;
    let mut data = vec![0u8; PAYLOAD_START];

    for (i, entry) in tracks.iter().enumerate() {
        let mut descriptor = Descriptor {
            hash: entry.hash,
            codec: entry.codec,
            num_bytes: entry.payload.len() as u32,
            num_samples: 0,
            compressed_data_offset: data.len() as u32,
            sample_rate: entry.sample_rate,
            ..Descriptor::default()
        };
        descriptor.set_channel_count(entry.channels).unwrap();
        let at = descriptor_offset(i);
        data[at..at + DESCRIPTOR_SIZE].copy_from_slice(&descriptor.to_bytes());

        let meta = MetadataRecord {
            codec: entry.codec,
            params: [0.5; 6],
            ..MetadataRecord::default()
        };
        let at = metadata_offset + i * METADATA_SIZE;
        data[at..at + METADATA_SIZE].copy_from_slice(&meta.to_bytes());

        data.extend_from_slice(&entry.payload);
    }
    let tag = bank_type.as_bytes();
    data[entry_description_offset..entry_description_offset + tag.len()].copy_from_slice(tag);

    let mut header = Header {
        num_entries: n as u32,
        total_bytes: data.len() as u32,
        metadata_offset: metadata_offset as u32,
        entry_description_offset: entry_description_offset as u32,
        ..Header::default()
    };
    header.magic.copy_from_slice(b"WBNK\0\0\0\0");
    header.name[..4].copy_from_slice(b"test");
    data[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    data
}
