//! Wave bank integration tests
//!
//! These tests build synthetic banks in memory, run them through parse,
//! replace and save, and check the container invariants on the result.

mod common;

use common::{build_bank, pcm, TrackSpec, PAYLOAD_START};
use wbk::bank::{
    engine_hash, status_of, BankError, BankStatus, Codec, CodecChoice, DecodeOptions, HashDictionary, WaveBank,
    ALIGNMENT,
};
use wbk::sound::{ima, StereoLayout, WavFile};

fn sample_bank() -> Vec<u8> {
    build_bank(
        &[
            TrackSpec::new(engine_hash("sfx/door"), 1, pcm(&[10, -10, 20, -20])),
            TrackSpec::new(engine_hash("sfx/wind"), 7, ima::encode(&[0, 500, 1000, 1500], 1, StereoLayout::Interleaved)),
            TrackSpec::new(engine_hash("music/theme"), 2, pcm(&[7; 16]).repeat(2)).channels(2),
        ],
        "SFX",
    )
}

fn open(data: Vec<u8>) -> WaveBank {
    WaveBank::from_bytes(data, true, &DecodeOptions::default()).unwrap()
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| ((i as i32 * 97) % 4000 - 2000) as i16).collect()
}

#[test]
fn test_parse_synthetic_bank() {
    let bank = open(sample_bank());
    assert_eq!(bank.len(), 3);
    assert_eq!(bank.header().name(), "test");
    assert_eq!(bank.bank_type(), Some("SFX"));
    assert_eq!(bank.metadata().len(), 3);

    assert_eq!(bank.track(0).unwrap(), &[10, -10, 20, -20]);
    assert_eq!(bank.track(1).unwrap().len(), 4);
    assert_eq!(bank.track(2).unwrap(), &[7; 32][..]);
    assert_eq!(bank.channel_count(2).unwrap(), 2);
    assert_eq!(bank.descriptors()[0].compressed_data_offset as usize, PAYLOAD_START);
}

#[test]
fn test_find_by_hash_and_dictionary() {
    let bank = open(sample_bank());
    let mut dict = HashDictionary::new();
    dict.insert("Music/Theme");

    let index = bank.find_by_hash(dict.hash_for("music/theme")).unwrap();
    assert_eq!(index, 2);
    assert_eq!(dict.name_for(bank.descriptors()[index].hash), Some("Music/Theme"));

    let missing = bank.find_by_hash(engine_hash("sfx/none"));
    assert_eq!(status_of(&missing), BankStatus::HashNotFound);
}

#[test]
fn test_replace_keeps_container_invariants() {
    let original = open(sample_bank());
    let samples = ramp(300);

    for codec in [Codec::Pcm, Codec::Pcm2, Codec::Vag, Codec::BlockAdpcm, Codec::Ima] {
        for index in 0..original.len() {
            let mut bank = open(sample_bank());
            bank.replace(index, &samples, 1, 44100, CodecChoice::Use(codec)).unwrap();

            let data = bank.as_bytes();
            assert_eq!(bank.header().total_bytes as usize, data.len(), "{} at {}", codec, index);
            assert_eq!(data.len() % ALIGNMENT, 0);

            let replaced = &bank.descriptors()[index];
            assert_eq!(replaced.codec, codec.tag());
            assert_eq!(replaced.sample_rate, 44100);
            assert_eq!(replaced.num_samples, 300);
            assert_eq!(replaced.channel_count(), 1);
            assert_eq!(replaced.compressed_data_offset, original.descriptors()[index].compressed_data_offset);

            for j in 0..original.len() {
                if j == index {
                    continue;
                }
                // Untouched tracks keep their bytes; later ones move to aligned offsets
                assert_eq!(bank.payload(j).unwrap(), original.payload(j).unwrap());
                assert_eq!(bank.descriptors()[j].hash, original.descriptors()[j].hash);
                if j > index {
                    assert_eq!(bank.descriptors()[j].compressed_data_offset as usize % ALIGNMENT, 0);
                } else {
                    assert_eq!(
                        bank.descriptors()[j].compressed_data_offset,
                        original.descriptors()[j].compressed_data_offset
                    );
                }
            }
        }
    }
}

#[test]
fn test_replace_empty_input_keeps_offsets_increasing() {
    let mut bank = open(sample_bank());
    bank.replace(0, &[10, 11], 1, 22050, CodecChoice::Use(Codec::Pcm)).unwrap();
    assert_eq!(bank.descriptors()[1].compressed_data_offset as usize, ALIGNMENT);
    let before = bank.as_bytes().to_vec();

    let result = bank.replace(1, &[], 1, 22050, CodecChoice::Use(Codec::Pcm));
    assert!(matches!(result, Err(BankError::InvalidInput(_))));
    assert_eq!(status_of(&result), BankStatus::ParseFailed);
    assert_eq!(bank.as_bytes(), before.as_slice());

    // The predictive codec always writes a terminator, so it still succeeds
    bank.replace(1, &[], 1, 22050, CodecChoice::Use(Codec::Vag)).unwrap();
    let offsets: Vec<u32> = bank.descriptors().iter().map(|d| d.compressed_data_offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]), "{:x?}", offsets);
}

#[test]
fn test_replace_pcm_decodes_exactly() {
    let mut bank = open(sample_bank());
    let samples = ramp(100);
    bank.replace(1, &samples, 1, 22050, CodecChoice::Use(Codec::Pcm)).unwrap();
    assert!(bank.tracks().is_empty());
    assert_eq!(bank.decode_track(1, &DecodeOptions::default()).unwrap(), samples);
    assert_eq!(bank.bank_type(), Some("SFX"));
    assert_eq!(bank.metadata().len(), 3);
}

#[test]
fn test_replace_with_stereo_updates_mask() {
    let mut bank = open(sample_bank());
    let stereo = ramp(256);
    bank.replace(0, &stereo, 2, 32000, CodecChoice::Use(Codec::Ima)).unwrap();

    let descriptor = &bank.descriptors()[0];
    assert_eq!(descriptor.channel_mask, 0b11);
    assert_eq!(descriptor.num_samples, 128);
    assert_eq!(descriptor.num_bytes, 128);
    assert_eq!(bank.decode_track(0, &DecodeOptions::default()).unwrap().len(), 256);
}

#[test]
fn test_replace_keep_codec() {
    let mut bank = open(sample_bank());
    bank.replace(1, &ramp(64), 1, 22050, CodecChoice::Keep).unwrap();
    assert_eq!(bank.descriptors()[1].codec().unwrap(), Codec::Ima);
    assert_eq!(bank.descriptors()[1].num_bytes, 32);
}

#[test]
fn test_replace_failures_leave_bank_unchanged() {
    let mut bank = open(sample_bank());
    let before = bank.as_bytes().to_vec();

    let result = bank.replace(3, &ramp(10), 1, 22050, CodecChoice::Keep);
    assert_eq!(status_of(&result), BankStatus::InvalidReplaceIndex);

    let result = bank.replace(0, &ramp(10), 1, 22050, CodecChoice::Use(Codec::Reserved));
    assert_eq!(status_of(&result), BankStatus::UnsupportedCodec);

    let result = bank.replace(0, &ramp(10), 1, 96000, CodecChoice::Keep);
    assert!(matches!(result, Err(BankError::InvalidInput(_))));

    let result = bank.replace(0, &ramp(10), 9, 22050, CodecChoice::Keep);
    assert_eq!(status_of(&result), BankStatus::ParseFailed);

    assert_eq!(bank.as_bytes(), before.as_slice());
    assert_eq!(bank.tracks().len(), 3);
}

#[test]
fn test_replace_wav_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let bank_path = dir.path().join("sfx.wbk");
    let wav_path = dir.path().join("door.wav");
    std::fs::write(&bank_path, sample_bank()).unwrap();

    let wav = WavFile::new(11025, 1, ramp(200));
    wav.write(&wav_path).unwrap();

    let mut bank = WaveBank::open(&bank_path, false, &DecodeOptions::default()).unwrap();
    let wav = WavFile::read(&wav_path).unwrap();
    bank.replace_wav(0, &wav, CodecChoice::Use(Codec::Pcm)).unwrap();

    let out_path = dir.path().join("sfx.new.wbk");
    bank.save(&out_path).unwrap();

    let reopened = WaveBank::open(&out_path, true, &DecodeOptions::default()).unwrap();
    assert_eq!(reopened.track(0).unwrap(), wav.samples.as_slice());
    assert_eq!(reopened.descriptors()[0].sample_rate, 11025);
    assert_eq!(reopened.track(2).unwrap(), &[7; 32][..]);
    assert_eq!(reopened.as_bytes(), bank.as_bytes());
}

#[test]
fn test_parse_failures() {
    let options = DecodeOptions::default();

    let result = WaveBank::from_bytes(vec![0; 100], false, &options);
    assert_eq!(status_of(&result), BankStatus::ParseFailed);

    let mut data = sample_bank();
    data.truncate(data.len() - 1);
    let result = WaveBank::from_bytes(data, false, &options);
    assert!(matches!(result, Err(BankError::Truncated { .. })));

    let mut data = sample_bank();
    data[wbk::bank::layout::descriptor_offset(0) + 4] = 9;
    assert!(WaveBank::from_bytes(data.clone(), false, &options).is_ok());
    let result = WaveBank::from_bytes(data, true, &options);
    assert_eq!(status_of(&result), BankStatus::UnsupportedCodec);

    let result = WaveBank::open("/nonexistent/dir/bank.wbk", false, &options);
    assert_eq!(status_of(&result), BankStatus::ParseFailed);
}
