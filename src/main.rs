use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use wbk::bank::{BankError, BankStatus, HashDictionary, WaveBank};
use wbk::cli::{Cli, Command};
use wbk::config::{self, parse_hash, Options};
use wbk::logging;
use wbk::sound::{WavError, WavFile};

fn main() {
    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{:#}", err);
            exit_status(&err).code()
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    logging::log_init(cli.requested_log_level());

    // Load the config file, then let the command line override it
    let options = config::load_config(cli.config.as_deref())?;
    let options = cli.merge_into_options(options)?;
    log::debug!("options: {:?}", options);

    let dictionary = load_dictionary(options.dictionary.as_deref());

    match &cli.command {
        Command::List { archive } => list(archive, &options, dictionary.as_ref()),
        Command::Extract { archive, out_dir } => extract(archive, out_dir, &options, dictionary.as_ref()),
        Command::Replace {
            archive,
            target,
            replacement,
        } => replace(archive, target, replacement.as_deref(), &options, dictionary.as_ref()),
    }
}

/// Load the name dictionary; a missing or unreadable file only warns.
fn load_dictionary(path: Option<&Path>) -> Option<HashDictionary> {
    match HashDictionary::from_file(path?) {
        Ok(dictionary) => Some(dictionary),
        Err(err) => {
            log::warn!("{:#}, continuing without names", anyhow::Error::from(err));
            None
        }
    }
}

/// Status code reported for a failure
fn exit_status(err: &anyhow::Error) -> BankStatus {
    if let Some(bank) = err.downcast_ref::<BankError>() {
        return bank.status();
    }
    match err.downcast_ref::<WavError>() {
        Some(WavError::Write { .. }) => BankStatus::WriteError,
        _ => BankStatus::ParseFailed,
    }
}

// ---------------------------------------------------------------------------
// Track naming
// ---------------------------------------------------------------------------

/// File name for a track: the dictionary name, the hash or the index.
///
/// `--names` falls back to the hash for tracks the dictionary does not know.
fn track_file_name(index: usize, hash: u32, opts: &Options, dictionary: Option<&HashDictionary>) -> PathBuf {
    if opts.resolve_names {
        if let Some(path) = dictionary.and_then(|d| d.name_for(hash)).and_then(wav_path) {
            return path;
        }
    }
    if opts.by_hash || opts.resolve_names {
        return PathBuf::from(format!("0x{:08x}.wav", hash));
    }
    PathBuf::from(format!("{}.wav", index))
}

/// `<name>.wav` as a relative path, or None when nothing usable is left.
fn wav_path(name: &str) -> Option<PathBuf> {
    let mut path = sanitize_name(name);
    let file = format!("{}.wav", path.file_name()?.to_string_lossy());
    path.set_file_name(file);
    Some(path)
}

/// Relative path for a dictionary name, dropping empty, `.` and `..` parts.
fn sanitize_name(name: &str) -> PathBuf {
    name.split(['/', '\\'])
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn list(archive: &Path, opts: &Options, dictionary: Option<&HashDictionary>) -> Result<i32> {
    let bank = WaveBank::open(archive, false, &opts.decode)?;
    println!(
        "{}: {} tracks, {} bytes{}",
        bank.header().name(),
        bank.len(),
        bank.as_bytes().len(),
        bank.bank_type().map(|t| format!(", type {}", t)).unwrap_or_default()
    );
    for (index, descriptor) in bank.descriptors().iter().enumerate() {
        let codec = descriptor
            .codec()
            .map(|c| c.to_string())
            .unwrap_or_else(|_| format!("unknown ({})", descriptor.codec));
        let name = dictionary.and_then(|d| d.name_for(descriptor.hash)).unwrap_or("");
        println!(
            "{:4}  0x{:08x}  {:14}  {}ch  {:6} Hz  {:8.3}s  {}",
            index,
            descriptor.hash,
            codec,
            descriptor.channel_count(),
            descriptor.sample_rate,
            descriptor.duration_secs(),
            name
        );
    }
    Ok(BankStatus::Ok.code())
}

fn extract(archive: &Path, out_dir: &Path, opts: &Options, dictionary: Option<&HashDictionary>) -> Result<i32> {
    let bank = WaveBank::open(archive, true, &opts.decode)?;
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for (index, samples) in bank.tracks().iter().enumerate() {
        let descriptor = bank.descriptor(index)?;
        let path = out_dir.join(track_file_name(index, descriptor.hash, opts, dictionary));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let wav = WavFile::new(
            descriptor.sample_rate as u32,
            descriptor.channel_count() as u16,
            samples.clone(),
        );
        wav.write(&path)?;
        log::info!("track {} -> {}", index, path.display());
    }

    log::info!("extracted {} tracks to {}", bank.len(), out_dir.display());
    Ok(BankStatus::Ok.code())
}

fn replace(
    archive: &Path,
    target: &str,
    replacement: Option<&Path>,
    opts: &Options,
    dictionary: Option<&HashDictionary>,
) -> Result<i32> {
    let mut bank = WaveBank::open(archive, false, &opts.decode)?;
    let target_path = Path::new(target);

    let (code, replaced) = if replacement.is_none() && target_path.is_dir() {
        replace_folder(&mut bank, target_path, opts, dictionary)?
    } else {
        let replacement = replacement.context("A replacement WAV file is required unless the target is a folder")?;
        let index = resolve_target(&bank, target, opts, dictionary)?;
        let wav = WavFile::read(replacement)?;
        bank.replace_wav(index, &wav, opts.codec)?;
        (BankStatus::Ok.code(), 1)
    };

    let output = output_path(archive, opts);
    if replaced == 0 {
        log::warn!("no tracks replaced, not writing {}", output.display());
        return Ok(code);
    }
    bank.save(&output)?;
    log::info!("wrote {}", output.display());
    Ok(code)
}

/// Track index named by a target argument
fn resolve_target(bank: &WaveBank, target: &str, opts: &Options, dictionary: Option<&HashDictionary>) -> Result<usize> {
    if opts.by_hash {
        return Ok(bank.find_by_hash(parse_hash(target)?)?);
    }
    if opts.resolve_names {
        let hash = match dictionary {
            Some(dictionary) => dictionary.hash_for(target),
            None => wbk::bank::engine_hash(target.trim()),
        };
        return Ok(bank.find_by_hash(hash)?);
    }

    let index: usize = target
        .trim()
        .parse()
        .with_context(|| format!("Invalid track index: {}", target))?;
    bank.descriptor(index)?;
    Ok(index)
}

/// Replace every track that has a matching WAV in `folder`.
///
/// Returns the status of the first failure and the number of tracks
/// replaced; missing files are only reported.
fn replace_folder(
    bank: &mut WaveBank,
    folder: &Path,
    opts: &Options,
    dictionary: Option<&HashDictionary>,
) -> Result<(i32, usize)> {
    let mut first_failure = BankStatus::Ok;
    let mut replaced = 0usize;
    let mut missing = Vec::new();

    for index in 0..bank.len() {
        let hash = bank.descriptor(index)?.hash;
        let Some(path) = folder_candidates(folder, index, hash, opts, dictionary)
            .into_iter()
            .find(|p| p.is_file())
        else {
            missing.push(index);
            continue;
        };

        let result = WavFile::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|wav| Ok(bank.replace_wav(index, &wav, opts.codec)?));
        match result {
            Ok(()) => replaced += 1,
            Err(err) => {
                log::error!("track {} from {}: {:#}", index, path.display(), err);
                if first_failure == BankStatus::Ok {
                    first_failure = exit_status(&err);
                }
            }
        }
    }

    if !missing.is_empty() {
        log::warn!("no replacement found for {} tracks: {:?}", missing.len(), missing);
    }
    log::info!("replaced {} of {} tracks from {}", replaced, bank.len(), folder.display());
    Ok((first_failure.code(), replaced))
}

/// Candidate replacement files for a track, in lookup order
fn folder_candidates(
    folder: &Path,
    index: usize,
    hash: u32,
    opts: &Options,
    dictionary: Option<&HashDictionary>,
) -> Vec<PathBuf> {
    let mut candidates = vec![folder.join(format!("{}.wav", index))];
    if opts.resolve_names {
        if let Some(path) = dictionary.and_then(|d| d.name_for(hash)).and_then(wav_path) {
            candidates.push(folder.join(path));
        }
    }
    if opts.by_hash || opts.resolve_names {
        candidates.push(folder.join(format!("0x{:08x}.wav", hash)));
    }
    candidates
}

/// `--output`, or `<stem>.new.wbk` next to the input
fn output_path(archive: &Path, opts: &Options) -> PathBuf {
    if let Some(ref output) = opts.output {
        return output.clone();
    }
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bank".to_string());
    archive.with_file_name(format!("{}.new.wbk", stem))
}
