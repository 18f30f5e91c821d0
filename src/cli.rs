use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::bank::CodecChoice;
use crate::config::{parse_alpha, parse_codec, parse_dither, Options};
use crate::logging::LogLevel;
use crate::sound::StereoLayout;

/// Wave bank tool - extract and replace tracks in WBK audio banks
#[derive(Parser, Debug)]
#[command(name = "wbk-tool")]
#[command(version)]
#[command(about = "Extract and replace tracks in WBK audio banks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Name tracks by hash (0x<hash>.wav) and accept hashes as targets
    #[arg(long, global = true)]
    pub hash: bool,

    /// Name tracks through the dictionary and accept names as targets
    #[arg(long, global = true)]
    pub names: bool,

    /// Dictionary of track names, one per line
    #[arg(long, global = true, value_name = "FILE")]
    pub dict: Option<PathBuf>,

    /// Dither amplitude for predictive tracks (default 0.2 when given bare)
    #[arg(long, global = true, value_name = "AMOUNT", num_args = 0..=1,
          default_missing_value = DEFAULT_DITHER_AMOUNT_STR)]
    pub dither: Option<String>,

    /// Low-pass coefficient for predictive tracks (default 0.95 when given bare)
    #[arg(long, global = true, value_name = "ALPHA", num_args = 0..=1,
          default_missing_value = DEFAULT_LOW_PASS_ALPHA_STR)]
    pub lowpass: Option<String>,

    /// Remove DC offset from predictive tracks
    #[arg(long = "remove-dc", global = true)]
    pub remove_dc: bool,

    /// Treat continuous step stereo payloads as one block per channel
    #[arg(long = "planar-stereo", global = true)]
    pub planar_stereo: bool,

    /// Seed for the dither noise
    #[arg(long, global = true, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Codec for replacements (pcm, pcm2, vag, block, ima or a tag number)
    #[arg(short, long, global = true, value_name = "CODEC")]
    pub codec: Option<String>,

    /// Output bank path for replace
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Config file with key = value settings
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors through the exit code
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

const DEFAULT_DITHER_AMOUNT_STR: &str = "0.2";
const DEFAULT_LOW_PASS_ALPHA_STR: &str = "0.95";

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the tracks of a bank
    List {
        archive: PathBuf,
    },

    /// Decode every track of a bank to WAV files
    Extract {
        archive: PathBuf,
        out_dir: PathBuf,
    },

    /// Replace one track, or every track found in a folder
    Replace {
        archive: PathBuf,
        /// Track index, hash (--hash), name (--names) or a folder of WAVs
        target: String,
        /// WAV file to insert when the target is a single track
        replacement: Option<PathBuf>,
    },
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        opts.by_hash = self.hash;
        opts.resolve_names = self.names;

        if let Some(ref dict) = self.dict {
            opts.dictionary = Some(dict.clone());
        }

        if let Some(ref dither) = self.dither {
            let amount = parse_dither(dither)?;
            opts.decode.vag.dither = (amount > 0.0).then_some(amount);
        }

        if let Some(ref lowpass) = self.lowpass {
            opts.decode.vag.low_pass = Some(parse_alpha(lowpass).context("Invalid low-pass value")?);
        }

        if self.remove_dc {
            opts.decode.vag.remove_dc = true;
        }

        if self.planar_stereo {
            opts.decode.stereo_layout = StereoLayout::Planar;
        }

        if let Some(seed) = self.seed {
            opts.decode.vag.seed = seed;
        }

        if let Some(ref codec) = self.codec {
            opts.codec = Self::parse_codec_choice(codec)?;
        }

        if let Some(ref output) = self.output {
            opts.output = Some(output.clone());
        }

        opts.log_level = self.requested_log_level();

        Ok(opts)
    }

    /// Log level from `-v` and `-q`, known before any config is read
    pub fn requested_log_level(&self) -> LogLevel {
        Self::log_level(self.verbose, self.quiet)
    }

    fn parse_codec_choice(s: &str) -> Result<CodecChoice> {
        if s.eq_ignore_ascii_case("keep") {
            return Ok(CodecChoice::Keep);
        }
        let codec = parse_codec(s).with_context(|| {
            format!("Invalid codec: {}. Valid options: keep, pcm, pcm2, vag, block, ima", s)
        })?;
        Ok(CodecChoice::Use(codec))
    }

    fn log_level(verbose: u8, quiet: bool) -> LogLevel {
        if quiet {
            LogLevel::Nothing
        } else {
            LogLevel::Warning.raised(verbose)
        }
    }
}
