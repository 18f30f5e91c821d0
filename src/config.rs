use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::bank::{Codec, CodecChoice, DecodeOptions};
use crate::logging::LogLevel;
use crate::sound::StereoLayout;

/// Tool options that can be set via CLI or config file
#[derive(Debug, Clone)]
pub struct Options {
    // Commandline and config file options
    pub codec: CodecChoice,
    pub dictionary: Option<PathBuf>,
    pub decode: DecodeOptions,

    // Commandline-only options
    pub by_hash: bool,
    pub resolve_names: bool,
    pub log_level: LogLevel,
    pub output: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            codec: CodecChoice::Keep,
            dictionary: None,
            decode: DecodeOptions::default(),
            by_hash: false,
            resolve_names: false,
            log_level: LogLevel::Warning,
            output: None,
        }
    }
}

/// Load options from a `key = value` config file.
///
/// Without a path the defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<Options> {
    let mut opts = Options::default();
    let Some(path) = path else {
        return Ok(opts);
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    for (number, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            anyhow::bail!("{}:{}: expected key = value", path.display(), number + 1);
        };
        apply_setting(&mut opts, key.trim(), value.trim())
            .with_context(|| format!("{}:{}", path.display(), number + 1))?;
    }

    log::debug!("loaded config from {}", path.display());
    Ok(opts)
}

fn apply_setting(opts: &mut Options, key: &str, value: &str) -> Result<()> {
    match key.to_lowercase().as_str() {
        "codec" => {
            opts.codec = if value.eq_ignore_ascii_case("keep") {
                CodecChoice::Keep
            } else {
                CodecChoice::Use(parse_codec(value)?)
            };
        }
        "dither" => {
            let amount = parse_dither(value)?;
            opts.decode.vag.dither = (amount > 0.0).then_some(amount);
        }
        "lowpass" => opts.decode.vag.low_pass = Some(parse_alpha(value)?),
        "remove_dc" => opts.decode.vag.remove_dc = parse_bool(value)?,
        "stereo_layout" => opts.decode.stereo_layout = parse_stereo_layout(value)?,
        "dictionary" => opts.dictionary = Some(PathBuf::from(value)),
        "dither_seed" => {
            opts.decode.vag.seed = value.parse().context("Invalid dither seed")?;
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}

/// Parse a codec given by numeric tag or name
pub fn parse_codec(s: &str) -> Result<Codec> {
    let codec: Codec = s.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if codec.is_reserved() {
        anyhow::bail!("Codec {} cannot be encoded", codec);
    }
    Ok(codec)
}

/// Parse a track hash, either `0x` hex or decimal
pub fn parse_hash(s: &str) -> Result<u32> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).context("Invalid hex hash"),
        None => s.parse().context("Invalid hash value"),
    }
}

/// Parse a one-pole filter coefficient in `[0, 1)`
pub fn parse_alpha(s: &str) -> Result<f64> {
    let alpha: f64 = s.trim().parse().context("Invalid filter coefficient")?;
    if !(0.0..1.0).contains(&alpha) {
        anyhow::bail!("Filter coefficient out of range (0.0 to below 1.0)");
    }
    Ok(alpha)
}

/// Parse a dither amplitude, non-negative
pub fn parse_dither(s: &str) -> Result<f64> {
    let amount: f64 = s.trim().parse().context("Invalid dither amount")?;
    if !amount.is_finite() || amount < 0.0 {
        anyhow::bail!("Dither amount must be a non-negative number");
    }
    Ok(amount)
}

pub fn parse_stereo_layout(s: &str) -> Result<StereoLayout> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid boolean: {}. Valid options: true, false", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codec() {
        assert_eq!(parse_codec("ima").unwrap(), Codec::Ima);
        assert_eq!(parse_codec("4").unwrap(), Codec::Vag);
        assert!(parse_codec("3").is_err()); // Reserved
        assert!(parse_codec("0").is_err());
        assert!(parse_codec("flac").is_err());
    }

    #[test]
    fn test_parse_hash() {
        assert_eq!(parse_hash("0x1A2b").unwrap(), 0x1A2B);
        assert_eq!(parse_hash("0XFFFFFFFF").unwrap(), u32::MAX);
        assert_eq!(parse_hash(" 42 ").unwrap(), 42);
        assert!(parse_hash("0x").is_err());
        assert!(parse_hash("0x100000000").is_err());
        assert!(parse_hash("wind").is_err());
    }

    #[test]
    fn test_parse_alpha() {
        assert_eq!(parse_alpha("0").unwrap(), 0.0);
        assert_eq!(parse_alpha("0.95").unwrap(), 0.95);
        assert!(parse_alpha("1.0").is_err());
        assert!(parse_alpha("-0.1").is_err());
        assert!(parse_alpha("abc").is_err());
    }

    #[test]
    fn test_parse_dither() {
        assert_eq!(parse_dither("0.2").unwrap(), 0.2);
        assert_eq!(parse_dither("0").unwrap(), 0.0);
        assert!(parse_dither("-1").is_err());
        assert!(parse_dither("inf").is_err());
    }

    #[test]
    fn test_parse_stereo_layout() {
        assert_eq!(parse_stereo_layout("planar").unwrap(), StereoLayout::Planar);
        assert_eq!(
            parse_stereo_layout("Interleaved").unwrap(),
            StereoLayout::Interleaved
        );
        assert!(parse_stereo_layout("mono").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("yes").unwrap());
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_options_default() {
        let opts = Options::default();
        assert_eq!(opts.codec, CodecChoice::Keep);
        assert_eq!(opts.log_level, LogLevel::Warning);
        assert!(opts.dictionary.is_none());
        assert!(!opts.by_hash);
        assert_eq!(opts.decode, DecodeOptions::default());
    }

    #[test]
    fn test_load_config_without_path() {
        let opts = load_config(None).unwrap();
        assert_eq!(opts.codec, CodecChoice::Keep);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wbk.cfg");
        std::fs::write(
            &path,
            "# wave bank tool\n\
             codec = block\n\
             dither = 0.5   # noise\n\
             lowpass=0.9\n\
             \n\
             remove_dc = yes\n\
             stereo_layout = planar\n\
             dictionary = names.txt\n\
             dither_seed = 7\n",
        )
        .unwrap();

        let opts = load_config(Some(&path)).unwrap();
        assert_eq!(opts.codec, CodecChoice::Use(Codec::BlockAdpcm));
        assert_eq!(opts.decode.vag.dither, Some(0.5));
        assert_eq!(opts.decode.vag.low_pass, Some(0.9));
        assert!(opts.decode.vag.remove_dc);
        assert_eq!(opts.decode.vag.seed, 7);
        assert_eq!(opts.decode.stereo_layout, StereoLayout::Planar);
        assert_eq!(opts.dictionary, Some(PathBuf::from("names.txt")));
    }

    #[test]
    fn test_load_config_zero_dither_disables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wbk.cfg");
        std::fs::write(&path, "dither = 0\ncodec = keep\n").unwrap();
        let opts = load_config(Some(&path)).unwrap();
        assert_eq!(opts.decode.vag.dither, None);
        assert_eq!(opts.codec, CodecChoice::Keep);
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wbk.cfg");

        std::fs::write(&path, "codec\n").unwrap();
        assert!(load_config(Some(&path)).is_err());

        std::fs::write(&path, "volume = 3\n").unwrap();
        assert!(load_config(Some(&path)).is_err());

        std::fs::write(&path, "lowpass = 2\n").unwrap();
        assert!(load_config(Some(&path)).is_err());

        assert!(load_config(Some(&dir.path().join("missing.cfg"))).is_err());
    }
}
