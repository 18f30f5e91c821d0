//! Track name hashing and the name dictionary
//!
//! Tracks are identified by a hash of their engine name. The hash folds
//! ASCII letters to lower case and multiplies by 33 per byte.
//!
//! # Dictionary format
//! ```text
//! # comments start with # or //
//! sfx/ambience/wind_light
//! 0x1234abcd music/title      <- hash column is ignored, the name is rehashed
//! ```

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use regex::Regex;
use thiserror::Error;

/// Hash of an engine name.
pub fn engine_hash(name: &str) -> u32 {
    name.bytes()
        .fold(0u32, |h, c| (c.to_ascii_lowercase() as u32).wrapping_add(h.wrapping_mul(33)))
}

/// Error type for dictionary loading
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Lines of the form `0x<hex> [name]`.
const HEX_PREFIXED_LINE: &str = r"^0[xX][0-9A-Fa-f]*(?:\s+(?P<name>.*))?$";

/// Two-way map between hashes and readable track names.
#[derive(Debug, Default)]
pub struct HashDictionary {
    by_hash: HashMap<u32, String>,
    by_name: HashMap<String, u32>,
}

impl HashDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dictionary from a reader
    pub fn parse<R: Read>(reader: R) -> io::Result<Self> {
        let hex_prefixed = Regex::new(HEX_PREFIXED_LINE).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut dict = Self::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }

            let name = match hex_prefixed.captures(trimmed) {
                Some(caps) => match caps.name("name").map(|m| m.as_str().trim()) {
                    Some(name) if !name.is_empty() => name,
                    // A bare hash has no name to offer
                    _ => continue,
                },
                None => trimmed,
            };
            dict.insert(name);
        }
        log::debug!("loaded {} dictionary names", dict.len());
        Ok(dict)
    }

    /// Load a dictionary file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(file).map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Add a name. The first mapping seen wins in both directions.
    pub fn insert(&mut self, name: &str) -> u32 {
        let key = name.to_lowercase();
        let hash = engine_hash(&key);
        self.by_hash.entry(hash).or_insert_with(|| name.to_string());
        self.by_name.entry(key).or_insert(hash);
        hash
    }

    /// Name recorded for a hash.
    pub fn name_for(&self, hash: u32) -> Option<&str> {
        self.by_hash.get(&hash).map(String::as_str)
    }

    /// Hash for a name, hashing the name itself when it is not listed.
    pub fn hash_for(&self, name: &str) -> u32 {
        let key = name.trim().to_lowercase();
        self.by_name.get(&key).copied().unwrap_or_else(|| engine_hash(&key))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
