//! Wave bank container
//!
//! A bank is a 256-byte header, a table of 40-byte track descriptors,
//! optional metadata records and the encoded track payloads. [`WaveBank`]
//! parses a bank, decodes its tracks and replaces payloads in place.

pub mod codec;
pub mod error;
pub mod hash;
pub mod layout;
pub mod store;

pub use codec::{Codec, CodecChoice, DecodeOptions};
pub use error::{status_of, BankError, BankResult, BankStatus};
pub use hash::{engine_hash, DictionaryError, HashDictionary};
pub use layout::{Descriptor, Header, MetadataRecord};
pub use store::{WaveBank, ALIGNMENT, SIZE_LIMIT};
