// Wave bank library
// Container parsing and the ADPCM codecs used by its tracks

pub mod bank;
pub mod cli;
pub mod config;
pub mod logging;
pub mod sound;

pub use bank::{BankError, BankStatus, Codec, WaveBank};
pub use cli::Cli;
pub use config::Options;
pub use logging::LogLevel;
