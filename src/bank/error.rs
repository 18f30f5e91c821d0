//! Wave bank errors and the status surface reported to callers

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors raised while reading, decoding, patching or writing a wave bank
#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read wave bank")]
    Read(#[source] io::Error),

    #[error("failed to write wave bank")]
    Write(#[source] io::Error),

    #[error("{what} at offset {offset:#x} needs {needed} bytes but the bank is {len} bytes long")]
    Truncated {
        what: &'static str,
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("malformed wave bank: {0}")]
    Malformed(String),

    #[error("unsupported codec ({0})")]
    UnsupportedCodec(u8),

    #[error("wave bank size {size:#x} reaches the 2 GiB limit")]
    FileTooLarge { size: u64 },

    #[error("track index {index} out of range (bank has {count} tracks)")]
    InvalidIndex { index: usize, count: usize },

    #[error("no track with hash {0:#010x}")]
    HashNotFound(u32),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type BankResult<T> = Result<T, BankError>;

/// Closed set of outcomes reported by parse and write operations.
///
/// The integer codes double as process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BankStatus {
    Ok = 0,
    ParseFailed = 1,
    FileTooLarge = 2,
    WriteError = 3,
    InvalidReplaceIndex = 4,
    UnsupportedCodec = 5,
    HashNotFound = 6,
}

impl BankStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Convert from the integer code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(BankStatus::Ok),
            1 => Some(BankStatus::ParseFailed),
            2 => Some(BankStatus::FileTooLarge),
            3 => Some(BankStatus::WriteError),
            4 => Some(BankStatus::InvalidReplaceIndex),
            5 => Some(BankStatus::UnsupportedCodec),
            6 => Some(BankStatus::HashNotFound),
            _ => None,
        }
    }
}

impl fmt::Display for BankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BankStatus::Ok => "WBK_OK",
            BankStatus::ParseFailed => "WBK_PARSE_FAILED",
            BankStatus::FileTooLarge => "WBK_FILE_TOO_LARGE",
            BankStatus::WriteError => "WBK_WRITE_ERROR",
            BankStatus::InvalidReplaceIndex => "WBK_INVALID_REPLACE_INDEX",
            BankStatus::UnsupportedCodec => "WBK_UNSUPPORTED_CODEC",
            BankStatus::HashNotFound => "WBK_HASH_NOT_FOUND",
        };
        f.write_str(name)
    }
}

impl BankError {
    /// Status code this error is reported as.
    pub fn status(&self) -> BankStatus {
        match self {
            BankError::Read(_)
            | BankError::Truncated { .. }
            | BankError::Malformed(_)
            | BankError::InvalidInput(_) => BankStatus::ParseFailed,
            BankError::Write(_) => BankStatus::WriteError,
            BankError::UnsupportedCodec(_) => BankStatus::UnsupportedCodec,
            BankError::FileTooLarge { .. } => BankStatus::FileTooLarge,
            BankError::InvalidIndex { .. } => BankStatus::InvalidReplaceIndex,
            BankError::HashNotFound(_) => BankStatus::HashNotFound,
        }
    }
}

/// Status of a result: `Ok` on success, the error's status otherwise.
pub fn status_of<T>(result: &BankResult<T>) -> BankStatus {
    match result {
        Ok(_) => BankStatus::Ok,
        Err(e) => e.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_roundtrip() {
        for code in 0..7 {
            let status = BankStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert_eq!(BankStatus::from_code(7), None);
        assert_eq!(BankStatus::from_code(-1), None);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(BankError::UnsupportedCodec(9).status(), BankStatus::UnsupportedCodec);
        assert_eq!(
            BankError::InvalidIndex { index: 3, count: 2 }.status(),
            BankStatus::InvalidReplaceIndex
        );
        assert_eq!(BankError::FileTooLarge { size: 1 << 31 }.status(), BankStatus::FileTooLarge);
        assert_eq!(
            BankError::Write(io::Error::new(io::ErrorKind::Other, "disk full")).status(),
            BankStatus::WriteError
        );
        assert_eq!(BankError::Malformed("x".into()).status(), BankStatus::ParseFailed);
        assert_eq!(BankError::HashNotFound(1).status(), BankStatus::HashNotFound);
    }

    #[test]
    fn test_status_of() {
        let ok: BankResult<()> = Ok(());
        assert_eq!(status_of(&ok), BankStatus::Ok);
        let err: BankResult<()> = Err(BankError::HashNotFound(0xdead));
        assert_eq!(status_of(&err), BankStatus::HashNotFound);
    }

    #[test]
    fn test_io_cause_printed_once() {
        let err = BankError::Read(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert_eq!(err.to_string(), "failed to read wave bank");
        assert_eq!(
            format!("{:#}", anyhow::Error::from(err)),
            "failed to read wave bank: no such file"
        );

        let err = BankError::Write(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(format!("{:#}", anyhow::Error::from(err)), "failed to write wave bank: disk full");
    }

    #[test]
    fn test_error_messages() {
        let err = BankError::Truncated {
            what: "header",
            offset: 0,
            needed: 256,
            len: 10,
        };
        assert_eq!(
            err.to_string(),
            "header at offset 0x0 needs 256 bytes but the bank is 10 bytes long"
        );
        assert_eq!(
            BankError::HashNotFound(0xab).to_string(),
            "no track with hash 0x000000ab"
        );
        assert_eq!(BankStatus::HashNotFound.to_string(), "WBK_HASH_NOT_FOUND");
    }
}
