//! Identity key file error types.

use std::fmt;
use std::path::PathBuf;

/// Step of a key file read or write that hit an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFileOp {
    Open,
    WriteHeader,
    WriteData,
    Flush,
    Sync,
    ReadHeader,
    ReadData,
}

impl KeyFileOp {
    /// Verb phrase used in messages ("Failed to <op>").
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyFileOp::Open => "open",
            KeyFileOp::WriteHeader => "write the header",
            KeyFileOp::WriteData => "write datas",
            KeyFileOp::Flush => "flush",
            KeyFileOp::Sync => "sync",
            KeyFileOp::ReadHeader => "read the header",
            KeyFileOp::ReadData => "read a data block",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, KeyFileOp::ReadHeader | KeyFileOp::ReadData)
    }
}

impl fmt::Display for KeyFileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while reading or writing an identity key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFileError {
    /// Refused to write a key with no payload.
    EmptyPayload,

    /// The first four bytes are not the `IDKY` tag.
    BadMagic { found: [u8; 4] },

    /// The file ended before the header or the declared payload was complete.
    TruncatedRead { expected: u64, actual: u64 },

    /// The header is valid but declares a zero-length payload.
    EmptyKey,

    /// Opening, reading or writing the file failed.
    Io {
        operation: KeyFileOp,
        path: Option<PathBuf>,
        message: String,
    },
}

impl KeyFileError {
    pub(crate) fn io(operation: KeyFileOp, path: Option<PathBuf>, err: std::io::Error) -> Self {
        KeyFileError::Io {
            operation,
            path,
            message: err.to_string(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            KeyFileError::EmptyPayload => "No data to write!".to_string(),
            KeyFileError::BadMagic { .. } => "Not a valid identity key!".to_string(),
            KeyFileError::TruncatedRead { .. } => {
                "The identity key is incomplete or corrupted.".to_string()
            }
            KeyFileError::EmptyKey => "The identity key holds no data!".to_string(),
            KeyFileError::Io {
                operation, path, ..
            } => match path {
                Some(p) => format!("Failed to {} '{}'!", operation, p.display()),
                None => format!("Failed to {} the identity key!", operation),
            },
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            KeyFileError::EmptyPayload => "E_KEY_EMPTY",
            KeyFileError::BadMagic { .. } => "E_KEY_MAGIC",
            KeyFileError::TruncatedRead { .. } => "E_KEY_TRUNCATED",
            KeyFileError::EmptyKey => "E_KEY_NO_DATA",
            KeyFileError::Io { .. } => "E_KEY_IO",
        }
    }
}

impl fmt::Display for KeyFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFileError::EmptyPayload => write!(f, "Key payload is empty"),
            KeyFileError::BadMagic { found } => {
                write!(f, "Bad key magic: expected \"IDKY\", found {:02x?}", found)
            }
            KeyFileError::TruncatedRead { expected, actual } => write!(
                f,
                "Truncated key read: expected {} bytes, got {}",
                expected, actual
            ),
            KeyFileError::EmptyKey => write!(f, "Key header declares an empty payload"),
            KeyFileError::Io {
                operation,
                path,
                message,
            } => match path {
                Some(p) => write!(f, "Failed to {} '{}': {}", operation, p.display(), message),
                None => write!(f, "Failed to {}: {}", operation, message),
            },
        }
    }
}

impl std::error::Error for KeyFileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic_display() {
        let err = KeyFileError::BadMagic { found: *b"ABCD" };
        assert!(err.to_string().contains("IDKY"));
        assert_eq!(err.error_code(), "E_KEY_MAGIC");
        assert_eq!(err.user_message(), "Not a valid identity key!");
    }

    #[test]
    fn test_truncated_display() {
        let err = KeyFileError::TruncatedRead {
            expected: 10,
            actual: 4,
        };
        assert!(err.to_string().contains("expected 10"));
        assert!(err.to_string().contains("got 4"));
    }

    #[test]
    fn test_io_with_path() {
        let err = KeyFileError::io(
            KeyFileOp::Open,
            Some(PathBuf::from("/dev/sdz")),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/dev/sdz"));
        assert!(err.user_message().contains("open"));
        assert_eq!(err.error_code(), "E_KEY_IO");
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(KeyFileOp::WriteData.to_string(), "write datas");
        assert!(KeyFileOp::ReadHeader.is_read());
        assert!(KeyFileOp::ReadData.is_read());
        assert!(!KeyFileOp::Open.is_read());
        assert!(!KeyFileOp::Sync.is_read());
    }
}
